use std::path::PathBuf;

use clap::ArgAction;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about = "Convert yt-dlp .info.json files into NFO sidecars.",
	long_about = "ytdl-nfo converts the metadata written by `yt-dlp --write-info-json` into \
	              `.nfo` files for Kodi, Plex, Emby and Jellyfin.\n\nPass a single json file or \
	              a directory to process recursively. Each record is rendered with the template \
	              matching its extractor, e.g. `youtube.yaml`. Add your own templates to the \
	              directory shown by `ytdl-nfo --config` or pass `--templates <DIR>`."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct NfoCli {
	/// JSON file to convert or directory to process recursively.
	#[arg(value_name = "JSON_FILE", required_unless_present = "config")]
	pub input: Option<PathBuf>,

	/// Use this template for every file instead of the detected extractor.
	#[arg(long, short)]
	pub extractor: Option<String>,

	/// Regular expression matched against file names when processing a
	/// directory.
	#[arg(long, short)]
	pub regex: Option<String>,

	/// Overwrite existing NFO files.
	#[arg(long, short = 'w', default_value_t = false)]
	pub overwrite: bool,

	/// Extra directory to search for templates before the built-in ones.
	/// Can be repeated.
	#[arg(long, short, value_name = "DIR")]
	pub templates: Vec<PathBuf>,

	/// Print the generated NFOs instead of writing them.
	#[arg(long, default_value_t = false)]
	pub print: bool,

	/// Print the user template directory and exit.
	#[arg(long, default_value_t = false)]
	pub config: bool,

	/// Increase logging. Repeat for more detail.
	#[arg(long, short, action = ArgAction::Count, conflicts_with = "quiet")]
	pub verbose: u8,

	/// Only log errors.
	#[arg(long, short, default_value_t = false)]
	pub quiet: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

impl NfoCli {
	/// Default log filter for the chosen verbosity. `RUST_LOG` overrides it.
	pub fn log_filter(&self) -> &'static str {
		if self.quiet {
			return "error";
		}

		match self.verbose {
			0 => "warn",
			1 => "info",
			2 => "debug",
			_ => "trace",
		}
	}
}
