use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use ytdl_nfo_cli::NfoCli;
use ytdl_nfo_core::DEFAULT_REGEX;
use ytdl_nfo_core::NfoConfig;
use ytdl_nfo_core::NfoError;
use ytdl_nfo_core::NfoResult;
use ytdl_nfo_core::ProcessOptions;
use ytdl_nfo_core::ProcessOutcome;
use ytdl_nfo_core::ScanOptions;
use ytdl_nfo_core::TemplateStore;
use ytdl_nfo_core::collect_info_files;
use ytdl_nfo_core::process_file_with;
use ytdl_nfo_core::user_template_dir;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

/// Per-run counts shown in the summary line.
#[derive(Debug, Default)]
struct Summary {
	written: usize,
	rendered: usize,
	skipped: usize,
	failed: usize,
}

fn main() {
	let args = NfoCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(&args, use_color);

	if args.config {
		match user_template_dir() {
			Some(dir) => println!("{}", dir.display()),
			None => {
				eprintln!(
					"{} no home directory found for the user template directory",
					colored!("error:", red)
				);
				process::exit(2);
			}
		}
		return;
	}

	let Some(input) = args.input.as_deref() else {
		eprintln!("{} no input given. Run `ytdl-nfo --help` for usage.", colored!("error:", red));
		process::exit(2);
	};

	match run(&args, input) {
		Ok(summary) => {
			print_summary(&args, &summary);
			if summary.failed > 0 {
				process::exit(1);
			}
		}
		Err(error) => {
			report(error);
			process::exit(2);
		}
	}
}

fn init_logging(args: &NfoCli, use_color: bool) {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
		)
		.with_target(false)
		.with_ansi(use_color)
		.with_writer(std::io::stderr)
		.init();
}

fn report(error: NfoError) {
	let report: miette::Report = error.into();
	eprintln!("{report:?}");
}

/// Where settings files and relative template paths are resolved from.
fn config_root(input: &Path) -> PathBuf {
	if input.is_dir() {
		return input.to_path_buf();
	}

	input
		.parent()
		.filter(|parent| !parent.as_os_str().is_empty())
		.map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn build_store(args: &NfoCli, config: &NfoConfig, root: &Path) -> TemplateStore {
	let mut store = TemplateStore::builtin();
	for directory in &args.templates {
		store = store.with_directory(directory);
	}
	for directory in config.template_paths(root) {
		store = store.with_directory(directory);
	}
	if let Some(directory) = user_template_dir().filter(|dir| dir.is_dir()) {
		store = store.with_directory(directory);
	}

	tracing::debug!(directories = ?store.directories(), "template search path");
	store
}

fn run(args: &NfoCli, input: &Path) -> NfoResult<Summary> {
	let root = config_root(input);
	let config = NfoConfig::load(&root)?.unwrap_or_default();
	let store = build_store(args, &config, &root);

	let pattern = args
		.regex
		.as_deref()
		.or(config.scan.regex.as_deref())
		.unwrap_or(DEFAULT_REGEX);
	let scan_options = ScanOptions::new(pattern)?.with_exclude(config.scan.exclude.clone());
	let files = collect_info_files(input, &scan_options)?;

	let options = ProcessOptions {
		extractor: args.extractor.clone().or_else(|| config.extractor.clone()),
		overwrite: args.overwrite || config.overwrite,
		dry_run: args.print,
	};
	let extractor_label = options.extractor.as_deref().unwrap_or("file specific");

	let mut summary = Summary::default();
	for file in &files {
		// Rendered documents own stdout in print mode.
		let announce = || {
			let line = format!("Processing {} with {extractor_label} extractor", file.display());
			if args.print {
				eprintln!("{line}");
			} else {
				println!("{line}");
			}
		};

		match process_file_with(file, &store, &options, announce) {
			Ok(ProcessOutcome::Written(_)) => summary.written += 1,
			Ok(ProcessOutcome::Rendered { xml, .. }) => {
				print!("{xml}");
				summary.rendered += 1;
			}
			Ok(ProcessOutcome::Skipped(_)) => summary.skipped += 1,
			Err(error) => {
				eprintln!("{} {}", colored!("failed:", red), file.display());
				report(error);
				summary.failed += 1;
			}
		}
	}

	Ok(summary)
}

fn print_summary(args: &NfoCli, summary: &Summary) {
	let processed = if args.print {
		format!("{} rendered", summary.rendered)
	} else {
		format!("{} written", summary.written)
	};
	let failed = format!("{} failed", summary.failed);
	let failed = if summary.failed > 0 {
		colored!(failed, red)
	} else {
		failed
	};

	let skipped = format!("{} skipped", summary.skipped);
	let skipped = if summary.skipped > 0 {
		colored!(skipped, yellow)
	} else {
		skipped
	};

	let line = format!(
		"{} {}, {skipped}, {failed}",
		colored!("Done:", bold),
		colored!(processed, green),
	);

	// Keep stdout clean for the rendered documents.
	if args.print {
		eprintln!("{line}");
	} else {
		println!("{line}");
	}
}
