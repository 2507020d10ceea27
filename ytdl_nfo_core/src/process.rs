use std::path::Path;
use std::path::PathBuf;

use crate::NfoError;
use crate::NfoResult;
use crate::info_json::InfoJson;
use crate::nfo::Nfo;
use crate::store::TemplateStore;

/// How a single metadata file is turned into a sidecar.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
	/// Template to use instead of the record's own extractor.
	pub extractor: Option<String>,
	/// Replace an existing sidecar.
	pub overwrite: bool,
	/// Render the sidecar without writing it.
	pub dry_run: bool,
}

/// What happened to one metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
	/// The sidecar was written to this path.
	Written(PathBuf),
	/// A sidecar already exists at this path and was left alone.
	Skipped(PathBuf),
	/// Dry run output for the sidecar that would be written to `path`.
	Rendered { path: PathBuf, xml: String },
}

impl ProcessOutcome {
	pub fn path(&self) -> &Path {
		match self {
			Self::Written(path) | Self::Skipped(path) => path,
			Self::Rendered { path, .. } => path,
		}
	}
}

/// Read `path`, generate its sidecar with a template from `store` and write
/// it next to the media file.
pub fn process_file(
	path: &Path,
	store: &TemplateStore,
	options: &ProcessOptions,
) -> NfoResult<ProcessOutcome> {
	process_file_with(path, store, options, || {})
}

/// [`process_file`] that calls `on_start` once the file is attempted.
///
/// `on_start` runs before any work that can fail after the skip check, and
/// also when the file cannot be read at all. It never runs for a skipped file.
pub fn process_file_with(
	path: &Path,
	store: &TemplateStore,
	options: &ProcessOptions,
	on_start: impl FnOnce(),
) -> NfoResult<ProcessOutcome> {
	let info = match InfoJson::read(path) {
		Ok(info) => info,
		Err(error) => {
			on_start();
			return Err(error);
		}
	};

	let nfo_path = info.nfo_path();
	if !options.dry_run && !options.overwrite && nfo_path.exists() {
		tracing::info!(path = %nfo_path.display(), "nfo already exists, skipping");
		return Ok(ProcessOutcome::Skipped(nfo_path));
	}

	on_start();

	let extractor = match &options.extractor {
		Some(extractor) => extractor.clone(),
		None => {
			info.extractor().ok_or_else(|| {
				NfoError::ExtractorMissing {
					path: path.display().to_string(),
				}
			})?
		}
	};

	let mut nfo = Nfo::load(store, &extractor);
	if let Some(error) = nfo.take_load_error() {
		return Err(error);
	}

	nfo.generate(info.record())?;

	if options.dry_run {
		let xml = nfo.to_xml()?;
		return Ok(ProcessOutcome::Rendered {
			path: nfo_path,
			xml,
		});
	}

	nfo.write(&nfo_path)?;
	tracing::info!(path = %nfo_path.display(), extractor = %extractor, "wrote nfo");

	Ok(ProcessOutcome::Written(nfo_path))
}
