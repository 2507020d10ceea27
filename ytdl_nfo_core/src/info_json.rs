use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;

use crate::NfoError;
use crate::NfoResult;
use crate::record::RawRecord;

/// Suffix yt-dlp gives metadata files written with `--write-info-json`.
pub const INFO_JSON_SUFFIX: &str = ".info.json";
/// Extension of the generated sidecar.
pub const NFO_EXTENSION: &str = "nfo";

const EXTRACTOR_FIELD: &str = "extractor";
const FILENAME_FIELD: &str = "_filename";

/// A metadata file and the record it contains.
#[derive(Debug, Clone)]
pub struct InfoJson {
	path: PathBuf,
	record: RawRecord,
}

impl InfoJson {
	/// Read and parse a metadata file. The top level must be a JSON object.
	pub fn read(path: impl Into<PathBuf>) -> NfoResult<Self> {
		let path = path.into();
		let content = std::fs::read_to_string(&path)?;
		let value: Value = serde_json::from_str(&content).map_err(|e| {
			NfoError::InvalidRecord {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;

		let Value::Object(fields) = value else {
			return Err(NfoError::InvalidRecord {
				path: path.display().to_string(),
				reason: "expected a json object".to_string(),
			});
		};

		Ok(Self {
			path,
			record: RawRecord::new(fields),
		})
	}

	pub fn from_record(path: impl Into<PathBuf>, record: RawRecord) -> Self {
		Self {
			path: path.into(),
			record,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn record(&self) -> &RawRecord {
		&self.record
	}

	/// The record's extractor, normalized into a template name.
	pub fn extractor(&self) -> Option<String> {
		self.record.get_str(EXTRACTOR_FIELD).map(normalize_extractor)
	}

	/// Where the sidecar for this file goes.
	///
	/// `video.info.json` becomes `video.nfo`. Other names fall back to the
	/// media file recorded in `_filename`, then to the metadata path itself.
	pub fn nfo_path(&self) -> PathBuf {
		let file_name = self
			.path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default();

		if let Some(stem) = file_name.strip_suffix(INFO_JSON_SUFFIX) {
			return self.path.with_file_name(format!("{stem}.{NFO_EXTENSION}"));
		}

		if let Some(media) = self.record.get_str(FILENAME_FIELD) {
			return Path::new(media).with_extension(NFO_EXTENSION);
		}

		let mut path = self.path.clone().into_os_string();
		path.push(format!(".{NFO_EXTENSION}"));
		PathBuf::from(path)
	}
}

/// Lower-case an extractor name and replace characters that cannot appear
/// in file names, so `Twitch:VOD` maps to the `twitch_vod` template.
pub fn normalize_extractor(extractor: &str) -> String {
	extractor
		.to_lowercase()
		.chars()
		.map(|ch| {
			if matches!(ch, ':' | '?' | '*' | '/' | '\\') {
				'_'
			} else {
				ch
			}
		})
		.collect()
}
