use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::NfoError;
use crate::NfoResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"ytdl-nfo.toml",
	".ytdl-nfo.toml",
	".config/ytdl-nfo.toml",
];

/// Configuration loaded from a `ytdl-nfo.toml` file.
///
/// ```toml
/// extractor = "youtube"
/// overwrite = false
///
/// [scan]
/// regex = "\\.info\\.json$"
/// exclude = ["archive/"]
///
/// [templates]
/// paths = ["templates"]
/// ```
///
/// Command line flags take precedence over every value here.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NfoConfig {
	/// Template used for every file instead of the detected extractor.
	#[serde(default)]
	pub extractor: Option<String>,
	/// Replace existing `.nfo` files.
	#[serde(default)]
	pub overwrite: bool,
	#[serde(default)]
	pub scan: ScanConfig,
	#[serde(default)]
	pub templates: TemplatesConfig,
}

/// Which files a directory walk picks up.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
	/// File name filter. Defaults to `\.json$`.
	#[serde(default)]
	pub regex: Option<String>,
	/// Gitignore-style patterns for paths to skip.
	#[serde(default)]
	pub exclude: Vec<String>,
}

/// Extra template directories, relative to the directory holding the config
/// file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
	#[serde(default)]
	pub paths: Vec<PathBuf>,
}

impl NfoConfig {
	/// Resolve the first config file path discovered at `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is no config file.
	pub fn load(root: &Path) -> NfoResult<Option<NfoConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		tracing::debug!(path = %config_path.display(), "loading config");
		let content = std::fs::read_to_string(&config_path)?;
		let config: NfoConfig =
			toml::from_str(&content).map_err(|e| NfoError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}

	/// Template directories made absolute against `root`.
	pub fn template_paths(&self, root: &Path) -> Vec<PathBuf> {
		self.templates
			.paths
			.iter()
			.map(|path| root.join(path))
			.collect()
	}
}
