use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::NfoError;
use crate::NfoResult;
use crate::template::Template;

/// File extensions tried, in order, when looking up a template on disk.
pub const TEMPLATE_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Templates compiled into the binary, keyed by normalized extractor name.
const BUILTIN_TEMPLATES: [(&str, &str); 5] = [
	("dailymotion", include_str!("../templates/dailymotion.yaml")),
	("generic", include_str!("../templates/generic.yaml")),
	("twitch_vod", include_str!("../templates/twitch_vod.yaml")),
	("vimeo", include_str!("../templates/vimeo.yaml")),
	("youtube", include_str!("../templates/youtube.yaml")),
];

/// Looks up templates by extractor name.
///
/// Directories added with [`TemplateStore::with_directory`] are searched
/// first, in the order they were added, so users can override the built-in
/// templates.
#[derive(Debug, Clone)]
pub struct TemplateStore {
	directories: Vec<PathBuf>,
	include_builtin: bool,
}

impl Default for TemplateStore {
	fn default() -> Self {
		Self::builtin()
	}
}

impl TemplateStore {
	/// A store backed by the built-in templates only.
	pub fn builtin() -> Self {
		Self {
			directories: Vec::new(),
			include_builtin: true,
		}
	}

	/// A store that only reads templates from directories.
	pub fn empty() -> Self {
		Self {
			directories: Vec::new(),
			include_builtin: false,
		}
	}

	#[must_use]
	pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
		self.directories.push(directory.into());
		self
	}

	pub fn directories(&self) -> &[PathBuf] {
		&self.directories
	}

	/// Names of the templates compiled into the binary.
	pub fn builtin_names() -> impl Iterator<Item = &'static str> {
		BUILTIN_TEMPLATES.iter().map(|(name, _)| *name)
	}

	/// Load the template for `extractor`.
	pub fn load(&self, extractor: &str) -> NfoResult<Template> {
		self.find(extractor)?
			.ok_or_else(|| NfoError::ConfigurationMissing {
				extractor: extractor.to_string(),
			})
	}

	/// Load the template for `extractor`, or `None` when no source has one.
	pub fn find(&self, extractor: &str) -> NfoResult<Option<Template>> {
		if !is_valid_extractor_name(extractor) {
			tracing::debug!(extractor, "refusing to look up template for unsafe name");
			return Ok(None);
		}

		for directory in &self.directories {
			if let Some(path) = template_path(directory, extractor) {
				tracing::debug!(extractor, path = %path.display(), "loading template from disk");
				let source = std::fs::read_to_string(&path)?;
				return parse_template(extractor, &source).map(Some);
			}
		}

		if !self.include_builtin {
			return Ok(None);
		}

		BUILTIN_TEMPLATES
			.iter()
			.find(|(name, _)| *name == extractor)
			.map(|(_, source)| {
				tracing::debug!(extractor, "loading built-in template");
				parse_template(extractor, source)
			})
			.transpose()
	}
}

fn template_path(directory: &Path, extractor: &str) -> Option<PathBuf> {
	TEMPLATE_EXTENSIONS
		.iter()
		.map(|extension| directory.join(format!("{extractor}.{extension}")))
		.find(|path| path.is_file())
}

fn parse_template(extractor: &str, source: &str) -> NfoResult<Template> {
	let value: serde_yaml_ng::Value =
		serde_yaml_ng::from_str(source).map_err(|e| {
			NfoError::TemplateParse {
				extractor: extractor.to_string(),
				reason: e.to_string(),
			}
		})?;

	Template::from_yaml(&value)
}

fn is_valid_extractor_name(extractor: &str) -> bool {
	!extractor.is_empty()
		&& !extractor.contains(['/', '\\'])
		&& !extractor.contains("..")
		&& extractor != "."
}

/// Per-user template directory, e.g. `~/.config/ytdl-nfo/templates` on
/// Linux.
pub fn user_template_dir() -> Option<PathBuf> {
	ProjectDirs::from("", "", "ytdl-nfo").map(|dirs| dirs.config_dir().join("templates"))
}
