use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use regex::Regex;

use crate::NfoError;
use crate::NfoResult;

/// File name filter used when none is configured.
pub const DEFAULT_REGEX: &str = r"\.json$";

/// yt-dlp writes chat replays next to the metadata with this suffix. They
/// match the default filter but are not video metadata.
pub const LIVE_CHAT_SUFFIX: &str = ".live_chat.json";

/// Controls which files [`collect_info_files`] returns.
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Matched against each file name.
	pub regex: Regex,
	/// Gitignore-style patterns, relative to the walk root.
	pub exclude: Vec<String>,
}

impl ScanOptions {
	/// Compile `pattern` into a file name filter.
	pub fn new(pattern: &str) -> NfoResult<Self> {
		let regex = Regex::new(pattern).map_err(|e| {
			NfoError::InvalidPattern {
				pattern: pattern.to_string(),
				reason: e.to_string(),
			}
		})?;

		Ok(Self {
			regex,
			exclude: Vec::new(),
		})
	}

	#[must_use]
	pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
		self.exclude = exclude;
		self
	}
}

/// Collect the metadata files under `root`, sorted.
///
/// A `root` that is a file is returned as is, without filtering.
pub fn collect_info_files(root: &Path, options: &ScanOptions) -> NfoResult<Vec<PathBuf>> {
	if root.is_file() {
		return Ok(vec![root.to_path_buf()]);
	}

	if !root.is_dir() {
		return Err(NfoError::Io(std::io::Error::new(
			std::io::ErrorKind::NotFound,
			format!("`{}` is not a file or directory", root.display()),
		)));
	}

	let exclude = build_exclude_matcher(root, &options.exclude)?;
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();

	walk_dir(root, &mut files, options, &exclude, &mut visited_dirs)?;
	files.sort();
	tracing::debug!(root = %root.display(), count = files.len(), "collected info files");

	Ok(files)
}

fn build_exclude_matcher(root: &Path, patterns: &[String]) -> NfoResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			NfoError::InvalidPattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}

	builder.build().map_err(|e| {
		NfoError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

fn walk_dir(
	dir: &Path,
	files: &mut Vec<PathBuf>,
	options: &ScanOptions,
	exclude: &Gitignore,
	visited_dirs: &mut HashSet<PathBuf>,
) -> NfoResult<()> {
	// Symlinked directories can loop back on themselves.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Err(NfoError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();
		let is_dir = path.is_dir();

		if exclude.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			walk_dir(&path, files, options, exclude, visited_dirs)?;
		} else if is_info_file(&path, &options.regex) {
			files.push(path);
		}
	}

	Ok(())
}

fn is_info_file(path: &Path, regex: &Regex) -> bool {
	let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
		return false;
	};

	!name.ends_with(LIVE_CHAT_SUFFIX) && regex.is_match(name)
}
