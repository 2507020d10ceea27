use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn nfo_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("ytdl-nfo"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

pub const YOUTUBE_INFO: &str = r#"{
	"id": "dQw4w9WgXcQ",
	"extractor": "youtube",
	"title": "Test Video Title",
	"uploader": "Test Uploader",
	"upload_date": "20230115",
	"tags": ["music", "video"]
}"#;

pub fn write_file(path: &Path, contents: &str) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
	}
	std::fs::write(path, contents).unwrap_or_else(|e| panic!("write: {e}"));
}
