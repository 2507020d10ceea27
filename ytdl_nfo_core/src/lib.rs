//! `ytdl_nfo_core` turns the `.info.json` metadata written by
//! `yt-dlp --write-info-json` into `.nfo` sidecar files for Kodi, Plex, Emby
//! and Jellyfin.
//!
//! ## Processing Pipeline
//!
//! ```text
//! .info.json
//!   -> InfoJson (record plus normalized extractor name)
//!   -> TemplateStore (YAML template for the extractor)
//!   -> Nfo::generate (interprets the template against the record)
//!   -> Element tree
//!   -> xml (pretty printed document, written atomically)
//! ```
//!
//! ## Templates
//!
//! A template is a YAML mapping with a single root key. Each entry names an
//! output element and a format string filled in from the record:
//!
//! ```yaml
//! episodedetails:
//!   - title: "{title}"
//!   - uniqueid:
//!       attr:
//!         type: youtube
//!         default: "true"
//!       value: "{id}"
//!   - premiered:
//!       convert: date
//!       input_f: "%Y%m%d"
//!       output_f: "%Y-%m-%d"
//!       value: "{upload_date}"
//!   - tag!: "{tags}"
//!   - actor>name!: "[{uploader!r}]"
//! ```
//!
//! A key ending in `!` is a table: its value must render to a list literal
//! and one element is emitted per item. Table keys may use `>` to wrap each
//! item in parent elements.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use ytdl_nfo_core::ProcessOptions;
//! use ytdl_nfo_core::TemplateStore;
//! use ytdl_nfo_core::process_file;
//!
//! let store = TemplateStore::builtin();
//! let outcome = process_file(
//! 	Path::new("video.info.json"),
//! 	&store,
//! 	&ProcessOptions::default(),
//! )
//! .unwrap();
//! println!("{}", outcome.path().display());
//! ```

pub use config::*;
pub use conversion::*;
pub use element::*;
pub use error::*;
pub use info_json::*;
pub use interpreter::generate;
pub use nfo::*;
pub use process::*;
pub use record::*;
pub use scan::*;
pub use store::*;
pub use template::*;

pub mod config;
mod conversion;
mod element;
#[allow(unused_assignments)]
mod error;
pub mod format;
mod info_json;
mod interpreter;
pub mod literal;
mod nfo;
pub mod path;
mod process;
mod record;
mod resolver;
pub mod scan;
mod store;
mod template;
pub mod xml;

#[cfg(test)]
mod __tests;
