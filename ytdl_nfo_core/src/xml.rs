//! NFO serialization.
//!
//! Output is pretty printed with four-space indentation and starts with an
//! XML declaration, which is what Kodi and Jellyfin expect of sidecar files.

use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;

use crate::NfoError;
use crate::NfoResult;
use crate::element::Element;

const XML_VERSION: &str = "1.0";
const XML_ENCODING: &str = "UTF-8";
const INDENT_SIZE: usize = 4;

/// Serialize a tree to an XML document.
pub fn to_xml_string(root: &Element) -> NfoResult<String> {
	let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

	write_event(
		&mut writer,
		Event::Decl(BytesDecl::new(XML_VERSION, Some(XML_ENCODING), None)),
	)?;
	write_element(&mut writer, root)?;

	let mut bytes = writer.into_inner();
	bytes.push(b'\n');
	String::from_utf8(bytes).map_err(|e| NfoError::XmlWrite(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> NfoResult<()> {
	let mut start = BytesStart::new(element.name.as_str());
	for (name, value) in &element.attributes {
		start.push_attribute((name.as_str(), value.as_str()));
	}

	let text = element.text();
	if text.is_empty() && element.children.is_empty() {
		return write_event(writer, Event::Empty(start));
	}

	write_event(writer, Event::Start(start))?;
	if !text.is_empty() {
		write_event(writer, Event::Text(BytesText::new(text)))?;
	}
	for child in &element.children {
		write_element(writer, child)?;
	}
	write_event(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> NfoResult<()> {
	writer
		.write_event(event)
		.map_err(|e| NfoError::XmlWrite(e.to_string()))
}

/// Write `contents` to `path` through a temporary sibling file and a rename,
/// so an interrupted write never leaves a truncated sidecar behind.
pub fn write_atomic(path: &Path, contents: &str) -> NfoResult<()> {
	let file_name = path
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_default();
	let temp_path = path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()));

	let output_error = |e: std::io::Error| {
		NfoError::OutputWrite {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	};

	std::fs::write(&temp_path, contents).map_err(output_error)?;
	std::fs::rename(&temp_path, path).map_err(|e| {
		let _ = std::fs::remove_file(&temp_path);
		output_error(e)
	})?;

	tracing::debug!(path = %path.display(), temp = %temp_path.display(), "moved file into place");
	Ok(())
}
