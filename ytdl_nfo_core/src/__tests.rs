use std::borrow::Cow;
use std::path::Path;
use std::path::PathBuf;

use quick_xml::Reader;
use quick_xml::events::Event;
use rstest::rstest;
use serde_json::Value;
use serde_json::json;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::*;
use crate::format::format_record;
use crate::literal::parse_list;
use crate::path::split_element_path;
use crate::xml::to_xml_string;

fn record(value: Value) -> RawRecord {
	match value {
		Value::Object(fields) => RawRecord::new(fields),
		other => panic!("expected a json object, found {other}"),
	}
}

fn youtube() -> Template {
	TemplateStore::builtin()
		.load("youtube")
		.unwrap_or_else(|e| panic!("youtube template: {e}"))
}

fn template(source: &str) -> Template {
	Template::from_yaml_str(source).unwrap_or_else(|e| panic!("template: {e}"))
}

fn texts<'a>(element: &'a Element, name: &'a str) -> Vec<&'a str> {
	element.children_named(name).map(Element::text).collect()
}

fn names(element: &Element) -> Vec<&str> {
	element.children.iter().map(|child| child.name.as_str()).collect()
}

fn write_file(path: &Path, contents: &str) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir: {e}"));
	}
	std::fs::write(path, contents).unwrap_or_else(|e| panic!("write: {e}"));
}

/// Parse serialized output back into a tree.
fn parse_xml(xml: &str) -> Element {
	let mut reader = Reader::from_str(xml);
	reader.config_mut().trim_text(true);

	let mut stack: Vec<Element> = Vec::new();
	let mut root = None;

	let element_from = |start: &quick_xml::events::BytesStart<'_>| {
		let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
		for attribute in start.attributes() {
			let attribute = attribute.unwrap_or_else(|e| panic!("attribute: {e}"));
			let value = attribute
				.unescape_value()
				.unwrap_or_else(|e| panic!("attribute value: {e}"));
			element.set_attribute(
				String::from_utf8_lossy(attribute.key.as_ref()),
				value.into_owned(),
			);
		}
		element
	};

	loop {
		match reader.read_event() {
			Ok(Event::Start(start)) => stack.push(element_from(&start)),
			Ok(Event::Empty(start)) => {
				let element = element_from(&start);
				match stack.last_mut() {
					Some(parent) => parent.push_child(element),
					None => root = Some(element),
				}
			}
			Ok(Event::Text(text)) => {
				let text = text.unescape().unwrap_or_else(|e| panic!("text: {e}"));
				if let Some(current) = stack.last_mut() {
					current.text = Some(text.into_owned());
				}
			}
			Ok(Event::End(_)) => {
				let element = stack.pop().unwrap_or_else(|| panic!("unbalanced end tag"));
				match stack.last_mut() {
					Some(parent) => parent.push_child(element),
					None => root = Some(element),
				}
			}
			Ok(Event::Eof) => break,
			Ok(_) => {}
			Err(e) => panic!("invalid xml: {e}"),
		}
	}

	root.unwrap_or_else(|| panic!("document has no root element"))
}

/// Empty text and missing text serialize the same way.
fn normalized(element: &Element) -> Element {
	Element {
		name: element.name.clone(),
		attributes: element.attributes.clone(),
		text: element.text.clone().filter(|text| !text.is_empty()),
		children: element.children.iter().map(normalized).collect(),
	}
}

#[test]
fn generates_youtube_episode() -> NfoResult<()> {
	let record = record(json!({
		"title": "Test Video Title",
		"uploader": "Test Uploader",
		"upload_date": "20230115",
	}));

	let root = generate(&youtube(), &record)?;

	assert_eq!(root.name, "episodedetails");
	assert_eq!(
		names(&root),
		vec![
			"title",
			"showtitle",
			"uniqueid",
			"plot",
			"premiered",
			"aired",
			"studio",
			"thumb",
			"actor"
		]
	);
	assert_eq!(texts(&root, "title"), vec!["Test Video Title"]);
	assert_eq!(texts(&root, "premiered"), vec!["2023-01-15"]);
	assert_eq!(texts(&root, "aired"), vec!["2023-01-15"]);
	assert_eq!(
		root.find(&["actor", "name"]).map(Element::text),
		Some("Test Uploader")
	);

	let xml = to_xml_string(&root)?;
	assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
	assert!(xml.contains("<title>Test Video Title</title>"));
	assert!(xml.contains("<premiered>2023-01-15</premiered>"));

	Ok(())
}

#[test]
fn missing_fields_render_empty() -> NfoResult<()> {
	let root = generate(&youtube(), &RawRecord::default())?;

	assert_eq!(texts(&root, "title"), vec![""]);
	assert_eq!(texts(&root, "premiered"), vec![""]);
	assert_eq!(root.child("uniqueid").and_then(|e| e.attribute("type")), Some("youtube"));
	assert!(root.child("genre").is_none());
	assert_eq!(root.children_named("actor").count(), 1);
	assert_eq!(root.find(&["actor", "name"]).map(Element::text), Some(""));

	Ok(())
}

#[rstest]
#[case::none(json!([]), vec![])]
#[case::one(json!(["music"]), vec!["music"])]
#[case::many(json!(["a", "b", "c"]), vec!["a", "b", "c"])]
#[case::mixed(json!(["x", 2, true]), vec!["x", "2", "True"])]
fn table_key_emits_one_element_per_item(
	#[case] tags: Value,
	#[case] expected: Vec<&str>,
) -> NfoResult<()> {
	let template = template("video:\n  - tag!: \"{tags}\"\n");
	let root = generate(&template, &record(json!({ "tags": tags })))?;

	assert_eq!(texts(&root, "tag"), expected);
	assert_eq!(root.children.len(), expected.len());

	Ok(())
}

#[test]
fn nested_table_key_builds_a_fresh_chain_per_item() -> NfoResult<()> {
	let template = template(
		"movie:\n  - actor>name!:\n      attr:\n        source: \"{site}\"\n      value: \"{cast}\"\n",
	);
	let record = record(json!({ "cast": ["Ann", "Bob"], "site": "example" }));
	let root = generate(&template, &record)?;

	assert_eq!(names(&root), vec!["actor", "actor"]);
	let cast: Vec<&str> = root
		.children_named("actor")
		.filter_map(|actor| actor.child("name"))
		.map(Element::text)
		.collect();
	assert_eq!(cast, vec!["Ann", "Bob"]);
	for actor in root.children_named("actor") {
		assert_eq!(actor.children.len(), 1);
		assert_eq!(actor.attributes, vec![]);
		assert_eq!(
			actor.child("name").and_then(|name| name.attribute("source")),
			Some("example")
		);
	}

	Ok(())
}

#[test]
fn nesting_without_table_marker_is_a_structural_violation() {
	let template = template("movie:\n  - actor>name: \"{uploader}\"\n");
	let result = generate(&template, &record(json!({ "uploader": "Ann" })));

	let Err(error) = result else {
		panic!("expected an error");
	};
	assert!(matches!(error, NfoError::StructuralViolation { .. }));
	insta::assert_snapshot!(error.to_string(), @"error with key `actor>name`: `>` delimiter can only be used for lists");
}

#[rstest]
#[case::plain("title", false)]
#[case::nested_plain("actor>name", false)]
#[case::table("tag!", true)]
#[case::nested_table("actor>name!", true)]
fn node_keys_decode_table_marker(#[case] raw: &str, #[case] table: bool) {
	let key = NodeKey::parse(raw);

	assert_eq!(key.raw(), raw);
	assert_eq!(key.is_table(), table);
	assert_eq!(key.name(), raw.trim_end_matches('!'));
}

#[rstest]
#[case::single("tag!", vec!["tag"])]
#[case::pair("actor>name!", vec!["actor", "name"])]
#[case::deep("a>b>c!", vec!["a", "b", "c"])]
fn splits_element_paths(#[case] raw: &str, #[case] expected: Vec<&str>) -> NfoResult<()> {
	let key = NodeKey::parse(raw);
	assert_eq!(split_element_path(&key)?, expected);

	Ok(())
}

#[test]
fn empty_path_segment_is_rejected() {
	let key = NodeKey::parse("actor>>name!");
	let result = split_element_path(&key);

	assert!(matches!(result, Err(NfoError::StructuralViolation { .. })));
}

#[test]
fn serialized_output_parses_back_to_the_same_tree() -> NfoResult<()> {
	let record = record(json!({
		"id": "dQw4w9WgXcQ",
		"title": "Fish & Chips <Live>",
		"uploader": "O'Brien \"The Chef\"",
		"description": "Line one\nLine two",
		"upload_date": "20091025",
		"channel": "Cooking",
		"thumbnail": "https://example.com/thumb.jpg?a=1&b=2",
		"categories": ["Howto & Style"],
		"tags": ["fish", "chips", "<tag>"],
	}));

	let root = generate(&youtube(), &record)?;
	let xml = to_xml_string(&root)?;
	let parsed = parse_xml(&xml);

	assert_eq!(parsed, normalized(&root));
	assert!(xml.contains("Fish &amp; Chips &lt;Live&gt;"));

	Ok(())
}

#[test]
fn childless_elements_without_text_are_empty_tags() -> NfoResult<()> {
	let mut root = Element::new("movie");
	root.push_child(Element::new("plot"));
	root.push_child(Element::new("title").with_text("Up"));

	let xml = to_xml_string(&root)?;

	assert!(xml.contains("<plot/>"));
	assert!(xml.contains("<title>Up</title>"));
	assert!(xml.ends_with("</movie>\n"));

	Ok(())
}

#[test]
fn set_attribute_replaces_in_place() {
	let mut element = Element::new("uniqueid");
	element.set_attribute("type", "youtube");
	element.set_attribute("default", "true");
	element.set_attribute("type", "vimeo");

	assert_eq!(
		element.attributes,
		vec![
			("type".to_string(), "vimeo".to_string()),
			("default".to_string(), "true".to_string()),
		]
	);
}

#[rstest]
#[case::number(json!(1673740800))]
#[case::float(json!(1673740800.75))]
#[case::string(json!("1673740800"))]
fn upload_date_is_derived_from_epoch(#[case] epoch: Value) {
	let record = record(json!({ "epoch": epoch }));

	let derived = record.with_upload_date();

	assert!(matches!(derived, Cow::Owned(_)));
	assert_eq!(derived.get_str(UPLOAD_DATE_FIELD), Some("20230115"));
	assert_eq!(record.get(UPLOAD_DATE_FIELD), None);
}

#[test]
fn upload_date_derivation_is_idempotent() {
	let record = record(json!({ "epoch": 1673740800 }));

	let once = record.with_upload_date().into_owned();
	let twice = once.with_upload_date();

	assert!(matches!(twice, Cow::Borrowed(_)));
	assert_eq!(*twice, once);
}

#[rstest]
#[case::existing(json!({ "upload_date": "20200101", "epoch": 1673740800 }), Some("20200101"))]
#[case::missing_epoch(json!({ "title": "x" }), None)]
#[case::bad_epoch(json!({ "epoch": "yesterday" }), None)]
fn upload_date_is_left_alone(#[case] value: Value, #[case] expected: Option<&str>) {
	let record = record(value);
	let derived = record.with_upload_date();

	assert!(matches!(derived, Cow::Borrowed(_)));
	assert_eq!(derived.get_str(UPLOAD_DATE_FIELD), expected);
}

#[test]
fn epoch_fills_in_dates_during_generation() -> NfoResult<()> {
	let record = record(json!({ "title": "x", "epoch": 1673740800 }));
	let root = generate(&youtube(), &record)?;

	assert_eq!(texts(&root, "premiered"), vec!["2023-01-15"]);

	Ok(())
}

#[test]
fn unknown_extractor_has_no_template() {
	let mut nfo = Nfo::load(&TemplateStore::builtin(), "nonexistent");

	assert_eq!(nfo.state(), NfoState::Unloaded);
	assert!(!nfo.is_template_loaded());
	assert!(matches!(
		nfo.load_error(),
		Some(NfoError::ConfigurationMissing { .. })
	));
	assert!(matches!(
		nfo.generate(&RawRecord::default()),
		Err(NfoError::TemplateNotLoaded { .. })
	));
	assert!(nfo.root().is_none());
	assert!(matches!(nfo.to_xml(), Err(NfoError::NotGenerated)));

	let Some(error) = nfo.take_load_error() else {
		panic!("expected a load error");
	};
	insta::assert_snapshot!(error.to_string(), @"no template available for extractor `nonexistent`");
}

#[test]
#[traced_test]
fn malformed_list_literal_fails_generation() {
	let mut nfo = Nfo::from_template("custom", template("video:\n  - tag!: \"{tags}\"\n"));

	let result = nfo.generate(&record(json!({ "tags": "not a list" })));

	let Err(error) = result else {
		panic!("expected a literal error");
	};
	insta::assert_snapshot!(error.to_string(), @"value of list key `tag!` is not a valid list literal: expected a list literal at offset 0");
	assert_eq!(nfo.state(), NfoState::Failed);
	assert!(nfo.root().is_none());
	assert!(matches!(nfo.to_xml(), Err(NfoError::NotGenerated)));
	assert!(logs_contain("is not a valid list literal"));
}

#[test]
fn failed_generation_discards_the_previous_tree() -> NfoResult<()> {
	let mut nfo = Nfo::from_template("custom", template("video:\n  - tag!: \"{tags}\"\n"));

	nfo.generate(&record(json!({ "tags": ["a"] })))?;
	assert!(nfo.is_generated());
	assert!(nfo.to_xml()?.contains("<tag>a</tag>"));

	let result = nfo.generate(&record(json!({ "tags": "['a'" })));
	assert!(matches!(result, Err(NfoError::LiteralParse { .. })));
	assert!(nfo.root().is_none());
	assert!(matches!(nfo.to_xml(), Err(NfoError::NotGenerated)));

	Ok(())
}

#[test]
fn each_generation_replaces_the_tree() -> NfoResult<()> {
	let mut nfo = Nfo::load(&TemplateStore::builtin(), "youtube");

	nfo.generate(&record(json!({ "title": "First" })))?;
	let root = nfo.generate(&record(json!({ "title": "Second" })))?;

	assert_eq!(texts(root, "title"), vec!["Second"]);
	assert_eq!(root.children_named("title").count(), 1);

	Ok(())
}

#[test]
fn unparsable_date_is_a_conversion_failure() {
	let result = generate(&youtube(), &record(json!({ "upload_date": "garbage" })));

	let Err(error) = result else {
		panic!("expected a conversion error");
	};
	assert!(error.is_generation_error());
	insta::assert_snapshot!(error.to_string(), @"failed to convert `garbage` for key `premiered`: time data `garbage` does not match format `%Y%m%d`");
}

#[rstest]
#[case::plain("{title}", "Hello")]
#[case::missing("{missing}", "")]
#[case::missing_with_spec("[{missing:>5}]", "[     ]")]
#[case::missing_repr("[{missing!r}]", "['']")]
#[case::missing_nested_repr("{meta.missing!r}", "''")]
#[case::missing_numeric_spec("[{missing:,}]", "[]")]
#[case::missing_integer_spec("[{missing:05d}]", "[]")]
#[case::escaped("{{title}}", "{title}")]
#[case::list("{tags}", "['a', 'b']")]
#[case::boolean("{live}", "True")]
#[case::float("{ratio}", "3.0")]
#[case::null("{nothing}", "")]
#[case::grouping("{views:,}", "1,234,567")]
#[case::repr("{title!r}", "'Hello'")]
#[case::index("{thumbnails[0][url]}", "https://example.com/0.jpg")]
#[case::attribute("{meta.kind}", "clip")]
#[case::width("{views_small:>5}", "   42")]
#[case::zero_pad("{views_small:05d}", "00042")]
#[case::truncate("{title:.3}", "Hel")]
#[case::fixed("{rating:.2f}", "4.57")]
#[case::nested_spec("{title:>{pad}}", "   Hello")]
#[case::text_around("by {uploader} ({views_small})", "by Ann (42)")]
fn formats_record_fields(#[case] format: &str, #[case] expected: &str) -> AnyEmptyResult {
	let record = record(json!({
		"title": "Hello",
		"uploader": "Ann",
		"tags": ["a", "b"],
		"live": true,
		"ratio": 3.0,
		"nothing": null,
		"views": 1234567,
		"views_small": 42,
		"rating": 4.567,
		"pad": 8,
		"thumbnails": [{ "url": "https://example.com/0.jpg" }],
		"meta": { "kind": "clip" },
	}));

	assert_eq!(format_record(format, &record)?, expected);

	Ok(())
}

#[rstest]
#[case::unterminated("{title")]
#[case::lone_close("title}")]
#[case::positional("{0}")]
#[case::empty("{}")]
#[case::bad_conversion("{title!z}")]
fn rejects_malformed_format_strings(#[case] format: &str) {
	let record = record(json!({ "title": "Hello" }));

	assert!(format_record(format, &record).is_err());
}

#[test]
fn malformed_placeholder_is_a_format_string_error() {
	let template = template("video:\n  - title: \"{title\"\n");
	let result = generate(&template, &record(json!({ "title": "Hello" })));

	assert!(matches!(result, Err(NfoError::FormatString { .. })));
}

#[rstest]
#[case::blank("  ", vec![])]
#[case::empty("[]", vec![])]
#[case::single_quotes("['a', 'b']", vec!["a", "b"])]
#[case::double_quotes(r#"["it's", "ok"]"#, vec!["it's", "ok"])]
#[case::trailing_comma("['a',]", vec!["a"])]
#[case::escapes(r"['a\'b', 'tab\there', '\u00e9']", vec!["a'b", "tab\there", "é"])]
#[case::primitives("[1, -2, 2.5, True, False, None]", vec!["1", "-2", "2.5", "True", "False", ""])]
fn parses_list_literals(#[case] text: &str, #[case] expected: Vec<&str>) -> AnyEmptyResult {
	assert_eq!(parse_list(text)?, expected);

	Ok(())
}

#[rstest]
#[case::not_a_list("hello")]
#[case::unterminated_list("['a'")]
#[case::unterminated_string("['a]")]
#[case::nested("[['a']]")]
#[case::trailing_text("['a'] extra")]
#[case::bare_word("[music]")]
#[case::missing_comma("['a' 'b']")]
fn rejects_invalid_list_literals(#[case] text: &str) {
	assert!(parse_list(text).is_err());
}

#[test]
fn rendered_lists_parse_back_into_items() -> AnyEmptyResult {
	let record = record(json!({ "tags": ["it's", "say \"hi\"", "back\\slash"] }));
	let rendered = format_record("{tags}", &record)?;

	assert_eq!(
		parse_list(&rendered)?,
		vec!["it's", "say \"hi\"", "back\\slash"]
	);

	Ok(())
}

#[rstest]
#[case::date("20230115", "%Y%m%d", "%Y-%m-%d", "2023-01-15")]
#[case::datetime("2023-01-15 08:30", "%Y-%m-%d %H:%M", "%d/%m/%Y %H:%M", "15/01/2023 08:30")]
#[case::empty("", "%Y%m%d", "%Y-%m-%d", "")]
fn converts_dates(
	#[case] value: &str,
	#[case] input_format: &str,
	#[case] output_format: &str,
	#[case] expected: &str,
) -> AnyEmptyResult {
	let conversion = Conversion::Date {
		input_format: input_format.to_string(),
		output_format: output_format.to_string(),
	};

	assert_eq!(conversion.apply(value)?, expected);

	Ok(())
}

#[rstest]
#[case::words("15 January")]
#[case::blank("  ")]
fn date_conversion_rejects_mismatched_input(#[case] value: &str) {
	let conversion = Conversion::Date {
		input_format: "%Y%m%d".to_string(),
		output_format: "%Y-%m-%d".to_string(),
	};

	assert!(conversion.apply(value).is_err());
}

const DATES_TEMPLATE: &str = "movie:\n  - dates!:\n      convert: date\n      input_f: \"%Y%m%d\"\n      output_f: \"%Y-%m-%d\"\n      value: \"{dates}\"\n";

#[test]
fn table_key_converts_every_item() -> NfoResult<()> {
	let template = template(DATES_TEMPLATE);
	let root = generate(&template, &record(json!({ "dates": ["20230115", "20240229"] })))?;

	assert_eq!(names(&root), vec!["dates", "dates"]);
	assert_eq!(texts(&root, "dates"), vec!["2023-01-15", "2024-02-29"]);

	Ok(())
}

#[test]
fn one_unparsable_table_item_fails_generation() {
	let mut nfo = Nfo::from_template("custom", template(DATES_TEMPLATE));

	let result = nfo.generate(&record(json!({ "dates": ["20230115", "someday"] })));

	let Err(error) = result else {
		panic!("expected a conversion error");
	};
	let NfoError::ConversionFailure { key, value, .. } = &error else {
		panic!("expected a conversion failure, found {error}");
	};
	assert_eq!(key, "dates!");
	assert_eq!(value, "someday");
	assert_eq!(nfo.state(), NfoState::Failed);
	assert!(nfo.root().is_none());
}

#[test]
fn multi_key_mapping_loads_as_a_sequence() -> NfoResult<()> {
	let template = template("movie:\n  title: \"{title}\"\n  year: \"{year}\"\n");
	let root = generate(&template, &record(json!({ "title": "Up", "year": 2009 })))?;

	assert_eq!(names(&root), vec!["title", "year"]);
	assert_eq!(texts(&root, "year"), vec!["2009"]);

	Ok(())
}

#[test]
fn scalar_values_are_stringified() -> NfoResult<()> {
	let template = template("movie:\n  - rating: 10\n  - watched: true\n");
	let root = generate(&template, &RawRecord::default())?;

	assert_eq!(texts(&root, "rating"), vec!["10"]);
	assert_eq!(texts(&root, "watched"), vec!["true"]);

	Ok(())
}

#[rstest]
#[case::two_roots("a:\n  - x: y\nb:\n  - x: y\n")]
#[case::not_a_mapping("- a\n- b\n")]
#[case::scalar_body("movie: hello\n")]
#[case::missing_value("movie:\n  - thumb:\n      attr:\n        aspect: thumb\n")]
#[case::attr_not_mapping("movie:\n  - thumb:\n      attr: thumb\n      value: x\n")]
#[case::unknown_conversion("movie:\n  - aired:\n      convert: upper\n      value: x\n")]
#[case::missing_pattern("movie:\n  - aired:\n      convert: date\n      input_f: \"%Y\"\n      value: x\n")]
#[case::empty_name("movie:\n  - \"!\": x\n")]
#[case::not_yaml("movie: [unclosed\n")]
fn rejects_invalid_templates(#[case] source: &str) {
	let result = Template::from_yaml_str(source);

	assert!(
		matches!(result, Err(NfoError::InvalidTemplate(_))),
		"unexpected result: {result:?}"
	);
}

#[test]
fn builtin_templates_all_load() -> NfoResult<()> {
	let store = TemplateStore::builtin();
	for name in TemplateStore::builtin_names() {
		store.load(name)?;
	}

	Ok(())
}

#[test]
fn template_directories_override_builtins() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(&tmp.path().join("youtube.yml"), "custom:\n  - title: \"{title}\"\n");

	let store = TemplateStore::builtin().with_directory(tmp.path());
	let template = store.load("youtube")?;

	assert_eq!(template.root(), "custom");
	assert_eq!(store.load("vimeo")?.root(), "episodedetails");

	Ok(())
}

#[test]
fn empty_store_only_reads_directories() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(&tmp.path().join("local.yaml"), "movie:\n  - title: \"{title}\"\n");
	write_file(&tmp.path().join("broken.yaml"), "movie: [\n");

	let store = TemplateStore::empty().with_directory(tmp.path());

	assert_eq!(store.load("local")?.root(), "movie");
	assert!(matches!(
		store.load("youtube"),
		Err(NfoError::ConfigurationMissing { .. })
	));
	assert!(matches!(
		store.load("broken"),
		Err(NfoError::TemplateParse { .. })
	));
	assert!(matches!(
		store.load("../local"),
		Err(NfoError::ConfigurationMissing { .. })
	));

	Ok(())
}

#[rstest]
#[case::lowercase("Youtube", "youtube")]
#[case::colon("twitch:vod", "twitch_vod")]
#[case::mixed("Twitch:VOD", "twitch_vod")]
#[case::separators(r"a/b\c*d?", "a_b_c_d_")]
fn normalizes_extractor_names(#[case] extractor: &str, #[case] expected: &str) {
	assert_eq!(normalize_extractor(extractor), expected);
}

#[rstest]
#[case::info_json("videos/clip.info.json", json!({}), "videos/clip.nfo")]
#[case::media_filename(
	"videos/clip.json",
	json!({ "_filename": "media/clip.mp4" }),
	"media/clip.nfo"
)]
#[case::fallback("videos/clip.json", json!({}), "videos/clip.json.nfo")]
fn derives_nfo_paths(#[case] path: &str, #[case] fields: Value, #[case] expected: &str) {
	let info = InfoJson::from_record(path, record(fields));

	assert_eq!(info.nfo_path(), PathBuf::from(expected));
}

#[test]
fn reads_info_json_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = tmp.path().join("clip.info.json");
	write_file(&path, r#"{"extractor": "Twitch:VOD", "title": "Stream"}"#);

	let info = InfoJson::read(&path)?;

	assert_eq!(info.path(), path.as_path());
	assert_eq!(info.extractor().as_deref(), Some("twitch_vod"));
	assert_eq!(info.record().get_str("title"), Some("Stream"));

	Ok(())
}

#[rstest]
#[case::malformed("{\"title\": ")]
#[case::array("[1, 2]")]
fn rejects_invalid_info_json(#[case] contents: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = tmp.path().join("clip.info.json");
	write_file(&path, contents);

	assert!(matches!(
		InfoJson::read(&path),
		Err(NfoError::InvalidRecord { .. })
	));

	Ok(())
}

#[test]
fn collects_info_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();
	write_file(&root.join("a.info.json"), "{}");
	write_file(&root.join("a.live_chat.json"), "{}");
	write_file(&root.join("notes.txt"), "");
	write_file(&root.join("sub/b.info.json"), "{}");
	write_file(&root.join("archive/c.info.json"), "{}");

	let options = ScanOptions::new(DEFAULT_REGEX)?.with_exclude(vec!["archive/".to_string()]);
	let files = collect_info_files(root, &options)?;

	assert_eq!(
		files,
		vec![root.join("a.info.json"), root.join("sub/b.info.json")]
	);

	Ok(())
}

#[test]
fn custom_regex_filters_file_names() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();
	write_file(&root.join("a.info.json"), "{}");
	write_file(&root.join("package.json"), "{}");

	let options = ScanOptions::new(r"\.info\.json$")?;
	let files = collect_info_files(root, &options)?;

	assert_eq!(files, vec![root.join("a.info.json")]);

	Ok(())
}

#[test]
fn file_root_is_returned_unfiltered() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = tmp.path().join("notes.txt");
	write_file(&path, "");

	let options = ScanOptions::new(DEFAULT_REGEX)?;

	assert_eq!(collect_info_files(&path, &options)?, vec![path]);

	Ok(())
}

#[test]
fn invalid_regex_is_reported() {
	let result = ScanOptions::new("[unclosed");

	assert!(matches!(result, Err(NfoError::InvalidPattern { .. })));
}

#[cfg(unix)]
#[test]
fn symlink_cycles_are_detected() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();
	std::fs::create_dir_all(root.join("sub"))?;
	std::os::unix::fs::symlink(root, root.join("sub/loop"))?;

	let options = ScanOptions::new(DEFAULT_REGEX)?;
	let result = collect_info_files(root, &options);

	assert!(matches!(result, Err(NfoError::SymlinkCycle { .. })));

	Ok(())
}

fn write_youtube_info(dir: &Path) -> PathBuf {
	let path = dir.join("clip.info.json");
	write_file(
		&path,
		r#"{"extractor": "youtube", "id": "abc", "title": "Clip", "upload_date": "20230115"}"#,
	);
	path
}

#[test]
fn processes_a_file_into_a_sidecar() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = write_youtube_info(tmp.path());
	let store = TemplateStore::builtin();

	let outcome = process_file(&path, &store, &ProcessOptions::default())?;

	let nfo_path = tmp.path().join("clip.nfo");
	assert_eq!(outcome, ProcessOutcome::Written(nfo_path.clone()));
	let xml = std::fs::read_to_string(&nfo_path)?;
	assert!(xml.contains("<title>Clip</title>"));
	assert!(xml.contains("<premiered>2023-01-15</premiered>"));

	Ok(())
}

#[test]
fn existing_sidecars_are_skipped_unless_overwriting() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = write_youtube_info(tmp.path());
	let nfo_path = tmp.path().join("clip.nfo");
	write_file(&nfo_path, "keep me");
	let store = TemplateStore::builtin();

	let outcome = process_file(&path, &store, &ProcessOptions::default())?;
	assert_eq!(outcome, ProcessOutcome::Skipped(nfo_path.clone()));
	assert_eq!(std::fs::read_to_string(&nfo_path)?, "keep me");

	let options = ProcessOptions {
		overwrite: true,
		..ProcessOptions::default()
	};
	let outcome = process_file(&path, &store, &options)?;
	assert_eq!(outcome, ProcessOutcome::Written(nfo_path.clone()));
	assert!(std::fs::read_to_string(&nfo_path)?.contains("<title>Clip</title>"));

	Ok(())
}

#[test]
fn dry_run_renders_without_writing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = write_youtube_info(tmp.path());
	let options = ProcessOptions {
		dry_run: true,
		..ProcessOptions::default()
	};

	let outcome = process_file(&path, &TemplateStore::builtin(), &options)?;

	let ProcessOutcome::Rendered { path, xml } = outcome else {
		panic!("expected rendered output");
	};
	assert_eq!(path, tmp.path().join("clip.nfo"));
	assert!(xml.contains("<title>Clip</title>"));
	assert!(!path.exists());

	Ok(())
}

#[test]
fn extractor_override_and_missing_extractor() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = tmp.path().join("clip.info.json");
	write_file(&path, r#"{"title": "Clip"}"#);
	let store = TemplateStore::builtin();

	let result = process_file(&path, &store, &ProcessOptions::default());
	assert!(matches!(result, Err(NfoError::ExtractorMissing { .. })));

	let options = ProcessOptions {
		extractor: Some("vimeo".to_string()),
		..ProcessOptions::default()
	};
	process_file(&path, &store, &options)?;
	assert!(std::fs::read_to_string(tmp.path().join("clip.nfo"))?.contains("Vimeo"));

	let options = ProcessOptions {
		extractor: Some("nonexistent".to_string()),
		overwrite: true,
		..ProcessOptions::default()
	};
	let result = process_file(&path, &store, &options);
	assert!(matches!(result, Err(NfoError::ConfigurationMissing { .. })));

	Ok(())
}

#[test]
fn start_hook_runs_for_attempted_files_only() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = write_youtube_info(tmp.path());
	let broken = tmp.path().join("broken.info.json");
	write_file(&broken, "{not json");
	let store = TemplateStore::builtin();
	let options = ProcessOptions::default();
	let started = std::cell::Cell::new(0);

	process_file_with(&path, &store, &options, || started.set(started.get() + 1))?;
	assert_eq!(started.get(), 1);

	let outcome = process_file_with(&path, &store, &options, || started.set(started.get() + 1))?;
	assert!(matches!(outcome, ProcessOutcome::Skipped(_)));
	assert_eq!(started.get(), 1);

	let result = process_file_with(&broken, &store, &options, || started.set(started.get() + 1));
	assert!(matches!(result, Err(NfoError::InvalidRecord { .. })));
	assert_eq!(started.get(), 2);

	Ok(())
}

#[test]
fn loads_config_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(
		&tmp.path().join(".config/ytdl-nfo.toml"),
		r#"
extractor = "youtube"
overwrite = true

[scan]
regex = '\.info\.json$'
exclude = ["archive/"]

[templates]
paths = ["templates"]
"#,
	);

	let Some(config) = NfoConfig::load(tmp.path())? else {
		panic!("expected a config");
	};

	assert_eq!(config.extractor.as_deref(), Some("youtube"));
	assert!(config.overwrite);
	assert_eq!(config.scan.regex.as_deref(), Some(r"\.info\.json$"));
	assert_eq!(config.scan.exclude, vec!["archive/".to_string()]);
	assert_eq!(
		config.template_paths(tmp.path()),
		vec![tmp.path().join("templates")]
	);

	Ok(())
}

#[test]
fn config_is_optional_and_validated() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	assert_eq!(NfoConfig::load(tmp.path())?, None);

	write_file(&tmp.path().join("ytdl-nfo.toml"), "overwrite = \"yes\"\n");
	assert!(matches!(
		NfoConfig::load(tmp.path()),
		Err(NfoError::ConfigParse(_))
	));

	Ok(())
}
