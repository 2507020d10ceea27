use serde_yaml_ng::Mapping;
use serde_yaml_ng::Value as YamlValue;

use crate::NfoError;
use crate::NfoResult;
use crate::conversion::Conversion;
use crate::conversion::DATE_CONVERSION;
use crate::path::NESTING_DELIMITER;

/// Trailing marker turning a key into a table key.
pub const TABLE_MARKER: char = '!';

/// A template key with its table marker decoded.
///
/// `tag!` is a table key named `tag`; `actor>name!` is a table key whose
/// name nests `name` inside `actor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKey {
	raw: String,
	name: String,
	table: bool,
}

impl NodeKey {
	pub fn parse(raw: impl Into<String>) -> Self {
		let raw = raw.into();
		let table = raw.ends_with(TABLE_MARKER);
		let name = raw.trim_end_matches(TABLE_MARKER).to_string();
		Self { raw, name, table }
	}

	/// The key as written in the template.
	pub fn raw(&self) -> &str {
		&self.raw
	}

	/// The element name with the table marker stripped.
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn is_table(&self) -> bool {
		self.table
	}

	/// Whether the name contains the nesting delimiter.
	pub fn is_nested(&self) -> bool {
		self.name.contains(NESTING_DELIMITER)
	}
}

/// A node of a loaded template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
	/// Children processed in order against the same parent.
	Sequence(Vec<TemplateNode>),
	/// `name: "{field}"`
	Scalar(ScalarNode),
	/// `name: { value: "{field}", attr: {...}, convert: ... }`
	Attributed(AttributedNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarNode {
	pub key: NodeKey,
	pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributedNode {
	pub key: NodeKey,
	pub value: String,
	/// Attribute name to format string, in template order.
	pub attributes: Vec<(String, String)>,
	pub conversion: Option<Conversion>,
}

/// A parsed template: a single root element and the body describing its
/// children.
///
/// ```yaml
/// episodedetails:
///   - title: "{title}"
///   - uniqueid:
///       attr:
///         type: youtube
///         default: "true"
///       value: "{id}"
///   - genre!: "{categories}"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
	root: String,
	body: TemplateNode,
}

impl Template {
	pub fn new(root: impl Into<String>, body: TemplateNode) -> Self {
		Self {
			root: root.into(),
			body,
		}
	}

	/// Parse a template from YAML source.
	pub fn from_yaml_str(source: &str) -> NfoResult<Self> {
		let value: YamlValue = serde_yaml_ng::from_str(source)
			.map_err(|e| NfoError::InvalidTemplate(format!("not valid yaml: {e}")))?;
		Self::from_yaml(&value)
	}

	/// Build a template from an already parsed YAML document.
	pub fn from_yaml(value: &YamlValue) -> NfoResult<Self> {
		let YamlValue::Mapping(document) = untag(value) else {
			return Err(NfoError::InvalidTemplate(format!(
				"the document must be a mapping with a single root key, found {}",
				describe(value)
			)));
		};

		let mut entries = document.iter();
		let (Some((root, body)), None) = (entries.next(), entries.next()) else {
			return Err(NfoError::InvalidTemplate(format!(
				"the document must have exactly one root key, found {}",
				document.len()
			)));
		};

		let root = scalar_text(root).ok_or_else(|| {
			NfoError::InvalidTemplate(format!("root key must be a string, found {}", describe(root)))
		})?;
		let body = parse_body(body, &root)?;

		Ok(Self { root, body })
	}

	/// Name of the root element.
	pub fn root(&self) -> &str {
		&self.root
	}

	pub fn body(&self) -> &TemplateNode {
		&self.body
	}
}

fn parse_body(value: &YamlValue, parent: &str) -> NfoResult<TemplateNode> {
	match untag(value) {
		YamlValue::Sequence(items) => {
			items
				.iter()
				.map(|item| parse_body(item, parent))
				.collect::<NfoResult<Vec<_>>>()
				.map(TemplateNode::Sequence)
		}
		YamlValue::Mapping(mapping) => parse_mapping(mapping),
		other => {
			Err(NfoError::InvalidTemplate(format!(
				"children of `{parent}` must be a list or mapping of elements, found {}",
				describe(other)
			)))
		}
	}
}

/// A mapping with several keys is read as a sequence of single-key nodes.
fn parse_mapping(mapping: &Mapping) -> NfoResult<TemplateNode> {
	if mapping.is_empty() {
		return Err(NfoError::InvalidTemplate(
			"found an empty mapping where an element was expected".to_string(),
		));
	}

	let mut nodes = mapping
		.iter()
		.map(|(key, value)| parse_element(key, value))
		.collect::<NfoResult<Vec<_>>>()?;

	if nodes.len() == 1 {
		return Ok(nodes.remove(0));
	}

	Ok(TemplateNode::Sequence(nodes))
}

fn parse_element(key: &YamlValue, value: &YamlValue) -> NfoResult<TemplateNode> {
	let raw = scalar_text(key).ok_or_else(|| {
		NfoError::InvalidTemplate(format!("element keys must be strings, found {}", describe(key)))
	})?;
	let key = NodeKey::parse(raw);

	if key.name().is_empty() {
		return Err(NfoError::InvalidTemplate(format!(
			"`{}` has an empty element name",
			key.raw()
		)));
	}

	match untag(value) {
		YamlValue::Mapping(mapping) => parse_attributed(key, mapping).map(TemplateNode::Attributed),
		other => {
			let value = scalar_text(other).ok_or_else(|| {
				NfoError::InvalidTemplate(format!(
					"`{}` must map to a format string or a mapping with `value`, found {}",
					key.raw(),
					describe(other)
				))
			})?;
			Ok(TemplateNode::Scalar(ScalarNode { key, value }))
		}
	}
}

fn parse_attributed(key: NodeKey, mapping: &Mapping) -> NfoResult<AttributedNode> {
	let value = mapping.get("value").and_then(scalar_text).ok_or_else(|| {
		NfoError::InvalidTemplate(format!("`{}` is missing a `value` entry", key.raw()))
	})?;

	let attributes = match mapping.get("attr").map(untag) {
		None | Some(YamlValue::Null) => Vec::new(),
		Some(YamlValue::Mapping(attributes)) => {
			attributes
				.iter()
				.map(|(name, value)| {
					match (scalar_text(name), scalar_text(value)) {
						(Some(name), Some(value)) => Ok((name, value)),
						_ => {
							Err(NfoError::InvalidTemplate(format!(
								"attributes of `{}` must map strings to format strings",
								key.raw()
							)))
						}
					}
				})
				.collect::<NfoResult<Vec<_>>>()?
		}
		Some(other) => {
			return Err(NfoError::InvalidTemplate(format!(
				"`attr` of `{}` must be a mapping, found {}",
				key.raw(),
				describe(other)
			)));
		}
	};

	let conversion = match mapping.get("convert").map(untag) {
		None | Some(YamlValue::Null) => None,
		Some(kind) => Some(parse_conversion(&key, kind, mapping)?),
	};

	Ok(AttributedNode {
		key,
		value,
		attributes,
		conversion,
	})
}

fn parse_conversion(key: &NodeKey, kind: &YamlValue, mapping: &Mapping) -> NfoResult<Conversion> {
	let kind = scalar_text(kind).unwrap_or_default();
	if kind != DATE_CONVERSION {
		return Err(NfoError::InvalidTemplate(format!(
			"`{}` requests unknown conversion `{kind}`",
			key.raw()
		)));
	}

	let pattern = |field: &str| {
		mapping.get(field).and_then(scalar_text).ok_or_else(|| {
			NfoError::InvalidTemplate(format!(
				"`{}` converts dates but has no `{field}` pattern",
				key.raw()
			))
		})
	};

	Ok(Conversion::Date {
		input_format: pattern("input_f")?,
		output_format: pattern("output_f")?,
	})
}

fn untag(value: &YamlValue) -> &YamlValue {
	match value {
		YamlValue::Tagged(tagged) => untag(&tagged.value),
		other => other,
	}
}

fn scalar_text(value: &YamlValue) -> Option<String> {
	match untag(value) {
		YamlValue::String(text) => Some(text.clone()),
		YamlValue::Number(number) => Some(number.to_string()),
		YamlValue::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

fn describe(value: &YamlValue) -> &'static str {
	match untag(value) {
		YamlValue::Null => "null",
		YamlValue::Bool(_) => "a boolean",
		YamlValue::Number(_) => "a number",
		YamlValue::String(_) => "a string",
		YamlValue::Sequence(_) => "a list",
		YamlValue::Mapping(_) => "a mapping",
		YamlValue::Tagged(_) => "a tagged value",
	}
}
