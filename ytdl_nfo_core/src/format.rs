//! Placeholder substitution for template values.
//!
//! Format strings use the `str.format_map` syntax that yt-dlp users already
//! know from output templates: `{title}`, `{thumbnails[0][url]}`,
//! `{view_count:,}`, `{id!r}`, with `{{` and `}}` for literal braces. A field
//! that is missing from the record formats as an empty string, so `{id!r}`
//! gives `''` and `{id:>3}` gives three spaces. A format spec that cannot
//! apply to a string renders a missing field as nothing instead of failing.

use serde_json::Value;

use crate::record::RawRecord;
use crate::record::display_value;
use crate::record::float_repr;
use crate::record::repr_value;

/// Substitute every replacement field in `template` from `record`.
///
/// The error is a human readable reason; callers attach the template key.
pub fn format_record(template: &str, record: &RawRecord) -> Result<String, String> {
	let mut output = String::with_capacity(template.len());
	let mut rest = template;

	while let Some(index) = rest.find(['{', '}']) {
		output.push_str(&rest[..index]);
		let brace = rest.as_bytes()[index];
		let after = &rest[index + 1..];

		if brace == b'}' {
			if !after.starts_with('}') {
				return Err("single '}' encountered in format string".to_string());
			}
			output.push('}');
			rest = &after[1..];
			continue;
		}

		if after.starts_with('{') {
			output.push('{');
			rest = &after[1..];
			continue;
		}

		let end = field_end(after)?;
		output.push_str(&render_field(&after[..end], record)?);
		rest = &after[end + 1..];
	}

	output.push_str(rest);
	Ok(output)
}

/// Byte offset of the `}` closing the field that starts at `text`.
fn field_end(text: &str) -> Result<usize, String> {
	let mut depth = 1usize;
	let mut in_brackets = false;

	for (index, ch) in text.char_indices() {
		match ch {
			'[' if depth == 1 => in_brackets = true,
			']' if depth == 1 => in_brackets = false,
			'{' if !in_brackets => depth += 1,
			'}' if !in_brackets => {
				depth -= 1;
				if depth == 0 {
					return Ok(index);
				}
			}
			_ => {}
		}
	}

	Err("expected '}' before end of string".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Accessor<'a> {
	Attribute(&'a str),
	Item(&'a str),
}

fn render_field(field: &str, record: &RawRecord) -> Result<String, String> {
	let (name, conversion, spec) = split_field(field)?;
	let (first, accessors) = parse_field_name(name)?;

	let mut value = record.get(first);
	for accessor in &accessors {
		value = value.and_then(|current| lookup(current, accessor));
	}

	let empty = Value::String(String::new());
	let found = value.filter(|value| !value.is_null());
	let missing = found.is_none();
	let value = found.unwrap_or(&empty);

	let spec = if spec.contains('{') {
		format_record(spec, record)?
	} else {
		spec.to_string()
	};

	let converted = match conversion {
		None => None,
		Some('s') => Some(Value::String(display_value(value))),
		Some('r' | 'a') => Some(Value::String(repr_value(value))),
		Some(other) => return Err(format!("unknown conversion specifier {other}")),
	};

	let rendered = apply_spec(converted.as_ref().unwrap_or(value), &spec);
	if missing {
		return Ok(rendered.unwrap_or_default());
	}

	rendered
}

/// Split `name!conversion:spec`.
fn split_field(field: &str) -> Result<(&str, Option<char>, &str), String> {
	let mut in_brackets = false;
	let mut name_end = field.len();
	for (index, ch) in field.char_indices() {
		match ch {
			'[' => in_brackets = true,
			']' => in_brackets = false,
			'!' | ':' if !in_brackets => {
				name_end = index;
				break;
			}
			_ => {}
		}
	}

	let name = &field[..name_end];
	let rest = &field[name_end..];

	if let Some(rest) = rest.strip_prefix('!') {
		let mut chars = rest.chars();
		let Some(conversion) = chars.next() else {
			return Err("end of string while looking for conversion specifier".to_string());
		};
		let after = chars.as_str();
		if after.is_empty() {
			return Ok((name, Some(conversion), ""));
		}
		let Some(spec) = after.strip_prefix(':') else {
			return Err("expected ':' after conversion specifier".to_string());
		};
		return Ok((name, Some(conversion), spec));
	}

	Ok((name, None, rest.strip_prefix(':').unwrap_or(rest)))
}

fn parse_field_name(name: &str) -> Result<(&str, Vec<Accessor<'_>>), String> {
	let first_end = name.find(['.', '[']).unwrap_or(name.len());
	let first = &name[..first_end];

	if first.is_empty() || first.bytes().all(|byte| byte.is_ascii_digit()) {
		return Err("format string contains positional fields".to_string());
	}

	let mut accessors = Vec::new();
	let mut rest = &name[first_end..];
	while !rest.is_empty() {
		if let Some(after) = rest.strip_prefix('.') {
			let end = after.find(['.', '[']).unwrap_or(after.len());
			if end == 0 {
				return Err("empty attribute in format string".to_string());
			}
			accessors.push(Accessor::Attribute(&after[..end]));
			rest = &after[end..];
		} else if let Some(after) = rest.strip_prefix('[') {
			let Some(end) = after.find(']') else {
				return Err("missing ']' in format string".to_string());
			};
			if end == 0 {
				return Err("empty attribute in format string".to_string());
			}
			accessors.push(Accessor::Item(&after[..end]));
			rest = &after[end + 1..];
		} else {
			return Err("only '.' or '[' may follow ']' in format field specifier".to_string());
		}
	}

	Ok((first, accessors))
}

fn lookup<'v>(value: &'v Value, accessor: &Accessor<'_>) -> Option<&'v Value> {
	match (value, accessor) {
		(Value::Object(fields), Accessor::Attribute(key) | Accessor::Item(key)) => fields.get(*key),
		(Value::Array(items), Accessor::Item(index)) => {
			let index: usize = index.parse().ok()?;
			items.get(index)
		}
		_ => None,
	}
}

/// Parsed `[[fill]align][sign][#][0][width][,|_][.precision][type]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FormatSpec {
	fill: char,
	align: Option<char>,
	sign: Option<char>,
	zero: bool,
	width: usize,
	grouping: Option<char>,
	precision: Option<usize>,
	kind: Option<char>,
}

impl FormatSpec {
	fn parse(spec: &str) -> Result<Self, String> {
		let chars: Vec<char> = spec.chars().collect();
		let mut parsed = Self {
			fill: ' ',
			align: None,
			sign: None,
			zero: false,
			width: 0,
			grouping: None,
			precision: None,
			kind: None,
		};
		let mut index = 0;

		if chars.len() >= 2 && is_align(chars[1]) {
			parsed.fill = chars[0];
			parsed.align = Some(chars[1]);
			index = 2;
		} else if chars.first().copied().is_some_and(is_align) {
			parsed.align = Some(chars[0]);
			index = 1;
		}

		if let Some(&sign @ ('+' | '-' | ' ')) = chars.get(index) {
			parsed.sign = Some(sign);
			index += 1;
		}

		if chars.get(index) == Some(&'#') {
			index += 1;
		}

		if chars.get(index) == Some(&'0') {
			parsed.zero = true;
			index += 1;
		}

		let width_start = index;
		while chars.get(index).is_some_and(char::is_ascii_digit) {
			index += 1;
		}
		if index > width_start {
			parsed.width = collect_number(&chars[width_start..index])?;
		}

		if let Some(&grouping @ (',' | '_')) = chars.get(index) {
			parsed.grouping = Some(grouping);
			index += 1;
		}

		if chars.get(index) == Some(&'.') {
			index += 1;
			let precision_start = index;
			while chars.get(index).is_some_and(char::is_ascii_digit) {
				index += 1;
			}
			if index == precision_start {
				return Err("format specifier missing precision".to_string());
			}
			parsed.precision = Some(collect_number(&chars[precision_start..index])?);
		}

		if let Some(&kind) = chars.get(index) {
			parsed.kind = Some(kind);
			index += 1;
		}

		if index != chars.len() {
			return Err("invalid format specifier".to_string());
		}

		Ok(parsed)
	}
}

fn is_align(ch: char) -> bool {
	matches!(ch, '<' | '>' | '=' | '^')
}

fn collect_number(digits: &[char]) -> Result<usize, String> {
	digits
		.iter()
		.collect::<String>()
		.parse()
		.map_err(|_| "too many decimal digits in format string".to_string())
}

enum Formattable {
	Text(String),
	Integer(i128),
	Float(f64),
}

fn apply_spec(value: &Value, spec: &str) -> Result<String, String> {
	if spec.is_empty() {
		return Ok(display_value(value));
	}

	let spec = FormatSpec::parse(spec)?;
	let formattable = match value {
		Value::Bool(flag) => Formattable::Integer(i128::from(*flag)),
		Value::Number(number) => {
			if let Some(integer) = number.as_i64() {
				Formattable::Integer(i128::from(integer))
			} else if let Some(integer) = number.as_u64() {
				Formattable::Integer(i128::from(integer))
			} else {
				Formattable::Float(number.as_f64().unwrap_or(f64::NAN))
			}
		}
		other => Formattable::Text(display_value(other)),
	};

	match formattable {
		Formattable::Text(text) => format_text(&text, &spec),
		Formattable::Integer(integer) => format_integer(integer, &spec),
		Formattable::Float(float) => format_float(float, &spec),
	}
}

fn format_text(text: &str, spec: &FormatSpec) -> Result<String, String> {
	if let Some(kind) = spec.kind.filter(|kind| *kind != 's') {
		return Err(format!(
			"unknown format code '{kind}' for object of type 'str'"
		));
	}
	if spec.sign.is_some() {
		return Err("sign not allowed in string format specifier".to_string());
	}
	if let Some(grouping) = spec.grouping {
		return Err(format!("cannot specify '{grouping}' with 's'"));
	}
	if spec.align == Some('=') {
		return Err("'=' alignment not allowed in string format specifier".to_string());
	}

	let body: String = match spec.precision {
		Some(precision) => text.chars().take(precision).collect(),
		None => text.to_string(),
	};

	let (fill, align) = if spec.zero && spec.align.is_none() {
		('0', '<')
	} else {
		(spec.fill, spec.align.unwrap_or('<'))
	};

	Ok(pad("", &body, fill, align, spec.width))
}

fn format_integer(integer: i128, spec: &FormatSpec) -> Result<String, String> {
	let digits = match spec.kind {
		None | Some('d' | 'n') => {
			if spec.precision.is_some() {
				return Err("precision not allowed in integer format specifier".to_string());
			}
			group_digits(&integer.unsigned_abs().to_string(), spec.grouping)
		}
		Some('x') => format!("{:x}", integer.unsigned_abs()),
		Some('X') => format!("{:X}", integer.unsigned_abs()),
		Some('o') => format!("{:o}", integer.unsigned_abs()),
		Some('b') => format!("{:b}", integer.unsigned_abs()),
		Some('f' | 'F' | '%') => return format_float(integer as f64, spec),
		Some(kind) => {
			return Err(format!(
				"unknown format code '{kind}' for object of type 'int'"
			));
		}
	};

	Ok(finish_number(integer < 0, &digits, spec))
}

fn format_float(float: f64, spec: &FormatSpec) -> Result<String, String> {
	let magnitude = float.abs();
	let digits = match spec.kind {
		None if spec.precision.is_none() => float_repr(magnitude),
		Some('f' | 'F') => {
			let precision = spec.precision.unwrap_or(6);
			group_fixed(&format!("{magnitude:.precision$}"), spec.grouping)
		}
		Some('%') => {
			let precision = spec.precision.unwrap_or(6);
			let percent = magnitude * 100.0;
			format!("{}%", group_fixed(&format!("{percent:.precision$}"), spec.grouping))
		}
		None => return Err("precision without a presentation type is not supported".to_string()),
		Some(kind) => {
			return Err(format!(
				"unknown format code '{kind}' for object of type 'float'"
			));
		}
	};

	Ok(finish_number(float.is_sign_negative() && float != 0.0, &digits, spec))
}

fn finish_number(negative: bool, digits: &str, spec: &FormatSpec) -> String {
	let sign = match (negative, spec.sign) {
		(true, _) => "-",
		(false, Some('+')) => "+",
		(false, Some(' ')) => " ",
		_ => "",
	};

	let (fill, align) = if spec.zero && spec.align.is_none() {
		('0', '=')
	} else {
		(spec.fill, spec.align.unwrap_or('>'))
	};

	pad(sign, digits, fill, align, spec.width)
}

fn group_fixed(fixed: &str, grouping: Option<char>) -> String {
	match fixed.split_once('.') {
		Some((whole, fraction)) => format!("{}.{fraction}", group_digits(whole, grouping)),
		None => group_digits(fixed, grouping),
	}
}

fn group_digits(digits: &str, grouping: Option<char>) -> String {
	let Some(separator) = grouping else {
		return digits.to_string();
	};

	let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
	for (index, ch) in digits.chars().enumerate() {
		if index > 0 && (digits.len() - index) % 3 == 0 {
			grouped.push(separator);
		}
		grouped.push(ch);
	}
	grouped
}

fn pad(sign: &str, body: &str, fill: char, align: char, width: usize) -> String {
	let length = sign.chars().count() + body.chars().count();
	if length >= width {
		return format!("{sign}{body}");
	}

	let padding = width - length;
	let repeat = |count: usize| fill.to_string().repeat(count);
	match align {
		'<' => format!("{sign}{body}{}", repeat(padding)),
		'^' => {
			let left = padding / 2;
			format!("{}{sign}{body}{}", repeat(left), repeat(padding - left))
		}
		'=' => format!("{sign}{}{body}", repeat(padding)),
		_ => format!("{}{sign}{body}", repeat(padding)),
	}
}
