use std::borrow::Cow;

use chrono::DateTime;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Field derived from `epoch` when a record has no upload date.
pub const UPLOAD_DATE_FIELD: &str = "upload_date";
/// Unix timestamp field written by yt-dlp at download time.
pub const EPOCH_FIELD: &str = "epoch";

/// A flat metadata record, usually the contents of a `.info.json` file.
///
/// Values keep their JSON types so that placeholders render them the way the
/// downloader's own tooling would: strings verbatim, lists as list literals
/// (`['a', 'b']`) which table keys parse back into items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
	pub fn new(fields: Map<String, Value>) -> Self {
		Self(fields)
	}

	/// Returns the value for `name`. `null` counts as absent.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name).filter(|value| !value.is_null())
	}

	/// Returns the value for `name` when it is a string.
	pub fn get_str(&self, name: &str) -> Option<&str> {
		self.get(name).and_then(Value::as_str)
	}

	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		self.0.insert(name.into(), value.into());
	}

	pub fn fields(&self) -> &Map<String, Value> {
		&self.0
	}

	pub fn into_fields(self) -> Map<String, Value> {
		self.0
	}

	/// Returns the record with `upload_date` filled in from `epoch`.
	///
	/// The record is borrowed unchanged when it already has an upload date or
	/// has no usable `epoch`, which makes repeated calls no-ops.
	pub fn with_upload_date(&self) -> Cow<'_, RawRecord> {
		if self.get(UPLOAD_DATE_FIELD).is_some() {
			return Cow::Borrowed(self);
		}

		let Some(upload_date) = self.get(EPOCH_FIELD).and_then(upload_date_from_epoch) else {
			tracing::debug!("record has neither `upload_date` nor a usable `epoch`");
			return Cow::Borrowed(self);
		};

		tracing::debug!(%upload_date, "derived `upload_date` from `epoch`");
		let mut record = self.clone();
		record.insert(UPLOAD_DATE_FIELD, upload_date);
		Cow::Owned(record)
	}
}

impl From<Map<String, Value>> for RawRecord {
	fn from(fields: Map<String, Value>) -> Self {
		Self(fields)
	}
}

impl FromIterator<(String, Value)> for RawRecord {
	fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// UTC calendar date of a Unix timestamp as `%Y%m%d`.
fn upload_date_from_epoch(epoch: &Value) -> Option<String> {
	let seconds = match epoch {
		Value::Number(number) => number.as_f64()?,
		Value::String(text) => text.trim().parse::<f64>().ok()?,
		_ => return None,
	};

	if !seconds.is_finite() {
		return None;
	}

	let date = DateTime::from_timestamp(seconds.floor() as i64, 0)?;
	Some(date.format("%Y%m%d").to_string())
}

/// Render a value the way Python's `str()` would.
pub fn display_value(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => repr_value(other),
	}
}

/// Render a value the way Python's `repr()` would.
pub fn repr_value(value: &Value) -> String {
	match value {
		Value::Null => "None".to_string(),
		Value::Bool(true) => "True".to_string(),
		Value::Bool(false) => "False".to_string(),
		Value::Number(number) => {
			if let Some(integer) = number.as_i64() {
				integer.to_string()
			} else if let Some(integer) = number.as_u64() {
				integer.to_string()
			} else {
				float_repr(number.as_f64().unwrap_or(f64::NAN))
			}
		}
		Value::String(text) => quote_string(text),
		Value::Array(items) => {
			let items: Vec<String> = items.iter().map(repr_value).collect();
			format!("[{}]", items.join(", "))
		}
		Value::Object(fields) => {
			let fields: Vec<String> = fields
				.iter()
				.map(|(key, value)| format!("{}: {}", quote_string(key), repr_value(value)))
				.collect();
			format!("{{{}}}", fields.join(", "))
		}
	}
}

/// Shortest round-trip float rendering with Python's exponent rules.
pub fn float_repr(value: f64) -> String {
	if value.is_nan() {
		return "nan".to_string();
	}

	if value.is_infinite() {
		return if value > 0.0 { "inf" } else { "-inf" }.to_string();
	}

	let magnitude = value.abs();
	if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
		let rendered = format!("{value:e}");
		let (mantissa, exponent) = rendered.split_once('e').unwrap_or((&rendered, "0"));
		let exponent: i32 = exponent.parse().unwrap_or(0);
		let sign = if exponent < 0 { '-' } else { '+' };
		return format!("{mantissa}e{sign}{:02}", exponent.abs());
	}

	if value.fract() == 0.0 {
		format!("{value:.1}")
	} else {
		format!("{value}")
	}
}

/// Quote a string like Python's `repr()`: single quotes unless the text
/// contains a single quote and no double quote.
pub fn quote_string(text: &str) -> String {
	let quote = if text.contains('\'') && !text.contains('"') {
		'"'
	} else {
		'\''
	};

	let mut quoted = String::with_capacity(text.len() + 2);
	quoted.push(quote);
	for ch in text.chars() {
		match ch {
			'\\' => quoted.push_str("\\\\"),
			'\n' => quoted.push_str("\\n"),
			'\r' => quoted.push_str("\\r"),
			'\t' => quoted.push_str("\\t"),
			c if c == quote => {
				quoted.push('\\');
				quoted.push(c);
			}
			c if c.is_control() => quoted.push_str(&format!("\\x{:02x}", c as u32)),
			c => quoted.push(c),
		}
	}
	quoted.push(quote);
	quoted
}
