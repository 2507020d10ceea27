use std::fmt::Write;

use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::format::Item;
use chrono::format::StrftimeItems;

/// The only conversion kind templates can currently request.
pub const DATE_CONVERSION: &str = "date";

/// A value conversion declared on an attributed template node.
///
/// ```yaml
/// premiered:
///   convert: date
///   input_f: "%Y%m%d"
///   output_f: "%Y-%m-%d"
///   value: "{upload_date}"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Conversion {
	/// Parse with `input_format` and render with `output_format`, both
	/// strftime-style patterns.
	Date {
		input_format: String,
		output_format: String,
	},
}

impl Conversion {
	/// Convert a single resolved item. The error is a human readable reason.
	///
	/// An empty item comes from a missing field and stays empty.
	pub fn apply(&self, value: &str) -> Result<String, String> {
		if value.is_empty() {
			return Ok(String::new());
		}

		match self {
			Self::Date {
				input_format,
				output_format,
			} => reformat_date(value, input_format, output_format),
		}
	}
}

fn reformat_date(value: &str, input_format: &str, output_format: &str) -> Result<String, String> {
	let parsed = parse_date(value, input_format).ok_or_else(|| {
		format!("time data `{value}` does not match format `{input_format}`")
	})?;

	let items: Vec<Item<'_>> = StrftimeItems::new(output_format).collect();
	if items.iter().any(|item| matches!(item, Item::Error)) {
		return Err(format!("invalid output format `{output_format}`"));
	}

	let mut rendered = String::new();
	write!(rendered, "{}", parsed.format_with_items(items.iter()))
		.map_err(|_| format!("output format `{output_format}` needs fields a date does not have"))?;

	Ok(rendered)
}

/// Parse a full date-time first, then a bare date at midnight, then a bare
/// time on 1900-01-01.
fn parse_date(value: &str, input_format: &str) -> Option<NaiveDateTime> {
	if let Ok(parsed) = NaiveDateTime::parse_from_str(value, input_format) {
		return Some(parsed);
	}

	if let Ok(date) = NaiveDate::parse_from_str(value, input_format) {
		return date.and_hms_opt(0, 0, 0);
	}

	let time = NaiveTime::parse_from_str(value, input_format).ok()?;
	NaiveDate::from_ymd_opt(1900, 1, 1).map(|date| date.and_time(time))
}
