use crate::NfoError;
use crate::NfoResult;
use crate::conversion::Conversion;
use crate::format::format_record;
use crate::literal::parse_list;
use crate::record::RawRecord;
use crate::template::NodeKey;

/// Resolve a node's value into the texts of the elements it emits.
///
/// Plain keys always emit exactly one item. Table keys parse the substituted
/// value as a list literal and emit one item per entry. A declared conversion
/// is applied to every item.
pub fn resolve_items(
	key: &NodeKey,
	value: &str,
	conversion: Option<&Conversion>,
	record: &RawRecord,
) -> NfoResult<Vec<String>> {
	let substituted = resolve_text(key, value, record)?;

	let items = if key.is_table() {
		parse_list(&substituted).map_err(|reason| {
			NfoError::LiteralParse {
				key: key.raw().to_string(),
				reason,
			}
		})?
	} else {
		vec![substituted]
	};

	let Some(conversion) = conversion else {
		return Ok(items);
	};

	items
		.into_iter()
		.map(|item| {
			conversion.apply(&item).map_err(|reason| {
				NfoError::ConversionFailure {
					key: key.raw().to_string(),
					value: item,
					reason,
				}
			})
		})
		.collect()
}

/// Substitute placeholders in a single format string, such as an attribute
/// value.
pub fn resolve_text(key: &NodeKey, template: &str, record: &RawRecord) -> NfoResult<String> {
	format_record(template, record).map_err(|reason| {
		NfoError::FormatString {
			key: key.raw().to_string(),
			reason,
		}
	})
}
