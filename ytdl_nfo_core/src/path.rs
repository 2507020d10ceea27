use crate::NfoError;
use crate::NfoResult;
use crate::template::NodeKey;

/// Separates parent element names from the leaf name in a table key, e.g.
/// `actor>name!`.
pub const NESTING_DELIMITER: char = '>';

/// Split a key's name into its element chain, outermost first.
///
/// Nesting is only meaningful for table keys, so splitting any other key is a
/// [`NfoError::StructuralViolation`].
pub fn split_element_path(key: &NodeKey) -> NfoResult<Vec<&str>> {
	if !key.is_table() {
		return Err(NfoError::StructuralViolation {
			key: key.raw().to_string(),
			reason: format!("`{NESTING_DELIMITER}` delimiter can only be used for lists"),
		});
	}

	let segments: Vec<&str> = key.name().split(NESTING_DELIMITER).collect();
	if segments.iter().any(|segment| segment.is_empty()) {
		return Err(NfoError::StructuralViolation {
			key: key.raw().to_string(),
			reason: "element path contains an empty segment".to_string(),
		});
	}

	Ok(segments)
}
