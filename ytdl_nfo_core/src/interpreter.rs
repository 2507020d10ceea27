use crate::NfoResult;
use crate::element::Element;
use crate::path::split_element_path;
use crate::record::RawRecord;
use crate::resolver::resolve_items;
use crate::resolver::resolve_text;
use crate::template::AttributedNode;
use crate::template::NodeKey;
use crate::template::ScalarNode;
use crate::template::Template;
use crate::template::TemplateNode;

/// Build the output tree for `record`.
///
/// The tree is assembled detached from any caller state and only returned
/// when every node resolved; on error nothing partial escapes.
pub fn generate(template: &Template, record: &RawRecord) -> NfoResult<Element> {
	let record = record.with_upload_date();
	let mut root = Element::new(template.root());
	build_node(&mut root, template.body(), &record)?;
	Ok(root)
}

fn build_node(parent: &mut Element, node: &TemplateNode, record: &RawRecord) -> NfoResult<()> {
	match node {
		TemplateNode::Sequence(children) => {
			for child in children {
				build_node(parent, child, record)?;
			}
		}
		TemplateNode::Scalar(ScalarNode { key, value }) => {
			let items = resolve_items(key, value, None, record)?;
			emit(parent, key, items, &[], record)?;
		}
		TemplateNode::Attributed(AttributedNode {
			key,
			value,
			attributes,
			conversion,
		}) => {
			let items = resolve_items(key, value, conversion.as_ref(), record)?;
			emit(parent, key, items, attributes, record)?;
		}
	}

	Ok(())
}

/// Append one element (or one fresh element chain) per item.
fn emit(
	parent: &mut Element,
	key: &NodeKey,
	items: Vec<String>,
	attributes: &[(String, String)],
	record: &RawRecord,
) -> NfoResult<()> {
	for item in items {
		let segments = if key.is_nested() {
			split_element_path(key)?
		} else {
			vec![key.name()]
		};

		let Some((leaf_name, chain)) = segments.split_last() else {
			continue;
		};

		let mut element = Element::new(*leaf_name).with_text(item);
		for (name, template) in attributes {
			element.set_attribute(name.as_str(), resolve_text(key, template, record)?);
		}

		for name in chain.iter().rev() {
			let mut wrapper = Element::new(*name);
			wrapper.push_child(element);
			element = wrapper;
		}

		parent.push_child(element);
	}

	Ok(())
}
