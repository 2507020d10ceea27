/// An element of a generated output tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
	pub name: String,
	/// Attributes in insertion order. Names are unique.
	pub attributes: Vec<(String, String)>,
	pub text: Option<String>,
	pub children: Vec<Element>,
}

impl Element {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_text(mut self, text: impl Into<String>) -> Self {
		self.text = Some(text.into());
		self
	}

	/// The element's text, empty when unset.
	pub fn text(&self) -> &str {
		self.text.as_deref().unwrap_or_default()
	}

	/// Set an attribute, replacing an existing one with the same name in
	/// place.
	pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();
		let value = value.into();
		match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
			Some((_, existing)) => *existing = value,
			None => self.attributes.push((name, value)),
		}
	}

	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|(existing, _)| existing == name)
			.map(|(_, value)| value.as_str())
	}

	pub fn push_child(&mut self, child: Element) {
		self.children.push(child);
	}

	/// The first child named `name`.
	pub fn child(&self, name: &str) -> Option<&Element> {
		self.children.iter().find(|child| child.name == name)
	}

	/// All children named `name`, in document order.
	pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
		self.children.iter().filter(move |child| child.name == name)
	}

	/// Follow a chain of child names, taking the first match at each level.
	pub fn find(&self, path: &[&str]) -> Option<&Element> {
		path.iter().try_fold(self, |element, name| element.child(name))
	}
}
