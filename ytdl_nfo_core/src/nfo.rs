use std::path::Path;

use crate::NfoError;
use crate::NfoResult;
use crate::element::Element;
use crate::interpreter;
use crate::record::RawRecord;
use crate::store::TemplateStore;
use crate::template::Template;
use crate::xml;

/// Where an [`Nfo`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NfoState {
	/// No template could be loaded for the extractor.
	Unloaded,
	/// A template is loaded and nothing has been generated yet.
	TemplateLoaded,
	/// The last call to [`Nfo::generate`] succeeded.
	Generated,
	/// The last call to [`Nfo::generate`] failed; no tree is available.
	Failed,
}

/// The output tree for one extractor's template.
///
/// Each successful [`Nfo::generate`] replaces the previous tree. A failed
/// generation discards it, so serialization is only possible right after a
/// success.
#[derive(Debug)]
pub struct Nfo {
	extractor: String,
	template: Option<Template>,
	load_error: Option<NfoError>,
	state: NfoState,
	root: Option<Element>,
}

impl Nfo {
	/// Load the template for `extractor` from `store`.
	///
	/// A missing or broken template does not fail construction; the nfo stays
	/// [`NfoState::Unloaded`] and keeps the error in [`Nfo::load_error`].
	pub fn load(store: &TemplateStore, extractor: &str) -> Self {
		match store.load(extractor) {
			Ok(template) => Self::from_template(extractor, template),
			Err(error) => {
				tracing::error!(extractor, "{error}");
				Self {
					extractor: extractor.to_string(),
					template: None,
					load_error: Some(error),
					state: NfoState::Unloaded,
					root: None,
				}
			}
		}
	}

	pub fn from_template(extractor: impl Into<String>, template: Template) -> Self {
		Self {
			extractor: extractor.into(),
			template: Some(template),
			load_error: None,
			state: NfoState::TemplateLoaded,
			root: None,
		}
	}

	pub fn extractor(&self) -> &str {
		&self.extractor
	}

	pub fn template(&self) -> Option<&Template> {
		self.template.as_ref()
	}

	/// Why the template could not be loaded, if it could not.
	pub fn load_error(&self) -> Option<&NfoError> {
		self.load_error.as_ref()
	}

	/// Take the load error out, e.g. to return it to a caller.
	pub fn take_load_error(&mut self) -> Option<NfoError> {
		self.load_error.take()
	}

	pub fn state(&self) -> NfoState {
		self.state
	}

	pub fn is_template_loaded(&self) -> bool {
		self.template.is_some()
	}

	pub fn is_generated(&self) -> bool {
		self.state == NfoState::Generated
	}

	/// The tree from the last successful generation.
	pub fn root(&self) -> Option<&Element> {
		self.root.as_ref()
	}

	/// Generate the output tree for `record`.
	///
	/// Errors are logged here and leave the nfo [`NfoState::Failed`] with no
	/// tree; the caller decides whether to skip the record or abort.
	pub fn generate(&mut self, record: &RawRecord) -> NfoResult<&Element> {
		let Some(template) = self.template.as_ref() else {
			return Err(NfoError::TemplateNotLoaded {
				extractor: self.extractor.clone(),
			});
		};

		self.root = None;
		match interpreter::generate(template, record) {
			Ok(root) => {
				self.state = NfoState::Generated;
				Ok(self.root.insert(root))
			}
			Err(error) => {
				if error.is_generation_error() {
					tracing::warn!(extractor = %self.extractor, "{error}");
				} else {
					tracing::error!(extractor = %self.extractor, "{error}");
				}
				self.state = NfoState::Failed;
				Err(error)
			}
		}
	}

	/// Serialize the generated tree.
	pub fn to_xml(&self) -> NfoResult<String> {
		match (&self.state, &self.root) {
			(NfoState::Generated, Some(root)) => xml::to_xml_string(root),
			_ => Err(NfoError::NotGenerated),
		}
	}

	/// Serialize the generated tree and write it to `path`.
	pub fn write(&self, path: &Path) -> NfoResult<()> {
		let contents = self.to_xml()?;
		xml::write_atomic(path, &contents)
	}
}
