use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum NfoError {
	#[error(transparent)]
	#[diagnostic(code(ytdl_nfo::io_error))]
	Io(#[from] std::io::Error),

	#[error("no template available for extractor `{extractor}`")]
	#[diagnostic(
		code(ytdl_nfo::configuration_missing),
		help(
			"add `{extractor}.yaml` to a template directory or force one with `--extractor`"
		)
	)]
	ConfigurationMissing { extractor: String },

	#[error("failed to parse template for extractor `{extractor}`: {reason}")]
	#[diagnostic(code(ytdl_nfo::template_parse))]
	TemplateParse { extractor: String, reason: String },

	#[error("invalid template: {0}")]
	#[diagnostic(
		code(ytdl_nfo::invalid_template),
		help(
			"templates are a single root key whose body is a list of `name: \"{{field}}\"` or \
			 `name: {{ value: ..., attr: ..., convert: ... }}` entries"
		)
	)]
	InvalidTemplate(String),

	#[error("error with key `{key}`: {reason}")]
	#[diagnostic(
		code(ytdl_nfo::structural_violation),
		help("the `>` delimiter can only be used in list keys ending with `!`")
	)]
	StructuralViolation { key: String, reason: String },

	#[error("failed to convert `{value}` for key `{key}`: {reason}")]
	#[diagnostic(code(ytdl_nfo::conversion_failure))]
	ConversionFailure {
		key: String,
		value: String,
		reason: String,
	},

	#[error("value of list key `{key}` is not a valid list literal: {reason}")]
	#[diagnostic(
		code(ytdl_nfo::literal_parse),
		help("list keys must resolve to a literal such as `['a', 'b']`")
	)]
	LiteralParse { key: String, reason: String },

	#[error("invalid format string for key `{key}`: {reason}")]
	#[diagnostic(
		code(ytdl_nfo::format_string),
		help("use `{{field}}` placeholders and `{{{{` / `}}}}` for literal braces")
	)]
	FormatString { key: String, reason: String },

	#[error("no template loaded for extractor `{extractor}`")]
	#[diagnostic(code(ytdl_nfo::template_not_loaded))]
	TemplateNotLoaded { extractor: String },

	#[error("the nfo has not been generated")]
	#[diagnostic(
		code(ytdl_nfo::not_generated),
		help("call `generate` successfully before serializing")
	)]
	NotGenerated,

	#[error("failed to read metadata from `{path}`: {reason}")]
	#[diagnostic(code(ytdl_nfo::invalid_record))]
	InvalidRecord { path: String, reason: String },

	#[error("no extractor found for `{path}`")]
	#[diagnostic(
		code(ytdl_nfo::extractor_missing),
		help("the json has no `extractor` field, pass one with `--extractor`")
	)]
	ExtractorMissing { path: String },

	#[error("failed to serialize xml: {0}")]
	#[diagnostic(code(ytdl_nfo::xml_write))]
	XmlWrite(String),

	#[error("cannot write output to `{path}`: {reason}")]
	#[diagnostic(
		code(ytdl_nfo::output_write),
		help("check write permissions for the output directory")
	)]
	OutputWrite { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(ytdl_nfo::config_parse),
		help("check that ytdl-nfo.toml is valid TOML with [scan] and/or [templates] sections")
	)]
	ConfigParse(String),

	#[error("invalid pattern `{pattern}`: {reason}")]
	#[diagnostic(code(ytdl_nfo::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(ytdl_nfo::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

impl NfoError {
	/// Returns true for errors raised while turning a record into an output
	/// tree. These only affect the current record.
	pub fn is_generation_error(&self) -> bool {
		matches!(
			self,
			Self::StructuralViolation { .. }
				| Self::ConversionFailure { .. }
				| Self::LiteralParse { .. }
				| Self::FormatString { .. }
		)
	}
}

pub type NfoResult<T> = Result<T, NfoError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
