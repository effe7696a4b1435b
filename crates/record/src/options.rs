//! Per-attribute encoder declarations.
//!
//! Every field of [`EncoderOptions`] is optional; unset fields fall back to the defaults of the
//! declaring [`EncoderStyle`].

use codify_codec::{AuxInputs, CodecKind, CodecSpec, Options, Setting};
use serde::Deserialize;

/// Declaration flavour, supplying defaults for unset options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderStyle {
	#[default]
	Encoder,
	Compressor,
	Digestor,
}

impl EncoderStyle {
	fn default_codec(self) -> &'static str {
		match self {
			Self::Encoder => "none",
			Self::Compressor => "zlib",
			Self::Digestor => "sha512",
		}
	}

	fn default_kind(self) -> CodecKind {
		match self {
			Self::Encoder => CodecKind::ALL,
			Self::Compressor => CodecKind::COMPRESSOR,
			Self::Digestor => CodecKind::DIGESTOR,
		}
	}

	fn default_prefix(self) -> &'static str {
		match self {
			Self::Encoder => "encoded_",
			Self::Compressor => "compressed_",
			Self::Digestor => "digested_",
		}
	}

	fn default_verbs(self) -> (&'static str, &'static str) {
		match self {
			Self::Encoder => ("encode", "decode"),
			Self::Compressor => ("compress", "uncompress"),
			Self::Digestor => ("digest", "decode"),
		}
	}
}

/// Options for one encoded attribute.
#[derive(Clone, Debug, Default)]
pub struct EncoderOptions {
	pub codecs: Option<Vec<CodecSpec>>,
	pub kind: Option<CodecKind>,
	pub prefix: Option<String>,
	pub suffix: Option<String>,
	/// Explicit name for the encoded attribute, overriding prefix and suffix.
	pub target: Option<String>,
	pub protect: Option<bool>,
	pub verb: Option<String>,
	pub reverse_verb: Option<String>,
	/// Passed to every codec in the chain.
	pub options: Options,
	pub inputs: AuxInputs,
}

impl EncoderOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a codec to the chain.
	pub fn codec(mut self, spec: impl Into<CodecSpec>) -> Self {
		self.codecs.get_or_insert_with(Vec::new).push(spec.into());
		self
	}

	pub fn kind(mut self, kind: CodecKind) -> Self {
		self.kind = Some(kind);
		self
	}

	pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = Some(prefix.into());
		self
	}

	pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
		self.suffix = Some(suffix.into());
		self
	}

	pub fn target(mut self, target: impl Into<String>) -> Self {
		self.target = Some(target.into());
		self
	}

	pub fn protect(mut self, protect: bool) -> Self {
		self.protect = Some(protect);
		self
	}

	pub fn verbs(mut self, verb: impl Into<String>, reverse_verb: impl Into<String>) -> Self {
		self.verb = Some(verb.into());
		self.reverse_verb = Some(reverse_verb.into());
		self
	}

	pub fn option(mut self, key: impl Into<String>, setting: impl Into<Setting>) -> Self {
		self.options.insert(key, setting);
		self
	}

	pub fn inputs(mut self, inputs: AuxInputs) -> Self {
		self.inputs = inputs;
		self
	}

	pub(crate) fn resolve(self, name: &str, style: EncoderStyle) -> ResolvedOptions {
		let (verb, reverse_verb) = style.default_verbs();
		let target = self.target.unwrap_or_else(|| {
			format!(
				"{}{name}{}",
				self.prefix.as_deref().unwrap_or(style.default_prefix()),
				self.suffix.as_deref().unwrap_or("")
			)
		});
		ResolvedOptions {
			codecs: self
				.codecs
				.unwrap_or_else(|| vec![CodecSpec::from(style.default_codec())]),
			kind: self.kind.unwrap_or_else(|| style.default_kind()),
			target,
			protect: self.protect.unwrap_or(true),
			verb: self.verb.unwrap_or_else(|| verb.to_string()),
			reverse_verb: self.reverse_verb.unwrap_or_else(|| reverse_verb.to_string()),
			options: self.options,
			inputs: self.inputs,
		}
	}
}

/// [`EncoderOptions`] with every default applied.
#[derive(Debug)]
pub(crate) struct ResolvedOptions {
	pub codecs: Vec<CodecSpec>,
	pub kind: CodecKind,
	pub target: String,
	pub protect: bool,
	pub verb: String,
	pub reverse_verb: String,
	pub options: Options,
	pub inputs: AuxInputs,
}
