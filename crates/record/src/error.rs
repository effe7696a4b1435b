use codify_codec::CodecError;
use codify_graph::{BoxError, StoreError};

/// Errors raised by record reads, writes and class-level codec calls.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
	/// An external write targeted an attribute that is only produced through its links.
	#[error("attribute `{attr}` of {model} is protected and cannot be written directly")]
	ProtectedAttributeWrite { model: String, attr: String },

	#[error("unknown attribute `{attr}` for {model}")]
	UnknownAttribute { model: String, attr: String },

	/// A link's producer failed; the attribute stays stale.
	#[error("producing `{attr}` failed: {source}")]
	ProducerFailure {
		attr: String,
		#[source]
		source: BoxError,
	},

	#[error("undefined method `{method}` for {model}")]
	UnknownMethod { model: String, method: String },

	#[error(transparent)]
	Codec(#[from] CodecError),

	#[error(transparent)]
	Store(#[from] StoreError),
}

/// Errors raised while loading a model declaration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to parse model config: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("encoder for `{attribute}`: {reason}")]
	InvalidEncoder { attribute: String, reason: String },

	#[error(transparent)]
	Codec(#[from] CodecError),
}
