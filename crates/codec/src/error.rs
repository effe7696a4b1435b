use crate::kind::CodecKind;

/// Boxed error used by record accessors and transform backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while resolving or running codecs.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
	/// Every lookup tier was exhausted for the symbol.
	#[error(":{symbol} codec of kind :{kind} not found")]
	NotFound { symbol: String, kind: CodecKind },

	/// Decode was requested through a one-way codec.
	#[error("codec `{codec}` cannot decode")]
	Irreversible { codec: String },

	/// A bound auxiliary input resolved to absence.
	#[error("codec `{codec}` is missing auxiliary input `{input}`")]
	MissingInput { codec: String, input: String },

	/// A record-bound setting was evaluated without a record.
	#[error("setting `{key}` needs a bound record")]
	Unbound { key: String },

	/// An option value has the wrong shape or range.
	#[error("codec `{codec}` option `{key}`: {reason}")]
	InvalidOption {
		codec: String,
		key: String,
		reason: String,
	},

	/// The underlying transform rejected its input.
	#[error("codec `{codec}` failed: {source}")]
	Transform {
		codec: String,
		#[source]
		source: BoxError,
	},

	/// A deferred setting failed while reading the record.
	#[error("resolving setting `{key}` failed: {source}")]
	Binding {
		key: String,
		#[source]
		source: BoxError,
	},
}

impl CodecError {
	pub(crate) fn transform(codec: &str, source: impl Into<BoxError>) -> Self {
		Self::Transform {
			codec: codec.to_string(),
			source: source.into(),
		}
	}

	pub(crate) fn invalid_option(codec: &str, key: &str, reason: impl Into<String>) -> Self {
		Self::InvalidOption {
			codec: codec.to_string(),
			key: key.to_string(),
			reason: reason.into(),
		}
	}
}
