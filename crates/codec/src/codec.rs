//! Codec instances and the transform contract they wrap.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::CodecError;
use crate::param::{AuxInputs, Options, Param, RecordAccess};

/// A leaf byte transform.
///
/// Transforms are stateless: everything that varies per attribute lives in the [`Codec`]
/// wrapping them and reaches the transform through [`Params`].
pub trait Transform: Send + Sync + fmt::Debug {
	fn encode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError>;

	/// Returns the inverse transform, if one exists.
	fn decoder(&self) -> Option<&dyn Decoder> {
		None
	}

	/// Names of the auxiliary inputs this transform accepts.
	fn auxiliary_inputs(&self) -> &'static [&'static str] {
		&[]
	}
}

/// Inverse half of a reversible [`Transform`].
pub trait Decoder: Send + Sync {
	fn decode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError>;
}

/// Per-invocation view of a codec's configuration, bound to a record.
pub struct Params<'a> {
	codec: &'a str,
	options: &'a Options,
	inputs: BTreeMap<&'a str, Param>,
	record: &'a mut dyn RecordAccess,
}

impl Params<'_> {
	/// Symbol of the codec being run, for error reporting.
	pub fn codec(&self) -> &str {
		self.codec
	}

	/// Resolves an option, evaluating callable settings against the bound record.
	pub fn option(&mut self, key: &str) -> Result<Option<Param>, CodecError> {
		match self.options.get(key) {
			Some(setting) => setting.resolve(key, &mut *self.record),
			None => Ok(None),
		}
	}

	/// Resolves an integer option, checking its range.
	pub fn int_option(
		&mut self,
		key: &str,
		range: std::ops::RangeInclusive<i64>,
	) -> Result<Option<i64>, CodecError> {
		let Some(param) = self.option(key)? else {
			return Ok(None);
		};
		let value = param
			.as_int()
			.ok_or_else(|| CodecError::invalid_option(self.codec, key, "expected an integer"))?;
		if !range.contains(&value) {
			return Err(CodecError::invalid_option(
				self.codec,
				key,
				format!("{value} is outside {}..={}", range.start(), range.end()),
			));
		}
		Ok(Some(value))
	}

	/// Returns an auxiliary input. Bound inputs are resolved before the transform runs.
	pub fn input(&self, name: &str) -> Option<&Param> {
		self.inputs.get(name)
	}
}

/// A resolved, configured codec.
#[derive(Clone)]
pub struct Codec {
	symbol: Arc<str>,
	transform: Arc<dyn Transform>,
	options: Options,
	inputs: Options,
}

impl Codec {
	pub fn new(symbol: impl Into<Arc<str>>, transform: impl Transform + 'static) -> Self {
		Self::from_shared(symbol, Arc::new(transform))
	}

	pub fn from_shared(symbol: impl Into<Arc<str>>, transform: Arc<dyn Transform>) -> Self {
		Self {
			symbol: symbol.into(),
			transform,
			options: Options::new(),
			inputs: Options::new(),
		}
	}

	/// Overlays `options` on the codec's own configuration.
	pub fn with_options(mut self, options: &Options) -> Self {
		self.options = self.options.merged(options);
		self
	}

	/// Keeps the offered inputs this codec's transform declares.
	pub fn with_inputs(mut self, inputs: &AuxInputs) -> Self {
		self.inputs = inputs.bind(self.transform.auxiliary_inputs());
		self
	}

	pub fn symbol(&self) -> &str {
		&self.symbol
	}

	pub fn options(&self) -> &Options {
		&self.options
	}

	pub fn decodes(&self) -> bool {
		self.transform.decoder().is_some()
	}

	/// Whether any option or bound input must be evaluated against a record.
	pub fn depends_on_record(&self) -> bool {
		self.options.any_callable() || self.inputs.any_callable()
	}

	/// Names of the auxiliary inputs bound to this codec.
	pub fn auxiliary_keys(&self) -> impl Iterator<Item = &str> {
		self.inputs.keys()
	}

	/// Attributes read by attribute-backed inputs.
	pub fn input_attributes(&self) -> impl Iterator<Item = &str> {
		self.inputs.iter().filter_map(|(_, s)| s.source_attribute())
	}

	pub fn encode(&self, data: &[u8], record: &mut dyn RecordAccess) -> Result<Vec<u8>, CodecError> {
		let mut params = self.bind(record)?;
		self.transform.encode(data, &mut params)
	}

	pub fn decode(&self, data: &[u8], record: &mut dyn RecordAccess) -> Result<Vec<u8>, CodecError> {
		let decoder = self.transform.decoder().ok_or_else(|| CodecError::Irreversible {
			codec: self.symbol.to_string(),
		})?;
		let mut params = self.bind(record)?;
		decoder.decode(data, &mut params)
	}

	fn bind<'a>(&'a self, record: &'a mut dyn RecordAccess) -> Result<Params<'a>, CodecError> {
		let mut inputs = BTreeMap::new();
		for (name, setting) in self.inputs.iter() {
			match setting.resolve(name, &mut *record)? {
				Some(value) => {
					inputs.insert(name, value);
				}
				None => {
					return Err(CodecError::MissingInput {
						codec: self.symbol.to_string(),
						input: name.to_string(),
					});
				}
			}
		}
		Ok(Params {
			codec: &self.symbol,
			options: &self.options,
			inputs,
			record,
		})
	}
}

impl fmt::Debug for Codec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Codec")
			.field("symbol", &self.symbol)
			.field("transform", &self.transform)
			.field("options", &self.options)
			.field("inputs", &self.inputs)
			.finish()
	}
}

/// Uninstantiated codec type: a transform awaiting configuration.
#[derive(Clone, Debug)]
pub struct CodecFactory {
	transform: Arc<dyn Transform>,
	pinned: Options,
}

impl CodecFactory {
	pub fn new(transform: impl Transform + 'static) -> Self {
		Self {
			transform: Arc::new(transform),
			pinned: Options::new(),
		}
	}

	/// Fixes options that caller configuration cannot override.
	pub fn pinned(mut self, options: Options) -> Self {
		self.pinned = self.pinned.merged(&options);
		self
	}

	/// Type name of the wrapped transform, read from its `Debug` form.
	pub fn transform_name(&self) -> String {
		let debug = format!("{:?}", self.transform);
		debug
			.split(|c: char| !(c.is_alphanumeric() || c == '_'))
			.next()
			.unwrap_or_default()
			.to_string()
	}

	/// Instantiates a codec named `symbol` with the given configuration.
	pub fn instantiate(&self, symbol: &str, options: &Options, inputs: &AuxInputs) -> Codec {
		Codec::from_shared(symbol, Arc::clone(&self.transform))
			.with_options(options)
			.with_options(&self.pinned)
			.with_inputs(inputs)
	}
}
