//! Model declarations.
//!
//! A [`Model`] is the per-type half of the record layer: its physical columns, the attribute
//! [`Schema`] linking logical attributes to their encoded counterparts, and the resolved codec
//! chain of every encoded attribute. It is built once through [`ModelBuilder`] and shared by
//! all of its records.
//!
//! # Declaration order
//!
//! Classification is first-declaration-wins, so declare `column`s and `attr_shadow`s before
//! the encoders that reference them.

use std::sync::Arc;

use bytes::Bytes;
use codify_codec::{CodecChain, CodecError, CodecRegistry};
use codify_graph::{Attr, AttrClass, BoxError, ComponentId, Produced, Producer, Schema, Variant};
use indexmap::{IndexMap, IndexSet};

use crate::error::RecordError;
use crate::options::{EncoderOptions, EncoderStyle};
use crate::record::{Record, Row};

/// Direction of a class-level codec method.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
	Encode,
	Decode,
}

/// A logical attribute and the encoded attribute backing it.
#[derive(Debug)]
pub struct EncodedAttribute {
	pub attr: Attr,
	pub encoded: Attr,
	pub chain: CodecChain,
	pub component: ComponentId,
	pub verb: String,
	pub reverse_verb: String,
}

/// Builds a [`Model`].
pub struct ModelBuilder<'r> {
	name: String,
	registry: &'r CodecRegistry,
	columns: IndexSet<Attr>,
	track_changes: bool,
	schema: Schema<Record>,
	encoders: Vec<EncodedAttribute>,
}

impl ModelBuilder<'static> {
	/// Builder resolving codecs through the process-wide registry.
	pub fn new(name: impl Into<String>) -> Self {
		Self::with_registry(name, codify_codec::global())
	}
}

impl<'r> ModelBuilder<'r> {
	pub fn with_registry(name: impl Into<String>, registry: &'r CodecRegistry) -> Self {
		Self {
			name: name.into(),
			registry,
			columns: IndexSet::new(),
			track_changes: true,
			schema: Schema::new(),
			encoders: Vec::new(),
		}
	}

	/// Declares a persisted column.
	pub fn column(&mut self, name: &str) -> &mut Self {
		self.columns.insert(Attr::new(name));
		self
	}

	pub fn columns<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> &mut Self {
		for name in names {
			self.column(name);
		}
		self
	}

	/// Enables or disables change tracking (on by default).
	pub fn track_changes(&mut self, enabled: bool) -> &mut Self {
		self.track_changes = enabled;
		self
	}

	/// Deprecates the column `name` in favour of a virtual attribute of the same name.
	///
	/// A non-absent legacy value is read in preference to the virtual one; every write clears
	/// the legacy column.
	pub fn attr_shadow(&mut self, name: &str) -> &mut Self {
		self.schema.register(name, AttrClass::Shadow);
		self
	}

	pub fn attr_compressor(&mut self, name: &str, options: EncoderOptions) -> Result<&mut Self, CodecError> {
		self.declare(name, options, EncoderStyle::Compressor)
	}

	pub fn attr_digestor(&mut self, name: &str, options: EncoderOptions) -> Result<&mut Self, CodecError> {
		self.declare(name, options, EncoderStyle::Digestor)
	}

	pub fn attr_encoder(&mut self, name: &str, options: EncoderOptions) -> Result<&mut Self, CodecError> {
		self.declare(name, options, EncoderStyle::Encoder)
	}

	/// Declares an encoded attribute with the defaults of `style`.
	pub fn declare(
		&mut self,
		name: &str,
		options: EncoderOptions,
		style: EncoderStyle,
	) -> Result<&mut Self, CodecError> {
		let options = options.resolve(name, style);
		let chain = self.registry.resolve_chain(
			options.codecs,
			&options.kind,
			&options.inputs,
			&options.options,
		)?;

		let attr = Attr::new(name);
		let encoded = Attr::from(options.target);
		let inputs: Vec<Attr> = chain.input_attributes().into_iter().map(Attr::new).collect();

		for a in [&attr, &encoded].into_iter().chain(&inputs) {
			let class = if self.columns.contains(a) {
				AttrClass::Column
			} else {
				AttrClass::Accessor
			};
			self.schema.register_default(a.clone(), class);
		}
		if options.protect {
			self.schema.protect(encoded.clone());
		}

		let component = self.schema.component();
		if chain.is_reversible() {
			self.schema.link(
				encoded.clone(),
				attr.clone(),
				Some(component),
				true,
				decoder(encoded.clone(), chain.clone()),
			);
		}
		let encode = encoder(attr.clone(), chain.clone());
		self.schema
			.link(attr.clone(), encoded.clone(), Some(component), false, encode.clone());
		for input in &inputs {
			self.schema
				.link(input.clone(), encoded.clone(), Some(component), false, encode.clone());
		}

		tracing::debug!(
			model = %self.name,
			%attr,
			%encoded,
			codecs = chain.len(),
			reversible = chain.is_reversible(),
			"declared encoded attribute"
		);
		self.encoders.push(EncodedAttribute {
			attr,
			encoded,
			chain,
			component,
			verb: options.verb,
			reverse_verb: options.reverse_verb,
		});
		Ok(self)
	}

	pub fn build(self) -> Arc<Model> {
		let mut methods = IndexMap::new();
		for (index, encoder) in self.encoders.iter().enumerate() {
			methods.insert(format!("{}_{}", encoder.verb, encoder.attr), (index, Direction::Encode));
			if encoder.chain.is_reversible() {
				methods.insert(
					format!("{}_{}", encoder.reverse_verb, encoder.attr),
					(index, Direction::Decode),
				);
			}
		}
		Arc::new(Model {
			name: self.name,
			schema: Arc::new(self.schema),
			columns: self.columns,
			track_changes: self.track_changes,
			encoders: self.encoders,
			methods,
		})
	}
}

/// Runs a chain result through the link contract: absent inputs defer the link.
fn produced(result: Result<Option<Bytes>, CodecError>) -> Result<Produced, BoxError> {
	match result {
		Ok(value) => Ok(Produced::Value(value)),
		Err(CodecError::MissingInput { codec, input }) => {
			tracing::trace!(%codec, %input, "link deferred on missing input");
			Ok(Produced::Deferred)
		}
		Err(error) => Err(Box::new(error)),
	}
}

fn decoder(encoded: Attr, chain: CodecChain) -> Producer<Record> {
	Producer::new(move |record: &mut Record, variant: Variant| {
		let data = record.read_variant(&encoded, variant)?;
		produced(chain.decode(data.as_deref(), record))
	})
}

fn encoder(attr: Attr, chain: CodecChain) -> Producer<Record> {
	Producer::new(move |record: &mut Record, variant: Variant| {
		let data = record.read_variant(&attr, variant)?;
		produced(chain.encode(data.as_deref(), record))
	})
}

/// A record type: columns, attribute graph and encoded attributes.
pub struct Model {
	name: String,
	schema: Arc<Schema<Record>>,
	columns: IndexSet<Attr>,
	track_changes: bool,
	encoders: Vec<EncodedAttribute>,
	methods: IndexMap<String, (usize, Direction)>,
}

impl Model {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn schema(&self) -> &Arc<Schema<Record>> {
		&self.schema
	}

	pub fn columns(&self) -> impl Iterator<Item = &Attr> {
		self.columns.iter()
	}

	pub fn is_column(&self, attr: &str) -> bool {
		self.columns.contains(attr)
	}

	pub fn tracks_changes(&self) -> bool {
		self.track_changes
	}

	pub fn encoders(&self) -> &[EncodedAttribute] {
		&self.encoders
	}

	/// Whether `attr` is a column or a registered attribute.
	pub fn knows(&self, attr: &str) -> bool {
		self.columns.contains(attr) || self.schema.classification(attr).is_some()
	}

	/// The encoder declared for logical attribute `attr`.
	pub fn encoder_for(&self, attr: &str) -> Option<&EncodedAttribute> {
		self.encoders.iter().find(|e| e.attr == attr)
	}

	/// Encodes `data` with the chain of `attr`, without a record.
	pub fn encode_attribute(&self, attr: &str, data: Option<&[u8]>) -> Result<Option<Bytes>, RecordError> {
		let encoder = self.encoder_for(attr).ok_or_else(|| self.unknown(attr))?;
		Ok(encoder.chain.encode_detached(data)?)
	}

	/// Decodes `data` with the chain of `attr`, without a record.
	pub fn decode_attribute(&self, attr: &str, data: Option<&[u8]>) -> Result<Option<Bytes>, RecordError> {
		let encoder = self.encoder_for(attr).ok_or_else(|| self.unknown(attr))?;
		Ok(encoder.chain.decode_detached(data)?)
	}

	/// Calls a class-level codec method such as `compress_body` or `uncompress_body`.
	pub fn invoke(&self, method: &str, data: Option<&[u8]>) -> Result<Option<Bytes>, RecordError> {
		let (index, direction) = self.methods.get(method).copied().ok_or_else(|| {
			RecordError::UnknownMethod {
				model: self.name.clone(),
				method: method.to_string(),
			}
		})?;
		let chain = &self.encoders[index].chain;
		Ok(match direction {
			Direction::Encode => chain.encode_detached(data)?,
			Direction::Decode => chain.decode_detached(data)?,
		})
	}

	/// Names of the class-level codec methods.
	pub fn methods(&self) -> impl Iterator<Item = &str> {
		self.methods.keys().map(String::as_str)
	}

	pub fn new_record(self: &Arc<Self>) -> Record {
		Record::new(Arc::clone(self))
	}

	/// Creates a record and applies `assignments` in order through the tracked write path.
	pub fn new_record_with<'a, I>(self: &Arc<Self>, assignments: I) -> Result<Record, RecordError>
	where
		I: IntoIterator<Item = (&'a str, Option<Bytes>)>,
	{
		let mut record = self.new_record();
		for (attr, value) in assignments {
			record.set(attr, value)?;
		}
		Ok(record)
	}

	/// Creates a record from a stored row.
	pub fn load(self: &Arc<Self>, row: Row) -> Result<Record, RecordError> {
		Record::load(Arc::clone(self), row)
	}

	pub(crate) fn unknown(&self, attr: &str) -> RecordError {
		RecordError::UnknownAttribute {
			model: self.name.clone(),
			attr: attr.to_string(),
		}
	}
}

impl std::fmt::Debug for Model {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Model")
			.field("name", &self.name)
			.field("columns", &self.columns)
			.field("encoders", &self.encoders)
			.finish_non_exhaustive()
	}
}
