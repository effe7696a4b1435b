//! Ordered codec composition.
//!
//! Encoding runs members head to tail, decoding runs them tail to head. Absence is never
//! encoded: a missing value passes through either direction untouched, before any other check.

use bytes::Bytes;

use crate::codec::Codec;
use crate::error::CodecError;
use crate::param::{Detached, RecordAccess};

#[derive(Clone, Debug, Default)]
pub struct CodecChain {
	codecs: Vec<Codec>,
	reversible: bool,
	depends_on_record: bool,
}

impl CodecChain {
	pub fn new(codecs: Vec<Codec>) -> Self {
		let reversible = codecs.iter().all(Codec::decodes);
		let depends_on_record = codecs.iter().any(Codec::depends_on_record);
		Self {
			codecs,
			reversible,
			depends_on_record,
		}
	}

	pub fn codecs(&self) -> &[Codec] {
		&self.codecs
	}

	pub fn len(&self) -> usize {
		self.codecs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.codecs.is_empty()
	}

	/// True when every member can decode.
	#[inline]
	pub fn is_reversible(&self) -> bool {
		self.reversible
	}

	/// True when any member has a callable option or input.
	#[inline]
	pub fn depends_on_record(&self) -> bool {
		self.depends_on_record
	}

	/// Attributes read by attribute-backed inputs of any member, deduplicated.
	pub fn input_attributes(&self) -> Vec<&str> {
		let mut out: Vec<&str> = Vec::new();
		for attr in self.codecs.iter().flat_map(Codec::input_attributes) {
			if !out.contains(&attr) {
				out.push(attr);
			}
		}
		out
	}

	pub fn encode(
		&self,
		value: Option<&[u8]>,
		record: &mut dyn RecordAccess,
	) -> Result<Option<Bytes>, CodecError> {
		let Some(value) = value else {
			return Ok(None);
		};
		let mut data = value.to_vec();
		for codec in &self.codecs {
			data = codec.encode(&data, &mut *record)?;
		}
		Ok(Some(Bytes::from(data)))
	}

	pub fn decode(
		&self,
		value: Option<&[u8]>,
		record: &mut dyn RecordAccess,
	) -> Result<Option<Bytes>, CodecError> {
		let Some(value) = value else {
			return Ok(None);
		};
		if let Some(codec) = self.codecs.iter().find(|c| !c.decodes()) {
			return Err(CodecError::Irreversible {
				codec: codec.symbol().to_string(),
			});
		}
		let mut data = value.to_vec();
		for codec in self.codecs.iter().rev() {
			data = codec.decode(&data, &mut *record)?;
		}
		Ok(Some(Bytes::from(data)))
	}

	/// Encodes without a bound record; record-bound settings fail with [`CodecError::Unbound`].
	pub fn encode_detached(&self, value: Option<&[u8]>) -> Result<Option<Bytes>, CodecError> {
		self.encode(value, &mut Detached)
	}

	pub fn decode_detached(&self, value: Option<&[u8]>) -> Result<Option<Bytes>, CodecError> {
		self.decode(value, &mut Detached)
	}
}

impl FromIterator<Codec> for CodecChain {
	fn from_iter<I: IntoIterator<Item = Codec>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}
