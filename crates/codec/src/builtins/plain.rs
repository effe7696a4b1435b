use crate::codec::{Decoder, Params, Transform};
use crate::error::CodecError;

/// Identity transform bound to `none`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Plaintext;

impl Transform for Plaintext {
	fn encode(&self, data: &[u8], _params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		Ok(data.to_vec())
	}

	fn decoder(&self) -> Option<&dyn Decoder> {
		Some(self)
	}
}

impl Decoder for Plaintext {
	fn decode(&self, data: &[u8], _params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		Ok(data.to_vec())
	}
}
