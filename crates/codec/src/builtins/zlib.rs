use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::codec::{Decoder, Params, Transform};
use crate::error::CodecError;

const DEFAULT_LEVEL: i64 = 6;

/// zlib-wrapped deflate. Option `level` (0-9).
#[derive(Debug, Default, Clone, Copy)]
pub struct Zlib;

impl Transform for Zlib {
	fn encode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		let level = params.int_option("level", 0..=9)?.unwrap_or(DEFAULT_LEVEL);
		let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level as u32));
		encoder
			.write_all(data)
			.map_err(|e| CodecError::transform(params.codec(), e))?;
		encoder.finish().map_err(|e| CodecError::transform(params.codec(), e))
	}

	fn decoder(&self) -> Option<&dyn Decoder> {
		Some(self)
	}
}

impl Decoder for Zlib {
	fn decode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		let mut out = Vec::with_capacity(data.len() * 2);
		ZlibDecoder::new(data)
			.read_to_end(&mut out)
			.map_err(|e| CodecError::transform(params.codec(), e))?;
		Ok(out)
	}
}
