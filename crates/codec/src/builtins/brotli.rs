use std::io::{Read, Write};

use crate::codec::{Decoder, Params, Transform};
use crate::error::CodecError;

const BUFFER_SIZE: usize = 4096;
const DEFAULT_QUALITY: i64 = 9;
const DEFAULT_WINDOW: i64 = 22;

/// Brotli stream. Options `level` (quality 0-11) and `window` (log2 size 10-24).
#[derive(Debug, Default, Clone, Copy)]
pub struct Brotli;

impl Transform for Brotli {
	fn encode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		let quality = params.int_option("level", 0..=11)?.unwrap_or(DEFAULT_QUALITY);
		let window = params.int_option("window", 10..=24)?.unwrap_or(DEFAULT_WINDOW);

		let mut writer =
			brotli::CompressorWriter::new(Vec::new(), BUFFER_SIZE, quality as u32, window as u32);
		writer
			.write_all(data)
			.map_err(|e| CodecError::transform(params.codec(), e))?;
		writer
			.flush()
			.map_err(|e| CodecError::transform(params.codec(), e))?;
		Ok(writer.into_inner())
	}

	fn decoder(&self) -> Option<&dyn Decoder> {
		Some(self)
	}
}

impl Decoder for Brotli {
	fn decode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		let mut out = Vec::with_capacity(data.len() * 3);
		brotli::Decompressor::new(data, BUFFER_SIZE)
			.read_to_end(&mut out)
			.map_err(|e| CodecError::transform(params.codec(), e))?;
		Ok(out)
	}
}
