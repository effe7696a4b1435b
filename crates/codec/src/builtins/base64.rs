use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD, URL_SAFE};
use base64::engine::DecodePaddingMode;

use crate::codec::{Decoder, Params, Transform};
use crate::error::CodecError;

/// Characters per line in the default line-wrapped form.
const LINE_WIDTH: usize = 60;

/// Decoder for the line-wrapped form: whitespace is stripped first, padding is optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Base64 text encoding. Option `representation`: absent for line-wrapped output, `strict`
/// for a single unwrapped line, `urlsafe` for the URL alphabet.
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Representation {
	Wrapped,
	Strict,
	UrlSafe,
}

fn representation(params: &mut Params<'_>) -> Result<Representation, CodecError> {
	let Some(param) = params.option("representation")? else {
		return Ok(Representation::Wrapped);
	};
	match param.as_text() {
		Some("strict") => Ok(Representation::Strict),
		Some("urlsafe") => Ok(Representation::UrlSafe),
		Some("") => Ok(Representation::Wrapped),
		other => Err(CodecError::invalid_option(
			params.codec(),
			"representation",
			format!("unknown representation {other:?}"),
		)),
	}
}

impl Transform for Base64 {
	fn encode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		Ok(match representation(params)? {
			Representation::Strict => STANDARD.encode(data).into_bytes(),
			Representation::UrlSafe => URL_SAFE.encode(data).into_bytes(),
			Representation::Wrapped => wrap(STANDARD.encode(data).as_bytes()),
		})
	}

	fn decoder(&self) -> Option<&dyn Decoder> {
		Some(self)
	}
}

impl Decoder for Base64 {
	fn decode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		let decoded = match representation(params)? {
			Representation::Strict => STANDARD.decode(data),
			Representation::UrlSafe => URL_SAFE.decode(data),
			Representation::Wrapped => {
				let compact: Vec<u8> = data.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
				LENIENT.decode(compact)
			}
		};
		decoded.map_err(|e| CodecError::transform(params.codec(), e))
	}
}

/// Splits encoded text into newline-terminated lines of [`LINE_WIDTH`] characters.
fn wrap(encoded: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH + 1);
	for line in encoded.chunks(LINE_WIDTH) {
		out.extend_from_slice(line);
		out.push(b'\n');
	}
	out
}
