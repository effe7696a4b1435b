use md4::Md4;
use md5::Md5;
use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::codec::{Params, Transform};
use crate::error::CodecError;

/// Supported digest algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestAlgorithm {
	Md4,
	Md5,
	Ripemd160,
	Sha1,
	Sha224,
	Sha256,
	Sha384,
	Sha512,
}

impl DigestAlgorithm {
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"md4" => Some(Self::Md4),
			"md5" => Some(Self::Md5),
			"ripemd160" => Some(Self::Ripemd160),
			"sha1" => Some(Self::Sha1),
			"sha224" => Some(Self::Sha224),
			"sha256" => Some(Self::Sha256),
			"sha384" => Some(Self::Sha384),
			"sha512" => Some(Self::Sha512),
			_ => None,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Md4 => "md4",
			Self::Md5 => "md5",
			Self::Ripemd160 => "ripemd160",
			Self::Sha1 => "sha1",
			Self::Sha224 => "sha224",
			Self::Sha256 => "sha256",
			Self::Sha384 => "sha384",
			Self::Sha512 => "sha512",
		}
	}

	/// Digest length in bytes.
	pub fn output_len(self) -> usize {
		match self {
			Self::Md4 | Self::Md5 => 16,
			Self::Ripemd160 | Self::Sha1 => 20,
			Self::Sha224 => 28,
			Self::Sha256 => 32,
			Self::Sha384 => 48,
			Self::Sha512 => 64,
		}
	}

	fn digest(self, parts: &[&[u8]]) -> Vec<u8> {
		fn run<D: sha2::Digest>(parts: &[&[u8]]) -> Vec<u8> {
			let mut hasher = D::new();
			for part in parts.iter().copied() {
				hasher.update(part);
			}
			hasher.finalize().to_vec()
		}
		match self {
			Self::Md4 => run::<Md4>(parts),
			Self::Md5 => run::<Md5>(parts),
			Self::Ripemd160 => run::<Ripemd160>(parts),
			Self::Sha1 => run::<Sha1>(parts),
			Self::Sha224 => run::<Sha224>(parts),
			Self::Sha256 => run::<Sha256>(parts),
			Self::Sha384 => run::<Sha384>(parts),
			Self::Sha512 => run::<Sha512>(parts),
		}
	}
}

/// One-way digest. Option `algorithm` (default `sha512`); auxiliary input `salt` is hashed
/// ahead of the data when bound.
#[derive(Debug, Default, Clone, Copy)]
pub struct Digest;

impl Transform for Digest {
	fn encode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		let algorithm = match params.option("algorithm")? {
			None => DigestAlgorithm::Sha512,
			Some(param) => param
				.as_text()
				.and_then(DigestAlgorithm::from_name)
				.ok_or_else(|| {
					CodecError::invalid_option(params.codec(), "algorithm", "unsupported digest algorithm")
				})?,
		};
		let salt = params.input("salt").map(|p| p.to_bytes());
		Ok(match salt {
			Some(salt) => algorithm.digest(&[&salt, data]),
			None => algorithm.digest(&[data]),
		})
	}

	fn auxiliary_inputs(&self) -> &'static [&'static str] {
		&["salt"]
	}
}
