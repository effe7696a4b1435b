//! Codecs registered into every registry built with [`CodecRegistry::with_builtins`].
//!
//! | Symbol | Kind | Binding |
//! |--------|------|---------|
//! | `none` | `all` | factory |
//! | `zlib`, `zlib<N>` | `compressor` | factory, matcher |
//! | `brotli` | `compressor` | factory |
//! | `base64`, `strict_base64`, `urlsafe_base64` | `encoding` | factory, instances |
//! | `md4`, `md5`, `ripemd160`, `sha1`, `sha224` .. `sha512` | `digestor` | matcher |

use crate::codec::{Codec, CodecFactory};
use crate::kind::CodecKind;
use crate::param::{Options, Param};
use crate::registry::{Binding, CodecRegistry};

mod base64;
mod brotli;
mod digest;
mod plain;
mod zlib;


pub use self::base64::Base64;
pub use self::brotli::Brotli;
pub use self::digest::{Digest, DigestAlgorithm};
pub use self::plain::Plaintext;
pub use self::zlib::Zlib;

/// Registers every builtin codec into `registry`.
pub fn register_builtins(registry: &CodecRegistry) {
	registry.register("none", CodecFactory::new(Plaintext), &[]);

	registry.register("zlib", CodecFactory::new(Zlib), &[CodecKind::COMPRESSOR]);
	registry.register_matcher(CodecKind::COMPRESSOR, zlib_level);
	registry.register("brotli", CodecFactory::new(Brotli), &[CodecKind::COMPRESSOR]);

	registry.register("base64", CodecFactory::new(Base64), &[CodecKind::ENCODING]);
	for (symbol, representation) in [("strict_base64", "strict"), ("urlsafe_base64", "urlsafe")] {
		let codec = Codec::new(symbol, Base64)
			.with_options(&Options::new().with("representation", representation));
		registry.register(symbol, codec, &[CodecKind::ENCODING]);
	}

	registry.register_matcher(CodecKind::DIGESTOR, digest_family);
}

/// `zlib<N>`: zlib at a fixed level, clamped to 9.
fn zlib_level(symbol: &str) -> Option<Binding> {
	let digits = symbol.strip_prefix("zlib")?;
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	let level = match digits.parse::<u64>() {
		Ok(0) => return None,
		Ok(n) => n.min(9),
		Err(_) => 9,
	};
	let codec = Codec::new(symbol, Zlib)
		.with_options(&Options::new().with("level", Param::Int(level as i64)));
	Some(Binding::Instance(codec))
}

fn digest_family(symbol: &str) -> Option<Binding> {
	let algorithm = DigestAlgorithm::from_name(symbol)?;
	let factory = CodecFactory::new(Digest).pinned(Options::new().with("algorithm", algorithm.name()));
	Some(Binding::Factory(factory))
}
