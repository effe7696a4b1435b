#![allow(dead_code)]

use crate::codec::{Codec, CodecFactory, Params, Transform};
use crate::error::CodecError;
use crate::kind::CodecKind;
use crate::registry::{Binding, CodecRegistry, Tier};

#[derive(Debug)]
struct Tag(&'static str);

impl Transform for Tag {
	fn encode(&self, data: &[u8], _params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		Ok([self.0.as_bytes(), data].concat())
	}
}

fn instance(tag: &'static str) -> Binding {
	Binding::Instance(Codec::new(tag, Tag(tag)))
}

fn tag_of(registry: &CodecRegistry, symbol: &str, kind: &CodecKind) -> (String, Tier) {
	let (binding, tier) = registry.lookup(symbol, kind).expect("symbol should resolve");
	let codec = match binding {
		Binding::Instance(codec) => codec,
		Binding::Factory(factory) => factory.instantiate(symbol, &Default::default(), &Default::default()),
	};
	let out = codec
		.encode(b"", &mut crate::param::Detached)
		.expect("tag transform never fails");
	(String::from_utf8(out).expect("tags are utf-8"), tier)
}

/// Invariant: a concrete binding beats any matcher registered under the same kind.
///
/// Matchers are catch-alls for symbol families; they MUST NOT shadow an exact registration in
/// their own scope, even when registered later.
pub(crate) fn inv_exact_beats_matcher_in_same_kind() {
	let registry = CodecRegistry::empty();
	registry.register("zlib9", instance("exact"), &[CodecKind::COMPRESSOR]);
	registry.register_matcher(CodecKind::COMPRESSOR, |_| Some(instance("matcher")));

	assert_eq!(
		tag_of(&registry, "zlib9", &CodecKind::COMPRESSOR),
		("exact".to_string(), Tier::Exact)
	);
	assert_eq!(
		tag_of(&registry, "zlib9", &CodecKind::ALL),
		("exact".to_string(), Tier::AllExact)
	);
}

#[cfg_attr(test, test)]
pub(crate) fn test_exact_beats_matcher_in_same_kind() {
	inv_exact_beats_matcher_in_same_kind()
}

/// Invariant: a matcher under the requested kind beats an exact binding that only exists
/// under `all`.
pub(crate) fn inv_kind_matcher_beats_all_exact() {
	let registry = CodecRegistry::empty();
	registry.register("sha1", instance("generic"), &[]);
	registry.register_matcher(CodecKind::DIGESTOR, |symbol| {
		symbol.starts_with("sha").then(|| instance("family"))
	});

	assert_eq!(
		tag_of(&registry, "sha1", &CodecKind::DIGESTOR),
		("family".to_string(), Tier::Matcher)
	);
	// `all` sees both; the exact registration wins there.
	assert_eq!(
		tag_of(&registry, "sha1", &CodecKind::ALL),
		("generic".to_string(), Tier::AllExact)
	);
}

#[cfg_attr(test, test)]
pub(crate) fn test_kind_matcher_beats_all_exact() {
	inv_kind_matcher_beats_all_exact()
}

/// Invariant: a symbol registered under one kind is still reachable from an unrelated kind
/// through the `all` fallback.
pub(crate) fn inv_all_fallback() {
	let registry = CodecRegistry::empty();
	registry.register("base64", instance("b64"), &[CodecKind::ENCODING]);

	assert_eq!(
		tag_of(&registry, "base64", &CodecKind::COMPRESSOR),
		("b64".to_string(), Tier::AllExact)
	);

	let err = registry
		.lookup("missing", &CodecKind::COMPRESSOR)
		.expect_err("unregistered symbol");
	assert!(matches!(err, CodecError::NotFound { ref symbol, ref kind }
		if symbol == "missing" && *kind == CodecKind::COMPRESSOR));
}

#[cfg_attr(test, test)]
pub(crate) fn test_all_fallback() {
	inv_all_fallback()
}

/// Invariant: among matchers in one scope, the most recently registered is consulted first.
pub(crate) fn inv_newest_matcher_first() {
	let registry = CodecRegistry::empty();
	registry.register_matcher(CodecKind::COMPRESSOR, |_| Some(instance("old")));
	registry.register_matcher(CodecKind::COMPRESSOR, |s| {
		(s == "lz").then(|| instance("new"))
	});

	assert_eq!(tag_of(&registry, "lz", &CodecKind::COMPRESSOR).0, "new");
	// The newer matcher declines, so the older one answers.
	assert_eq!(tag_of(&registry, "other", &CodecKind::COMPRESSOR).0, "old");
}

#[cfg_attr(test, test)]
pub(crate) fn test_newest_matcher_first() {
	inv_newest_matcher_first()
}

/// Invariant: re-registering a symbol replaces the earlier binding in every scope it touches.
pub(crate) fn inv_last_registration_wins() {
	let registry = CodecRegistry::empty();
	registry.register("gz", CodecFactory::new(Tag("first")), &[CodecKind::COMPRESSOR]);
	registry.register("gz", instance("second"), &[CodecKind::COMPRESSOR]);

	assert_eq!(tag_of(&registry, "gz", &CodecKind::COMPRESSOR).0, "second");
	assert_eq!(tag_of(&registry, "gz", &CodecKind::ALL).0, "second");
}

#[cfg_attr(test, test)]
pub(crate) fn test_last_registration_wins() {
	inv_last_registration_wins()
}
