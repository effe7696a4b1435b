use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::codec::{Params, Transform};
use crate::param::{Detached, Setting};

/// Writes its `tag` option (or `-`) followed by the data.
#[derive(Debug)]
struct Tagged;

impl Transform for Tagged {
	fn encode(&self, data: &[u8], params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		let tag = params.option("tag")?.map(|p| p.to_bytes()).unwrap_or_default();
		let tag: &[u8] = if tag.is_empty() { b"-" } else { &tag };
		Ok([tag, data].concat())
	}

	fn auxiliary_inputs(&self) -> &'static [&'static str] {
		&["pepper"]
	}
}

fn run(codec: &Codec, data: &[u8]) -> Vec<u8> {
	codec.encode(data, &mut Detached).unwrap()
}

#[test]
fn test_noop_snapshot_stability() {
	let registry = CodecRegistry::empty();
	registry.register("t", CodecFactory::new(Tagged), &[]);

	let before = registry.snapshot();
	let after = registry.snapshot();
	assert!(Arc::ptr_eq(&before, &after));

	registry.register("u", CodecFactory::new(Tagged), &[]);
	let published = registry.snapshot();
	assert!(!Arc::ptr_eq(&before, &published));
	// Old readers keep their view.
	assert!(!before.contains(&CodecKind::ALL, "u"));
	assert!(published.contains(&CodecKind::ALL, "u"));
}

#[test]
fn test_registration_publishes_under_all() {
	let registry = CodecRegistry::empty();
	registry.register("t", CodecFactory::new(Tagged), &[CodecKind::ENCODING]);

	let snap = registry.snapshot();
	assert!(snap.contains(&CodecKind::ENCODING, "t"));
	assert!(snap.contains(&CodecKind::ALL, "t"));
	assert!(!snap.contains(&CodecKind::COMPRESSOR, "t"));
}

#[test]
fn test_factory_receives_configuration() {
	let registry = CodecRegistry::empty();
	registry.register("t", CodecFactory::new(Tagged), &[]);

	let config = Options::new().with("tag", "x:");
	let codec = registry
		.resolve("t", &CodecKind::ALL, &AuxInputs::None, &config)
		.unwrap();
	assert_eq!(codec.symbol(), "t");
	assert_eq!(run(&codec, b"data"), b"x:data");
}

#[test]
fn test_bound_instance_ignores_configuration() {
	let registry = CodecRegistry::empty();
	let preset = Codec::new("t", Tagged).with_options(&Options::new().with("tag", "preset:"));
	registry.register("t", preset, &[]);

	let config = Options::new().with("tag", "ignored:");
	let codec = registry
		.resolve("t", &CodecKind::ALL, &AuxInputs::None, &config)
		.unwrap();
	assert_eq!(run(&codec, b"data"), b"preset:data");
}

#[test]
fn test_instance_spec_passes_through() {
	let registry = CodecRegistry::empty();
	let codec = Codec::new("own", Tagged);
	let resolved = registry
		.resolve(codec, &CodecKind::COMPRESSOR, &AuxInputs::None, &Options::new())
		.unwrap();
	assert_eq!(resolved.symbol(), "own");
}

#[test]
fn test_factory_spec_needs_no_registration() {
	let registry = CodecRegistry::empty();
	let codec = registry
		.resolve(
			CodecFactory::new(Tagged),
			&CodecKind::ALL,
			&AuxInputs::None,
			&Options::new().with("tag", "f:"),
		)
		.unwrap();
	assert_eq!(run(&codec, b"1"), b"f:1");
	assert_eq!(codec.symbol(), "Tagged");
}

#[test]
fn test_unregistered_factory_errors_name_the_transform() {
	let registry = CodecRegistry::empty();
	let codec = registry
		.resolve(
			CodecFactory::new(Tagged),
			&CodecKind::ALL,
			&AuxInputs::None,
			&Options::new(),
		)
		.unwrap();
	let err = codec.decode(b"x", &mut Detached).unwrap_err();
	assert_eq!(err.to_string(), "codec `Tagged` cannot decode");
}

#[test]
fn test_undeclared_inputs_are_dropped() {
	let registry = CodecRegistry::empty();
	registry.register("t", CodecFactory::new(Tagged), &[]);

	let inputs = AuxInputs::named(
		Options::new()
			.with("pepper", "p")
			.with("salt", Setting::attribute("salt")),
	);
	let codec = registry
		.resolve("t", &CodecKind::ALL, &inputs, &Options::new())
		.unwrap();
	assert_eq!(codec.auxiliary_keys().collect::<Vec<_>>(), vec!["pepper"]);
	assert_eq!(codec.input_attributes().count(), 0);
}

#[test]
fn test_positional_inputs_pair_with_declared_names() {
	let registry = CodecRegistry::empty();
	registry.register("t", CodecFactory::new(Tagged), &[]);

	let inputs = AuxInputs::positional([Setting::attribute("secret"), Setting::fixed("extra")]);
	let codec = registry
		.resolve("t", &CodecKind::ALL, &inputs, &Options::new())
		.unwrap();
	assert_eq!(codec.auxiliary_keys().collect::<Vec<_>>(), vec!["pepper"]);
	assert_eq!(codec.input_attributes().collect::<Vec<_>>(), vec!["secret"]);
	assert!(codec.depends_on_record());
}

#[test]
fn test_resolve_chain_preserves_order_and_fails_fast() {
	let registry = CodecRegistry::empty();
	registry.register("a", Codec::new("a", Tagged).with_options(&Options::new().with("tag", "a")), &[]);
	registry.register("b", Codec::new("b", Tagged).with_options(&Options::new().with("tag", "b")), &[]);

	let chain = registry
		.resolve_chain(["a", "b"], &CodecKind::ALL, &AuxInputs::None, &Options::new())
		.unwrap();
	assert_eq!(chain.encode_detached(Some(b"!")).unwrap().unwrap(), &b"ba!"[..]);

	let err = registry
		.resolve_chain(["a", "nope"], &CodecKind::ENCODING, &AuxInputs::None, &Options::new())
		.unwrap_err();
	assert_eq!(err.to_string(), ":nope codec of kind :encoding not found");
}

#[test]
fn test_concurrent_registration_keeps_every_symbol() {
	let registry = Arc::new(CodecRegistry::empty());
	let handles: Vec<_> = (0..8)
		.map(|i| {
			let registry = Arc::clone(&registry);
			std::thread::spawn(move || {
				for j in 0..16 {
					registry.register(&format!("s{i}_{j}"), CodecFactory::new(Tagged), &[]);
				}
			})
		})
		.collect();
	for handle in handles {
		handle.join().unwrap();
	}

	let snap = registry.snapshot();
	for i in 0..8 {
		for j in 0..16 {
			assert!(snap.contains(&CodecKind::ALL, &format!("s{i}_{j}")));
		}
	}
}

#[test]
fn test_global_registry_has_builtins() {
	let snap = global().snapshot();
	for symbol in ["none", "zlib", "brotli", "base64", "strict_base64", "urlsafe_base64"] {
		assert!(snap.contains(&CodecKind::ALL, symbol), "{symbol} missing");
	}
	assert!(global().lookup("zlib7", &CodecKind::COMPRESSOR).is_ok());
	assert!(global().lookup("sha256", &CodecKind::DIGESTOR).is_ok());
}
