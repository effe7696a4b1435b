//! End-to-end behaviour of encoded attributes on realistic models.

mod common;

use bytes::Bytes;
use codify_codec::{
	AuxInputs, CodecFactory, CodecKind, CodecRegistry, Detached, Options, Setting,
};
use codify_record::{EncoderOptions, ModelBuilder, RecordError, Row};
use common::{Counting, b, init_tracing};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn sha(symbol: &str, data: &[u8]) -> Bytes {
	let codec = codify_codec::global()
		.resolve(symbol, &CodecKind::DIGESTOR, &AuxInputs::None, &Options::new())
		.unwrap();
	Bytes::from(codec.encode(data, &mut Detached).unwrap())
}

#[test]
fn compressed_email_body_round_trips_through_storage() {
	init_tracing();
	let mut builder = ModelBuilder::new("Email");
	builder.columns(["subject", "compressed_body"]);
	builder
		.attr_compressor("body", EncoderOptions::new().codec("zlib9"))
		.unwrap();
	let model = builder.build();

	let body = "Hello from the mailroom. ".repeat(40);
	let mut email = model.new_record();
	email.set("subject", b("hi")).unwrap();
	email.set("body", b(&body)).unwrap();

	let row = email.save().unwrap();
	let stored = row["compressed_body"].clone().unwrap();
	assert!(stored.len() < body.len());
	assert_eq!(model.invoke("compress_body", Some(body.as_bytes())).unwrap(), Some(stored.clone()));
	assert_eq!(model.invoke("uncompress_body", Some(&stored[..])).unwrap(), b(&body));

	let mut reloaded = model.load(row).unwrap();
	assert_eq!(reloaded.get("body").unwrap(), b(&body));
	assert_eq!(reloaded.get("subject").unwrap(), b("hi"));
}

#[test]
fn compressed_then_base64_is_printable() {
	let mut builder = ModelBuilder::new("Attachment");
	builder.column("compressed_payload");
	builder
		.attr_compressor(
			"payload",
			EncoderOptions::new().codec("zlib").codec("strict_base64"),
		)
		.unwrap();
	let model = builder.build();

	let mut attachment = model.new_record();
	attachment.set("payload", b("binary-ish payload")).unwrap();
	let stored = attachment.get("compressed_payload").unwrap().unwrap();
	assert!(stored.iter().all(|c| c.is_ascii_graphic()));

	let row: Row = [("compressed_payload".to_string(), Some(stored))].into_iter().collect();
	let mut reloaded = model.load(row).unwrap();
	assert_eq!(reloaded.get("payload").unwrap(), b("binary-ish payload"));
}

#[rstest]
#[case("base64", "c2VjcmV0\n")]
#[case("strict_base64", "c2VjcmV0")]
#[case("urlsafe_base64", "c2VjcmV0")]
fn base64_token(#[case] codec: &str, #[case] expected: &str) {
	let mut builder = ModelBuilder::new("Session");
	builder.column("encoded_token");
	builder
		.attr_encoder("token", EncoderOptions::new().codec(codec))
		.unwrap();
	let model = builder.build();

	let mut session = model.new_record();
	session.set("token", b("secret")).unwrap();
	assert_eq!(session.get("encoded_token").unwrap(), b(expected));
	assert_eq!(model.invoke("decode_token", b(expected).as_deref()).unwrap(), b("secret"));
}

#[test]
fn search_digest_is_one_way() {
	let mut builder = ModelBuilder::new("Email");
	builder.column("digested_search");
	builder
		.attr_digestor("search", EncoderOptions::new().codec("sha256"))
		.unwrap();
	let model = builder.build();

	let mut email = model.new_record();
	email.set("search", b("needle")).unwrap();
	let digest = email.get("digested_search").unwrap().unwrap();
	assert_eq!(digest.len(), 32);
	assert_eq!(digest, sha("sha256", b"needle"));
	assert_eq!(model.invoke("digest_search", Some(&b"needle"[..])).unwrap(), Some(digest));

	let err = model.invoke("decode_search", Some(&b"x"[..])).unwrap_err();
	assert!(matches!(err, RecordError::UnknownMethod { .. }));
	assert_eq!(err.to_string(), "undefined method `decode_search` for Email");

	let mut reloaded = model.load(email.save().unwrap()).unwrap();
	assert_eq!(reloaded.get("search").unwrap(), None);
	assert_eq!(reloaded.get("digested_search").unwrap(), Some(sha("sha256", b"needle")));
}

#[test]
fn change_tracks_the_window_original_across_writes() {
	let mut builder = ModelBuilder::new("Email");
	builder.columns(["subject", "compressed_body"]);
	builder.attr_compressor("body", EncoderOptions::new()).unwrap();
	let model = builder.build();

	let mut email = model.new_record_with([("body", b("orig"))]).unwrap();
	let mut email = model.load(email.save().unwrap()).unwrap();

	email.set("body", b("first")).unwrap();
	assert_eq!(email.change("body").unwrap(), Some((b("orig"), b("first"))));
	email.set("body", b("second")).unwrap();
	assert_eq!(email.change("body").unwrap(), Some((b("orig"), b("second"))));
	email.set("body", b("orig")).unwrap();
	assert_eq!(email.change("body").unwrap(), None);
	assert!(!email.changed("body").unwrap());
	assert!(!email.changed_attributes().unwrap().contains(&"body"));
}

#[test]
fn salted_digest_waits_for_its_salt() {
	init_tracing();
	let mut builder = ModelBuilder::new("Account");
	builder.columns(["salt", "digested_password"]);
	builder
		.attr_digestor(
			"password",
			EncoderOptions::new().inputs(AuxInputs::named(
				Options::new().with("salt", Setting::attribute("salt")),
			)),
		)
		.unwrap();
	let model = builder.build();

	let mut account = model.new_record();
	account.set("password", b("hunter2")).unwrap();
	assert_eq!(account.get("digested_password").unwrap(), None);
	assert!(account.is_pending("digested_password"));

	account.set("salt", b("pepper")).unwrap();
	assert_eq!(
		account.get("digested_password").unwrap(),
		Some(sha("sha512", b"pepperhunter2"))
	);

	// Changing only the salt re-digests the same password.
	account.set("salt", b("paprika")).unwrap();
	assert!(account.is_pending("digested_password"));
	assert!(!account.is_pending("password"));
	assert_eq!(
		account.get("digested_password").unwrap(),
		Some(sha("sha512", b"paprikahunter2"))
	);
}

#[test]
fn encoders_run_lazily_once_per_write() {
	let counting = Counting::default();
	let registry = CodecRegistry::with_builtins();
	registry.register("shout", CodecFactory::new(counting.handle()), &[CodecKind::ENCODING]);

	let mut builder = ModelBuilder::with_registry("Token", &registry);
	builder.column("encoded_token");
	builder
		.attr_encoder(
			"token",
			EncoderOptions::new().codec("shout").kind(CodecKind::ENCODING),
		)
		.unwrap();
	let model = builder.build();

	let mut token = model.new_record();
	token.set("token", b("a")).unwrap();
	token.set("token", b("b")).unwrap();
	assert_eq!(counting.encodes(), 0);

	assert_eq!(token.get("encoded_token").unwrap(), b("B"));
	assert_eq!(token.get("encoded_token").unwrap(), b("B"));
	assert_eq!(counting.encodes(), 1);

	token.set("token", b("c")).unwrap();
	assert_eq!(token.get("encoded_token").unwrap(), b("C"));
	assert_eq!(counting.encodes(), 2);

	let row = token.save().unwrap();
	let mut reloaded = model.load(row).unwrap();
	assert_eq!(counting.decodes(), 0);
	assert_eq!(reloaded.get("token").unwrap(), b("c"));
	assert_eq!(reloaded.get("token").unwrap(), b("c"));
	assert_eq!(counting.decodes(), 1);
}

#[test]
fn writing_a_loaded_value_back_reports_no_change() {
	let mut builder = ModelBuilder::new("Email");
	builder.column("compressed_body");
	builder.attr_compressor("body", EncoderOptions::new()).unwrap();
	let model = builder.build();

	let mut fresh = model.new_record();
	fresh.set("body", None).unwrap();
	assert!(!fresh.changed("body").unwrap());

	let mut email = model.new_record_with([("body", b("orig"))]).unwrap();
	let mut email = model.load(email.save().unwrap()).unwrap();
	email.set("body", b("orig")).unwrap();
	assert!(!email.changed("body").unwrap());
	assert_eq!(email.change("body").unwrap(), None);
}

#[test]
fn protected_encoded_attribute_rejects_writes() {
	let mut builder = ModelBuilder::new("Email");
	builder.column("compressed_body").column("raw_digest");
	builder.attr_compressor("body", EncoderOptions::new()).unwrap();
	builder
		.attr_digestor("raw", EncoderOptions::new().suffix("_digest").prefix("").protect(false))
		.unwrap();
	let model = builder.build();

	let mut email = model.new_record();
	let err = email.set("compressed_body", b("x")).unwrap_err();
	assert_eq!(
		err.to_string(),
		"attribute `compressed_body` of Email is protected and cannot be written directly"
	);

	email.set("raw_digest", b("imported")).unwrap();
	assert_eq!(email.get("raw_digest").unwrap(), b("imported"));
}

#[test]
fn legacy_column_migrates_on_write() {
	let mut builder = ModelBuilder::new("Email");
	builder.columns(["body", "compressed_body"]).attr_shadow("body");
	builder.attr_compressor("body", EncoderOptions::new()).unwrap();
	let model = builder.build();

	let row: Row = [
		("body".to_string(), b("old plain text")),
		("compressed_body".to_string(), None),
	]
	.into_iter()
	.collect();
	let mut email = model.load(row).unwrap();
	assert_eq!(email.get("body").unwrap(), b("old plain text"));

	email.set("body", b("new text")).unwrap();
	assert_eq!(email.change("body").unwrap(), Some((b("old plain text"), b("new text"))));

	let saved = email.save().unwrap();
	assert_eq!(saved["body"], None);
	let mut reloaded = model.load(saved).unwrap();
	assert_eq!(reloaded.get("body").unwrap(), b("new text"));
}

#[test]
fn unknown_codec_fails_declaration() {
	let mut builder = ModelBuilder::new("Email");
	let Err(err) = builder.attr_compressor("body", EncoderOptions::new().codec("lzma")) else {
		panic!("lzma is not registered");
	};
	assert_eq!(err.to_string(), ":lzma codec of kind :compressor not found");
}
