//! Shared helpers for record integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use codify_codec::{CodecError, Decoder, Params, Transform};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn b(value: &str) -> Option<Bytes> {
	Some(Bytes::copy_from_slice(value.as_bytes()))
}

/// Uppercases on encode, lowercases on decode, and counts both.
#[derive(Debug, Default)]
pub struct Counting {
	pub encodes: Arc<AtomicUsize>,
	pub decodes: Arc<AtomicUsize>,
}

impl Counting {
	pub fn encodes(&self) -> usize {
		self.encodes.load(Ordering::SeqCst)
	}

	pub fn decodes(&self) -> usize {
		self.decodes.load(Ordering::SeqCst)
	}

	/// A transform sharing this instance's counters.
	pub fn handle(&self) -> Self {
		Self {
			encodes: Arc::clone(&self.encodes),
			decodes: Arc::clone(&self.decodes),
		}
	}
}

impl Transform for Counting {
	fn encode(&self, data: &[u8], _params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		self.encodes.fetch_add(1, Ordering::SeqCst);
		Ok(data.to_ascii_uppercase())
	}

	fn decoder(&self) -> Option<&dyn Decoder> {
		Some(self)
	}
}

impl Decoder for Counting {
	fn decode(&self, data: &[u8], _params: &mut Params<'_>) -> Result<Vec<u8>, CodecError> {
		self.decodes.fetch_add(1, Ordering::SeqCst);
		Ok(data.to_ascii_lowercase())
	}
}
