//! Immutable registry tables published through the runtime registry.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap as HashMap;

use crate::codec::{Codec, CodecFactory};
use crate::kind::CodecKind;

/// What a symbol resolves to before configuration is applied.
#[derive(Clone, Debug)]
pub enum Binding {
	/// A preconfigured codec, returned as-is.
	Instance(Codec),
	/// A codec type, instantiated with the caller's configuration.
	Factory(CodecFactory),
}

impl From<Codec> for Binding {
	fn from(codec: Codec) -> Self {
		Self::Instance(codec)
	}
}

impl From<CodecFactory> for Binding {
	fn from(factory: CodecFactory) -> Self {
		Self::Factory(factory)
	}
}

/// Catch-all lookup for an open-ended family of symbols.
#[derive(Clone)]
pub struct Matcher(Arc<dyn Fn(&str) -> Option<Binding> + Send + Sync>);

impl Matcher {
	pub fn new(f: impl Fn(&str) -> Option<Binding> + Send + Sync + 'static) -> Self {
		Self(Arc::new(f))
	}

	#[inline]
	pub fn try_match(&self, symbol: &str) -> Option<Binding> {
		(self.0)(symbol)
	}
}

impl fmt::Debug for Matcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Matcher(..)")
	}
}

/// Bindings scoped to one [`CodecKind`].
#[derive(Clone, Debug, Default)]
pub(crate) struct KindTable {
	pub(crate) symbols: HashMap<Arc<str>, Binding>,
	/// In registration order; consulted newest first.
	pub(crate) matchers: Vec<Matcher>,
}

impl KindTable {
	pub(crate) fn exact(&self, symbol: &str) -> Option<&Binding> {
		self.symbols.get(symbol)
	}

	pub(crate) fn matched(&self, symbol: &str) -> Option<Binding> {
		self.matchers.iter().rev().find_map(|m| m.try_match(symbol))
	}
}

/// Current state of a codec registry.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
	pub(crate) kinds: HashMap<CodecKind, KindTable>,
}

impl Snapshot {
	pub(crate) fn table(&self, kind: &CodecKind) -> Option<&KindTable> {
		self.kinds.get(kind)
	}

	/// Kinds that hold at least one binding or matcher.
	pub fn kinds(&self) -> impl Iterator<Item = &CodecKind> {
		self.kinds.keys()
	}

	/// Whether `symbol` has a concrete binding under `kind`.
	pub fn contains(&self, kind: &CodecKind, symbol: &str) -> bool {
		self.table(kind).is_some_and(|t| t.symbols.contains_key(symbol))
	}

	pub(crate) fn bind_symbol(&mut self, symbol: &str, binding: &Binding, kinds: &[CodecKind]) {
		let symbol: Arc<str> = Arc::from(symbol);
		for kind in scoped(kinds) {
			self.kinds
				.entry(kind)
				.or_default()
				.symbols
				.insert(Arc::clone(&symbol), binding.clone());
		}
	}

	pub(crate) fn push_matcher(&mut self, kind: &CodecKind, matcher: &Matcher) {
		for kind in scoped(std::slice::from_ref(kind)) {
			self.kinds.entry(kind).or_default().matchers.push(matcher.clone());
		}
	}
}

/// The requested kinds plus `all`, without duplicates.
fn scoped(kinds: &[CodecKind]) -> Vec<CodecKind> {
	let mut out: Vec<CodecKind> = Vec::with_capacity(kinds.len() + 1);
	for kind in kinds.iter().cloned().chain(std::iter::once(CodecKind::ALL)) {
		if !out.contains(&kind) {
			out.push(kind);
		}
	}
	out
}
