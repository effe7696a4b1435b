#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Process-wide codec registry.
//!
//! # Purpose
//!
//! Maps a short symbol (optionally scoped by a [`CodecKind`]) to a codec binding, and resolves
//! symbols, factories or ready instances into configured [`Codec`]s.
//!
//! # Mental Model
//!
//! 1. **Registration phase:** builtins and extensions call [`CodecRegistry::register`] and
//!    [`CodecRegistry::register_matcher`]. Every registration is also published under
//!    [`CodecKind::ALL`].
//! 2. **Publication:** each registration builds an extended [`Snapshot`] and swaps it in.
//! 3. **Consumption:** [`CodecRegistry::resolve`] loads the current snapshot and walks the
//!    precedence tiers.
//!
//! # Precedence Contract
//!
//! Lookup for `(symbol, kind)` tries, highest first:
//! 1. **Exact:** concrete binding under `kind` (last registration wins).
//! 2. **Matcher:** matchers under `kind`, most recently registered first.
//! 3. **AllExact:** concrete binding under `all`.
//! 4. **AllMatcher:** matchers under `all`, most recently registered first.
//!
//! Tiers 1 and 2 are skipped when `kind` is `all`. A matcher never overrides a concrete
//! binding in the same scope.
//!
//! - Enforced in: [`CodecRegistry::lookup`]
//! - Tested by: [`crate::registry::invariants::test_exact_beats_matcher_in_same_kind`],
//!   [`crate::registry::invariants::test_kind_matcher_beats_all_exact`]
//! - Failure symptom: a narrower codec is shadowed by a catch-all family, or `NotFound` for a
//!   symbol registered only under `all`.
//!
//! # Concurrency
//!
//! - **Reads:** wait-free (atomic load of the current snapshot).
//! - **Writes:** CAS retry loop; registration is expected to finish before concurrent reads
//!   begin, but concurrent registrations are still linearizable.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use crate::chain::CodecChain;
use crate::codec::{Codec, CodecFactory};
use crate::error::CodecError;
use crate::kind::CodecKind;
use crate::param::{AuxInputs, Options};

mod snapshot;

pub use snapshot::{Binding, Matcher, Snapshot};

#[cfg(any(test, doc))]
pub(crate) mod invariants;

#[cfg(test)]
mod tests;

/// The precedence tier a lookup was answered from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
	Exact,
	Matcher,
	AllExact,
	AllMatcher,
}

/// Input to [`CodecRegistry::resolve`].
#[derive(Clone, Debug)]
pub enum CodecSpec {
	Symbol(String),
	Factory(CodecFactory),
	Instance(Codec),
}

impl From<&str> for CodecSpec {
	fn from(symbol: &str) -> Self {
		Self::Symbol(symbol.to_string())
	}
}

impl From<String> for CodecSpec {
	fn from(symbol: String) -> Self {
		Self::Symbol(symbol)
	}
}

impl From<CodecFactory> for CodecSpec {
	fn from(factory: CodecFactory) -> Self {
		Self::Factory(factory)
	}
}

impl From<Codec> for CodecSpec {
	fn from(codec: Codec) -> Self {
		Self::Instance(codec)
	}
}

/// Registry wrapper publishing immutable [`Snapshot`]s.
pub struct CodecRegistry {
	snap: ArcSwap<Snapshot>,
}

impl Default for CodecRegistry {
	fn default() -> Self {
		Self::empty()
	}
}

impl CodecRegistry {
	/// Creates a registry with no bindings.
	pub fn empty() -> Self {
		Self {
			snap: ArcSwap::from_pointee(Snapshot::default()),
		}
	}

	/// Creates a registry preloaded with the builtin codecs.
	pub fn with_builtins() -> Self {
		let registry = Self::empty();
		crate::builtins::register_builtins(&registry);
		registry
	}

	/// Returns the current snapshot.
	pub fn snapshot(&self) -> Arc<Snapshot> {
		self.snap.load_full()
	}

	/// Binds `symbol` under each of `kinds` and under `all`.
	pub fn register(&self, symbol: &str, binding: impl Into<Binding>, kinds: &[CodecKind]) {
		let binding = binding.into();
		self.publish(|next| next.bind_symbol(symbol, &binding, kinds));
		tracing::debug!(symbol, ?kinds, "registered codec");
	}

	/// Adds a catch-all matcher under `kind` and under `all`.
	pub fn register_matcher(
		&self,
		kind: CodecKind,
		matcher: impl Fn(&str) -> Option<Binding> + Send + Sync + 'static,
	) {
		let matcher = Matcher::new(matcher);
		self.publish(|next| next.push_matcher(&kind, &matcher));
		tracing::debug!(%kind, "registered codec matcher");
	}

	fn publish(&self, extend: impl Fn(&mut Snapshot)) {
		loop {
			let old = self.snap.load_full();
			let mut next = Snapshot::clone(&old);
			extend(&mut next);

			let prev = self.snap.compare_and_swap(&old, Arc::new(next));
			if Arc::ptr_eq(&prev, &old) {
				return;
			}
			// CAS failed, retry against the newer snapshot
		}
	}

	/// Finds the binding for `symbol`, walking the precedence tiers.
	pub fn lookup(&self, symbol: &str, kind: &CodecKind) -> Result<(Binding, Tier), CodecError> {
		let snap = self.snap.load();

		if !kind.is_all()
			&& let Some(table) = snap.table(kind)
		{
			if let Some(binding) = table.exact(symbol) {
				tracing::trace!(symbol, %kind, tier = ?Tier::Exact, "codec lookup");
				return Ok((binding.clone(), Tier::Exact));
			}
			if let Some(binding) = table.matched(symbol) {
				tracing::trace!(symbol, %kind, tier = ?Tier::Matcher, "codec lookup");
				return Ok((binding, Tier::Matcher));
			}
		}

		if let Some(table) = snap.table(&CodecKind::ALL) {
			if let Some(binding) = table.exact(symbol) {
				tracing::trace!(symbol, %kind, tier = ?Tier::AllExact, "codec lookup");
				return Ok((binding.clone(), Tier::AllExact));
			}
			if let Some(binding) = table.matched(symbol) {
				tracing::trace!(symbol, %kind, tier = ?Tier::AllMatcher, "codec lookup");
				return Ok((binding, Tier::AllMatcher));
			}
		}

		Err(CodecError::NotFound {
			symbol: symbol.to_string(),
			kind: kind.clone(),
		})
	}

	/// Resolves a symbol, factory or instance into a configured codec.
	///
	/// Instances (given directly or bound to the symbol) are returned unchanged; factories are
	/// instantiated with `config` and `inputs`. An unregistered factory is named after its
	/// transform type.
	pub fn resolve(
		&self,
		spec: impl Into<CodecSpec>,
		kind: &CodecKind,
		inputs: &AuxInputs,
		config: &Options,
	) -> Result<Codec, CodecError> {
		match spec.into() {
			CodecSpec::Instance(codec) => Ok(codec),
			CodecSpec::Factory(factory) => {
				let symbol = factory.transform_name();
				Ok(factory.instantiate(&symbol, config, inputs))
			}
			CodecSpec::Symbol(symbol) => match self.lookup(&symbol, kind)?.0 {
				Binding::Instance(codec) => Ok(codec),
				Binding::Factory(factory) => Ok(factory.instantiate(&symbol, config, inputs)),
			},
		}
	}

	/// Resolves every spec and composes them into a chain.
	pub fn resolve_chain<I>(
		&self,
		specs: I,
		kind: &CodecKind,
		inputs: &AuxInputs,
		config: &Options,
	) -> Result<CodecChain, CodecError>
	where
		I: IntoIterator,
		I::Item: Into<CodecSpec>,
	{
		specs
			.into_iter()
			.map(|spec| self.resolve(spec, kind, inputs, config))
			.collect::<Result<Vec<_>, _>>()
			.map(CodecChain::new)
	}
}

static GLOBAL: LazyLock<CodecRegistry> = LazyLock::new(CodecRegistry::with_builtins);

/// The process-wide registry, preloaded with the builtin codecs.
pub fn global() -> &'static CodecRegistry {
	&GLOBAL
}

/// Registers `symbol` in the process-wide registry.
pub fn register(symbol: &str, binding: impl Into<Binding>, kinds: &[CodecKind]) {
	global().register(symbol, binding, kinds);
}

/// Registers a matcher in the process-wide registry.
pub fn register_matcher(
	kind: CodecKind,
	matcher: impl Fn(&str) -> Option<Binding> + Send + Sync + 'static,
) {
	global().register_matcher(kind, matcher);
}

/// Resolves through the process-wide registry.
pub fn resolve(
	spec: impl Into<CodecSpec>,
	kind: &CodecKind,
	inputs: &AuxInputs,
	config: &Options,
) -> Result<Codec, CodecError> {
	global().resolve(spec, kind, inputs, config)
}
