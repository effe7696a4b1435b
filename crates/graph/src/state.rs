//! Per-record lazy recomputation and change-tracking state.
//!
//! # Mental Model
//!
//! Each attribute is either `CURRENT` (no pending producer, stored value is trustworthy) or
//! `STALE` (a producer is installed in `pending`). Presence in `pending` is the only staleness
//! marker.
//!
//! - A write calls [`RecomputeState::mark_written`], which installs producers for everything
//!   reachable from the written attribute. Nothing runs yet.
//! - A read calls [`RecomputeState::before_read`], runs the returned producer, writes the
//!   result back through the raw store, and leaves the attribute `CURRENT`. A failed or deferred
//!   producer is handed back through [`RecomputeState::reinstate`] and the attribute stays
//!   `STALE`.
//!
//! In parallel, a shadow map answers "what was this before the window's first change". Entries
//! are captured on demand by [`RecomputeState::snapshot_before_change`], first write wins, and
//! are dropped by [`RecomputeState::clear_change`] or [`RecomputeState::reset_for_new_window`].
//!
//! # Invariants
//!
//! - `mark_written` never runs a producer.
//!   - Enforced in: [`RecomputeState::mark_written`]
//!   - Tested by: [`crate::invariants::test_lazy_invalidation`]
//!   - Failure symptom: every write pays the full encode cost, even when the value is never read.
//! - A snapshot is captured at most once per window.
//!   - Enforced in: [`RecomputeState::snapshot_before_change`]
//!   - Tested by: [`crate::invariants::test_snapshot_first_write_wins`]
//!   - Failure symptom: `was` reports an intermediate value instead of the window's original.
//! - A failed producer leaves its attribute pending.
//!   - Enforced in: [`RecomputeState::reinstate`]
//!   - Tested by: [`crate::invariants::test_failed_producer_stays_stale`]
//!   - Failure symptom: a transient codec failure silently caches the stale stored value.

use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;

use crate::attr::{Attr, ComponentId};
use crate::producer::Producer;
use crate::schema::{Linked, Schema};
use crate::store::AttributeStore;

/// Lazy recompute state owned by one record instance.
pub struct RecomputeState<R: ?Sized> {
	schema: Arc<Schema<R>>,
	pending: IndexMap<Attr, Producer<R>>,
	/// Producers most recently installed per component in this window.
	last_linked: Linked<R>,
	/// `last_linked` as of the previous window boundary.
	previous_linked: Linked<R>,
	/// Previous-value producers captured while the attribute was still stale.
	shadow_pending: IndexMap<Attr, Producer<R>>,
	/// Previous values captured from the store.
	shadow_values: IndexMap<Attr, Option<Bytes>>,
}

impl<R: ?Sized> RecomputeState<R> {
	/// Creates state with every seed producer pending.
	pub fn new(schema: Arc<Schema<R>>) -> Self {
		let pending = schema
			.seeds()
			.map(|(attr, producer)| (attr.clone(), producer.clone()))
			.collect();
		Self {
			schema,
			pending,
			last_linked: IndexMap::new(),
			previous_linked: IndexMap::new(),
			shadow_pending: IndexMap::new(),
			shadow_values: IndexMap::new(),
		}
	}

	pub fn schema(&self) -> &Arc<Schema<R>> {
		&self.schema
	}

	/// Takes the pending producer for `attr`, if the attribute is stale.
	///
	/// The caller runs it, writes the result back through the raw store, and hands it back to
	/// [`Self::reinstate`] if it failed or deferred.
	pub fn before_read(&mut self, attr: &str) -> Option<Producer<R>> {
		self.pending.shift_remove(attr)
	}

	/// Returns a producer taken by [`Self::before_read`] that did not complete. A producer
	/// installed in the meantime by a newer write is kept instead.
	pub fn reinstate(&mut self, attr: &str, producer: Producer<R>) {
		self.pending.entry(Attr::new(attr)).or_insert(producer);
	}

	pub fn is_pending(&self, attr: &str) -> bool {
		self.pending.contains_key(attr)
	}

	/// Stale attributes, in the order they became stale.
	pub fn pending(&self) -> impl Iterator<Item = &Attr> {
		self.pending.keys()
	}

	/// Invalidates everything reachable from `attr` after it was written.
	///
	/// With `tracked`, each dependent's pre-write value is snapshotted before its new producer
	/// replaces any older one.
	pub fn mark_written<S>(&mut self, attr: &str, store: &S, tracked: bool)
	where
		S: AttributeStore + ?Sized,
	{
		let linked = self.schema.linked_attributes(attr);
		self.pending.shift_remove(attr);

		for (component, producers) in linked {
			for (target, producer) in &producers {
				if tracked {
					self.snapshot_before_change(target, store);
				}
				self.pending.insert(target.clone(), producer.clone());
			}
			tracing::trace!(attr, %component, targets = producers.len(), "invalidated component");
			self.last_linked.insert(component, producers);
		}
	}

	/// Captures the previous value of `attr` unless this window already has one.
	///
	/// A stale attribute stores its pending producer so the previous value can be computed on
	/// demand. Otherwise the stored value is cloned. A failed store read leaves no snapshot.
	pub fn snapshot_before_change<S>(&mut self, attr: &str, store: &S)
	where
		S: AttributeStore + ?Sized,
	{
		if self.has_change(attr) {
			return;
		}
		if let Some(producer) = self.pending.get(attr) {
			self.shadow_pending.insert(Attr::new(attr), producer.clone());
			return;
		}
		match store.read_raw(attr) {
			Ok(value) => {
				self.shadow_values.insert(Attr::new(attr), value);
			}
			Err(error) => {
				tracing::debug!(attr, %error, "no previous value available");
			}
		}
	}

	/// Whether `attr` has a snapshot in this window.
	pub fn has_change(&self, attr: &str) -> bool {
		self.shadow_pending.contains_key(attr) || self.shadow_values.contains_key(attr)
	}

	/// Takes the previous-value producer for `attr`, to be run with the previous variant.
	pub fn take_previous_producer(&mut self, attr: &str) -> Option<Producer<R>> {
		self.shadow_pending.shift_remove(attr)
	}

	/// Returns a previous-value producer that failed to run.
	pub fn restore_previous_producer(&mut self, attr: &str, producer: Producer<R>) {
		if !self.shadow_values.contains_key(attr) {
			self.shadow_pending.entry(Attr::new(attr)).or_insert(producer);
		}
	}

	/// Stores the computed previous value of `attr`.
	pub fn record_previous(&mut self, attr: &str, value: Option<Bytes>) {
		self.shadow_pending.shift_remove(attr);
		self.shadow_values.insert(Attr::new(attr), value);
	}

	/// The captured previous value, if one was captured as a value.
	pub fn previous_value(&self, attr: &str) -> Option<&Option<Bytes>> {
		self.shadow_values.get(attr)
	}

	/// Forgets any snapshot of `attr`.
	pub fn clear_change(&mut self, attr: &str) {
		self.shadow_pending.shift_remove(attr);
		self.shadow_values.shift_remove(attr);
	}

	/// Closes the current tracking window.
	pub fn reset_for_new_window(&mut self) {
		self.previous_linked = std::mem::take(&mut self.last_linked);
		self.shadow_pending.clear();
		self.shadow_values.clear();
	}

	/// Attributes with a snapshot in this window, in capture order.
	pub fn changed_attributes(&self) -> Vec<&Attr> {
		let mut out: Vec<&Attr> = self.shadow_pending.keys().collect();
		out.extend(self.shadow_values.keys().filter(|a| !self.shadow_pending.contains_key(*a)));
		out
	}

	/// Producers last installed for `component` in this window.
	pub fn last_linked(&self, component: ComponentId) -> Option<&IndexMap<Attr, Producer<R>>> {
		self.last_linked.get(&component)
	}

	/// Producers installed for `component` during the previous window.
	pub fn previous_window_links(&self, component: ComponentId) -> Option<&IndexMap<Attr, Producer<R>>> {
		self.previous_linked.get(&component)
	}
}

impl<R: ?Sized> std::fmt::Debug for RecomputeState<R> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RecomputeState")
			.field("pending", &self.pending.keys().collect::<Vec<_>>())
			.field("last_linked", &self.last_linked.keys().collect::<Vec<_>>())
			.field("shadow_pending", &self.shadow_pending.keys().collect::<Vec<_>>())
			.field("shadow_values", &self.shadow_values)
			.finish()
	}
}
