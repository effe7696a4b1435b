//! Per-type attribute dependency graph.
//!
//! # Purpose
//!
//! Declares, once per record type, which attribute produces which. Each edge carries a
//! [`ComponentId`]; all edges in one component invalidate together when any of them fires.
//!
//! # Invariants
//!
//! - [`Schema::linked_attributes`] expands each component at most once per traversal.
//!   - Enforced in: [`Schema::linked_attributes`]
//!   - Tested by: [`crate::invariants::test_cycle_safe_traversal`]
//!   - Failure symptom: writes to attributes on a cycle never return.
//! - [`Schema::register_default`] never overrides an existing classification.
//!   - Enforced in: [`Schema::register_default`]
//!   - Tested by: `schema::tests::first_classification_wins`
//!   - Failure symptom: a declared column is treated as a virtual accessor and never persisted.

use indexmap::{IndexMap, IndexSet};

use crate::attr::{Attr, ComponentId};
use crate::producer::Producer;

/// How an attribute is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttrClass {
	/// A physical, persisted column.
	Column,
	/// A virtual attribute held only in memory.
	Accessor,
	/// A virtual attribute backed by a deprecated legacy column that is read in preference.
	Shadow,
}

/// Directed edge from a source attribute to the attribute its producer computes.
pub struct Link<R: ?Sized> {
	pub component: ComponentId,
	pub producer: Producer<R>,
}

impl<R: ?Sized> Clone for Link<R> {
	fn clone(&self) -> Self {
		Self {
			component: self.component,
			producer: self.producer.clone(),
		}
	}
}

impl<R: ?Sized> std::fmt::Debug for Link<R> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Link")
			.field("component", &self.component)
			.field("producer", &self.producer)
			.finish()
	}
}

/// Dependents grouped by component: component → (target → producer).
pub type Linked<R> = IndexMap<ComponentId, IndexMap<Attr, Producer<R>>>;

/// Attribute graph shared by every record of one type.
pub struct Schema<R: ?Sized> {
	/// source → (target → link); a later link to the same target replaces the earlier one.
	edges: IndexMap<Attr, IndexMap<Attr, Link<R>>>,
	/// target → producer run lazily on first read after construction.
	seeds: IndexMap<Attr, Producer<R>>,
	classes: IndexMap<Attr, AttrClass>,
	protected: IndexSet<Attr>,
	next_component: u32,
}

impl<R: ?Sized> Default for Schema<R> {
	fn default() -> Self {
		Self {
			edges: IndexMap::new(),
			seeds: IndexMap::new(),
			classes: IndexMap::new(),
			protected: IndexSet::new(),
			next_component: 0,
		}
	}
}

impl<R: ?Sized> Schema<R> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Allocates a fresh component id.
	pub fn component(&mut self) -> ComponentId {
		self.next_component += 1;
		ComponentId(self.next_component)
	}

	/// Records an edge `set → get`. Allocates a component when none is given and returns the
	/// one used, so callers can add further edges to the same group.
	pub fn link(
		&mut self,
		set: impl Into<Attr>,
		get: impl Into<Attr>,
		component: Option<ComponentId>,
		seed: bool,
		producer: Producer<R>,
	) -> ComponentId {
		let component = component.unwrap_or_else(|| self.component());
		let (set, get) = (set.into(), get.into());
		if seed {
			self.seeds.insert(get.clone(), producer.clone());
		}
		tracing::trace!(%set, %get, %component, seed, "link attributes");
		self.edges
			.entry(set)
			.or_default()
			.insert(get, Link { component, producer });
		component
	}

	/// Direct outgoing edges of `attr`.
	pub fn edges_from(&self, attr: &str) -> Option<&IndexMap<Attr, Link<R>>> {
		self.edges.get(attr)
	}

	/// Breadth-first closure of everything reachable from `attr`, grouped by component.
	///
	/// Each hop merges the outgoing edges of the whole frontier (later sources override earlier
	/// ones for the same target), drops edges whose component was absorbed by an earlier hop,
	/// and continues from the deduplicated set of new targets.
	pub fn linked_attributes(&self, attr: &str) -> Linked<R> {
		let mut out: Linked<R> = IndexMap::new();
		let mut frontier: Vec<&Attr> = match self.edges.get_key_value(attr) {
			Some((key, _)) => vec![key],
			None => return out,
		};

		while !frontier.is_empty() {
			let mut merged: IndexMap<&Attr, &Link<R>> = IndexMap::new();
			for source in &frontier {
				for (target, link) in self.edges.get(*source).into_iter().flatten() {
					merged.insert(target, link);
				}
			}

			let mut hop: Linked<R> = IndexMap::new();
			let mut next: Vec<&Attr> = Vec::new();
			for (target, link) in merged {
				if out.contains_key(&link.component) {
					continue;
				}
				hop.entry(link.component)
					.or_default()
					.insert(target.clone(), link.producer.clone());
				if !next.contains(&target) {
					next.push(target);
				}
			}
			out.extend(hop);
			frontier = next;
		}
		out
	}

	/// Seed producers, keyed by the attribute they compute.
	pub fn seeds(&self) -> impl Iterator<Item = (&Attr, &Producer<R>)> {
		self.seeds.iter()
	}

	/// Sets the classification of `attr`, replacing any earlier one.
	pub fn register(&mut self, attr: impl Into<Attr>, class: AttrClass) {
		self.classes.insert(attr.into(), class);
	}

	/// Classifies `attr` unless it already has a classification. Returns whether it applied.
	pub fn register_default(&mut self, attr: impl Into<Attr>, class: AttrClass) -> bool {
		match self.classes.entry(attr.into()) {
			indexmap::map::Entry::Occupied(_) => false,
			indexmap::map::Entry::Vacant(slot) => {
				slot.insert(class);
				true
			}
		}
	}

	pub fn classification(&self, attr: &str) -> Option<AttrClass> {
		self.classes.get(attr).copied()
	}

	/// Registered attributes in declaration order.
	pub fn registered(&self) -> impl Iterator<Item = (&Attr, AttrClass)> {
		self.classes.iter().map(|(attr, class)| (attr, *class))
	}

	/// Marks `attr` as writable only through its links.
	pub fn protect(&mut self, attr: impl Into<Attr>) {
		self.protected.insert(attr.into());
	}

	pub fn is_protected(&self, attr: &str) -> bool {
		self.protected.contains(attr)
	}
}

impl<R: ?Sized> std::fmt::Debug for Schema<R> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Schema")
			.field("edges", &self.edges)
			.field("seeds", &self.seeds.keys().collect::<Vec<_>>())
			.field("classes", &self.classes)
			.field("protected", &self.protected)
			.finish()
	}
}

#[cfg(test)]
mod tests;
