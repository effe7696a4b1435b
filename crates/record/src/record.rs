//! Record instances.
//!
//! A [`Record`] owns its raw attribute cells and the [`RecomputeState`] that keeps encoded and
//! logical attributes consistent. All reads and writes go through one accessor pair,
//! [`Record::get`] and [`Record::set`], parameterized by attribute name.
//!
//! # Read path
//!
//! A stale attribute's producer runs on read, its result is written back through the raw store
//! (without change tracking and without enqueueing dependents, which the original write already
//! enqueued), and the attribute becomes current. A producer that defers on a missing input, or
//! fails, leaves the attribute stale.
//!
//! # Write path
//!
//! Protected attributes are rejected before any mutation. With change tracking, the attribute's
//! own previous value is snapshotted, and a write back to that value clears the change. The
//! write then invalidates every dependent.

use std::sync::Arc;

use bytes::Bytes;
use codify_codec::RecordAccess;
use codify_graph::{
	Attr, AttrClass, AttributeStore, Produced, RecomputeState, Schema, StoreError, Variant,
};
use indexmap::IndexMap;

use crate::error::RecordError;
use crate::model::Model;

/// Stored column values keyed by column name.
pub type Row = IndexMap<String, Option<Bytes>>;

/// Raw attribute storage: persisted columns and in-memory virtual attributes.
struct Cells {
	schema: Arc<Schema<Record>>,
	physical: IndexMap<Attr, Option<Bytes>>,
	virtuals: IndexMap<Attr, Option<Bytes>>,
}

impl Cells {
	fn new(model: &Model) -> Self {
		let schema = Arc::clone(model.schema());
		let physical = model.columns().map(|c| (c.clone(), None)).collect();
		let virtuals = schema
			.registered()
			.filter(|(_, class)| matches!(class, AttrClass::Accessor | AttrClass::Shadow))
			.map(|(attr, _)| (attr.clone(), None))
			.collect();
		Self {
			schema,
			physical,
			virtuals,
		}
	}

	fn is_shadow(&self, attr: &str) -> bool {
		self.schema.classification(attr) == Some(AttrClass::Shadow)
	}

	/// Whether a shadow attribute still carries a legacy column value.
	fn has_legacy(&self, attr: &str) -> bool {
		self.physical.get(attr).is_some_and(Option::is_some)
	}
}

impl AttributeStore for Cells {
	fn read_raw(&self, attr: &str) -> Result<Option<Bytes>, StoreError> {
		if self.is_shadow(attr) {
			if let Some(Some(legacy)) = self.physical.get(attr) {
				return Ok(Some(legacy.clone()));
			}
			return Ok(self.virtuals.get(attr).cloned().flatten());
		}
		self.physical
			.get(attr)
			.or_else(|| self.virtuals.get(attr))
			.cloned()
			.ok_or_else(|| StoreError::UnknownAttribute(attr.to_string()))
	}

	fn write_raw(&mut self, attr: &str, value: Option<Bytes>) -> Result<(), StoreError> {
		if self.is_shadow(attr) {
			if let Some(legacy) = self.physical.get_mut(attr) {
				*legacy = None;
			}
			self.virtuals.insert(Attr::new(attr), value);
			return Ok(());
		}
		let slot = match self.physical.get_mut(attr) {
			Some(slot) => slot,
			None => self
				.virtuals
				.get_mut(attr)
				.ok_or_else(|| StoreError::UnknownAttribute(attr.to_string()))?,
		};
		*slot = value;
		Ok(())
	}
}

/// One record of a [`Model`].
pub struct Record {
	model: Arc<Model>,
	cells: Cells,
	state: RecomputeState<Record>,
}

impl Record {
	pub(crate) fn new(model: Arc<Model>) -> Self {
		let cells = Cells::new(&model);
		let state = RecomputeState::new(Arc::clone(model.schema()));
		Self { model, cells, state }
	}

	/// Builds a record from a stored row. Shadow attributes holding a legacy value invalidate
	/// their dependents so the next save migrates them.
	pub(crate) fn load(model: Arc<Model>, row: Row) -> Result<Self, RecordError> {
		let mut record = Self::new(model);
		for (column, value) in row {
			match record.cells.physical.get_mut(column.as_str()) {
				Some(slot) => *slot = value,
				None => return Err(record.model.unknown(&column)),
			}
		}

		let legacy: Vec<Attr> = record
			.model
			.schema()
			.registered()
			.filter(|(attr, class)| *class == AttrClass::Shadow && record.cells.has_legacy(attr))
			.map(|(attr, _)| attr.clone())
			.collect();
		for attr in legacy {
			tracing::debug!(model = record.model.name(), %attr, "loaded legacy shadow value");
			record.state.mark_written(&attr, &record.cells, false);
		}
		Ok(record)
	}

	pub fn model(&self) -> &Arc<Model> {
		&self.model
	}

	fn ensure_known(&self, attr: &str) -> Result<(), RecordError> {
		if self.model.knows(attr) {
			Ok(())
		} else {
			Err(self.model.unknown(attr))
		}
	}

	/// Reads `attr`, running its pending producer first if it is stale.
	pub fn get(&mut self, attr: &str) -> Result<Option<Bytes>, RecordError> {
		self.ensure_known(attr)?;
		if let Some(producer) = self.state.before_read(attr) {
			match producer.run(self, Variant::Current) {
				Ok(Produced::Value(value)) => {
					tracing::trace!(attr, "materialized");
					self.cells.write_raw(attr, value)?;
				}
				Ok(Produced::Deferred) => {
					tracing::trace!(attr, "producer deferred");
					self.state.reinstate(attr, producer);
				}
				Err(source) => {
					self.state.reinstate(attr, producer);
					return Err(RecordError::ProducerFailure {
						attr: attr.to_string(),
						source,
					});
				}
			}
		}
		Ok(self.cells.read_raw(attr)?)
	}

	/// Writes `attr` and invalidates everything that depends on it.
	pub fn set(&mut self, attr: &str, value: Option<Bytes>) -> Result<(), RecordError> {
		self.ensure_known(attr)?;
		if self.model.schema().is_protected(attr) {
			return Err(RecordError::ProtectedAttributeWrite {
				model: self.model.name().to_string(),
				attr: attr.to_string(),
			});
		}

		let tracked = self.model.tracks_changes();
		if tracked {
			let stale = self.state.is_pending(attr);
			if stale || self.cells.read_raw(attr)? != value {
				self.state.snapshot_before_change(attr, &self.cells);
			}
			if self.state.previous_value(attr) == Some(&value) {
				self.state.clear_change(attr);
			}
		}

		self.cells.write_raw(attr, value)?;
		self.state.mark_written(attr, &self.cells, tracked);
		Ok(())
	}

	pub fn unset(&mut self, attr: &str) -> Result<(), RecordError> {
		self.set(attr, None)
	}

	/// Whether `attr` changed in the current tracking window.
	///
	/// A snapshot whose previous value equals the current one is dropped, so writing an
	/// attribute back to its value (even while it was still stale) is not a change.
	pub fn changed(&mut self, attr: &str) -> Result<bool, RecordError> {
		self.ensure_known(attr)?;
		if !self.state.has_change(attr) {
			return Ok(false);
		}
		let previous = self.was(attr)?;
		if self.state.previous_value(attr).is_none() {
			// Previous-value producer deferred; nothing to compare yet.
			return Ok(true);
		}
		if previous == self.get(attr)? {
			self.state.clear_change(attr);
			tracing::trace!(attr, "no-op change dropped");
			return Ok(false);
		}
		Ok(true)
	}

	/// The value of `attr` before the window's first change, or the current value if unchanged.
	pub fn was(&mut self, attr: &str) -> Result<Option<Bytes>, RecordError> {
		self.ensure_known(attr)?;
		if let Some(producer) = self.state.take_previous_producer(attr) {
			match producer.run(self, Variant::Previous) {
				Ok(Produced::Value(value)) => self.state.record_previous(attr, value),
				Ok(Produced::Deferred) => {
					self.state.restore_previous_producer(attr, producer);
					return Ok(None);
				}
				Err(source) => {
					self.state.restore_previous_producer(attr, producer);
					return Err(RecordError::ProducerFailure {
						attr: format!("{attr}{}", Variant::Previous.suffix()),
						source,
					});
				}
			}
		}
		match self.state.previous_value(attr) {
			Some(previous) => Ok(previous.clone()),
			None => self.get(attr),
		}
	}

	/// `(previous, current)` when `attr` changed in this window.
	#[allow(clippy::type_complexity)]
	pub fn change(&mut self, attr: &str) -> Result<Option<(Option<Bytes>, Option<Bytes>)>, RecordError> {
		if !self.changed(attr)? {
			return Ok(None);
		}
		let previous = self.was(attr)?;
		let current = self.get(attr)?;
		Ok(Some((previous, current)))
	}

	/// Attributes changed in this window, in the order they changed.
	pub fn changed_attributes(&mut self) -> Result<Vec<&str>, RecordError> {
		let candidates: Vec<Attr> = self.state.changed_attributes().into_iter().cloned().collect();
		for attr in &candidates {
			self.changed(attr)?;
		}
		Ok(self
			.state
			.changed_attributes()
			.into_iter()
			.map(Attr::as_str)
			.collect())
	}

	/// Whether `attr` is stale.
	pub fn is_pending(&self, attr: &str) -> bool {
		self.state.is_pending(attr)
	}

	pub(crate) fn read_variant(&mut self, attr: &str, variant: Variant) -> Result<Option<Bytes>, RecordError> {
		match variant {
			Variant::Current => self.get(attr),
			Variant::Previous => self.was(attr),
		}
	}

	/// Runs every pending encoder link so no stale value reaches storage.
	pub fn materialize(&mut self) -> Result<(), RecordError> {
		let pairs: Vec<(Attr, Attr)> = self
			.model
			.encoders()
			.iter()
			.map(|e| (e.attr.clone(), e.encoded.clone()))
			.collect();
		for (attr, encoded) in pairs {
			self.get(&attr)?;
			self.get(&encoded)?;
		}
		Ok(())
	}

	/// Physical column values.
	pub fn to_row(&self) -> Row {
		self.cells
			.physical
			.iter()
			.map(|(column, value)| (column.to_string(), value.clone()))
			.collect()
	}

	/// Closes the change-tracking window.
	pub fn commit(&mut self) {
		tracing::trace!(model = self.model.name(), "tracking window reset");
		self.state.reset_for_new_window();
	}

	/// Materializes, snapshots the row and closes the window.
	pub fn save(&mut self) -> Result<Row, RecordError> {
		self.materialize()?;
		let row = self.to_row();
		self.commit();
		Ok(row)
	}
}

impl RecordAccess for Record {
	fn read_attribute(&mut self, attr: &str) -> Result<Option<Bytes>, codify_codec::BoxError> {
		self.get(attr).map_err(Into::into)
	}
}

impl std::fmt::Debug for Record {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Record")
			.field("model", &self.model.name())
			.field("physical", &self.cells.physical)
			.field("virtuals", &self.cells.virtuals)
			.field("state", &self.state)
			.finish()
	}
}
