#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use indexmap::IndexMap;

use crate::{AttributeStore, Produced, Producer, RecomputeState, Schema, StoreError, Variant};

/// Minimal record: raw cells plus a producer call counter.
#[derive(Default)]
struct Cells {
	values: IndexMap<String, Option<Bytes>>,
	calls: Arc<AtomicUsize>,
}

impl AttributeStore for Cells {
	fn read_raw(&self, attr: &str) -> Result<Option<Bytes>, StoreError> {
		self.values
			.get(attr)
			.cloned()
			.ok_or_else(|| StoreError::UnknownAttribute(attr.to_string()))
	}

	fn write_raw(&mut self, attr: &str, value: Option<Bytes>) -> Result<(), StoreError> {
		self.values.insert(attr.to_string(), value);
		Ok(())
	}
}

/// Producer copying `source` upper-cased and counting invocations.
fn upper(source: &'static str) -> Producer<Cells> {
	Producer::new(move |cells: &mut Cells, _variant: Variant| {
		cells.calls.fetch_add(1, Ordering::SeqCst);
		let value = cells.read_raw(source)?;
		Ok(Produced::Value(value.map(|v| Bytes::from(v.to_ascii_uppercase()))))
	})
}

fn cells(pairs: &[(&str, Option<&'static [u8]>)]) -> Cells {
	let mut cells = Cells::default();
	for (name, value) in pairs {
		cells.values.insert(name.to_string(), value.map(Bytes::from_static));
	}
	cells
}

/// Reads `attr` the way the record layer does.
fn read(state: &mut RecomputeState<Cells>, cells: &mut Cells, attr: &str) -> Option<Bytes> {
	if let Some(producer) = state.before_read(attr) {
		match producer.run(cells, Variant::Current) {
			Ok(Produced::Value(value)) => cells.write_raw(attr, value).expect("known attribute"),
			Ok(Produced::Deferred) | Err(_) => state.reinstate(attr, producer),
		}
	}
	cells.read_raw(attr).expect("known attribute")
}

/// Invariant: writing a source never runs dependent producers; reading a dependent runs its
/// producer exactly once.
pub(crate) fn inv_lazy_invalidation() {
	let mut schema = Schema::new();
	schema.link("token", "encoded_token", None, false, upper("token"));
	let mut state = RecomputeState::new(Arc::new(schema));
	let mut cells = cells(&[("token", None), ("encoded_token", Some(b"OLD"))]);

	assert_eq!(read(&mut state, &mut cells, "encoded_token").as_deref(), Some(&b"OLD"[..]));

	cells.write_raw("token", Some(Bytes::from_static(b"abc"))).unwrap();
	state.mark_written("token", &cells, false);
	assert!(state.is_pending("encoded_token"));
	assert_eq!(cells.calls.load(Ordering::SeqCst), 0);

	assert_eq!(read(&mut state, &mut cells, "encoded_token").as_deref(), Some(&b"ABC"[..]));
	assert_eq!(read(&mut state, &mut cells, "encoded_token").as_deref(), Some(&b"ABC"[..]));
	assert_eq!(cells.calls.load(Ordering::SeqCst), 1);
	assert!(!state.is_pending("encoded_token"));
}

#[cfg_attr(test, test)]
pub(crate) fn test_lazy_invalidation() {
	inv_lazy_invalidation()
}

/// Invariant: the first snapshot in a window is kept until the window resets.
pub(crate) fn inv_snapshot_first_write_wins() {
	let state_schema = Arc::new(Schema::<Cells>::new());
	let mut state = RecomputeState::new(state_schema);
	let mut cells = cells(&[("name", Some(b"first"))]);

	state.snapshot_before_change("name", &cells);
	cells.write_raw("name", Some(Bytes::from_static(b"second"))).unwrap();
	state.snapshot_before_change("name", &cells);

	assert_eq!(
		state.previous_value("name"),
		Some(&Some(Bytes::from_static(b"first")))
	);

	state.reset_for_new_window();
	assert!(!state.has_change("name"));
	state.snapshot_before_change("name", &cells);
	assert_eq!(
		state.previous_value("name"),
		Some(&Some(Bytes::from_static(b"second")))
	);
}

#[cfg_attr(test, test)]
pub(crate) fn test_snapshot_first_write_wins() {
	inv_snapshot_first_write_wins()
}

/// Invariant: a producer that fails leaves its attribute pending, and a later read retries.
pub(crate) fn inv_failed_producer_stays_stale() {
	let fail = Arc::new(AtomicUsize::new(1));
	let mut schema = Schema::new();
	let remaining = Arc::clone(&fail);
	schema.link(
		"body",
		"compressed_body",
		None,
		false,
		Producer::new(move |cells: &mut Cells, _| {
			if remaining.fetch_sub(1, Ordering::SeqCst) > 0 {
				return Err("transient".into());
			}
			Ok(Produced::Value(cells.read_raw("body")?))
		}),
	);
	let mut state = RecomputeState::new(Arc::new(schema));
	let mut cells = cells(&[("body", Some(b"x")), ("compressed_body", None)]);

	state.mark_written("body", &cells, false);
	assert_eq!(read(&mut state, &mut cells, "compressed_body"), None);
	assert!(state.is_pending("compressed_body"));

	assert_eq!(
		read(&mut state, &mut cells, "compressed_body").as_deref(),
		Some(&b"x"[..])
	);
	assert!(!state.is_pending("compressed_body"));
}

#[cfg_attr(test, test)]
pub(crate) fn test_failed_producer_stays_stale() {
	inv_failed_producer_stays_stale()
}

/// Invariant: traversal over a cyclic graph terminates and visits each component once.
pub(crate) fn inv_cycle_safe_traversal() {
	let mut schema = Schema::<Cells>::new();
	let ab = schema.link("a", "b", None, false, upper("a"));
	let bc = schema.link("b", "c", None, false, upper("b"));
	let ca = schema.link("c", "a", None, false, upper("c"));

	let linked = schema.linked_attributes("a");
	assert_eq!(linked.keys().copied().collect::<Vec<_>>(), vec![ab, bc, ca]);
	assert!(linked[&ca].contains_key("a"));
}

#[cfg_attr(test, test)]
pub(crate) fn test_cycle_safe_traversal() {
	inv_cycle_safe_traversal()
}

/// Invariant: a stale attribute snapshots its pending producer, not its stored value.
pub(crate) fn inv_stale_snapshot_keeps_producer() {
	let mut schema = Schema::new();
	schema.link("encoded", "plain", None, true, upper("encoded"));
	let mut state = RecomputeState::new(Arc::new(schema));
	let mut cells = cells(&[("encoded", Some(b"abc")), ("plain", None)]);

	assert!(state.is_pending("plain"));
	state.snapshot_before_change("plain", &cells);
	assert!(state.has_change("plain"));
	assert_eq!(state.previous_value("plain"), None);

	let producer = state.take_previous_producer("plain").expect("producer snapshot");
	let Produced::Value(value) = producer.run(&mut cells, Variant::Previous).unwrap() else {
		panic!("upper never defers");
	};
	state.record_previous("plain", value);
	assert_eq!(
		state.previous_value("plain"),
		Some(&Some(Bytes::from_static(b"ABC")))
	);
}

#[cfg_attr(test, test)]
pub(crate) fn test_stale_snapshot_keeps_producer() {
	inv_stale_snapshot_keeps_producer()
}
