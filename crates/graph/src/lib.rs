//! Attribute dependency graph and lazy recompute state for encoded records.
//!
//! - [`Schema`] - links between attributes, built once per record type and shared
//! - [`RecomputeState`] - per-record pending producers and change-tracking snapshots
//! - [`AttributeStore`] - raw read/write primitives supplied by the record layer

pub mod attr;
pub mod error;
pub mod producer;
pub mod schema;
pub mod state;
pub mod store;

#[cfg(any(test, doc))]
pub(crate) mod invariants;

pub use attr::{Attr, ComponentId, Variant};
pub use error::{BoxError, StoreError};
pub use producer::{Produced, Producer};
pub use schema::{AttrClass, Link, Linked, Schema};
pub use state::RecomputeState;
pub use store::AttributeStore;
