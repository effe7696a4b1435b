use bytes::Bytes;

use crate::error::StoreError;

/// Raw attribute storage owned by the record layer.
///
/// These are the only points where the graph touches stored values. Writes through this trait
/// bypass change tracking and never enqueue dependents.
pub trait AttributeStore {
	fn read_raw(&self, attr: &str) -> Result<Option<Bytes>, StoreError>;

	fn write_raw(&mut self, attr: &str, value: Option<Bytes>) -> Result<(), StoreError>;
}
