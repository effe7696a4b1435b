use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::attr::Variant;
use crate::error::BoxError;

/// Outcome of running a producer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Produced {
	/// The computed value; `None` is a legitimate absent value.
	Value(Option<Bytes>),
	/// A required input is absent, so the link does not run and the target stays stale.
	Deferred,
}

type ProducerFn<R> = dyn Fn(&mut R, Variant) -> Result<Produced, BoxError> + Send + Sync;

/// Computes a link's target from the record, addressing the current or previous variant of
/// its source.
pub struct Producer<R: ?Sized>(Arc<ProducerFn<R>>);

impl<R: ?Sized> Producer<R> {
	pub fn new(f: impl Fn(&mut R, Variant) -> Result<Produced, BoxError> + Send + Sync + 'static) -> Self {
		Self(Arc::new(f))
	}

	#[inline]
	pub fn run(&self, record: &mut R, variant: Variant) -> Result<Produced, BoxError> {
		(self.0)(record, variant)
	}

	/// Whether both handles share one closure.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl<R: ?Sized> Clone for Producer<R> {
	fn clone(&self) -> Self {
		Self(Arc::clone(&self.0))
	}
}

impl<R: ?Sized> fmt::Debug for Producer<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Producer({:p})", Arc::as_ptr(&self.0).cast::<()>())
	}
}
