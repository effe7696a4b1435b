/// Boxed error raised by producers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from the raw attribute store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("unknown attribute `{0}`")]
	UnknownAttribute(String),
}
