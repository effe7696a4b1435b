use std::borrow::Cow;
use std::fmt;

/// Classification scope for codec lookups.
///
/// Every concrete registration is visible under [`CodecKind::ALL`] in addition to the kinds it
/// was registered with, so `ALL` acts as the fallback scope for any narrower request.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodecKind(Cow<'static, str>);

impl CodecKind {
	pub const ALL: Self = Self(Cow::Borrowed("all"));
	pub const COMPRESSOR: Self = Self(Cow::Borrowed("compressor"));
	pub const ENCODING: Self = Self(Cow::Borrowed("encoding"));
	pub const DIGESTOR: Self = Self(Cow::Borrowed("digestor"));

	pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	#[inline]
	pub fn is_all(&self) -> bool {
		self.0 == "all"
	}
}

impl Default for CodecKind {
	fn default() -> Self {
		Self::ALL
	}
}

impl fmt::Display for CodecKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Debug for CodecKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, ":{}", self.0)
	}
}

impl From<&'static str> for CodecKind {
	fn from(name: &'static str) -> Self {
		Self(Cow::Borrowed(name))
	}
}

impl From<String> for CodecKind {
	fn from(name: String) -> Self {
		Self(Cow::Owned(name))
	}
}
