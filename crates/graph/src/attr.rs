use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Interned attribute name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Attr(Arc<str>);

impl Attr {
	pub fn new(name: &str) -> Self {
		Self(Arc::from(name))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::ops::Deref for Attr {
	type Target = str;

	fn deref(&self) -> &str {
		&self.0
	}
}

impl Borrow<str> for Attr {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for Attr {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Attr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Debug for Attr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, ":{}", self.0)
	}
}

impl From<&str> for Attr {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl From<String> for Attr {
	fn from(name: String) -> Self {
		Self(Arc::from(name))
	}
}

impl PartialEq<str> for Attr {
	fn eq(&self, other: &str) -> bool {
		&*self.0 == other
	}
}

impl PartialEq<&str> for Attr {
	fn eq(&self, other: &&str) -> bool {
		&*self.0 == *other
	}
}

/// Invalidation group shared by links that recompute together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);

impl fmt::Display for ComponentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Which version of a source attribute a producer reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
	/// The value as of now.
	Current,
	/// The value before the first change in the current tracking window.
	Previous,
}

impl Variant {
	/// Accessor suffix naming this variant (`""` or `"_was"`).
	pub fn suffix(self) -> &'static str {
		match self {
			Self::Current => "",
			Self::Previous => "_was",
		}
	}
}
