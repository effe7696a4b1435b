//! Codec configuration values and the record accessor capability.
//!
//! Codec options and auxiliary inputs are stored as [`Setting`]s. A setting is either a fixed
//! [`Param`] or something evaluated per invocation: a thunk, a closure over the bound record,
//! or a reference to one of the record's attributes. Evaluation goes through
//! [`RecordAccess`], which the record layer implements and which codecs receive explicitly
//! instead of reaching into ambient record state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{BoxError, CodecError};

/// Read access to the record a codec is currently bound to.
pub trait RecordAccess {
	/// Returns the current (materialized) value of `attr`.
	fn read_attribute(&mut self, attr: &str) -> Result<Option<Bytes>, BoxError>;
}

/// Accessor used for class-level encoding, where no record is bound.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl RecordAccess for Detached {
	fn read_attribute(&mut self, attr: &str) -> Result<Option<Bytes>, BoxError> {
		Err(Box::new(CodecError::Unbound {
			key: attr.to_string(),
		}))
	}
}

/// A resolved option or input value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Param {
	Int(i64),
	Text(String),
	Bytes(Bytes),
}

impl Param {
	pub fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(value) => Some(*value),
			Self::Text(text) => text.trim().parse().ok(),
			Self::Bytes(_) => None,
		}
	}

	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			Self::Bytes(bytes) => std::str::from_utf8(bytes).ok(),
			Self::Int(_) => None,
		}
	}

	/// Returns the raw bytes of the value; integers use their decimal form.
	pub fn to_bytes(&self) -> Bytes {
		match self {
			Self::Int(value) => Bytes::from(value.to_string()),
			Self::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
			Self::Bytes(bytes) => bytes.clone(),
		}
	}
}

impl From<i64> for Param {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<&str> for Param {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}

impl From<String> for Param {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

impl From<Bytes> for Param {
	fn from(value: Bytes) -> Self {
		Self::Bytes(value)
	}
}

type Thunk = Arc<dyn Fn() -> Option<Param> + Send + Sync>;
type Deferred = Arc<dyn Fn(&mut dyn RecordAccess) -> Result<Option<Param>, BoxError> + Send + Sync>;

/// A configuration entry: fixed, or evaluated each time the codec runs.
#[derive(Clone)]
pub enum Setting {
	Fixed(Param),
	Thunk(Thunk),
	Deferred(Deferred),
	/// Reads the named attribute of the bound record.
	Attribute(Arc<str>),
}

impl Setting {
	pub fn fixed(value: impl Into<Param>) -> Self {
		Self::Fixed(value.into())
	}

	pub fn thunk(f: impl Fn() -> Option<Param> + Send + Sync + 'static) -> Self {
		Self::Thunk(Arc::new(f))
	}

	pub fn deferred(
		f: impl Fn(&mut dyn RecordAccess) -> Result<Option<Param>, BoxError> + Send + Sync + 'static,
	) -> Self {
		Self::Deferred(Arc::new(f))
	}

	pub fn attribute(name: impl Into<Arc<str>>) -> Self {
		Self::Attribute(name.into())
	}

	/// Whether the value can change between invocations.
	#[inline]
	pub fn is_callable(&self) -> bool {
		!matches!(self, Self::Fixed(_))
	}

	/// The record attribute this setting reads, if it is attribute-backed.
	pub fn source_attribute(&self) -> Option<&str> {
		match self {
			Self::Attribute(name) => Some(name),
			_ => None,
		}
	}

	pub fn resolve(&self, key: &str, record: &mut dyn RecordAccess) -> Result<Option<Param>, CodecError> {
		let binding = |source: BoxError| match source.downcast::<CodecError>() {
			Ok(err) => *err,
			Err(source) => CodecError::Binding {
				key: key.to_string(),
				source,
			},
		};
		match self {
			Self::Fixed(value) => Ok(Some(value.clone())),
			Self::Thunk(f) => Ok(f()),
			Self::Deferred(f) => f(record).map_err(binding),
			Self::Attribute(name) => Ok(record.read_attribute(name).map_err(binding)?.map(Param::Bytes)),
		}
	}
}

impl fmt::Debug for Setting {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
			Self::Thunk(_) => f.write_str("Thunk(..)"),
			Self::Deferred(_) => f.write_str("Deferred(..)"),
			Self::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
		}
	}
}

impl From<Param> for Setting {
	fn from(value: Param) -> Self {
		Self::Fixed(value)
	}
}

impl From<i64> for Setting {
	fn from(value: i64) -> Self {
		Self::Fixed(Param::Int(value))
	}
}

impl From<&str> for Setting {
	fn from(value: &str) -> Self {
		Self::Fixed(Param::from(value))
	}
}

impl From<String> for Setting {
	fn from(value: String) -> Self {
		Self::Fixed(Param::Text(value))
	}
}

impl From<Bytes> for Setting {
	fn from(value: Bytes) -> Self {
		Self::Fixed(Param::Bytes(value))
	}
}

/// Named codec configuration.
#[derive(Clone, Debug, Default)]
pub struct Options(BTreeMap<String, Setting>);

impl Options {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, key: impl Into<String>, setting: impl Into<Setting>) -> Self {
		self.insert(key, setting);
		self
	}

	pub fn insert(&mut self, key: impl Into<String>, setting: impl Into<Setting>) {
		self.0.insert(key.into(), setting.into());
	}

	pub fn get(&self, key: &str) -> Option<&Setting> {
		self.0.get(key)
	}

	/// Overlays `other` on a copy of `self`; keys in `other` win.
	pub fn merged(&self, other: &Options) -> Options {
		let mut out = self.clone();
		for (key, setting) in &other.0 {
			out.0.insert(key.clone(), setting.clone());
		}
		out
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Setting)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn any_callable(&self) -> bool {
		self.0.values().any(Setting::is_callable)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}
}

impl<K: Into<String>, S: Into<Setting>> FromIterator<(K, S)> for Options {
	fn from_iter<I: IntoIterator<Item = (K, S)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, s)| (k.into(), s.into())).collect())
	}
}

/// Auxiliary inputs offered by the caller when a codec is instantiated.
///
/// Only inputs the codec declares survive binding: named inputs are filtered by name,
/// positional inputs are paired with the declared names in order and any surplus is dropped.
#[derive(Clone, Debug, Default)]
pub enum AuxInputs {
	#[default]
	None,
	Named(Options),
	Positional(Vec<Setting>),
}

impl AuxInputs {
	pub fn named(options: Options) -> Self {
		Self::Named(options)
	}

	pub fn positional(settings: impl IntoIterator<Item = Setting>) -> Self {
		Self::Positional(settings.into_iter().collect())
	}

	/// Binds the offered inputs against the names a codec declares.
	pub fn bind(&self, declared: &[&'static str]) -> Options {
		match self {
			Self::None => Options::new(),
			Self::Named(options) => declared
				.iter()
				.filter_map(|name| options.get(name).map(|s| (*name, s.clone())))
				.collect(),
			Self::Positional(settings) => declared
				.iter()
				.zip(settings.iter())
				.map(|(name, s)| (*name, s.clone()))
				.collect(),
		}
	}

	/// Attributes referenced by attribute-backed inputs, in declaration order.
	pub fn source_attributes(&self) -> Vec<&str> {
		match self {
			Self::None => Vec::new(),
			Self::Named(options) => options.iter().filter_map(|(_, s)| s.source_attribute()).collect(),
			Self::Positional(settings) => settings.iter().filter_map(Setting::source_attribute).collect(),
		}
	}
}
