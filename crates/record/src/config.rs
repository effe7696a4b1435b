//! TOML model declarations.
//!
//! ```toml
//! name = "Email"
//! columns = ["subject", "body", "compressed_body"]
//! shadows = ["body"]
//!
//! [[encoder]]
//! attribute = "body"
//! style = "compressor"
//! codecs = ["zlib", "base64"]
//!
//! [encoder.options]
//! level = 9
//!
//! [encoder.inputs]
//! salt = { attribute = "salt" }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use codify_codec::{AuxInputs, CodecKind, CodecRegistry, CodecSpec, Options, Param, Setting};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{Model, ModelBuilder};
use crate::options::{EncoderOptions, EncoderStyle};

fn default_true() -> bool {
	true
}

/// A model declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
	pub name: String,
	#[serde(default)]
	pub columns: Vec<String>,
	/// Legacy columns superseded by virtual attributes of the same name.
	#[serde(default)]
	pub shadows: Vec<String>,
	#[serde(default = "default_true")]
	pub track_changes: bool,
	#[serde(default, rename = "encoder")]
	pub encoders: Vec<EncoderConfig>,
}

/// One `[[encoder]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncoderConfig {
	pub attribute: String,
	#[serde(default)]
	pub style: EncoderStyle,
	pub codecs: Option<Vec<String>>,
	pub kind: Option<String>,
	pub prefix: Option<String>,
	pub suffix: Option<String>,
	pub target: Option<String>,
	pub protect: Option<bool>,
	pub verb: Option<String>,
	pub reverse_verb: Option<String>,
	#[serde(default)]
	pub options: BTreeMap<String, ParamValue>,
	#[serde(default)]
	pub inputs: BTreeMap<String, InputValue>,
}

/// A literal option value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
	Int(i64),
	Text(String),
}

impl From<&ParamValue> for Param {
	fn from(value: &ParamValue) -> Self {
		match value {
			ParamValue::Int(n) => Param::Int(*n),
			ParamValue::Text(text) => Param::Text(text.clone()),
		}
	}
}

/// An auxiliary input: a literal, or a reference to one of the record's attributes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
	Attribute { attribute: String },
	Literal(ParamValue),
}

impl ModelConfig {
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(source)?)
	}

	/// Builds the model, resolving codecs through `registry`.
	pub fn build(&self, registry: &CodecRegistry) -> Result<Arc<Model>, ConfigError> {
		let mut builder = ModelBuilder::with_registry(self.name.as_str(), registry);
		builder
			.columns(self.columns.iter().map(String::as_str))
			.track_changes(self.track_changes);
		for shadow in &self.shadows {
			builder.attr_shadow(shadow);
		}
		for encoder in &self.encoders {
			builder.declare(&encoder.attribute, encoder.to_options()?, encoder.style)?;
		}
		Ok(builder.build())
	}
}

impl EncoderConfig {
	fn invalid(&self, reason: &str) -> ConfigError {
		ConfigError::InvalidEncoder {
			attribute: self.attribute.clone(),
			reason: reason.to_string(),
		}
	}

	/// Converts the table into builder options, rejecting contradictory settings.
	pub fn to_options(&self) -> Result<EncoderOptions, ConfigError> {
		if self.attribute.trim().is_empty() {
			return Err(self.invalid("attribute name is empty"));
		}
		if self.codecs.as_ref().is_some_and(Vec::is_empty) {
			return Err(self.invalid("codec list is empty"));
		}
		if self.target.is_some() && (self.prefix.is_some() || self.suffix.is_some()) {
			return Err(self.invalid("`target` cannot be combined with `prefix` or `suffix`"));
		}

		let options: Options = self
			.options
			.iter()
			.map(|(key, value)| (key.as_str(), Param::from(value)))
			.collect();
		let inputs: Options = self
			.inputs
			.iter()
			.map(|(name, value)| {
				let setting = match value {
					InputValue::Attribute { attribute } => Setting::attribute(attribute.as_str()),
					InputValue::Literal(literal) => Setting::Fixed(Param::from(literal)),
				};
				(name.as_str(), setting)
			})
			.collect();

		Ok(EncoderOptions {
			codecs: self
				.codecs
				.as_ref()
				.map(|codecs| codecs.iter().map(|c| CodecSpec::from(c.as_str())).collect()),
			kind: self.kind.clone().map(CodecKind::from),
			prefix: self.prefix.clone(),
			suffix: self.suffix.clone(),
			target: self.target.clone(),
			protect: self.protect,
			verb: self.verb.clone(),
			reverse_verb: self.reverse_verb.clone(),
			options,
			inputs: if inputs.is_empty() {
				AuxInputs::None
			} else {
				AuxInputs::named(inputs)
			},
		})
	}
}
