//! Records with encoded, compressed and digested attributes.
//!
//! A [`Model`] declares, per logical attribute, a codec chain and the encoded attribute that
//! stores its output. Records keep both sides consistent lazily: writing one side invalidates
//! the other, and the invalidated side is recomputed on its next read.
//!
//! ```ignore
//! let mut builder = ModelBuilder::new("Email");
//! builder.column("compressed_body");
//! builder.attr_compressor("body", EncoderOptions::new().codec("zlib9"))?;
//! let model = builder.build();
//!
//! let mut email = model.new_record();
//! email.set("body", Some("hello".into()))?;
//! let stored = email.get("compressed_body")?;
//! ```
//!
//! Models can also be declared in TOML through [`ModelConfig`].

pub mod config;
pub mod error;
pub mod model;
pub mod options;
pub mod record;

pub use config::{EncoderConfig, InputValue, ModelConfig, ParamValue};
pub use error::{ConfigError, RecordError};
pub use model::{Direction, EncodedAttribute, Model, ModelBuilder};
pub use options::{EncoderOptions, EncoderStyle};
pub use record::{Record, Row};
