//! Codec registry and chain composition for encoded record attributes.
//!
//! # Layout
//!
//! - [`param`] - Option values, record-bound settings, auxiliary inputs
//! - [`codec`] - The [`Transform`] contract and configured [`Codec`] instances
//! - [`chain`] - Ordered composition with absence pass-through
//! - [`registry`] - Symbol lookup with kind-scoped precedence
//! - [`builtins`] - zlib, brotli, base64 and digest codecs
//!
//! # Adding a Codec
//!
//! 1. Implement [`Transform`] (and [`Decoder`] if reversible)
//! 2. Register a [`CodecFactory`], a preconfigured [`Codec`], or a matcher for a symbol family

pub mod builtins;
pub mod chain;
pub mod codec;
pub mod error;
pub mod kind;
pub mod param;
pub mod registry;

pub use chain::CodecChain;
pub use codec::{Codec, CodecFactory, Decoder, Params, Transform};
pub use error::{BoxError, CodecError};
pub use kind::CodecKind;
pub use param::{AuxInputs, Detached, Options, Param, RecordAccess, Setting};
pub use registry::{Binding, CodecRegistry, CodecSpec, Matcher, Snapshot, Tier, global};
