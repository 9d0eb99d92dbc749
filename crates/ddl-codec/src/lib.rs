// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # ddl-codec - Schema-driven binary codec
//!
//! Computes the exact byte/bit layout of structured types in two
//! representations (in-memory "deserialized" and wire "serialized") and gives
//! typed, bounds-checked access to fields of caller-owned buffers without
//! generated per-type code.
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  TypeModel        DataType | EnumType | StructType | Unit      |
//! +---------------------------------------------------------------+
//! |  Validation       problems, levels, event-driven revalidation  |
//! |  Layout           TypeInfo / ElementTypeInfo caches, offsets   |
//! +---------------------------------------------------------------+
//! |  Codec            StructLayout -> CodecFactory                 |
//! |                   Decoder | Codec | StaticDecoder | StaticCodec|
//! |                   CodecIndex resolution, LeafCodecIndex        |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TypeModel`] | Owner of all types, layout caches and validation state |
//! | [`CodecFactory`] | Compiled struct schema, factory for runtime objects |
//! | [`Codec`] | Read-write access to one buffer |
//! | [`CodecIndex`] | Path to one element of an instance |
//! | [`LeafCodecIndex`] | Precomputed scalar accessor |
//!
//! ## Threading
//!
//! Nothing locks. Editing a [`TypeModel`] needs `&mut`; compiled layouts are
//! immutable and `Send + Sync`, so decoders over distinct or read-only
//! buffers may run on any thread.

pub mod codec;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod validation;

pub use codec::{
    Codec, CodecFactory, CodecIndex, Decoder, ElementAccess, LeafCodecIndex, Representation,
    StaticCodec, StaticDecoder, Value, ValueAccess, ValueAccessMut,
};
pub use config::{CodecConfig, ConfigError};
pub use error::{CodecError, Result};
pub use model::TypeModel;
pub use validation::ValidationLevel;
