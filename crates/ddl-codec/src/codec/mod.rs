// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime codec: compiled schemas, element addressing and buffer access.
//!
//! # Features
//!
//! - **StructLayout**: immutable snapshot of a laid-out struct, shared by
//!   every runtime object of a factory
//! - **CodecIndex**: path-based addressing (`a.b[2].c`) resolved against a
//!   concrete buffer, so dynamic arrays shift what follows them
//! - **LeafCodecIndex**: precomputed scalar descriptor for hot paths
//! - **Decoder / Codec**: read-only and read-write access to caller buffers,
//!   with static variants for schemas without dynamic arrays
//!
//! # Example
//!
//! ```rust
//! use ddl_codec::codec::{CodecFactory, Representation, ValueAccess, ValueAccessMut};
//! use ddl_codec::model::{StructBuilder, TypeModel};
//!
//! let mut model = TypeModel::new();
//! model
//!     .add_struct_type(
//!         StructBuilder::new("Point")
//!             .field("x", "tInt32")
//!             .field("y", "tInt32")
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let factory = CodecFactory::new(&mut model, "Point").unwrap();
//! let mut buf = vec![0u8; factory.static_size(Representation::Deserialized).unwrap()];
//! let mut codec = factory.codec(&mut buf, Representation::Deserialized);
//! codec.set_by_name("y", -7i32).unwrap();
//! assert_eq!(codec.get_by_name::<i32>("y").unwrap(), -7);
//! ```

pub mod access;
pub(crate) mod bits;
mod factory;
mod index;
mod leaf;
mod resolve;
mod runtime;
mod schema;
pub mod traverse;
mod transform;
mod value;

pub use access::{ChildElements, ElementAccess, ElementHandle, ElementInfo, SchemaView, ValueAccess, ValueAccessMut};
pub use factory::{CodecFactory, LeafTable};
pub use index::{CodecIndex, IndexStep};
pub use leaf::{AccessMode, LeafCodecIndex, LeafType, TypedLeafIndex};
pub use resolve::{instance_size, resolve, ResolvedElement};
pub use runtime::{Codec, Decoder, StaticCodec, StaticDecoder};
pub use schema::{
    compile, EnumLayout, FieldCount, FieldKind, FieldLayout, Representation, StructLayout,
};
pub use transform::{reset, transform};
pub use value::{sign_extend, Scalar, ScalarType, Value};
