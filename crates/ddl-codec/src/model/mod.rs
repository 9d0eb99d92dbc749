// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type model: data types, enumerations, structures, units.
//!
//! The model is produced by an external schema parser (or built in code with
//! the builders) and is the single owner of all layout and validation caches.

mod builder;
mod data_type;
mod enum_type;
pub mod predefined;
mod struct_type;
mod type_model;
mod unit;
mod version;

pub use builder::{ElementBuilder, EnumBuilder, StructBuilder};
pub use data_type::DataType;
pub(crate) use enum_type::parse_integer;
pub use enum_type::{EnumType, EnumValue};
pub use struct_type::{
    ArraySize, ByteOrder, DeserializedInfo, Element, ScaleInfo, SerializedInfo, StructType,
    ValueInfo,
};
pub use type_model::{TypeModel, TypeRef};
pub use unit::Unit;
pub use version::FormatVersion;
