// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Predefined primitive types and base units.
//!
//! Type-name resolution falls back to this table when a name is not
//! defined in the model itself.

use crate::codec::ScalarType;
use crate::model::DataType;

/// Name, scalar mapping and bit size of each predefined primitive.
const PRIMITIVES: &[(&str, ScalarType)] = &[
    ("tBool", ScalarType::Bool),
    ("tChar", ScalarType::I8),
    ("tInt8", ScalarType::I8),
    ("tUInt8", ScalarType::U8),
    ("tInt16", ScalarType::I16),
    ("tUInt16", ScalarType::U16),
    ("tInt32", ScalarType::I32),
    ("tUInt32", ScalarType::U32),
    ("tInt64", ScalarType::I64),
    ("tUInt64", ScalarType::U64),
    ("tFloat32", ScalarType::F32),
    ("tFloat64", ScalarType::F64),
];

/// SI and common base units that need no definition in the model.
pub const BASE_UNITS: &[&str] = &[
    "Metre", "Kilogram", "Second", "Ampere", "Kelvin", "Mole", "Candela", "Degree",
    "Radiant", "Unitless",
];

/// Scalar type behind a predefined primitive name.
pub fn scalar_type(name: &str) -> Option<ScalarType> {
    PRIMITIVES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ty)| *ty)
}

/// Data type definition of a predefined primitive (natural alignment).
pub fn data_type(name: &str) -> Option<DataType> {
    let ty = scalar_type(name)?;
    let bits = ty.bit_size();
    Some(DataType::new(name, bits).with_alignment(bits / 8))
}

/// Whether `name` is a predefined base unit.
pub fn is_base_unit(name: &str) -> bool {
    BASE_UNITS.contains(&name)
}

/// All predefined primitive names.
pub fn names() -> impl Iterator<Item = &'static str> {
    PRIMITIVES.iter().map(|(n, _)| *n)
}
