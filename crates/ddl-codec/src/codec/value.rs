// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar values and conversions.

use crate::error::{CodecError, Result};
use crate::model::parse_integer;
use std::fmt;

/// Machine scalar type of a leaf element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    /// Natural bit size (bool occupies one byte).
    pub const fn bit_size(self) -> usize {
        self.byte_size() * 8
    }

    pub const fn byte_size(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::F32 | Self::F64
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Fixed-width integer (bool excluded).
    pub const fn is_integer(self) -> bool {
        !self.is_float() && !matches!(self, Self::Bool)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Smallest unsigned type holding `bits` bits.
    pub const fn unsigned_for_bits(bits: usize) -> Option<Self> {
        match bits {
            1..=8 => Some(Self::U8),
            9..=16 => Some(Self::U16),
            17..=32 => Some(Self::U32),
            33..=64 => Some(Self::U64),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar value read from or written to a buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Bool(_) => ScalarType::Bool,
            Self::I8(_) => ScalarType::I8,
            Self::U8(_) => ScalarType::U8,
            Self::I16(_) => ScalarType::I16,
            Self::U16(_) => ScalarType::U16,
            Self::I32(_) => ScalarType::I32,
            Self::U32(_) => ScalarType::U32,
            Self::I64(_) => ScalarType::I64,
            Self::U64(_) => ScalarType::U64,
            Self::F32(_) => ScalarType::F32,
            Self::F64(_) => ScalarType::F64,
        }
    }

    /// Zero of the given type.
    pub fn zero(ty: ScalarType) -> Self {
        Self::U8(0).convert(ty)
    }

    fn as_i128(self) -> i128 {
        match self {
            Self::Bool(v) => i128::from(v),
            Self::I8(v) => i128::from(v),
            Self::U8(v) => i128::from(v),
            Self::I16(v) => i128::from(v),
            Self::U16(v) => i128::from(v),
            Self::I32(v) => i128::from(v),
            Self::U32(v) => i128::from(v),
            Self::I64(v) => i128::from(v),
            Self::U64(v) => i128::from(v),
            Self::F32(v) => v as i128,
            Self::F64(v) => v as i128,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Self::F32(v) => f64::from(v),
            Self::F64(v) => v,
            other => other.as_i128() as f64,
        }
    }

    /// Integer view (floats truncate, `None` when out of `i64` range).
    pub fn as_i64(self) -> Option<i64> {
        i64::try_from(self.as_i128()).ok()
    }

    /// Integer view (floats truncate, `None` when negative or too large).
    pub fn as_u64(self) -> Option<u64> {
        u64::try_from(self.as_i128()).ok()
    }

    pub fn as_bool(self) -> bool {
        match self {
            Self::F32(v) => v != 0.0,
            Self::F64(v) => v != 0.0,
            other => other.as_i128() != 0,
        }
    }

    /// Convert to another scalar type.
    ///
    /// Integers wrap like `as` casts; floats to integers saturate first.
    pub fn convert(self, to: ScalarType) -> Self {
        if self.scalar_type() == to {
            return self;
        }
        let i = self.as_i128();
        match to {
            ScalarType::Bool => Self::Bool(self.as_bool()),
            ScalarType::I8 => Self::I8(i as i8),
            ScalarType::U8 => Self::U8(i as u8),
            ScalarType::I16 => Self::I16(i as i16),
            ScalarType::U16 => Self::U16(i as u16),
            ScalarType::I32 => Self::I32(i as i32),
            ScalarType::U32 => Self::U32(i as u32),
            ScalarType::I64 => Self::I64(i as i64),
            ScalarType::U64 => Self::U64(i as u64),
            ScalarType::F32 => Self::F32(self.as_f64() as f32),
            ScalarType::F64 => Self::F64(self.as_f64()),
        }
    }

    /// Raw two's-complement / IEEE bit pattern.
    pub fn to_bits(self) -> u64 {
        match self {
            Self::F32(v) => u64::from(v.to_bits()),
            Self::F64(v) => v.to_bits(),
            Self::U64(v) => v,
            other => other.as_i128() as i64 as u64,
        }
    }

    /// Rebuild a value of type `ty` from the low `width` bits of `raw`.
    pub fn from_bits(ty: ScalarType, raw: u64, width: usize) -> Self {
        match ty {
            ScalarType::F32 => Self::F32(f32::from_bits(raw as u32)),
            ScalarType::F64 => Self::F64(f64::from_bits(raw)),
            ScalarType::Bool => Self::Bool(mask(raw, width) != 0),
            ty if ty.is_signed() => Self::I64(sign_extend(raw, width)).convert(ty),
            ty => Self::U64(mask(raw, width)).convert(ty),
        }
    }

    /// Parse authored text (decimal, `0x` hex, float or `true`/`false`).
    pub fn parse(ty: ScalarType, text: &str) -> Result<Self> {
        let text = text.trim();
        let unsupported = || CodecError::UnsupportedConversion {
            from: format!("'{}'", text),
            to: ty.name().to_string(),
        };
        match ty {
            ScalarType::Bool => match text {
                "true" | "TRUE" | "True" => Ok(Self::Bool(true)),
                "false" | "FALSE" | "False" => Ok(Self::Bool(false)),
                _ => parse_integer(text)
                    .map(|v| Self::Bool(v != 0))
                    .ok_or_else(unsupported),
            },
            ScalarType::F32 | ScalarType::F64 => text
                .parse::<f64>()
                .map(|v| Self::F64(v).convert(ty))
                .map_err(|_| unsupported()),
            ScalarType::U64 => match text.parse::<u64>() {
                Ok(v) => Ok(Self::U64(v)),
                Err(_) => parse_integer(text)
                    .map(|v| Self::I64(v).convert(ty))
                    .ok_or_else(unsupported),
            },
            _ => parse_integer(text)
                .map(|v| Self::I64(v).convert(ty))
                .ok_or_else(unsupported),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::I8(v) => write!(f, "{}", v),
            Self::U8(v) => write!(f, "{}", v),
            Self::I16(v) => write!(f, "{}", v),
            Self::U16(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::U32(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::U64(v) => write!(f, "{}", v),
            Self::F32(v) => write!(f, "{}", v),
            Self::F64(v) => write!(f, "{}", v),
        }
    }
}

fn mask(raw: u64, width: usize) -> u64 {
    if width >= 64 {
        raw
    } else {
        raw & ((1u64 << width) - 1)
    }
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    if bits == 0 || bits >= 64 {
        return value as i64;
    }
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Rust primitive usable with typed get/set.
pub trait Scalar: Copy + Send + Sync + 'static {
    const TYPE: ScalarType;

    fn into_value(self) -> Value;

    /// Convert any value into `Self`.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! impl_scalar {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const TYPE: ScalarType = ScalarType::$variant;

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value.convert(Self::TYPE) {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}
