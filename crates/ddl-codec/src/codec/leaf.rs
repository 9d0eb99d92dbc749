// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Leaf fast path.
//!
//! A [`LeafCodecIndex`] is a small `Copy` descriptor of one scalar field
//! resolved for one representation. Access never walks the schema again: it
//! is a bounds check plus either a native byte copy or a bit extraction.

use crate::codec::{
    bits, FieldKind, FieldLayout, Representation, ResolvedElement, Scalar, ScalarType, Value,
};
use crate::error::{CodecError, Result};
use crate::model::ByteOrder;
use std::marker::PhantomData;

/// How a leaf is moved in and out of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AccessMode {
    /// Byte-aligned, full-width, native byte order.
    Plain = 0,
    PackedLe = 1,
    PackedBe = 2,
}

/// Declared type of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafType {
    Scalar(ScalarType),
    /// Enumeration stored as the given scalar.
    Enum(ScalarType),
    /// User data type read as the given scalar.
    Raw(ScalarType),
}

impl LeafType {
    pub fn scalar_type(self) -> ScalarType {
        match self {
            Self::Scalar(ty) | Self::Enum(ty) | Self::Raw(ty) => ty,
        }
    }

    /// Whether values of type `requested` may be converted to/from this leaf.
    pub fn check_conversion(self, requested: ScalarType) -> Result<()> {
        match self {
            Self::Enum(repr) if !requested.is_integer() => Err(CodecError::UnsupportedConversion {
                from: format!("enum({})", repr),
                to: requested.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Compact descriptor of one scalar leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafCodecIndex {
    byte_pos: usize,
    bit_pos: u8,
    leaf_type: LeafType,
    bit_size: u16,
    mode: AccessMode,
}

impl LeafCodecIndex {
    /// Descriptor for a resolved element.
    ///
    /// Only predefined scalars and enumerations whose size is exactly a
    /// machine width qualify.
    pub fn new(resolved: &ResolvedElement<'_>) -> Result<Self> {
        let field = resolved.field.ok_or_else(|| CodecError::TypeMismatch {
            expected: "scalar leaf".into(),
            got: format!("struct '{}'", resolved.parent.name),
        })?;
        let declared = match &field.kind {
            FieldKind::Scalar(ty) => *ty,
            FieldKind::Enum { repr, .. } => *repr,
            _ => {
                return Err(CodecError::TypeMismatch {
                    expected: "predefined scalar or enum".into(),
                    got: field.type_name.clone(),
                })
            }
        };
        let width = field.leaf_bits(resolved.repr);
        if width != declared.bit_size() {
            return Err(CodecError::TypeMismatch {
                expected: format!("{} bits", declared.bit_size()),
                got: format!("{} bits", width),
            });
        }
        let leaf = resolved.leaf_access()?;
        if resolved.repr == Representation::Serialized && leaf.mode == AccessMode::Plain {
            log::trace!(
                "[LeafCodecIndex] '{}' serialized access downgraded to plain at byte {}",
                field.name,
                leaf.byte_pos
            );
        }
        Ok(leaf)
    }

    /// Descriptor for any leaf field up to 64 bits wide, at bit `start`.
    pub(crate) fn access(field: &FieldLayout, start: usize, repr: Representation) -> Result<Self> {
        let leaf_type = match &field.kind {
            FieldKind::Scalar(ty) => LeafType::Scalar(*ty),
            FieldKind::Enum { repr, .. } => LeafType::Enum(*repr),
            FieldKind::Raw { repr: Some(ty) } => LeafType::Raw(*ty),
            _ => {
                return Err(CodecError::TypeMismatch {
                    expected: "scalar leaf".into(),
                    got: field.type_name.clone(),
                })
            }
        };
        let ty = leaf_type.scalar_type();
        let width = field.leaf_bits(repr).min(ty.bit_size());
        if width == 0 {
            return Err(CodecError::TypeMismatch {
                expected: ty.to_string(),
                got: "0 bits".into(),
            });
        }
        let aligned = start % 8 == 0 && width == ty.bit_size();
        let mode = match repr {
            // Serialized bytes equal deserialized bytes here.
            _ if aligned && (repr == Representation::Deserialized || field.byte_order.is_native()) => {
                AccessMode::Plain
            }
            Representation::Deserialized => packed(ByteOrder::native()),
            Representation::Serialized => packed(field.byte_order),
        };
        Ok(Self {
            byte_pos: start / 8,
            bit_pos: (start % 8) as u8,
            leaf_type,
            bit_size: width as u16,
            mode,
        })
    }

    pub fn byte_pos(&self) -> usize {
        self.byte_pos
    }

    pub fn bit_pos(&self) -> u8 {
        self.bit_pos
    }

    pub fn bit_size(&self) -> usize {
        usize::from(self.bit_size)
    }

    pub fn leaf_type(&self) -> LeafType {
        self.leaf_type
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.leaf_type.scalar_type()
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    fn bit_offset(&self) -> usize {
        self.byte_pos * 8 + usize::from(self.bit_pos)
    }

    /// Read the leaf as its declared type.
    pub fn read(&self, buf: &[u8]) -> Result<Value> {
        let ty = self.scalar_type();
        match self.mode {
            AccessMode::Plain => bits::read_plain(buf, self.byte_pos, ty),
            AccessMode::PackedLe => {
                let raw = bits::read_bits(buf, self.bit_offset(), self.bit_size(), ByteOrder::LittleEndian)?;
                Ok(Value::from_bits(ty, raw, self.bit_size()))
            }
            AccessMode::PackedBe => {
                let raw = bits::read_bits(buf, self.bit_offset(), self.bit_size(), ByteOrder::BigEndian)?;
                Ok(Value::from_bits(ty, raw, self.bit_size()))
            }
        }
    }

    /// Write `value`, converted to the declared type.
    pub fn write(&self, buf: &mut [u8], value: Value) -> Result<()> {
        self.leaf_type.check_conversion(value.scalar_type())?;
        let value = value.convert(self.scalar_type());
        match self.mode {
            AccessMode::Plain => bits::write_plain(buf, self.byte_pos, value),
            AccessMode::PackedLe => bits::write_bits(
                buf,
                self.bit_offset(),
                self.bit_size(),
                ByteOrder::LittleEndian,
                value.to_bits(),
            ),
            AccessMode::PackedBe => bits::write_bits(
                buf,
                self.bit_offset(),
                self.bit_size(),
                ByteOrder::BigEndian,
                value.to_bits(),
            ),
        }
    }

    /// Read and convert to `T`.
    pub fn get<T: Scalar>(&self, buf: &[u8]) -> Result<T> {
        self.leaf_type.check_conversion(T::TYPE)?;
        convert_to(self.read(buf)?)
    }

    pub fn set<T: Scalar>(&self, buf: &mut [u8], value: T) -> Result<()> {
        self.write(buf, value.into_value())
    }

    /// Statically typed view; conversion support is checked once, here.
    pub fn typed<T: Scalar>(self) -> Result<TypedLeafIndex<T>> {
        self.leaf_type.check_conversion(T::TYPE)?;
        Ok(TypedLeafIndex {
            leaf: self,
            _marker: PhantomData,
        })
    }
}

fn packed(order: ByteOrder) -> AccessMode {
    match order {
        ByteOrder::LittleEndian => AccessMode::PackedLe,
        ByteOrder::BigEndian => AccessMode::PackedBe,
    }
}

pub(crate) fn convert_to<T: Scalar>(value: Value) -> Result<T> {
    T::from_value(value).ok_or_else(|| CodecError::TypeMismatch {
        expected: T::TYPE.to_string(),
        got: value.scalar_type().to_string(),
    })
}

/// [`LeafCodecIndex`] bound to a Rust type at construction.
#[derive(Debug, Clone, Copy)]
pub struct TypedLeafIndex<T> {
    leaf: LeafCodecIndex,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Scalar> TypedLeafIndex<T> {
    pub fn leaf(&self) -> &LeafCodecIndex {
        &self.leaf
    }

    pub fn get(&self, buf: &[u8]) -> Result<T> {
        convert_to(self.leaf.read(buf)?)
    }

    pub fn set(&self, buf: &mut [u8], value: T) -> Result<()> {
        self.leaf.write(buf, value.into_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{compile, resolve, CodecIndex, StructLayout};
    use crate::model::{DataType, ElementBuilder, EnumBuilder, StructBuilder, TypeModel};
    use std::sync::Arc;

    fn packet() -> Arc<StructLayout> {
        let mut m = TypeModel::new();
        m.add_data_type(DataType::new("tRaw12", 12)).unwrap();
        m.add_enum_type(EnumBuilder::new("Mode", "tUInt16").value("Off").value("On").build())
            .unwrap();
        m.add_struct_type(
            StructBuilder::new("Packet")
                .element(ElementBuilder::new("flags", "tUInt8").num_bits(3))
                .element(ElementBuilder::new("rest", "tUInt8").num_bits(5))
                .element(ElementBuilder::new("word", "tUInt16").big_endian())
                .field("plain", "tInt32")
                .field("mode", "Mode")
                .field("raw", "tRaw12")
                .build()
                .unwrap(),
        )
        .unwrap();
        compile(&mut m, "Packet").unwrap()
    }

    fn leaf(layout: &StructLayout, repr: Representation, path: &str) -> Result<LeafCodecIndex> {
        let index = CodecIndex::from_path(layout, path)?;
        LeafCodecIndex::new(&resolve(layout, repr, None, &index)?)
    }

    #[test]
    fn test_serialized_native_downgrades_to_plain() {
        let layout = packet();
        let plain = leaf(&layout, Representation::Serialized, "plain").unwrap();
        let expected = if ByteOrder::LittleEndian.is_native() {
            AccessMode::Plain
        } else {
            AccessMode::PackedLe
        };
        assert_eq!(plain.mode(), expected);
        assert_eq!(plain.byte_pos(), 3);
    }

    #[test]
    fn test_big_endian_packed() {
        let layout = packet();
        let word = leaf(&layout, Representation::Serialized, "word").unwrap();
        assert_eq!(word.mode(), AccessMode::PackedBe);
        let mut buf = [0u8; 12];
        word.set(&mut buf, 0x1234u16).unwrap();
        assert_eq!(&buf[1..3], &[0x12, 0x34]);
        assert_eq!(word.get::<u16>(&buf).unwrap(), 0x1234);
    }

    #[test]
    fn test_strict_construction() {
        let layout = packet();
        assert!(matches!(
            leaf(&layout, Representation::Serialized, "flags"),
            Err(CodecError::TypeMismatch { .. })
        ));
        // Deserialized, the field occupies its full byte.
        let flags = leaf(&layout, Representation::Deserialized, "flags").unwrap();
        assert_eq!(flags.mode(), AccessMode::Plain);
        assert!(matches!(
            leaf(&layout, Representation::Deserialized, "raw"),
            Err(CodecError::TypeMismatch { .. })
        ));
        assert!(matches!(
            leaf(&layout, Representation::Deserialized, ""),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_lenient_access_for_bitfields() {
        let layout = packet();
        let index = CodecIndex::from_path(&layout, "rest").unwrap();
        let rest = resolve(&layout, Representation::Serialized, None, &index)
            .unwrap()
            .leaf_access()
            .unwrap();
        assert_eq!((rest.byte_pos(), rest.bit_pos(), rest.bit_size()), (0, 3, 5));
        let mut buf = [0xFFu8; 12];
        rest.set(&mut buf, 0u8).unwrap();
        assert_eq!(buf[0], 0b0000_0111);
        rest.set(&mut buf, 0x3Fu8).unwrap();
        // Truncated to five bits.
        assert_eq!(rest.get::<u8>(&buf).unwrap(), 0x1F);
    }

    #[test]
    fn test_enum_conversions() {
        let layout = packet();
        let mode = leaf(&layout, Representation::Deserialized, "mode").unwrap();
        assert_eq!(mode.leaf_type(), LeafType::Enum(ScalarType::U16));
        assert!(matches!(
            mode.typed::<f32>(),
            Err(CodecError::UnsupportedConversion { .. })
        ));
        let typed = mode.typed::<i64>().unwrap();
        let mut buf = [0u8; 16];
        typed.set(&mut buf, 1).unwrap();
        assert_eq!(typed.get(&buf).unwrap(), 1);
        assert!(matches!(
            mode.write(&mut buf, Value::F64(1.0)),
            Err(CodecError::UnsupportedConversion { .. })
        ));
    }

    #[test]
    fn test_bounds_checked() {
        let layout = packet();
        let plain = leaf(&layout, Representation::Deserialized, "plain").unwrap();
        let mut short = [0u8; 5];
        assert!(matches!(
            plain.set(&mut short, 1i32),
            Err(CodecError::OutOfBounds { .. })
        ));
        assert!(matches!(plain.read(&short), Err(CodecError::OutOfBounds { .. })));
    }
}
