// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cached layout records for types and elements.

/// Memoized layout of a DataType, EnumType or StructType.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeInfo {
    /// Serialized bit size (for dynamic structs: the extent of the static part).
    pub bit_size: usize,
    /// Deserialized byte size.
    pub byte_size: usize,
    /// Deserialized byte size rounded up to `alignment`.
    pub aligned_byte_size: usize,
    pub alignment: usize,
    pub dynamic: bool,
    pub valid: bool,
}

impl TypeInfo {
    /// Placeholder for an unresolved or cyclic reference.
    pub const fn invalid() -> Self {
        Self {
            bit_size: 0,
            byte_size: 0,
            aligned_byte_size: 0,
            alignment: 1,
            dynamic: false,
            valid: false,
        }
    }
}

/// Byte/bit position in the serialized representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BitPosition {
    pub byte: usize,
    pub bit: u8,
}

impl BitPosition {
    pub const fn new(byte: usize, bit: u8) -> Self {
        Self { byte, bit }
    }

    /// Split an absolute bit offset.
    pub const fn from_bits(bits: usize) -> Self {
        Self {
            byte: bits / 8,
            bit: (bits % 8) as u8,
        }
    }

    /// Absolute bit offset.
    pub const fn bits(self) -> usize {
        self.byte * 8 + self.bit as usize
    }
}

/// Classification of the type an element references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Predefined,
    Data,
    Enum,
    Struct,
    /// Dangling or cyclic reference.
    Unresolved,
}

/// Memoized layout of one element within its struct.
///
/// Positions are `None` when a preceding sibling's extent is only known at
/// decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementTypeInfo {
    pub serialized: Option<BitPosition>,
    /// Serialized bit size; one repetition when the element is dynamic.
    pub bit_size: usize,
    pub deserialized: Option<usize>,
    /// Deserialized byte size; `None` when dynamic.
    pub deserialized_size: Option<usize>,
    /// Serialized bit size of one unit of the referenced type.
    pub type_bit_size: usize,
    pub type_byte_size: usize,
    pub type_aligned_byte_size: usize,
    /// Effective deserialized alignment.
    pub alignment: usize,
    pub type_class: TypeClass,
    pub dynamic: bool,
    pub after_dynamic: bool,
    pub valid: bool,
}

impl ElementTypeInfo {
    /// Absolute serialized bit offset just past this element.
    pub fn serialized_end(&self) -> Option<usize> {
        self.serialized.map(|p| p.bits() + self.bit_size)
    }

    /// Deserialized byte offset just past this element.
    pub fn deserialized_end(&self) -> Option<usize> {
        Some(self.deserialized? + self.deserialized_size?)
    }

    /// Whether the next sibling can no longer be placed statically.
    pub fn blocks_successors(&self) -> bool {
        self.dynamic || self.after_dynamic
    }
}
