// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structures and their elements.
//!
//! Elements live in a vector owned by the struct and are addressed by
//! position; name uniqueness is checked against that vector directly.

use crate::error::{CodecError, Result};
use crate::layout::{ElementTypeInfo, TypeInfo};
use crate::model::FormatVersion;
use crate::validation::ValidationInfo;

/// Byte order of a serialized element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the running platform.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }

    pub fn is_native(self) -> bool {
        self == Self::native()
    }
}

/// Repetition count of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArraySize {
    /// Literal count fixed in the schema.
    Fixed(usize),
    /// Count read at decode time from the named earlier sibling.
    Dynamic(String),
}

impl ArraySize {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }

    /// Literal count, if fixed.
    pub fn fixed(&self) -> Option<usize> {
        match self {
            Self::Fixed(n) => Some(*n),
            Self::Dynamic(_) => None,
        }
    }

    /// Whether the element is declared as an array (fixed count other than 1, or dynamic).
    pub fn is_array(&self) -> bool {
        !matches!(self, Self::Fixed(1))
    }
}

impl Default for ArraySize {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

/// Placement in the serialized (wire) representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerializedInfo {
    /// Authored byte position; auto-computed when absent.
    pub byte_pos: Option<usize>,
    /// Authored bit position within `byte_pos`.
    pub bit_pos: Option<u8>,
    /// Bit-width override for bit-packed fields.
    pub num_bits: Option<usize>,
    pub byte_order: ByteOrder,
}

/// Placement in the deserialized (in-memory) representation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeserializedInfo {
    /// Explicit alignment; falls back to the referenced type's alignment.
    pub alignment: Option<usize>,
}

/// Constant and default values as authored text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueInfo {
    pub constant: Option<String>,
    pub default: Option<String>,
}

/// Informational scaling metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaleInfo {
    pub min: Option<String>,
    pub max: Option<String>,
    pub scale: Option<String>,
    pub offset: Option<String>,
}

/// A named member of a [`StructType`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element {
    pub name: String,
    /// DataType, EnumType or StructType name, resolved within the owning model.
    pub type_name: String,
    pub array_size: ArraySize,
    pub serialized: SerializedInfo,
    pub deserialized: DeserializedInfo,
    pub value: ValueInfo,
    pub scale: ScaleInfo,
    pub unit: Option<String>,
    pub description: Option<String>,
    #[cfg_attr(feature = "model-serde", serde(skip))]
    pub(crate) layout: Option<ElementTypeInfo>,
}

impl Element {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            array_size: ArraySize::default(),
            serialized: SerializedInfo::default(),
            deserialized: DeserializedInfo::default(),
            value: ValueInfo::default(),
            scale: ScaleInfo::default(),
            unit: None,
            description: None,
            layout: None,
        }
    }

    /// Whether the serialized position was explicitly authored.
    pub fn has_explicit_position(&self) -> bool {
        self.serialized.byte_pos.is_some()
    }

    /// Cached layout of this element, if computed and not invalidated since.
    pub fn layout(&self) -> Option<&ElementTypeInfo> {
        self.layout.as_ref()
    }

    /// Structural equality of the authored definition.
    ///
    /// Array sizes compare as authored: `Fixed(0)` and `Fixed(1)` differ here
    /// even though offset calculation treats both as one slot.
    pub fn layout_eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.type_name == other.type_name
            && self.array_size == other.array_size
            && self.serialized == other.serialized
            && self.deserialized == other.deserialized
    }
}

/// A structure: an ordered sequence of elements.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructType {
    pub name: String,
    /// Authored struct version string (informational).
    pub version: String,
    /// Format version overriding the model's file version.
    pub format_version: Option<FormatVersion>,
    /// Explicit deserialized alignment.
    pub alignment: Option<usize>,
    pub comment: Option<String>,
    elements: Vec<Element>,
    #[cfg_attr(feature = "model-serde", serde(skip))]
    pub(crate) type_info: Option<TypeInfo>,
    #[cfg_attr(feature = "model-serde", serde(skip))]
    pub(crate) validation: ValidationInfo,
}

impl StructType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1".to_string(),
            format_version: None,
            alignment: None,
            comment: None,
            elements: Vec::new(),
            type_info: None,
            validation: ValidationInfo::default(),
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    pub fn validation(&self) -> &ValidationInfo {
        &self.validation
    }

    /// Append an element; only the new element's layout becomes stale.
    pub fn push_element(&mut self, element: Element) -> Result<()> {
        self.check_new_name(&element.name)?;
        self.elements.push(element);
        self.type_info = None;
        Ok(())
    }

    /// Insert an element at `index`; layouts from `index` on become stale.
    pub fn insert_element(&mut self, index: usize, element: Element) -> Result<()> {
        if index > self.elements.len() {
            return Err(CodecError::InvalidIndex {
                index,
                bound: self.elements.len(),
            });
        }
        self.check_new_name(&element.name)?;
        self.elements.insert(index, element);
        self.invalidate_from(index);
        Ok(())
    }

    /// Remove an element by name.
    pub fn remove_element(&mut self, name: &str) -> Result<Element> {
        let index = self
            .element_index(name)
            .ok_or_else(|| CodecError::not_found(format!("{}.{}", self.name, name)))?;
        let removed = self.elements.remove(index);
        self.invalidate_from(index);
        Ok(removed)
    }

    /// Rename an element, keeping names unique.
    pub fn rename_element(&mut self, old: &str, new: &str) -> Result<()> {
        let index = self
            .element_index(old)
            .ok_or_else(|| CodecError::not_found(format!("{}.{}", self.name, old)))?;
        if old != new {
            self.check_new_name(new)?;
        }
        self.elements[index].name = new.to_string();
        self.invalidate_from(index);
        Ok(())
    }

    /// Edit an element in place; its layout and all following become stale.
    pub fn edit_element<F>(&mut self, name: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Element),
    {
        let index = self
            .element_index(name)
            .ok_or_else(|| CodecError::not_found(format!("{}.{}", self.name, name)))?;
        let mut element = self.elements[index].clone();
        edit(&mut element);
        if element.name != name {
            self.check_new_name(&element.name)?;
        }
        self.elements[index] = element;
        self.invalidate_from(index);
        Ok(())
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CodecError::InvalidSchema(format!(
                "empty element name in '{}'",
                self.name
            )));
        }
        if self.element(name).is_some() {
            return Err(CodecError::InvalidSchema(format!(
                "duplicate element '{}' in '{}'",
                name, self.name
            )));
        }
        Ok(())
    }

    /// Drop cached layouts from `index` to the end, plus the aggregate.
    pub(crate) fn invalidate_from(&mut self, index: usize) {
        for element in self.elements.iter_mut().skip(index) {
            element.layout = None;
        }
        self.type_info = None;
    }

    pub(crate) fn invalidate_all(&mut self) {
        self.invalidate_from(0);
    }

    /// Index of the first element without a cached layout.
    pub(crate) fn first_stale(&self) -> Option<usize> {
        self.elements.iter().position(|e| e.layout.is_none())
    }

    pub(crate) fn element_layout_mut(&mut self, index: usize) -> Option<&mut Option<ElementTypeInfo>> {
        self.elements.get_mut(index).map(|e| &mut e.layout)
    }
}
