// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for model types.

use crate::error::{CodecError, Result};
use crate::model::{ArraySize, ByteOrder, Element, EnumType, FormatVersion, StructType};

/// Builder for [`Element`]s.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    element: Element,
}

impl ElementBuilder {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            element: Element::new(name, type_name),
        }
    }

    /// Fixed array of `count` repetitions.
    pub fn array(mut self, count: usize) -> Self {
        self.element.array_size = ArraySize::Fixed(count);
        self
    }

    /// Dynamic array whose count is held by the earlier sibling `count_element`.
    pub fn dynamic_array(mut self, count_element: impl Into<String>) -> Self {
        self.element.array_size = ArraySize::Dynamic(count_element.into());
        self
    }

    /// Explicit serialized byte position.
    pub fn byte_pos(mut self, byte_pos: usize) -> Self {
        self.element.serialized.byte_pos = Some(byte_pos);
        self
    }

    /// Explicit serialized bit position within the byte.
    pub fn bit_pos(mut self, bit_pos: u8) -> Self {
        self.element.serialized.bit_pos = Some(bit_pos);
        self
    }

    /// Bit-width override for bit-packed fields.
    pub fn num_bits(mut self, num_bits: usize) -> Self {
        self.element.serialized.num_bits = Some(num_bits);
        self
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.element.serialized.byte_order = byte_order;
        self
    }

    pub fn big_endian(self) -> Self {
        self.byte_order(ByteOrder::BigEndian)
    }

    /// Deserialized alignment.
    pub fn alignment(mut self, alignment: usize) -> Self {
        self.element.deserialized.alignment = Some(alignment);
        self
    }

    pub fn constant(mut self, value: impl Into<String>) -> Self {
        self.element.value.constant = Some(value.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.element.value.default = Some(value.into());
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.element.unit = Some(unit.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.element.description = Some(text.into());
        self
    }

    pub fn build(self) -> Element {
        self.element
    }
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

/// Builder for [`StructType`]s.
///
/// The first rejected element (a duplicate name) is kept and returned by
/// [`build`](Self::build).
#[derive(Debug)]
pub struct StructBuilder {
    inner: StructType,
    error: Option<CodecError>,
}

impl StructBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: StructType::new(name),
            error: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.inner.version = version.into();
        self
    }

    pub fn format_version(mut self, version: FormatVersion) -> Self {
        self.inner.format_version = Some(version);
        self
    }

    pub fn alignment(mut self, alignment: usize) -> Self {
        self.inner.alignment = Some(alignment);
        self
    }

    /// Append an element.
    pub fn element(mut self, element: impl Into<Element>) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Err(e) = self.inner.push_element(element.into()) {
            log::debug!("[StructBuilder] '{}' rejected element: {}", self.inner.name, e);
            self.error = Some(e);
        }
        self
    }

    /// Append a scalar element of `type_name`.
    pub fn field(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.element(ElementBuilder::new(name, type_name))
    }

    pub fn build(self) -> Result<StructType> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.inner),
        }
    }
}

/// Builder for [`EnumType`]s with auto-incrementing values.
#[derive(Debug)]
pub struct EnumBuilder {
    inner: EnumType,
    next_value: i64,
}

impl EnumBuilder {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            inner: EnumType::new(name, data_type),
            next_value: 0,
        }
    }

    /// Add a value with an explicit number.
    pub fn value_with(mut self, name: impl Into<String>, value: i64) -> Self {
        if self.inner.add_value(name, value.to_string()) {
            self.next_value = value + 1;
        }
        self
    }

    /// Add a value numbered after the previous one.
    pub fn value(self, name: impl Into<String>) -> Self {
        let next = self.next_value;
        self.value_with(name, next)
    }

    pub fn build(self) -> EnumType {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_builder() {
        let s = StructBuilder::new("Frame")
            .version("2")
            .alignment(4)
            .field("id", "tUInt16")
            .element(ElementBuilder::new("data", "tUInt8").dynamic_array("id"))
            .build()
            .unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.version, "2");
        assert!(s.element("data").unwrap().array_size.is_dynamic());
    }

    #[test]
    fn test_struct_builder_rejects_duplicate_names() {
        let err = StructBuilder::new("S")
            .field("a", "tInt32")
            .field("a", "tInt8")
            .field("b", "tInt8")
            .build()
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidSchema(_)));

        let mut m = crate::model::TypeModel::new();
        let built = StructBuilder::new("S").field("a", "tInt32").field("a", "tInt8").build();
        assert!(built.and_then(|s| m.add_struct_type(s)).is_err());
        assert!(m.struct_type("S").is_none());
    }

    #[test]
    fn test_enum_builder_numbering() {
        let e = EnumBuilder::new("Gear", "tInt8")
            .value("PARK")
            .value_with("DRIVE", 10)
            .value("SPORT")
            .build();
        assert_eq!(e.value("PARK"), Some("0"));
        assert_eq!(e.value("SPORT"), Some("11"));
    }
}
