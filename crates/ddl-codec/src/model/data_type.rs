// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Leaf data types.

use crate::layout::TypeInfo;
use crate::validation::ValidationInfo;

/// A named primitive of a given bit size.
///
/// Unit, minimum and maximum are informational and never affect layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataType {
    /// Type name, unique within a model.
    pub name: String,
    /// Bit size of one value.
    pub bit_size: usize,
    /// Fixed repetition count baked into the type (e.g. fixed-size strings).
    pub array_size: Option<usize>,
    /// Default deserialized alignment in bytes.
    pub alignment: Option<usize>,
    /// Unit name (model unit or predefined base unit).
    pub unit: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub description: Option<String>,
    #[cfg_attr(feature = "model-serde", serde(skip))]
    pub(crate) type_info: Option<TypeInfo>,
    #[cfg_attr(feature = "model-serde", serde(skip))]
    pub(crate) validation: ValidationInfo,
}

impl DataType {
    /// Create a data type of `bit_size` bits.
    pub fn new(name: impl Into<String>, bit_size: usize) -> Self {
        Self {
            name: name.into(),
            bit_size,
            array_size: None,
            alignment: None,
            unit: None,
            min: None,
            max: None,
            description: None,
            type_info: None,
            validation: ValidationInfo::default(),
        }
    }

    /// Set the default alignment.
    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Set a fixed array size.
    pub fn with_array_size(mut self, array_size: usize) -> Self {
        self.array_size = Some(array_size);
        self
    }

    /// Set the unit reference.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the informational value range.
    pub fn with_range(mut self, min: impl Into<String>, max: impl Into<String>) -> Self {
        self.min = Some(min.into());
        self.max = Some(max.into());
        self
    }

    /// Cached layout, if computed and not invalidated since.
    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    /// Last validation result.
    pub fn validation(&self) -> &ValidationInfo {
        &self.validation
    }
}
