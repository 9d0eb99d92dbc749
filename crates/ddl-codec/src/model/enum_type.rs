// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumerations over an underlying data type.

use crate::layout::TypeInfo;
use crate::validation::ValidationInfo;

/// Enumeration: named values stored as the underlying data type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumType {
    pub name: String,
    /// Name of the underlying data type.
    pub data_type: String,
    /// Ordered (name, value) pairs; the value text may be numeric or symbolic.
    pub values: Vec<EnumValue>,
    #[cfg_attr(feature = "model-serde", serde(skip))]
    pub(crate) type_info: Option<TypeInfo>,
    #[cfg_attr(feature = "model-serde", serde(skip))]
    pub(crate) validation: ValidationInfo,
}

/// One enumeration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumValue {
    pub name: String,
    pub value: String,
}

impl EnumType {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            values: Vec::new(),
            type_info: None,
            validation: ValidationInfo::default(),
        }
    }

    /// Append a value, rejecting duplicate names.
    pub fn add_value(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.value(&name).is_some() {
            return false;
        }
        self.values.push(EnumValue {
            name,
            value: value.into(),
        });
        true
    }

    /// Value text by entry name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }

    /// Entries whose value parses as an integer, resolving symbolic values
    /// that name another entry of the same enum.
    pub fn numeric_values(&self) -> Vec<(String, i64)> {
        self.values
            .iter()
            .filter_map(|v| self.resolve_value(&v.value, 0).map(|n| (v.name.clone(), n)))
            .collect()
    }

    fn resolve_value(&self, text: &str, depth: usize) -> Option<i64> {
        if let Some(n) = parse_integer(text) {
            return Some(n);
        }
        if depth >= self.values.len() {
            return None;
        }
        self.value(text.trim())
            .and_then(|next| self.resolve_value(next, depth + 1))
    }

    pub fn type_info(&self) -> Option<&TypeInfo> {
        self.type_info.as_ref()
    }

    pub fn validation(&self) -> &ValidationInfo {
        &self.validation
    }
}

/// Parse decimal or `0x` hexadecimal integer text.
pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}
