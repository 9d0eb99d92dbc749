// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Units referenced by data types and elements (informational).

/// A derived unit: `numerator / denominator + offset`, all kept as authored text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Unit {
    pub name: String,
    pub numerator: String,
    pub denominator: String,
    pub offset: String,
}

impl Unit {
    pub fn new(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
        offset: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
            offset: offset.into(),
        }
    }
}
