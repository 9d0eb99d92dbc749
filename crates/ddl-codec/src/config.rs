// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec configuration.
//!
//! Supports both programmatic and file-based (TOML) configuration.
//!
//! ```toml
//! default_version = "4.1"
//! layout_update = "from_first_change"
//! reset_zero_unset = true
//! leaf_fast_path = true
//! strict_static_size = true
//! ```

use crate::layout::LayoutUpdate;
use crate::model::FormatVersion;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tuning knobs for layout computation and codec runtime objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Format version used when neither the struct nor the model carries one.
    #[serde(default = "default_version")]
    pub default_version: String,

    /// Default cache update policy for struct layouts.
    #[serde(default)]
    pub layout_update: LayoutUpdate,

    /// `reset` writes zero into scalars lacking a constant or default.
    #[serde(default = "default_true")]
    pub reset_zero_unset: bool,

    /// Dispatch scalar get/set through the leaf fast path when eligible.
    #[serde(default = "default_true")]
    pub leaf_fast_path: bool,

    /// Static codecs demand an exact buffer length (otherwise `>=`).
    #[serde(default = "default_true")]
    pub strict_static_size: bool,
}

fn default_version() -> String {
    FormatVersion::LATEST.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            default_version: default_version(),
            layout_update: LayoutUpdate::default(),
            reset_zero_unset: true,
            leaf_fast_path: true,
            strict_static_size: true,
        }
    }
}

impl CodecConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.version().map(|_| ())
    }

    /// Parsed fallback format version.
    pub fn version(&self) -> Result<FormatVersion, ConfigError> {
        self.default_version.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "default_version '{}' is not a format version",
                self.default_version
            ))
        })
    }
}
