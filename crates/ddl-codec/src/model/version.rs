// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema format versions.

use crate::error::CodecError;
use std::fmt;
use std::str::FromStr;

/// Format version tag carried by a model and optionally by each struct.
///
/// The deserialized size rule changes at 3.0: from then on every array
/// repetition, including the last, pays its alignment padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "model-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormatVersion {
    pub major: u16,
    pub minor: u16,
}

impl FormatVersion {
    pub const V1_0: Self = Self::new(1, 0);
    pub const V2_0: Self = Self::new(2, 0);
    pub const V3_0: Self = Self::new(3, 0);
    pub const V4_0: Self = Self::new(4, 0);
    pub const V4_1: Self = Self::new(4, 1);
    /// Newest known version.
    pub const LATEST: Self = Self::V4_1;

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Whether every array repetition is padded to its alignment.
    pub fn pads_every_repetition(self) -> bool {
        self >= Self::V3_0
    }

    /// Whether this is one of the versions the layout rules know about.
    pub fn is_known(self) -> bool {
        [Self::V1_0, Self::V2_0, Self::V3_0, Self::V4_0, Self::V4_1].contains(&self)
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::LATEST
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for FormatVersion {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CodecError::InvalidSchema(format!("bad format version '{}'", s));
        let (major, minor) = match s.trim().split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s.trim(), "0"),
        };
        let major = major.parse().map_err(|_| invalid())?;
        let minor = minor.parse().map_err(|_| invalid())?;
        Ok(Self::new(major, minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(FormatVersion::V2_0 < FormatVersion::V3_0);
        assert!(FormatVersion::V4_0 < FormatVersion::V4_1);
        assert!(!FormatVersion::V2_0.pads_every_repetition());
        assert!(FormatVersion::V3_0.pads_every_repetition());
    }

    #[test]
    fn test_parse() {
        assert_eq!("4.1".parse::<FormatVersion>().unwrap(), FormatVersion::V4_1);
        assert_eq!("2".parse::<FormatVersion>().unwrap(), FormatVersion::V2_0);
        assert!("x.1".parse::<FormatVersion>().is_err());
        assert_eq!(FormatVersion::V3_0.to_string(), "3.0");
    }
}
