// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Validation results: levels, problems and per-type info.

use std::fmt;

/// Ordered validity levels: `Invalid < Unknown < GoodEnough < Valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ValidationLevel {
    Invalid,
    /// Never validated, or stale since the last edit.
    #[default]
    Unknown,
    /// Usable for layout; informational metadata has defects.
    GoodEnough,
    Valid,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    /// A type-name reference resolves neither locally nor to a predefined type.
    TypeNotFound,
    /// A unit reference resolves neither locally nor to a base unit.
    UnitNotFound,
    /// Composition refers back to the type itself.
    RecursiveType,
    /// A referenced type is itself invalid.
    ReferencedTypeInvalid,
    DynamicArraySizeNotFound,
    /// The count element does not precede the dynamic array.
    DynamicArraySizeNotBefore,
    /// The count element is itself an array.
    DynamicArraySizeNotScalar,
    DynamicArraySizeNotIntegral,
    EnumUnderlyingNotFound,
    EnumDuplicateValueName,
    /// Alignment is zero or not a power of two.
    InvalidAlignment,
    /// Zero bit size.
    InvalidSize,
    /// Bit-width override larger than the type's native bit size.
    BitWidthTooLarge,
}

impl ProblemKind {
    /// Level a model drops to when this problem is present.
    pub fn severity(self) -> ValidationLevel {
        match self {
            Self::UnitNotFound | Self::BitWidthTooLarge => ValidationLevel::GoodEnough,
            _ => ValidationLevel::Invalid,
        }
    }
}

/// One validation finding, naming the offending type/element/unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Problem {
    pub kind: ProblemKind,
    pub name: String,
    pub message: String,
}

impl Problem {
    pub fn new(kind: ProblemKind, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at '{}': {}", self.kind, self.name, self.message)
    }
}

/// Pass/fail state of one type plus its problems.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationInfo {
    level: ValidationLevel,
    problems: Vec<Problem>,
}

impl ValidationInfo {
    /// Build from a problem list; no problems means `Valid`.
    pub fn from_problems(problems: Vec<Problem>) -> Self {
        let level = problems
            .iter()
            .map(|p| p.kind.severity())
            .min()
            .unwrap_or(ValidationLevel::Valid);
        Self { level, problems }
    }

    pub fn level(&self) -> ValidationLevel {
        self.level
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Monotone comparison against the cached level.
    pub fn is_valid(&self, level: ValidationLevel) -> bool {
        self.level >= level
    }

    pub(crate) fn mark_stale(&mut self) {
        self.level = ValidationLevel::Unknown;
        self.problems.clear();
    }
}
