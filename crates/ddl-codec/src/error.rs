// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by the model, layout and codec layers.

use thiserror::Error;

/// Errors raised synchronously at the point of use.
///
/// Structural schema defects (cycles, dangling references) are not reported
/// through this type while editing; they accumulate as
/// [`Problem`](crate::validation::Problem)s instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Unresolved type, unit, element or path segment.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Index outside the current (possibly dynamic) bounds.
    #[error("Invalid index {index} (bound {bound})")]
    InvalidIndex { index: usize, bound: usize },

    /// Declared type incompatible with the requested scalar type.
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    /// Struct/enum composition refers back to itself.
    #[error("Recursive definition of '{0}'")]
    RecursiveDefinition(String),

    /// Buffer too small for the requested byte/bit access.
    #[error("Out of bounds: {offset}+{size} exceeds buffer of {len} bytes")]
    OutOfBounds { offset: usize, size: usize, len: usize },

    /// No scalar conversion path exists between the two types.
    #[error("Unsupported conversion from {from} to {to}")]
    UnsupportedConversion { from: String, to: String },

    /// Empty or malformed name/description handed to a factory or edit.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// A computed layout disagrees with what resolution can produce.
    #[error("Inconsistent layout: {0}")]
    Inconsistent(String),
}

impl CodecError {
    pub(crate) fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub(crate) fn out_of_bounds(offset: usize, size: usize, len: usize) -> Self {
        Self::OutOfBounds { offset, size, len }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CodecError>;
