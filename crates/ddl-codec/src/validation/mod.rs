// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Referential-integrity and composition checks over a [`TypeModel`](crate::model::TypeModel).

mod problem;
mod service;

pub use problem::{Problem, ProblemKind, ValidationInfo, ValidationLevel};
pub use service::{ModelEvent, ValidationService};
