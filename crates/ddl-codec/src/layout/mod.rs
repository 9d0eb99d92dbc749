// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout computation and caches.

mod calculator;
pub mod offsets;
mod type_info;

pub use calculator::LayoutUpdate;
pub use type_info::{BitPosition, ElementTypeInfo, TypeClass, TypeInfo};
