// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Whole-instance operations: cross-layout transform and reset to defaults.

use crate::codec::access::{ValueAccess, ValueAccessMut};
use crate::codec::traverse;
use crate::codec::{CodecIndex, FieldCount, StructLayout, Value};
use crate::error::{CodecError, Result};

/// Copy every leaf of `src` into the element of `dst` with the same full name.
///
/// Leaves are visited in order, so count fields reach `dst` before the
/// dynamic arrays they size. Enumerations present on both sides move by
/// value name, everything else by converted value. Leaves that do not
/// resolve in `dst` are skipped. Returns the number of leaves written.
pub fn transform<S, D>(src: &S, dst: &mut D) -> Result<usize>
where
    S: ValueAccess,
    D: ValueAccessMut,
{
    let mut written = 0;
    for handle in traverse::leaves(src) {
        let handle = handle?;
        let name = handle.full_name()?;
        let target = match dst.index_of(&name) {
            Ok(index) => index,
            Err(CodecError::NotFound(_) | CodecError::InvalidIndex { .. }) => {
                log::debug!("[transform] '{}' has no counterpart, skipped", name);
                continue;
            }
            Err(e) => return Err(e),
        };
        let src_enum = handle.resolve()?.field.is_some_and(|f| f.enum_layout().is_some());
        let dst_enum = match dst.resolve(&target) {
            Ok(r) => r.field.is_some_and(|f| f.enum_layout().is_some()),
            Err(CodecError::NotFound(_) | CodecError::InvalidIndex { .. }) => {
                log::debug!("[transform] '{}' does not resolve in destination, skipped", name);
                continue;
            }
            Err(e) => return Err(e),
        };
        let result = if src_enum && dst_enum {
            let text = handle.get_string()?;
            dst.set_string(&target, &text)
        } else {
            let value = handle.get_value()?;
            dst.set_value(&target, value)
        };
        match result {
            Ok(()) => written += 1,
            Err(
                e @ (CodecError::UnsupportedConversion { .. }
                | CodecError::TypeMismatch { .. }
                | CodecError::InvalidIndex { .. }),
            ) => {
                log::debug!("[transform] '{}' skipped: {}", name, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}

/// Restore leaves to their constant, else default, else zero (when
/// `zero_unset`). Repetitions of dynamic arrays are left alone.
pub fn reset<C: ValueAccessMut>(codec: &mut C, zero_unset: bool) -> Result<usize> {
    let mut targets: Vec<(CodecIndex, Option<String>)> = Vec::new();
    for handle in traverse::leaves(&*codec) {
        let handle = handle?;
        if through_dynamic_count(codec.layout(), handle.index()) {
            continue;
        }
        let resolved = handle.resolve()?;
        let text = resolved
            .field
            .and_then(|f| f.constant.clone().or_else(|| f.default.clone()));
        targets.push((handle.into_index(), text));
    }

    let mut written = 0;
    for (index, text) in targets {
        if let Some(text) = text {
            match codec.set_string(&index, &text) {
                Ok(()) => {
                    written += 1;
                    continue;
                }
                Err(CodecError::UnsupportedConversion { .. }) => {
                    log::warn!("[reset] '{}' ignored for element {}", text, index);
                }
                Err(e) => return Err(e),
            }
        }
        if zero_unset {
            let ty = codec.leaf_access(&index)?.scalar_type();
            codec.set_value(&index, Value::zero(ty))?;
            written += 1;
        }
    }
    Ok(written)
}

fn through_dynamic_count(root: &StructLayout, index: &CodecIndex) -> bool {
    let mut current = root;
    for step in index.steps() {
        let Some(field) = current.field(step.field) else {
            return false;
        };
        if matches!(field.count, FieldCount::Dynamic { .. }) {
            return true;
        }
        match field.nested() {
            Some(nested) => current = nested,
            None => break,
        }
    }
    false
}
