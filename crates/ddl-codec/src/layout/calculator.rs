// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layout cache driver.
//!
//! Computes [`TypeInfo`]/[`ElementTypeInfo`] on demand and stores them on the
//! model entities. Referenced types are laid out recursively; a visiting stack
//! guarded by [`InProgress`] turns composition cycles into an error instead of
//! unbounded recursion.

use crate::error::{CodecError, Result};
use crate::layout::{offsets, ElementTypeInfo, TypeClass, TypeInfo};
use crate::model::{predefined, TypeModel, TypeRef};
use serde::{Deserialize, Serialize};

/// How much of a struct's cached layout is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutUpdate {
    /// Drop and recompute every element.
    Full,
    /// Recompute from the first stale element to the end.
    #[default]
    FromFirstChange,
    /// Recompute only a freshly appended last element, reusing its
    /// predecessor's cached layout; falls back to `FromFirstChange`.
    Append,
}

/// Marks a type as being laid out; popped on every exit path.
struct InProgress<'a> {
    stack: &'a mut Vec<String>,
}

impl<'a> InProgress<'a> {
    fn enter(stack: &'a mut Vec<String>, name: &str) -> Result<Self> {
        if let Some(start) = stack.iter().position(|n| n == name) {
            let mut cycle = stack[start..].join(" -> ");
            cycle.push_str(" -> ");
            cycle.push_str(name);
            return Err(CodecError::RecursiveDefinition(cycle));
        }
        stack.push(name.to_string());
        Ok(Self { stack })
    }

    fn stack(&mut self) -> &mut Vec<String> {
        self.stack
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.stack.pop();
    }
}

impl TypeModel {
    /// Layout of a model or predefined type, computed on demand.
    ///
    /// Struct layouts honor the model's [`LayoutUpdate`] policy.
    pub fn type_info(&mut self, name: &str) -> Result<TypeInfo> {
        let policy = self.layout_update;
        let mut visiting = Vec::new();
        self.type_info_with(name, policy, &mut visiting)
    }

    /// Recompute a struct's layout under an explicit policy.
    pub fn update_layout(&mut self, name: &str, policy: LayoutUpdate) -> Result<TypeInfo> {
        let i = match self.lookup(name) {
            Some(TypeRef::Struct(i)) => i,
            Some(_) => return self.type_info(name),
            None => return Err(CodecError::not_found(name)),
        };
        if policy == LayoutUpdate::Full {
            self.structs[i].invalidate_all();
        }
        let mut visiting = Vec::new();
        self.struct_info(i, policy, &mut visiting)
    }

    /// Layout of one element, laying out its struct first when needed.
    pub fn element_info(&mut self, struct_name: &str, element: &str) -> Result<ElementTypeInfo> {
        self.type_info(struct_name)?;
        let st = self
            .struct_type(struct_name)
            .ok_or_else(|| CodecError::not_found(struct_name))?;
        let el = st
            .element(element)
            .ok_or_else(|| CodecError::not_found(format!("{}.{}", struct_name, element)))?;
        el.layout()
            .copied()
            .ok_or_else(|| CodecError::Inconsistent(format!("{}.{} not laid out", struct_name, element)))
    }

    /// Cached layout without computing anything.
    pub fn cached_type_info(&self, name: &str) -> Option<TypeInfo> {
        match self.lookup(name) {
            Some(TypeRef::Data(i)) => self.data_types[i].type_info,
            Some(TypeRef::Enum(i)) => self.enums[i].type_info,
            Some(TypeRef::Struct(i)) => self.structs[i].type_info,
            None => predefined::data_type(name).map(|dt| offsets::data_type_info(&dt)),
        }
    }

    /// Classification of a type name.
    pub fn type_class(&self, name: &str) -> TypeClass {
        match self.lookup(name) {
            Some(TypeRef::Data(_)) => TypeClass::Data,
            Some(TypeRef::Enum(_)) => TypeClass::Enum,
            Some(TypeRef::Struct(_)) => TypeClass::Struct,
            None if predefined::scalar_type(name).is_some() => TypeClass::Predefined,
            None => TypeClass::Unresolved,
        }
    }

    fn type_info_with(
        &mut self,
        name: &str,
        policy: LayoutUpdate,
        visiting: &mut Vec<String>,
    ) -> Result<TypeInfo> {
        match self.lookup(name) {
            Some(TypeRef::Data(i)) => {
                if let Some(info) = self.data_types[i].type_info {
                    return Ok(info);
                }
                let info = offsets::data_type_info(&self.data_types[i]);
                self.data_types[i].type_info = Some(info);
                Ok(info)
            }
            Some(TypeRef::Enum(i)) => {
                if let Some(info) = self.enums[i].type_info {
                    return Ok(info);
                }
                let mut guard = InProgress::enter(visiting, name)?;
                let underlying = self.enums[i].data_type.clone();
                let info = match self.type_class(&underlying) {
                    TypeClass::Data | TypeClass::Predefined => {
                        let base = self.type_info_with(&underlying, policy, guard.stack())?;
                        offsets::enum_type_info(&base)
                    }
                    _ => TypeInfo::invalid(),
                };
                self.enums[i].type_info = Some(info);
                Ok(info)
            }
            Some(TypeRef::Struct(i)) => {
                if let Some(info) = self.structs[i].type_info {
                    return Ok(info);
                }
                self.struct_info(i, policy, visiting)
            }
            None => predefined::data_type(name)
                .map(|dt| offsets::data_type_info(&dt))
                .ok_or_else(|| CodecError::not_found(name)),
        }
    }

    fn struct_info(
        &mut self,
        i: usize,
        policy: LayoutUpdate,
        visiting: &mut Vec<String>,
    ) -> Result<TypeInfo> {
        let name = self.structs[i].name.clone();
        let mut guard = InProgress::enter(visiting, &name)?;
        let version = self.relevant_version(&self.structs[i]);
        let len = self.structs[i].len();

        let start = match self.structs[i].first_stale() {
            None => len,
            Some(first) if policy == LayoutUpdate::Append && first + 1 != len => {
                log::debug!(
                    "[Layout] '{}': append policy with stale element {} of {}, recomputing from there",
                    name,
                    first,
                    len
                );
                first
            }
            Some(first) => first,
        };

        for k in start..len {
            let element = self.structs[i].elements()[k].clone();
            let previous = match k {
                0 => None,
                _ => self.structs[i].elements()[k - 1].layout().copied(),
            };
            let class = self.type_class(&element.type_name);
            let referenced = match self.type_info_with(&element.type_name, policy, guard.stack()) {
                Ok(info) => info,
                Err(CodecError::RecursiveDefinition(cycle)) => {
                    log::warn!("[Layout] recursive definition: {}", cycle);
                    TypeInfo::invalid()
                }
                Err(CodecError::NotFound(_)) => TypeInfo::invalid(),
                Err(e) => return Err(e),
            };
            let class = if referenced.valid || class != TypeClass::Struct {
                class
            } else {
                TypeClass::Unresolved
            };
            let layout =
                offsets::element_layout(&element, &referenced, class, previous.as_ref(), version);
            if let Some(slot) = self.structs[i].element_layout_mut(k) {
                *slot = Some(layout);
            }
        }

        let layouts: Vec<ElementTypeInfo> = self.structs[i]
            .elements()
            .iter()
            .filter_map(|e| e.layout().copied())
            .collect();
        if layouts.len() != len {
            return Err(CodecError::Inconsistent(format!(
                "'{}' has {} elements but {} layouts",
                name,
                len,
                layouts.len()
            )));
        }
        let info = offsets::struct_type_info(self.structs[i].alignment, &layouts, version);
        log::debug!(
            "[Layout] '{}' v{}: {} bits serialized, {} bytes deserialized (align {}, dynamic={}, valid={}), recomputed {} of {} elements",
            name,
            version,
            info.bit_size,
            info.byte_size,
            info.alignment,
            info.dynamic,
            info.valid,
            len - start,
            len
        );
        self.structs[i].type_info = Some(info);
        Ok(info)
    }
}
