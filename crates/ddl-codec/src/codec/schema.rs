// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Resolved schema tree.
//!
//! A [`StructLayout`] is an immutable snapshot of a laid-out struct and every
//! type it references, shared through `Arc` by all codec objects built from
//! one factory. It holds only schema-static data: positions that depend on
//! decoded counts are computed per instance by [`resolve`](super::resolve).

use crate::codec::ScalarType;
use crate::error::{CodecError, Result};
use crate::layout::{BitPosition, TypeClass};
use crate::model::{predefined, ArraySize, ByteOrder, FormatVersion, TypeModel};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Which of the two layouts a buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Representation {
    /// In-memory layout: native byte order, aligned.
    #[default]
    Deserialized,
    /// Wire layout: authored positions, bit packing, explicit byte order.
    Serialized,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deserialized => f.write_str("deserialized"),
            Self::Serialized => f.write_str("serialized"),
        }
    }
}

/// Enumeration values with numeric resolution done.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumLayout {
    pub name: String,
    pub repr: ScalarType,
    pub values: Vec<(String, i64)>,
}

impl EnumLayout {
    pub fn name_of(&self, value: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }

    pub fn value_of(&self, name: &str) -> Option<i64> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

/// What a field holds.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Predefined primitive.
    Scalar(ScalarType),
    /// Enumeration stored as `repr`.
    Enum {
        repr: ScalarType,
        layout: Arc<EnumLayout>,
    },
    /// User data type; `repr` is `None` when wider than 64 bits.
    Raw { repr: Option<ScalarType> },
    Struct(Arc<StructLayout>),
    /// Dangling or cyclic reference.
    Unresolved,
}

/// Repetition count of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCount {
    Fixed(usize),
    /// Read at decode time from sibling `field`.
    Dynamic { field: usize },
}

/// One element of a [`StructLayout`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    pub name: String,
    pub type_name: String,
    pub kind: FieldKind,
    pub count: FieldCount,
    /// Authored array size.
    pub array_size: ArraySize,
    pub serialized: Option<BitPosition>,
    pub deserialized: Option<usize>,
    /// Serialized bit size (one repetition when dynamic).
    pub bit_size: usize,
    /// Serialized bit stride between repetitions.
    pub repetition_bits: usize,
    pub type_byte_size: usize,
    pub type_aligned_byte_size: usize,
    pub alignment: usize,
    pub byte_order: ByteOrder,
    pub dynamic: bool,
    pub after_dynamic: bool,
    pub valid: bool,
    pub constant: Option<String>,
    pub default: Option<String>,
}

impl FieldLayout {
    /// Scalar type of one repetition, if the field is a leaf.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        match &self.kind {
            FieldKind::Scalar(ty) => Some(*ty),
            FieldKind::Enum { repr, .. } => Some(*repr),
            FieldKind::Raw { repr } => *repr,
            FieldKind::Struct(_) | FieldKind::Unresolved => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.scalar_type().is_some()
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, FieldKind::Struct(_))
    }

    /// Declared as an array (authored count other than 1, or dynamic).
    pub fn is_array(&self) -> bool {
        self.array_size.is_array()
    }

    pub fn nested(&self) -> Option<&Arc<StructLayout>> {
        match &self.kind {
            FieldKind::Struct(layout) => Some(layout),
            _ => None,
        }
    }

    pub fn enum_layout(&self) -> Option<&Arc<EnumLayout>> {
        match &self.kind {
            FieldKind::Enum { layout, .. } => Some(layout),
            _ => None,
        }
    }

    /// Bit width of one leaf repetition in `repr`.
    pub fn leaf_bits(&self, repr: Representation) -> usize {
        match repr {
            Representation::Serialized => self.repetition_bits,
            Representation::Deserialized => (self.type_byte_size * 8).min(64),
        }
    }

    /// Static position in `repr`, in bits.
    pub fn static_position(&self, repr: Representation) -> Option<usize> {
        match repr {
            Representation::Serialized => self.serialized.map(BitPosition::bits),
            Representation::Deserialized => self.deserialized.map(|b| b * 8),
        }
    }
}

/// Immutable laid-out struct.
#[derive(Debug, Clone, PartialEq)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<FieldLayout>,
    pub alignment: usize,
    pub version: FormatVersion,
    pub dynamic: bool,
    /// Serialized bit size of the static part.
    pub serialized_bits: usize,
    /// Deserialized byte size of the static part.
    pub deserialized_size: usize,
    pub aligned_deserialized_size: usize,
    pub valid: bool,
}

impl StructLayout {
    pub fn field(&self, index: usize) -> Option<&FieldLayout> {
        self.fields.get(index)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Static byte size of an instance in `repr` (static part only when dynamic).
    pub fn static_size(&self, repr: Representation) -> usize {
        match repr {
            Representation::Serialized => self.serialized_bits.div_ceil(8),
            Representation::Deserialized => self.deserialized_size,
        }
    }
}

/// Lay out `name` and snapshot it (and everything it references).
pub fn compile(model: &mut TypeModel, name: &str) -> Result<Arc<StructLayout>> {
    if name.is_empty() {
        return Err(CodecError::InvalidSchema("empty struct name".into()));
    }
    if model.struct_type(name).is_none() {
        return Err(CodecError::not_found(name));
    }
    model.type_info(name)?;
    let mut compiler = Compiler {
        model,
        memo: HashMap::new(),
        visiting: Vec::new(),
    };
    compiler
        .struct_layout(name)?
        .ok_or_else(|| CodecError::RecursiveDefinition(name.to_string()))
}

struct Compiler<'m> {
    model: &'m TypeModel,
    memo: HashMap<String, Arc<StructLayout>>,
    visiting: Vec<String>,
}

impl Compiler<'_> {
    /// `None` when `name` is already being compiled (a cycle).
    fn struct_layout(&mut self, name: &str) -> Result<Option<Arc<StructLayout>>> {
        if let Some(layout) = self.memo.get(name) {
            return Ok(Some(layout.clone()));
        }
        if self.visiting.iter().any(|v| v == name) {
            return Ok(None);
        }
        let model = self.model;
        let st = model
            .struct_type(name)
            .ok_or_else(|| CodecError::not_found(name))?;
        let info = st
            .type_info()
            .copied()
            .ok_or_else(|| CodecError::Inconsistent(format!("'{}' not laid out", name)))?;

        self.visiting.push(name.to_string());
        let mut fields = Vec::with_capacity(st.len());
        for (index, element) in st.elements().iter().enumerate() {
            let layout = element.layout().copied().ok_or_else(|| {
                CodecError::Inconsistent(format!("'{}.{}' not laid out", name, element.name))
            })?;
            let kind = match self.field_kind(&element.type_name, layout.type_class) {
                Ok(kind) => kind,
                Err(e) => {
                    self.visiting.pop();
                    return Err(e);
                }
            };
            let (count, count_valid) = match &element.array_size {
                ArraySize::Fixed(n) => (FieldCount::Fixed((*n).max(1)), true),
                ArraySize::Dynamic(counter) => match st.element_index(counter) {
                    Some(field) if field < index => (FieldCount::Dynamic { field }, true),
                    _ => (FieldCount::Fixed(0), false),
                },
            };
            let repetition_bits = match count {
                FieldCount::Fixed(n) => layout.bit_size / n.max(1),
                FieldCount::Dynamic { .. } => layout.bit_size,
            };
            let valid = layout.valid && count_valid && kind != FieldKind::Unresolved;
            fields.push(FieldLayout {
                name: element.name.clone(),
                type_name: element.type_name.clone(),
                kind,
                count,
                array_size: element.array_size.clone(),
                serialized: layout.serialized,
                deserialized: layout.deserialized,
                bit_size: layout.bit_size,
                repetition_bits,
                type_byte_size: layout.type_byte_size,
                type_aligned_byte_size: layout.type_aligned_byte_size,
                alignment: layout.alignment,
                byte_order: element.serialized.byte_order,
                dynamic: layout.dynamic,
                after_dynamic: layout.after_dynamic,
                valid,
                constant: element.value.constant.clone(),
                default: element.value.default.clone(),
            });
        }
        self.visiting.pop();

        let layout = Arc::new(StructLayout {
            name: name.to_string(),
            valid: info.valid && fields.iter().all(|f| f.valid),
            fields,
            alignment: info.alignment,
            version: model.relevant_version(st),
            dynamic: info.dynamic,
            serialized_bits: info.bit_size,
            deserialized_size: info.byte_size,
            aligned_deserialized_size: info.aligned_byte_size,
        });
        self.memo.insert(name.to_string(), layout.clone());
        Ok(Some(layout))
    }

    fn field_kind(&mut self, type_name: &str, class: TypeClass) -> Result<FieldKind> {
        let model = self.model;
        Ok(match class {
            TypeClass::Predefined => predefined::scalar_type(type_name)
                .map(FieldKind::Scalar)
                .unwrap_or(FieldKind::Unresolved),
            TypeClass::Data => match model.data_type(type_name) {
                Some(dt) if dt.array_size.unwrap_or(1) <= 1 => FieldKind::Raw {
                    repr: ScalarType::unsigned_for_bits(dt.bit_size),
                },
                Some(_) => FieldKind::Raw { repr: None },
                None => FieldKind::Unresolved,
            },
            TypeClass::Enum => match model.enum_type(type_name) {
                Some(en) => {
                    let repr = predefined::scalar_type(&en.data_type).or_else(|| {
                        model
                            .data_type(&en.data_type)
                            .and_then(|dt| ScalarType::unsigned_for_bits(dt.bit_size))
                    });
                    match repr {
                        Some(repr) => FieldKind::Enum {
                            repr,
                            layout: Arc::new(EnumLayout {
                                name: en.name.clone(),
                                repr,
                                values: en.numeric_values(),
                            }),
                        },
                        None => FieldKind::Unresolved,
                    }
                }
                None => FieldKind::Unresolved,
            },
            TypeClass::Struct => match self.struct_layout(type_name)? {
                Some(layout) => FieldKind::Struct(layout),
                None => FieldKind::Unresolved,
            },
            TypeClass::Unresolved => FieldKind::Unresolved,
        })
    }
}
