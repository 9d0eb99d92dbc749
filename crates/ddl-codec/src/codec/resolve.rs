// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Buffer-dependent element resolution.
//!
//! Walks a [`StructLayout`] together with a concrete buffer. Fields with a
//! static position are used as anchors; fields after dynamic content are
//! placed by walking forward from the nearest anchor, reading runtime counts
//! from the buffer as needed. All arithmetic is in bits (deserialized byte
//! positions are scaled by 8). Nothing computed here is written back into the
//! shared schema.

use crate::codec::{
    CodecIndex, FieldCount, FieldKind, FieldLayout, LeafCodecIndex, Representation, StructLayout,
};
use crate::error::{CodecError, Result};
use crate::layout::offsets::align_up;

/// Bit extent of one field inside an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldSpan {
    pub start: usize,
    pub count: usize,
    pub size: usize,
}

impl FieldSpan {
    fn end(&self) -> usize {
        self.start + self.size
    }
}

/// One struct instance located at `base` bits into `buf`.
#[derive(Clone, Copy)]
pub(crate) struct Instance<'a> {
    pub layout: &'a StructLayout,
    pub repr: Representation,
    pub buf: Option<&'a [u8]>,
    pub base: usize,
}

impl<'a> Instance<'a> {
    pub fn new(layout: &'a StructLayout, repr: Representation, buf: Option<&'a [u8]>) -> Self {
        Self {
            layout,
            repr,
            buf,
            base: 0,
        }
    }

    fn at(&self, layout: &'a StructLayout, base: usize) -> Self {
        Self {
            layout,
            base,
            ..*self
        }
    }

    fn field(&self, index: usize) -> Result<&'a FieldLayout> {
        self.layout.field(index).ok_or(CodecError::InvalidIndex {
            index,
            bound: self.layout.len(),
        })
    }

    /// Extent of field `index`.
    pub fn field_span(&self, index: usize) -> Result<FieldSpan> {
        let field = self.field(index)?;
        if let Some(pos) = field.static_position(self.repr) {
            return self.span_at(field, self.base + pos);
        }
        let anchor = (0..index)
            .rev()
            .find(|&k| self.layout.fields[k].static_position(self.repr).is_some())
            .ok_or_else(|| {
                CodecError::Inconsistent(format!(
                    "'{}.{}' has no statically placed predecessor",
                    self.layout.name, field.name
                ))
            })?;
        let layout = self.layout;
        let mut span = self.span_at(&layout.fields[anchor], self.base + self.static_pos(anchor)?)?;
        for k in anchor + 1..=index {
            let next = &layout.fields[k];
            let start = match next.static_position(self.repr) {
                Some(pos) => self.base + pos,
                None => self.follow(span.end(), next),
            };
            span = self.span_at(next, start)?;
        }
        Ok(span)
    }

    fn static_pos(&self, index: usize) -> Result<usize> {
        self.layout.fields[index]
            .static_position(self.repr)
            .ok_or_else(|| CodecError::Inconsistent(format!("field {} is not static", index)))
    }

    /// Start of a field placed right after a predecessor ending at `end`.
    fn follow(&self, end: usize, field: &FieldLayout) -> usize {
        match self.repr {
            Representation::Serialized => end,
            Representation::Deserialized => align_up(end.div_ceil(8), field.alignment) * 8,
        }
    }

    /// Repetition count of `field` in this instance.
    pub fn count(&self, field: &FieldLayout) -> Result<usize> {
        match field.count {
            FieldCount::Fixed(n) => Ok(n),
            FieldCount::Dynamic { field: counter } => {
                let Some(buf) = self.buf else {
                    return Ok(0);
                };
                let span = self.field_span(counter)?;
                let counter_field = self.field(counter)?;
                let value = LeafCodecIndex::access(counter_field, span.start, self.repr)?.read(buf)?;
                let Some(n) = value.as_u64() else {
                    return Ok(0);
                };
                // A count beyond the buffer's bit length cannot describe this buffer.
                match usize::try_from(n) {
                    Ok(n) if n <= buf.len().saturating_mul(8) => Ok(n),
                    _ => {
                        log::debug!(
                            "[Codec] '{}.{}' count {} exceeds buffer of {} bytes",
                            self.layout.name,
                            field.name,
                            n,
                            buf.len()
                        );
                        Err(CodecError::out_of_bounds(span.start / 8, usize::MAX, buf.len()))
                    }
                }
            }
        }
    }

    /// Overflow or a dynamic span running past the bound buffer.
    fn overflow(&self, start: usize) -> CodecError {
        CodecError::out_of_bounds(start / 8, usize::MAX, self.buf.map_or(0, <[u8]>::len))
    }

    fn span_at(&self, field: &'a FieldLayout, start: usize) -> Result<FieldSpan> {
        let count = self.count(field)?;
        let size = match (&field.kind, self.repr) {
            (FieldKind::Struct(nested), _) if nested.dynamic => {
                self.walk_repetitions(field, nested, start, count, count)? - start
            }
            (_, Representation::Serialized) => match field.count {
                FieldCount::Fixed(_) => field.bit_size,
                FieldCount::Dynamic { .. } => count
                    .checked_mul(field.repetition_bits)
                    .ok_or_else(|| self.overflow(start))?,
            },
            (_, Representation::Deserialized) => self
                .deserialized_bytes(field, count)
                .and_then(|bytes| bytes.checked_mul(8))
                .ok_or_else(|| self.overflow(start))?,
        };
        let span = FieldSpan { start, count, size };
        if let (Some(buf), FieldCount::Dynamic { .. }) = (self.buf, field.count) {
            let fits = start
                .checked_add(size)
                .is_some_and(|end| end <= buf.len().saturating_mul(8));
            if !fits {
                return Err(CodecError::out_of_bounds(start / 8, size.div_ceil(8), buf.len()));
            }
        }
        Ok(span)
    }

    fn deserialized_bytes(&self, field: &FieldLayout, count: usize) -> Option<usize> {
        if count == 0 {
            return Some(0);
        }
        if self.layout.version.pads_every_repetition() {
            count.checked_mul(field.type_aligned_byte_size)
        } else {
            (count - 1)
                .checked_mul(field.type_aligned_byte_size)?
                .checked_add(field.type_byte_size)
        }
    }

    /// Walk the repetitions of a dynamically sized nested struct.
    ///
    /// Returns the position just past the first `upto` repetitions.
    fn walk_repetitions(
        &self,
        field: &FieldLayout,
        nested: &'a StructLayout,
        start: usize,
        count: usize,
        upto: usize,
    ) -> Result<usize> {
        let mut cursor = start;
        let limit = self.buf.map(|buf| buf.len().saturating_mul(8));
        for r in 0..upto.min(count) {
            if limit.is_some_and(|limit| cursor > limit) {
                return Err(self.overflow(cursor));
            }
            let extent = self.at(nested, cursor).extent()?;
            let step = match self.repr {
                Representation::Serialized => extent,
                Representation::Deserialized => {
                    let bytes = extent.div_ceil(8);
                    let padded = r + 1 < count || self.layout.version.pads_every_repetition();
                    if padded {
                        align_up(bytes, field.alignment) * 8
                    } else {
                        bytes * 8
                    }
                }
            };
            cursor = cursor.checked_add(step).ok_or_else(|| self.overflow(cursor))?;
        }
        Ok(cursor)
    }

    /// Start and size (bits) of repetition `pos` of a field.
    pub fn repetition(
        &self,
        field: &'a FieldLayout,
        span: &FieldSpan,
        pos: usize,
    ) -> Result<(usize, usize)> {
        if pos >= span.count {
            return Err(CodecError::InvalidIndex {
                index: pos,
                bound: span.count,
            });
        }
        match (&field.kind, self.repr) {
            (FieldKind::Struct(nested), _) if nested.dynamic => {
                let rep_start = self.walk_repetitions(field, nested, span.start, span.count, pos)?;
                let size = self.at(nested, rep_start).extent()?;
                Ok((rep_start, size))
            }
            (_, Representation::Serialized) => Ok((
                pos.checked_mul(field.repetition_bits)
                    .and_then(|off| span.start.checked_add(off))
                    .ok_or_else(|| self.overflow(span.start))?,
                field.repetition_bits,
            )),
            (_, Representation::Deserialized) => Ok((
                pos.checked_mul(field.type_aligned_byte_size * 8)
                    .and_then(|off| span.start.checked_add(off))
                    .ok_or_else(|| self.overflow(span.start))?,
                field.type_byte_size * 8,
            )),
        }
    }

    /// Bit extent of the whole instance.
    pub fn extent(&self) -> Result<usize> {
        if !self.layout.dynamic {
            return Ok(self.layout.static_size(self.repr) * 8);
        }
        match self.repr {
            Representation::Serialized => {
                let mut end = self.base;
                for k in 0..self.layout.len() {
                    end = end.max(self.field_span(k)?.end());
                }
                Ok(end - self.base)
            }
            Representation::Deserialized => {
                let Some(last) = self.layout.len().checked_sub(1) else {
                    return Ok(0);
                };
                let raw = (self.field_span(last)?.end() - self.base).div_ceil(8);
                let bytes = if self.layout.version.pads_every_repetition() {
                    align_up(raw, self.layout.alignment)
                } else {
                    raw
                };
                Ok(bytes * 8)
            }
        }
    }
}

/// An element located inside a concrete instance.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedElement<'a> {
    /// Struct holding the element (the root struct itself for the root).
    pub parent: &'a StructLayout,
    /// `None` for the root.
    pub field: Option<&'a FieldLayout>,
    pub array_pos: Option<usize>,
    /// Repetitions of the field in this instance (1 for the root).
    pub count: usize,
    /// Bit position of the addressed repetition, or of the whole element.
    pub start: usize,
    /// Bit size of the addressed repetition, or of the whole element.
    pub size: usize,
    pub repr: Representation,
}

impl<'a> ResolvedElement<'a> {
    pub fn is_root(&self) -> bool {
        self.field.is_none()
    }

    pub fn name(&self) -> &'a str {
        match self.field {
            Some(f) => &f.name,
            None => &self.parent.name,
        }
    }

    pub fn type_name(&self) -> &'a str {
        match self.field {
            Some(f) => &f.type_name,
            None => &self.parent.name,
        }
    }

    /// Whole array addressed without a subscript.
    pub fn addresses_array(&self) -> bool {
        self.array_pos.is_none() && self.field.is_some_and(FieldLayout::is_array)
    }

    /// Struct whose fields are this element's children.
    pub fn members(&self) -> Option<&'a StructLayout> {
        match self.field {
            None => Some(self.parent),
            Some(_) if self.addresses_array() => None,
            Some(f) => f.nested().map(|n| n.as_ref()),
        }
    }

    pub fn child_count(&self) -> usize {
        if self.addresses_array() {
            self.count
        } else {
            self.members().map_or(0, StructLayout::len)
        }
    }

    /// Terminal scalar element (a single repetition of a leaf field).
    pub fn is_leaf(&self) -> bool {
        !self.addresses_array() && self.field.is_some_and(FieldLayout::is_leaf)
    }

    pub fn byte_offset(&self) -> usize {
        self.start / 8
    }

    pub fn bit_offset(&self) -> u8 {
        (self.start % 8) as u8
    }

    /// Leaf accessor for this element (position 0 of a whole array).
    pub fn leaf_access(&self) -> Result<LeafCodecIndex> {
        let field = self.field.ok_or_else(|| CodecError::TypeMismatch {
            expected: "scalar element".into(),
            got: format!("struct '{}'", self.parent.name),
        })?;
        if field.kind == FieldKind::Unresolved {
            return Err(CodecError::not_found(&field.type_name));
        }
        if !field.is_leaf() {
            return Err(CodecError::TypeMismatch {
                expected: "scalar element".into(),
                got: field.type_name.clone(),
            });
        }
        if self.count == 0 {
            return Err(CodecError::InvalidIndex { index: 0, bound: 0 });
        }
        LeafCodecIndex::access(field, self.start, self.repr)
    }
}

/// Resolve `index` inside the instance held by `buf` (`None`: schema only,
/// dynamic arrays count as empty).
pub fn resolve<'a>(
    root: &'a StructLayout,
    repr: Representation,
    buf: Option<&'a [u8]>,
    index: &CodecIndex,
) -> Result<ResolvedElement<'a>> {
    let mut instance = Instance::new(root, repr, buf);
    let steps = index.steps();
    if steps.is_empty() {
        return Ok(ResolvedElement {
            parent: root,
            field: None,
            array_pos: None,
            count: 1,
            start: 0,
            size: instance.extent()?,
            repr,
        });
    }
    for (depth, step) in steps.iter().enumerate() {
        let field = instance.field(step.field)?;
        let span = instance.field_span(step.field)?;
        let last = depth + 1 == steps.len();
        let (start, size) = match step.array_pos {
            None if last => (span.start, span.size),
            _ => instance.repetition(field, &span, step.position())?,
        };
        if last {
            return Ok(ResolvedElement {
                parent: instance.layout,
                field: Some(field),
                array_pos: step.array_pos,
                count: span.count,
                start,
                size,
                repr,
            });
        }
        let nested = field.nested().ok_or_else(|| {
            CodecError::not_found(format!("'{}' has no members", field.name))
        })?;
        instance = instance.at(nested, start);
    }
    Err(CodecError::Inconsistent(format!("unresolvable index {}", index)))
}

/// Byte size of the instance held by `buf`.
pub fn instance_size(root: &StructLayout, repr: Representation, buf: Option<&[u8]>) -> Result<usize> {
    Ok(Instance::new(root, repr, buf).extent()?.div_ceil(8))
}
