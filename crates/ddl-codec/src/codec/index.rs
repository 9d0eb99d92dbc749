// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Element addressing.
//!
//! A [`CodecIndex`] is a path of `(field, array position)` steps from the
//! root struct down to one element. It is schema-relative: the buffer
//! positions it denotes are only known once resolved against an instance.

use crate::codec::{FieldCount, StructLayout};
use crate::error::{CodecError, Result};
use std::fmt;

/// One level of a [`CodecIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexStep {
    /// Field position within its struct.
    pub field: usize,
    /// Array repetition; `None` addresses the element as a whole (position 0
    /// when descending further).
    pub array_pos: Option<usize>,
}

impl IndexStep {
    pub const fn new(field: usize, array_pos: Option<usize>) -> Self {
        Self { field, array_pos }
    }

    pub(crate) fn position(self) -> usize {
        self.array_pos.unwrap_or(0)
    }
}

/// Path to one element of a struct instance. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CodecIndex {
    steps: Vec<IndexStep>,
}

impl CodecIndex {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<IndexStep>) -> Self {
        Self { steps }
    }

    /// Top-level field `field`, as a whole.
    pub fn field(field: usize) -> Self {
        Self {
            steps: vec![IndexStep::new(field, None)],
        }
    }

    pub fn steps(&self) -> &[IndexStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn last(&self) -> Option<IndexStep> {
        self.steps.last().copied()
    }

    /// Path extended by one step.
    pub fn child(&self, step: IndexStep) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(step);
        Self { steps }
    }

    /// Same path with the last step's array position replaced.
    pub fn with_array_pos(&self, array_pos: usize) -> Self {
        let mut out = self.clone();
        if let Some(last) = out.steps.last_mut() {
            last.array_pos = Some(array_pos);
        }
        out
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.steps.split_last()?;
        Some(Self {
            steps: head.to_vec(),
        })
    }

    /// Whether `self` lies inside (or is) `other`.
    pub fn starts_with(&self, other: &CodecIndex) -> bool {
        self.steps.starts_with(&other.steps)
    }

    /// Parse a dotted path such as `a.b[2].c`.
    ///
    /// A missing subscript addresses the element as a whole, which reads as
    /// position 0. Fixed array bounds are checked here; dynamic bounds only on
    /// resolution.
    pub fn from_path(layout: &StructLayout, path: &str) -> Result<Self> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::root());
        }
        let mut steps = Vec::new();
        let mut current = layout;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let (name, array_pos) = parse_segment(segment)
                .ok_or_else(|| CodecError::not_found(format!("malformed path '{}'", path)))?;
            let field = current
                .field_index(name)
                .ok_or_else(|| CodecError::not_found(format!("{}.{}", current.name, name)))?;
            let layout_field = &current.fields[field];
            if let (Some(pos), FieldCount::Fixed(n)) = (array_pos, layout_field.count) {
                if pos >= n {
                    return Err(CodecError::InvalidIndex {
                        index: pos,
                        bound: n,
                    });
                }
            }
            steps.push(IndexStep::new(field, array_pos));
            if segments.peek().is_some() {
                current = layout_field.nested().ok_or_else(|| {
                    CodecError::not_found(format!("'{}' in '{}' has no members", name, path))
                })?;
            }
        }
        Ok(Self { steps })
    }

    /// Dotted name of the addressed element (`a.b[2].c`).
    pub fn full_name(&self, layout: &StructLayout) -> Result<String> {
        let mut out = String::new();
        let mut current = layout;
        for (depth, step) in self.steps.iter().enumerate() {
            let field = current.field(step.field).ok_or(CodecError::InvalidIndex {
                index: step.field,
                bound: current.len(),
            })?;
            if depth > 0 {
                out.push('.');
            }
            out.push_str(&field.name);
            if let Some(pos) = step.array_pos {
                out.push_str(&format!("[{}]", pos));
            }
            if depth + 1 < self.steps.len() {
                current = field.nested().ok_or_else(|| {
                    CodecError::Inconsistent(format!("'{}' has no members", out))
                })?;
            }
        }
        Ok(out)
    }
}

impl fmt::Display for CodecIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", step.field)?;
            if let Some(pos) = step.array_pos {
                write!(f, "[{}]", pos)?;
            }
        }
        Ok(())
    }
}

fn parse_segment(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.find('[') {
        None if !segment.is_empty() => Some((segment, None)),
        None => None,
        Some(open) => {
            let name = &segment[..open];
            let pos = segment[open + 1..].strip_suffix(']')?.trim().parse().ok()?;
            (!name.is_empty()).then_some((name, Some(pos)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::schema::compile;
    use crate::model::{ElementBuilder, StructBuilder, TypeModel};

    fn layout() -> std::sync::Arc<StructLayout> {
        let mut m = TypeModel::new();
        m.add_struct_type(
            StructBuilder::new("Point")
                .field("x", "tInt32")
                .field("y", "tInt32")
                .build()
                .unwrap(),
        )
        .unwrap();
        m.add_struct_type(
            StructBuilder::new("Track")
                .field("id", "tUInt16")
                .element(ElementBuilder::new("points", "Point").array(4))
                .build()
                .unwrap(),
        )
        .unwrap();
        compile(&mut m, "Track").unwrap()
    }

    #[test]
    fn test_parse_path() {
        let layout = layout();
        let index = CodecIndex::from_path(&layout, "points[2].y").unwrap();
        assert_eq!(
            index.steps(),
            &[IndexStep::new(1, Some(2)), IndexStep::new(1, None)]
        );
        assert_eq!(index.full_name(&layout).unwrap(), "points[2].y");
        assert_eq!(index.to_string(), "1[2].1");

        let defaulted = CodecIndex::from_path(&layout, "points.x").unwrap();
        assert_eq!(defaulted.steps()[0].position(), 0);
    }

    #[test]
    fn test_parse_errors() {
        let layout = layout();
        assert!(matches!(
            CodecIndex::from_path(&layout, "nope"),
            Err(CodecError::NotFound(_))
        ));
        assert!(matches!(
            CodecIndex::from_path(&layout, "id.x"),
            Err(CodecError::NotFound(_))
        ));
        assert!(matches!(
            CodecIndex::from_path(&layout, "points[4].x"),
            Err(CodecError::InvalidIndex { index: 4, bound: 4 })
        ));
        assert!(CodecIndex::from_path(&layout, "points[x]").is_err());
        assert!(CodecIndex::from_path(&layout, "").unwrap().is_root());
    }

    #[test]
    fn test_navigation() {
        let index = CodecIndex::field(1).with_array_pos(3);
        let child = index.child(IndexStep::new(0, None));
        assert!(child.starts_with(&index));
        assert_eq!(child.parent(), Some(index));
        assert_eq!(CodecIndex::root().parent(), None);
    }
}
