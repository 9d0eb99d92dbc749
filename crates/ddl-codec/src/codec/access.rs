// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Capability traits and element handles.
//!
//! Access is graded by trait: [`ElementAccess`] resolves and counts,
//! [`ValueAccess`] adds reads, [`ValueAccessMut`] adds writes. A factory only
//! implements the first, decoders the first two, codecs all three; a
//! read-only object has no setters to call.

use crate::codec::leaf::convert_to;
use crate::codec::resolve::{self, ResolvedElement};
use crate::codec::{
    CodecIndex, IndexStep, LeafCodecIndex, LeafType, Representation, Scalar, ScalarType,
    StructLayout, Value,
};
use crate::error::{CodecError, Result};
use crate::model::{ArraySize, ByteOrder};
use std::sync::Arc;

/// Resolution and navigation.
pub trait ElementAccess {
    /// Root layout.
    fn layout(&self) -> &Arc<StructLayout>;

    fn representation(&self) -> Representation;

    /// Bound buffer; `None` for schema-only access.
    fn buffer(&self) -> Option<&[u8]>;

    fn resolve(&self, index: &CodecIndex) -> Result<ResolvedElement<'_>> {
        resolve::resolve(self.layout(), self.representation(), self.buffer(), index)
    }

    /// Leaf accessor for a scalar element.
    fn leaf_access(&self, index: &CodecIndex) -> Result<LeafCodecIndex> {
        self.resolve(index)?.leaf_access()
    }

    fn child_count(&self, index: &CodecIndex) -> Result<usize> {
        Ok(self.resolve(index)?.child_count())
    }

    /// Parse a dotted path against the root layout.
    fn index_of(&self, path: &str) -> Result<CodecIndex> {
        CodecIndex::from_path(self.layout(), path)
    }

    fn full_name(&self, index: &CodecIndex) -> Result<String> {
        index.full_name(self.layout())
    }

    fn root(&self) -> ElementHandle<'_, Self>
    where
        Self: Sized,
    {
        ElementHandle::new(self, CodecIndex::root())
    }

    /// Handle by dotted path.
    fn element(&self, path: &str) -> Result<ElementHandle<'_, Self>>
    where
        Self: Sized,
    {
        Ok(ElementHandle::new(self, self.index_of(path)?))
    }

    /// Handle of top-level field `field`.
    fn element_at(&self, field: usize) -> Result<ElementHandle<'_, Self>>
    where
        Self: Sized,
    {
        let bound = self.layout().len();
        if field >= bound {
            return Err(CodecError::InvalidIndex {
                index: field,
                bound,
            });
        }
        Ok(ElementHandle::new(self, CodecIndex::field(field)))
    }

    fn handle(&self, index: CodecIndex) -> ElementHandle<'_, Self>
    where
        Self: Sized,
    {
        ElementHandle::new(self, index)
    }
}

/// Reads from a bound buffer.
pub trait ValueAccess: ElementAccess {
    fn data(&self) -> &[u8];

    /// Value in the element's declared type (an enum reads as its stored integer).
    fn get_value(&self, index: &CodecIndex) -> Result<Value> {
        self.leaf_access(index)?.read(self.data())
    }

    /// Typed read; `T` must match the declared scalar type (enums and user
    /// data types accept any integer type).
    fn get<T: Scalar>(&self, index: &CodecIndex) -> Result<T> {
        let leaf = self.leaf_access(index)?;
        check_typed(leaf.leaf_type(), T::TYPE)?;
        convert_to(leaf.read(self.data())?)
    }

    fn get_by_name<T: Scalar>(&self, path: &str) -> Result<T> {
        self.get(&self.index_of(path)?)
    }

    /// Text rendering; enum values render by name when one matches.
    fn get_string(&self, index: &CodecIndex) -> Result<String> {
        let resolved = self.resolve(index)?;
        let value = resolved.leaf_access()?.read(self.data())?;
        let name = resolved
            .field
            .and_then(|f| f.enum_layout())
            .zip(value.as_i64())
            .and_then(|(e, v)| e.name_of(v).map(str::to_string));
        Ok(name.unwrap_or_else(|| value.to_string()))
    }

    fn get_leaf<T: Scalar>(&self, leaf: &LeafCodecIndex) -> Result<T> {
        leaf.get(self.data())
    }

    fn get_leaf_value(&self, leaf: &LeafCodecIndex) -> Result<Value> {
        leaf.read(self.data())
    }
}

/// Writes into a bound buffer.
pub trait ValueAccessMut: ValueAccess {
    fn data_mut(&mut self) -> &mut [u8];

    /// Write any value, converted to the element's declared type.
    fn set_value(&mut self, index: &CodecIndex, value: Value) -> Result<()> {
        let leaf = self.leaf_access(index)?;
        leaf.write(self.data_mut(), value)
    }

    fn set<T: Scalar>(&mut self, index: &CodecIndex, value: T) -> Result<()> {
        let leaf = self.leaf_access(index)?;
        check_typed(leaf.leaf_type(), T::TYPE)?;
        leaf.write(self.data_mut(), value.into_value())
    }

    fn set_by_name<T: Scalar>(&mut self, path: &str, value: T) -> Result<()> {
        let index = self.index_of(path)?;
        self.set(&index, value)
    }

    /// Parse and write text; enum elements accept value names.
    fn set_string(&mut self, index: &CodecIndex, text: &str) -> Result<()> {
        let (leaf, named) = {
            let resolved = self.resolve(index)?;
            let named = resolved
                .field
                .and_then(|f| f.enum_layout())
                .and_then(|e| e.value_of(text.trim()));
            (resolved.leaf_access()?, named)
        };
        let value = match named {
            Some(v) => Value::I64(v),
            None => Value::parse(leaf.scalar_type(), text)?,
        };
        leaf.write(self.data_mut(), value)
    }

    fn set_leaf<T: Scalar>(&mut self, leaf: &LeafCodecIndex, value: T) -> Result<()> {
        leaf.set(self.data_mut(), value)
    }

    fn set_leaf_value(&mut self, leaf: &LeafCodecIndex, value: Value) -> Result<()> {
        leaf.write(self.data_mut(), value)
    }
}

fn check_typed(leaf: LeafType, requested: ScalarType) -> Result<()> {
    match leaf {
        LeafType::Scalar(ty) if ty != requested => Err(CodecError::TypeMismatch {
            expected: ty.to_string(),
            got: requested.to_string(),
        }),
        LeafType::Raw(ty) if !requested.is_integer() => Err(CodecError::TypeMismatch {
            expected: ty.to_string(),
            got: requested.to_string(),
        }),
        other => other.check_conversion(requested),
    }
}

/// Schema-only view in one representation; dynamic arrays count as empty.
#[derive(Debug, Clone, Copy)]
pub struct SchemaView<'f> {
    layout: &'f Arc<StructLayout>,
    repr: Representation,
}

impl<'f> SchemaView<'f> {
    pub fn new(layout: &'f Arc<StructLayout>, repr: Representation) -> Self {
        Self { layout, repr }
    }
}

impl ElementAccess for SchemaView<'_> {
    fn layout(&self) -> &Arc<StructLayout> {
        self.layout
    }

    fn representation(&self) -> Representation {
        self.repr
    }

    fn buffer(&self) -> Option<&[u8]> {
        None
    }
}

/// Metadata of a resolved element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub name: String,
    pub full_name: String,
    pub type_name: String,
    pub array_size: ArraySize,
    /// Repetitions in this instance.
    pub count: usize,
    pub array_pos: Option<usize>,
    pub byte_order: ByteOrder,
    pub representation: Representation,
    pub byte_pos: usize,
    pub bit_pos: u8,
    pub bit_size: usize,
    pub constant: bool,
    pub dynamic: bool,
    pub leaf: bool,
}

/// Navigable reference to one element of a capability object.
#[derive(Debug)]
pub struct ElementHandle<'a, A> {
    access: &'a A,
    index: CodecIndex,
}

impl<A> Clone for ElementHandle<'_, A> {
    fn clone(&self) -> Self {
        Self {
            access: self.access,
            index: self.index.clone(),
        }
    }
}

impl<'a, A: ElementAccess> ElementHandle<'a, A> {
    pub fn new(access: &'a A, index: CodecIndex) -> Self {
        Self { access, index }
    }

    pub fn index(&self) -> &CodecIndex {
        &self.index
    }

    pub fn into_index(self) -> CodecIndex {
        self.index
    }

    pub fn resolve(&self) -> Result<ResolvedElement<'a>> {
        self.access.resolve(&self.index)
    }

    pub fn name(&self) -> Result<String> {
        Ok(self.resolve()?.name().to_string())
    }

    pub fn full_name(&self) -> Result<String> {
        self.access.full_name(&self.index)
    }

    pub fn type_name(&self) -> Result<String> {
        Ok(self.resolve()?.type_name().to_string())
    }

    pub fn is_leaf(&self) -> Result<bool> {
        Ok(self.resolve()?.is_leaf())
    }

    pub fn child_count(&self) -> Result<usize> {
        self.access.child_count(&self.index)
    }

    /// Lazy forward-only iteration over the children.
    pub fn children(&self) -> ChildElements<'a, A> {
        ChildElements {
            access: self.access,
            parent: self.index.clone(),
            next: 0,
            shape: None,
            done: false,
        }
    }

    /// Child by position (array repetition or struct member).
    pub fn child_at(&self, position: usize) -> Result<ElementHandle<'a, A>> {
        let resolved = self.resolve()?;
        let bound = resolved.child_count();
        if position >= bound {
            return Err(CodecError::InvalidIndex {
                index: position,
                bound,
            });
        }
        Ok(Self::new(
            self.access,
            child_index(&self.index, resolved.addresses_array(), position),
        ))
    }

    /// Struct member by name.
    pub fn child(&self, name: &str) -> Result<ElementHandle<'a, A>> {
        let resolved = self.resolve()?;
        let members = resolved
            .members()
            .ok_or_else(|| CodecError::not_found(format!("'{}' has no members", resolved.name())))?;
        let field = members
            .field_index(name)
            .ok_or_else(|| CodecError::not_found(format!("{}.{}", members.name, name)))?;
        Ok(Self::new(
            self.access,
            self.index.child(IndexStep::new(field, None)),
        ))
    }

    pub fn info(&self) -> Result<ElementInfo> {
        let resolved = self.resolve()?;
        let field = resolved.field;
        Ok(ElementInfo {
            name: resolved.name().to_string(),
            full_name: self.full_name()?,
            type_name: resolved.type_name().to_string(),
            array_size: field.map_or(ArraySize::Fixed(1), |f| f.array_size.clone()),
            count: resolved.count,
            array_pos: resolved.array_pos,
            byte_order: field.map_or(ByteOrder::native(), |f| f.byte_order),
            representation: resolved.repr,
            byte_pos: resolved.byte_offset(),
            bit_pos: resolved.bit_offset(),
            bit_size: resolved.size,
            constant: field.is_some_and(|f| f.constant.is_some()),
            dynamic: field.is_some_and(|f| f.dynamic),
            leaf: resolved.is_leaf(),
        })
    }
}

impl<'a, A: ValueAccess> ElementHandle<'a, A> {
    pub fn get_value(&self) -> Result<Value> {
        self.access.get_value(&self.index)
    }

    pub fn get<T: Scalar>(&self) -> Result<T> {
        self.access.get(&self.index)
    }

    pub fn get_string(&self) -> Result<String> {
        self.access.get_string(&self.index)
    }

    /// Leaf descriptor valid for this buffer's current counts.
    pub fn leaf_index(&self) -> Result<LeafCodecIndex> {
        LeafCodecIndex::new(&self.resolve()?)
    }
}

pub(crate) fn child_index(parent: &CodecIndex, array: bool, position: usize) -> CodecIndex {
    if array {
        parent.with_array_pos(position)
    } else {
        parent.child(IndexStep::new(position, None))
    }
}

/// Lazy child sequence; the count is resolved on the first step.
#[derive(Debug)]
pub struct ChildElements<'a, A> {
    access: &'a A,
    parent: CodecIndex,
    next: usize,
    /// (child count, parent addresses an array)
    shape: Option<(usize, bool)>,
    done: bool,
}

impl<A: ElementAccess> ChildElements<'_, A> {
    /// Number of children, resolving the parent if not done yet.
    pub fn total(&mut self) -> Result<usize> {
        Ok(self.shape()?.0)
    }

    fn shape(&mut self) -> Result<(usize, bool)> {
        if let Some(shape) = self.shape {
            return Ok(shape);
        }
        let resolved = self.access.resolve(&self.parent)?;
        let shape = (resolved.child_count(), resolved.addresses_array());
        self.shape = Some(shape);
        Ok(shape)
    }
}

impl<'a, A: ElementAccess> Iterator for ChildElements<'a, A> {
    type Item = Result<ElementHandle<'a, A>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (count, array) = match self.shape() {
            Ok(shape) => shape,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        if self.next >= count {
            self.done = true;
            return None;
        }
        let index = child_index(&self.parent, array, self.next);
        self.next += 1;
        Some(Ok(ElementHandle::new(self.access, index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecFactory;
    use crate::model::{ElementBuilder, EnumBuilder, StructBuilder, TypeModel};

    fn factory() -> CodecFactory {
        let mut m = TypeModel::new();
        m.add_enum_type(EnumBuilder::new("Color", "tUInt8").value("Red").value("Green").build())
            .unwrap();
        m.add_struct_type(
            StructBuilder::new("Inner")
                .field("x", "tInt16")
                .field("c", "Color")
                .build()
                .unwrap(),
        )
        .unwrap();
        m.add_struct_type(
            StructBuilder::new("Outer")
                .field("id", "tUInt32")
                .element(ElementBuilder::new("pts", "Inner").array(2))
                .element(ElementBuilder::new("tags", "tUInt8").array(3))
                .build()
                .unwrap(),
        )
        .unwrap();
        CodecFactory::new(&mut m, "Outer").unwrap()
    }

    #[test]
    fn test_navigation() {
        let factory = factory();
        assert_eq!(factory.static_size(Representation::Deserialized), Some(16));
        let root = factory.root();
        let names: Vec<String> = root.children().map(|c| c.unwrap().name().unwrap()).collect();
        assert_eq!(names, ["id", "pts", "tags"]);

        let pts = factory.element("pts").unwrap();
        let mut children = pts.children();
        assert_eq!(children.total().unwrap(), 2);
        let last = children.last().unwrap().unwrap();
        assert_eq!(last.full_name().unwrap(), "pts[1]");
        assert_eq!(last.child("c").unwrap().full_name().unwrap(), "pts[1].c");

        assert!(matches!(last.child("nope"), Err(CodecError::NotFound(_))));
        assert_eq!(
            pts.child_at(5).unwrap_err(),
            CodecError::InvalidIndex { index: 5, bound: 2 }
        );
        assert!(matches!(factory.element("pts[2]"), Err(CodecError::InvalidIndex { .. })));
        assert!(matches!(factory.element_at(3), Err(CodecError::InvalidIndex { .. })));
    }

    #[test]
    fn test_element_info() {
        let factory = factory();
        let info = factory.element("tags[2]").unwrap().info().unwrap();
        assert_eq!(info.byte_pos, 14);
        assert_eq!(info.bit_size, 8);
        assert_eq!(info.count, 3);
        assert_eq!(info.array_pos, Some(2));
        assert_eq!(info.array_size, ArraySize::Fixed(3));
        assert!(info.leaf);
        assert!(!info.constant);

        let serialized = factory.schema(Representation::Serialized);
        let info = serialized.element("pts[1].c").unwrap().info().unwrap();
        assert_eq!(info.byte_pos, 4 + 3 + 2);
        assert_eq!(info.representation, Representation::Serialized);
    }

    #[test]
    fn test_typed_access_is_strict() {
        let factory = factory();
        let mut buf = [0u8; 16];
        let mut codec = factory.codec(&mut buf, Representation::Deserialized);
        let id = codec.index_of("id").unwrap();

        codec.set(&id, 70_000u32).unwrap();
        assert_eq!(codec.get::<u32>(&id).unwrap(), 70_000);
        assert!(matches!(codec.get::<i64>(&id), Err(CodecError::TypeMismatch { .. })));
        assert!(matches!(codec.set(&id, 1.0f64), Err(CodecError::TypeMismatch { .. })));
        // The converting accessors accept any scalar.
        codec.set_value(&id, Value::F64(12.0)).unwrap();
        assert_eq!(codec.get_value(&id).unwrap(), Value::U32(12));
        assert_eq!(codec.get_string(&id).unwrap(), "12");
    }

    #[test]
    fn test_enum_string_access() {
        let factory = factory();
        let mut buf = [0u8; 16];
        let mut codec = factory.codec(&mut buf, Representation::Deserialized);
        let c = codec.index_of("pts[1].c").unwrap();

        codec.set_string(&c, "Green").unwrap();
        assert_eq!(codec.get_string(&c).unwrap(), "Green");
        assert_eq!(codec.get::<u8>(&c).unwrap(), 1);
        assert_eq!(codec.get::<i32>(&c).unwrap(), 1);
        assert!(matches!(
            codec.get::<f32>(&c),
            Err(CodecError::UnsupportedConversion { .. })
        ));

        codec.set_string(&c, "0").unwrap();
        assert_eq!(codec.get_string(&c).unwrap(), "Red");
        codec.set_string(&c, "9").unwrap();
        assert_eq!(codec.get_string(&c).unwrap(), "9");
        assert!(matches!(
            codec.set_string(&c, "Blue"),
            Err(CodecError::UnsupportedConversion { .. })
        ));

        let handle = codec.element("pts[1].c").unwrap();
        assert_eq!(handle.get::<u8>().unwrap(), 9);
        assert_eq!(handle.leaf_index().unwrap().byte_pos(), 10);
    }
}
