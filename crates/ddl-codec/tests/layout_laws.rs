// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::unreadable_literal)] // Test constants

//! Layout laws: fixed positions, alignment per format version, recursion.

use ddl_codec::codec::{CodecFactory, ElementAccess, Representation};
use ddl_codec::model::{ElementBuilder, FormatVersion, StructBuilder, TypeModel};
use ddl_codec::validation::{ProblemKind, ValidationLevel};

#[repr(C)]
#[allow(dead_code)]
struct NativeFixed {
    a: i8,
    b: [i32; 3],
    c: i8,
}

fn fixed_position_model() -> TypeModel {
    let mut m = TypeModel::new();
    m.add_struct_type(
        StructBuilder::new("Fixed")
            .element(ElementBuilder::new("a", "tInt8").byte_pos(0).alignment(1))
            .element(
                ElementBuilder::new("b", "tInt32")
                    .array(3)
                    .byte_pos(1)
                    .alignment(4),
            )
            .element(ElementBuilder::new("c", "tInt8").byte_pos(13).alignment(1))
            .build()
            .unwrap(),
    )
    .unwrap();
    m
}

#[test]
fn test_fixed_positions_match_native_layout() {
    let mut m = fixed_position_model();
    let info = m.type_info("Fixed").unwrap();
    assert_eq!(info.byte_size, std::mem::size_of::<NativeFixed>());
    assert_eq!(info.byte_size, 20);
    assert_eq!(info.alignment, std::mem::align_of::<NativeFixed>());

    let b = m.element_info("Fixed", "b").unwrap();
    assert_eq!(b.deserialized, Some(4));
    assert_eq!(b.serialized.map(|p| p.byte), Some(1));
    let c = m.element_info("Fixed", "c").unwrap();
    assert_eq!(c.deserialized, Some(16));
    assert_eq!(c.serialized.map(|p| p.byte), Some(13));
    assert_eq!(info.bit_size, 14 * 8);
}

#[test]
fn test_authored_positions_survive_edits() {
    let mut m = fixed_position_model();
    m.type_info("Fixed").unwrap();
    m.edit_element("Fixed", "a", |e| e.type_name = "tInt16".into())
        .unwrap();
    let b = m.element_info("Fixed", "b").unwrap();
    assert_eq!(b.serialized.map(|p| p.byte), Some(1));
    assert_eq!(m.struct_type("Fixed").unwrap().elements()[1].serialized.byte_pos, Some(1));
}

#[test]
fn test_out_of_order_positions() {
    let mut m = TypeModel::new();
    m.add_struct_type(
        StructBuilder::new("Swapped")
            .element(ElementBuilder::new("late", "tUInt16").byte_pos(6))
            .element(ElementBuilder::new("early", "tUInt8").byte_pos(0))
            .build()
            .unwrap(),
    )
    .unwrap();
    // Serialized size follows the furthest element, not the last declared.
    assert_eq!(m.type_info("Swapped").unwrap().bit_size, 64);
}

fn padded_model(version: FormatVersion) -> TypeModel {
    let mut m = TypeModel::with_file_version(version);
    m.add_struct_type(
        StructBuilder::new("Inner")
            .field("x", "tInt32")
            .field("y", "tInt8")
            .build()
            .unwrap(),
    )
    .unwrap();
    m.add_struct_type(
        StructBuilder::new("Outer")
            .field("tag", "tUInt8")
            .element(ElementBuilder::new("items", "Inner").array(3))
            .field("z", "tInt8")
            .element(ElementBuilder::new("w", "tInt16").alignment(16))
            .field("d", "tFloat64")
            .build()
            .unwrap(),
    )
    .unwrap();
    m
}

#[test]
fn test_every_element_aligned_from_version_3() {
    let mut m = padded_model(FormatVersion::V4_1);
    m.type_info("Outer").unwrap();
    let names: Vec<String> = m
        .struct_type("Outer")
        .unwrap()
        .elements()
        .iter()
        .map(|e| e.name.clone())
        .collect();
    for name in &names {
        let info = m.element_info("Outer", name).unwrap();
        let pos = info.deserialized.unwrap();
        assert_eq!(pos % info.alignment, 0, "{} at {}", name, pos);
    }
    let items = m.element_info("Outer", "items").unwrap();
    assert_eq!(items.deserialized_size, Some(24));
    assert_eq!(m.element_info("Outer", "z").unwrap().deserialized, Some(28));
    assert_eq!(m.element_info("Outer", "w").unwrap().deserialized, Some(32));
}

#[test]
fn test_legacy_pads_only_inner_repetitions() {
    let mut m = padded_model(FormatVersion::V2_0);
    assert_eq!(m.type_info("Inner").unwrap().byte_size, 5);
    assert_eq!(m.type_info("Inner").unwrap().aligned_byte_size, 8);
    let items = m.element_info("Outer", "items").unwrap();
    assert_eq!(items.deserialized, Some(4));
    // 8 + 8 + 5: the last repetition is unpadded.
    assert_eq!(items.deserialized_size, Some(21));
    assert_eq!(m.element_info("Outer", "z").unwrap().deserialized, Some(25));

    let factory = CodecFactory::new(&mut m, "Outer").unwrap();
    let schema = factory.schema(Representation::Deserialized);
    let third = schema.element("items[2]").unwrap().info().unwrap();
    assert_eq!(third.byte_pos, 4 + 16);
    assert_eq!(third.bit_size, 5 * 8);
}

#[test]
fn test_recursive_struct_is_rejected() {
    let mut m = TypeModel::new();
    m.add_struct_type(StructBuilder::new("Node").field("next", "Node").build().unwrap())
        .unwrap();
    m.add_struct_type(StructBuilder::new("A").field("b", "B").build().unwrap())
        .unwrap();
    m.add_struct_type(StructBuilder::new("B").field("a", "A").build().unwrap())
        .unwrap();

    m.validate_all();
    for name in ["Node", "A", "B"] {
        let info = m.validation_info(name).unwrap();
        assert!(!info.is_valid(ValidationLevel::GoodEnough), "{}", name);
        assert!(info.problems().iter().any(|p| p.kind == ProblemKind::RecursiveType));
    }

    // Layout terminates and reports the type unusable.
    assert!(m.type_info("Node").map_or(true, |i| !i.valid));
    assert!(m.type_info("A").map_or(true, |i| !i.valid));

    let factory = CodecFactory::new(&mut m, "Node").unwrap();
    assert!(!factory.is_valid());
    let buf = [0u8; 8];
    assert!(!factory.decoder(&buf, Representation::Deserialized).is_valid());
}
