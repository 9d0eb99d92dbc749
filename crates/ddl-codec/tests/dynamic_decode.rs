// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decoding instances whose layout depends on counts held in the buffer.

use ddl_codec::codec::{
    CodecFactory, ElementAccess, Representation, ValueAccess, ValueAccessMut,
};
use ddl_codec::model::{ElementBuilder, StructBuilder, TypeModel};

fn model() -> TypeModel {
    let mut m = TypeModel::new();
    m.add_struct_type(
        StructBuilder::new("Reading")
            .field("n", "tUInt16")
            .element(ElementBuilder::new("samples", "tInt32").dynamic_array("n"))
            .field("checksum", "tUInt8")
            .build()
            .unwrap(),
    )
    .unwrap();
    m.add_struct_type(
        StructBuilder::new("Batch")
            .field("count", "tUInt8")
            .element(ElementBuilder::new("readings", "Reading").dynamic_array("count"))
            .field("end", "tUInt32")
            .build()
            .unwrap(),
    )
    .unwrap();
    m
}

/// Serialized `Reading` with `n` samples `0, 10, 20, ...` and checksum 0xAB.
fn reading(n: u16) -> Vec<u8> {
    let mut buf = n.to_le_bytes().to_vec();
    for i in 0..i32::from(n) {
        buf.extend_from_slice(&(i * 10).to_le_bytes());
    }
    buf.push(0xAB);
    buf
}

#[test]
fn test_trailing_field_moves_with_count() {
    let mut m = model();
    let factory = CodecFactory::new(&mut m, "Reading").unwrap();
    assert!(factory.is_dynamic());

    for n in [0u16, 1, 4, 9] {
        let buf = reading(n);
        let decoder = factory.decoder(&buf, Representation::Serialized);
        assert!(decoder.is_valid());
        assert_eq!(decoder.element_count().unwrap(), 1 + usize::from(n) + 1);

        let checksum = decoder.element("checksum").unwrap().info().unwrap();
        assert_eq!(checksum.byte_pos, 2 + 4 * usize::from(n));
        assert_eq!(decoder.get_by_name::<u8>("checksum").unwrap(), 0xAB);
        if n > 0 {
            let last = format!("samples[{}]", n - 1);
            assert_eq!(decoder.get_by_name::<i32>(&last).unwrap(), i32::from(n - 1) * 10);
        }
    }

    // The compiled schema still carries no position for the trailing field.
    let layout = factory.layout();
    assert!(layout.fields[2].after_dynamic);
    assert_eq!(layout.fields[2].serialized, None);
}

#[test]
fn test_deserialized_trailing_alignment() {
    let mut m = model();
    let factory = CodecFactory::new(&mut m, "Reading").unwrap();
    let mut buf = vec![0u8; 64];
    let mut codec = factory.codec(&mut buf, Representation::Deserialized);
    codec.set_by_name("n", 3u16).unwrap();
    codec.set_by_name("checksum", 0x5Au8).unwrap();
    // n at 0, samples aligned to 4, checksum right after the third sample.
    let info = codec.element("checksum").unwrap().info().unwrap();
    assert_eq!(info.byte_pos, 4 + 12);
    assert_eq!(codec.extent().unwrap(), 20);
    assert_eq!(buf[16], 0x5A);
}

#[test]
fn test_nested_dynamic_repetitions() {
    let mut m = model();
    let factory = CodecFactory::new(&mut m, "Batch").unwrap();

    let mut buf = vec![2u8];
    buf.extend(reading(1));
    buf.extend(reading(3));
    buf.extend_from_slice(&0xDEAD_BEEFu32.to_le_bytes());

    let decoder = factory.decoder(&buf, Representation::Serialized);
    assert!(decoder.is_valid());
    assert_eq!(decoder.extent().unwrap(), buf.len());
    assert_eq!(decoder.get_by_name::<u16>("readings[1].n").unwrap(), 3);
    assert_eq!(decoder.get_by_name::<i32>("readings[1].samples[2]").unwrap(), 20);
    assert_eq!(decoder.get_by_name::<u8>("readings[1].checksum").unwrap(), 0xAB);
    assert_eq!(decoder.get_by_name::<u32>("end").unwrap(), 0xDEAD_BEEF);

    let names: Vec<String> = decoder
        .leaves()
        .map(|leaf| leaf.unwrap().full_name().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "count",
            "readings[0].n",
            "readings[0].samples[0]",
            "readings[0].checksum",
            "readings[1].n",
            "readings[1].samples[0]",
            "readings[1].samples[1]",
            "readings[1].samples[2]",
            "readings[1].checksum",
            "end",
        ]
    );
}

#[test]
fn test_schema_view_sees_empty_arrays() {
    let mut m = model();
    let factory = CodecFactory::new(&mut m, "Reading").unwrap();
    let schema = factory.schema(Representation::Serialized);
    let samples = schema.element("samples").unwrap();
    assert_eq!(samples.child_count().unwrap(), 0);
    assert!(factory.element_count().is_err());
}
