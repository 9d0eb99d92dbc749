// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::float_cmp)] // Exact round-trips

//! Value round-trips over every leaf, and leaf fast path vs path resolution.

use ddl_codec::codec::{
    CodecFactory, CodecIndex, ElementAccess, Representation, Scalar, ScalarType, Value,
    ValueAccess, ValueAccessMut,
};
use ddl_codec::model::{ElementBuilder, EnumBuilder, StructBuilder, TypeModel};

const REPRS: [Representation; 2] = [Representation::Deserialized, Representation::Serialized];

fn factory() -> CodecFactory {
    let mut m = TypeModel::new();
    m.add_enum_type(
        EnumBuilder::new("Mode", "tUInt8")
            .value("Idle")
            .value_with("Run", 4)
            .value_with("Fault", 200)
            .build(),
    )
    .unwrap();
    m.add_struct_type(
        StructBuilder::new("AllTypes")
            .field("flag", "tBool")
            .field("i8", "tInt8")
            .field("u8", "tUInt8")
            .element(ElementBuilder::new("i16", "tInt16").big_endian())
            .field("u16", "tUInt16")
            .element(ElementBuilder::new("i32", "tInt32").big_endian())
            .field("u32", "tUInt32")
            .field("i64", "tInt64")
            .element(ElementBuilder::new("u64", "tUInt64").big_endian())
            .field("f32", "tFloat32")
            .element(ElementBuilder::new("f64", "tFloat64").big_endian())
            .field("mode", "Mode")
            .element(ElementBuilder::new("arr", "tInt16").array(3))
            .element(ElementBuilder::new("nib", "tUInt8").num_bits(4))
            .element(ElementBuilder::new("snib", "tInt8").num_bits(4))
            .element(ElementBuilder::new("wide", "tInt16").num_bits(12).big_endian())
            .build()
            .unwrap(),
    )
    .unwrap();
    CodecFactory::new(&mut m, "AllTypes").unwrap()
}

fn random_value(rng: &mut fastrand::Rng, ty: ScalarType, width: usize) -> Value {
    match ty {
        ScalarType::F32 => Value::F32(rng.f32() * 2000.0 - 1000.0),
        ScalarType::F64 => Value::F64(rng.f64() * 2.0e9 - 1.0e9),
        ty => {
            let raw = rng.u64(..);
            let raw = if width < 64 { raw & ((1u64 << width) - 1) } else { raw };
            Value::from_bits(ty, raw, width)
        }
    }
}

fn leaves(factory: &CodecFactory) -> Vec<CodecIndex> {
    (0..factory.element_count().unwrap())
        .map(|i| factory.leaf_index(i).unwrap())
        .collect()
}

#[test]
fn test_set_get_roundtrip_every_leaf() {
    let factory = factory();
    let indices = leaves(&factory);
    assert_eq!(indices.len(), 18);
    let mut rng = fastrand::Rng::with_seed(0x5EED);

    for repr in REPRS {
        let size = factory.static_size(repr).unwrap();
        let mut buf = vec![0u8; size];
        let mut codec = factory.static_codec(&mut buf, repr).unwrap();
        assert!(codec.is_valid());
        for _ in 0..50 {
            let mut written = Vec::new();
            for index in &indices {
                let leaf = codec.leaf_access(index).unwrap();
                let value = random_value(&mut rng, leaf.scalar_type(), leaf.bit_size());
                codec.set_value(index, value).unwrap();
                written.push(value);
            }
            // Neighbouring writes (bit-packed ones included) leave values intact.
            for (index, value) in indices.iter().zip(&written) {
                assert_eq!(codec.get_value(index).unwrap(), *value, "{} in {:?}", index, repr);
            }
        }
    }
}

#[test]
fn test_typed_roundtrip_per_scalar_type() {
    let factory = factory();
    let size = factory.static_size(Representation::Serialized).unwrap();
    let mut buf = vec![0u8; size];
    let mut codec = factory.codec(&mut buf, Representation::Serialized);

    macro_rules! roundtrip {
        ($path:literal, $($v:expr),+) => {
            let index = codec.index_of($path).unwrap();
            $(
                check(&mut codec, &index, $v);
            )+
        };
    }

    roundtrip!("flag", true, false);
    roundtrip!("i8", i8::MIN, -1i8, i8::MAX);
    roundtrip!("u8", 0u8, u8::MAX);
    roundtrip!("i16", i16::MIN, 0x1234i16);
    roundtrip!("u16", u16::MAX, 7u16);
    roundtrip!("i32", i32::MIN, -123_456i32);
    roundtrip!("u32", u32::MAX, 0xCAFEu32);
    roundtrip!("i64", i64::MIN, i64::MAX);
    roundtrip!("u64", u64::MAX, 0x0102_0304_0506_0708u64);
    roundtrip!("f32", f32::MIN_POSITIVE, -2.5f32);
    roundtrip!("f64", f64::MAX, 1.0e-300f64);
    roundtrip!("mode", 4u8, 200u8);
    roundtrip!("arr[2]", -300i16, 300i16);
}

fn check<T, A>(codec: &mut A, index: &CodecIndex, value: T)
where
    T: Scalar + PartialEq + std::fmt::Debug,
    A: ValueAccessMut,
{
    codec.set(index, value).unwrap();
    assert_eq!(codec.get::<T>(index).unwrap(), value, "{}", index);
}

#[test]
fn test_big_endian_wire_bytes() {
    let factory = factory();
    let size = factory.static_size(Representation::Serialized).unwrap();
    let mut buf = vec![0u8; size];
    let mut codec = factory.codec(&mut buf, Representation::Serialized);
    codec.set_by_name("i32", 0x0102_0304i32).unwrap();
    let pos = codec.element("i32").unwrap().info().unwrap().byte_pos;
    // flag, i8, u8, i16, u16 precede it.
    assert_eq!(pos, 1 + 1 + 1 + 2 + 2);
    assert_eq!(&buf[pos..pos + 4], &[1, 2, 3, 4]);
}

#[test]
fn test_leaf_index_matches_path_resolution() {
    let factory = factory();
    let indices = leaves(&factory);
    let mut rng = fastrand::Rng::with_seed(42);

    for repr in REPRS {
        let size = factory.static_size(repr).unwrap();
        let buf: Vec<u8> = (0..size).map(|_| rng.u8(..)).collect();
        let decoder = factory.decoder(&buf, repr);
        for index in &indices {
            let by_path = decoder.resolve(index).unwrap().leaf_access().unwrap().read(&buf).unwrap();
            let by_table = decoder.get_value(index).unwrap();
            assert!(same(by_path, by_table), "{} in {:?}", index, repr);

            // Exact-width leaves also build standalone descriptors.
            if let Ok(leaf) = factory.leaf_codec_index(index, repr) {
                assert!(same(decoder.get_leaf_value(&leaf).unwrap(), by_path));
                assert_eq!(decoder.leaf_codec_index(index).unwrap(), leaf);
            }
        }
    }
}

/// Bitwise equality, so random NaN patterns compare equal to themselves.
fn same(a: Value, b: Value) -> bool {
    a.scalar_type() == b.scalar_type() && a.to_bits() == b.to_bits()
}
