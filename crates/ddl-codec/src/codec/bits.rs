// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked byte and bit access on caller buffers.
//!
//! Bits are addressed LSB-first: absolute bit `b` is bit `b % 8` of byte
//! `b / 8`. Every access checks `offset + size <= len` before touching memory.

use crate::codec::{ScalarType, Value};
use crate::error::{CodecError, Result};
use crate::model::ByteOrder;

/// Bounds check for a byte range.
pub fn check(len: usize, offset: usize, size: usize) -> Result<()> {
    match offset.checked_add(size) {
        Some(end) if end <= len => Ok(()),
        _ => Err(CodecError::out_of_bounds(offset, size, len)),
    }
}

fn bytes<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    check(buf.len(), offset, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    Ok(out)
}

/// Read a native-endian scalar at a byte offset.
pub fn read_plain(buf: &[u8], offset: usize, ty: ScalarType) -> Result<Value> {
    Ok(match ty {
        ScalarType::Bool => Value::Bool(bytes::<1>(buf, offset)?[0] != 0),
        ScalarType::I8 => Value::I8(i8::from_ne_bytes(bytes(buf, offset)?)),
        ScalarType::U8 => Value::U8(bytes::<1>(buf, offset)?[0]),
        ScalarType::I16 => Value::I16(i16::from_ne_bytes(bytes(buf, offset)?)),
        ScalarType::U16 => Value::U16(u16::from_ne_bytes(bytes(buf, offset)?)),
        ScalarType::I32 => Value::I32(i32::from_ne_bytes(bytes(buf, offset)?)),
        ScalarType::U32 => Value::U32(u32::from_ne_bytes(bytes(buf, offset)?)),
        ScalarType::I64 => Value::I64(i64::from_ne_bytes(bytes(buf, offset)?)),
        ScalarType::U64 => Value::U64(u64::from_ne_bytes(bytes(buf, offset)?)),
        ScalarType::F32 => Value::F32(f32::from_ne_bytes(bytes(buf, offset)?)),
        ScalarType::F64 => Value::F64(f64::from_ne_bytes(bytes(buf, offset)?)),
    })
}

/// Write a native-endian scalar at a byte offset; `value` must already have
/// the target type.
pub fn write_plain(buf: &mut [u8], offset: usize, value: Value) -> Result<()> {
    let size = value.scalar_type().byte_size();
    check(buf.len(), offset, size)?;
    let dst = &mut buf[offset..offset + size];
    match value {
        Value::Bool(v) => dst[0] = u8::from(v),
        Value::I8(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        Value::U8(v) => dst[0] = v,
        Value::I16(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        Value::U16(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        Value::I32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        Value::U32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        Value::I64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        Value::U64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        Value::F32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        Value::F64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
    }
    Ok(())
}

fn check_bits(len: usize, bit_offset: usize, width: usize) -> Result<()> {
    if width == 0 || width > 64 {
        return Err(CodecError::TypeMismatch {
            expected: "1..=64 bits".into(),
            got: format!("{} bits", width),
        });
    }
    let first = bit_offset / 8;
    let last = (bit_offset + width).div_ceil(8);
    check(len, first, last - first)
}

/// Swap the bytes of a `width`-bit value; widths that are not a whole number
/// of bytes are left as is.
fn swap(raw: u64, width: usize) -> u64 {
    if width % 8 != 0 || width == 8 {
        return raw;
    }
    raw.swap_bytes() >> (64 - width)
}

/// Read `width` bits (at most 64) starting at absolute bit `bit_offset`.
pub fn read_bits(buf: &[u8], bit_offset: usize, width: usize, order: ByteOrder) -> Result<u64> {
    check_bits(buf.len(), bit_offset, width)?;
    let mut raw = 0u64;
    if bit_offset % 8 == 0 && width % 8 == 0 {
        let start = bit_offset / 8;
        for (i, byte) in buf[start..start + width / 8].iter().enumerate() {
            raw |= u64::from(*byte) << (8 * i);
        }
    } else {
        for i in 0..width {
            let b = bit_offset + i;
            if (buf[b / 8] >> (b % 8)) & 1 == 1 {
                raw |= 1 << i;
            }
        }
    }
    Ok(match order {
        ByteOrder::LittleEndian => raw,
        ByteOrder::BigEndian => swap(raw, width),
    })
}

/// Write the low `width` bits of `raw` at absolute bit `bit_offset`,
/// preserving neighbouring bits.
pub fn write_bits(
    buf: &mut [u8],
    bit_offset: usize,
    width: usize,
    order: ByteOrder,
    raw: u64,
) -> Result<()> {
    check_bits(buf.len(), bit_offset, width)?;
    let raw = match order {
        ByteOrder::LittleEndian => raw,
        ByteOrder::BigEndian => swap(raw, width),
    };
    if bit_offset % 8 == 0 && width % 8 == 0 {
        let start = bit_offset / 8;
        for (i, byte) in buf[start..start + width / 8].iter_mut().enumerate() {
            *byte = (raw >> (8 * i)) as u8;
        }
    } else {
        for i in 0..width {
            let b = bit_offset + i;
            let bit = 1u8 << (b % 8);
            if (raw >> i) & 1 == 1 {
                buf[b / 8] |= bit;
            } else {
                buf[b / 8] &= !bit;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_roundtrip() {
        let mut buf = [0u8; 12];
        write_plain(&mut buf, 4, Value::F64(-0.25)).unwrap();
        assert_eq!(read_plain(&buf, 4, ScalarType::F64).unwrap(), Value::F64(-0.25));
        write_plain(&mut buf, 0, Value::Bool(true)).unwrap();
        assert_eq!(buf[0], 1);
    }

    #[test]
    fn test_plain_bounds() {
        let buf = [0u8; 4];
        assert_eq!(
            read_plain(&buf, 2, ScalarType::U32).unwrap_err(),
            CodecError::OutOfBounds {
                offset: 2,
                size: 4,
                len: 4
            }
        );
        assert!(read_plain(&buf, usize::MAX, ScalarType::U8).is_err());
    }

    #[test]
    fn test_bits_preserve_neighbours() {
        let mut buf = [0xFFu8; 2];
        write_bits(&mut buf, 3, 7, ByteOrder::LittleEndian, 0).unwrap();
        assert_eq!(buf, [0b0000_0111, 0b1111_1100]);
        write_bits(&mut buf, 3, 7, ByteOrder::LittleEndian, 0b101_0101).unwrap();
        assert_eq!(read_bits(&buf, 3, 7, ByteOrder::LittleEndian).unwrap(), 0b101_0101);
        assert_eq!(buf[0] & 0b111, 0b111);
    }

    #[test]
    fn test_big_endian_whole_bytes() {
        let mut buf = [0u8; 4];
        write_bits(&mut buf, 0, 32, ByteOrder::BigEndian, 0x0102_0304).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(read_bits(&buf, 0, 32, ByteOrder::BigEndian).unwrap(), 0x0102_0304);
        assert_eq!(read_bits(&buf, 0, 16, ByteOrder::LittleEndian).unwrap(), 0x0201);
    }

    #[test]
    fn test_big_endian_odd_width_not_swapped() {
        let mut le = [0u8; 2];
        let mut be = [0u8; 2];
        write_bits(&mut le, 2, 12, ByteOrder::LittleEndian, 0xABC).unwrap();
        write_bits(&mut be, 2, 12, ByteOrder::BigEndian, 0xABC).unwrap();
        assert_eq!(le, be);
    }

    #[test]
    fn test_bits_bounds() {
        let buf = [0u8; 2];
        assert!(matches!(
            read_bits(&buf, 10, 8, ByteOrder::LittleEndian),
            Err(CodecError::OutOfBounds { .. })
        ));
        assert!(read_bits(&buf, 0, 0, ByteOrder::LittleEndian).is_err());
    }
}
