// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Offset calculation.
//!
//! Pure functions: an element's placement in both representations follows
//! from its definition, its previous sibling's layout, the referenced type's
//! [`TypeInfo`] and the owning struct's format version. The cache driver in
//! [`calculator`](super::calculator) supplies those inputs.

use crate::layout::{BitPosition, ElementTypeInfo, TypeClass, TypeInfo};
use crate::model::{ArraySize, DataType, Element, FormatVersion};

/// Round `value` up to a multiple of `alignment` (0 and 1 mean unaligned).
pub fn align_up(value: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

/// Repetition count used for layout; an authored 0 occupies one slot.
pub fn layout_count(array_size: &ArraySize) -> usize {
    match array_size {
        ArraySize::Fixed(n) => (*n).max(1),
        ArraySize::Dynamic(_) => 1,
    }
}

/// Serialized bit size of an element.
///
/// A bit-width override wins when it does not exceed the referenced type's
/// native bit size; otherwise the native size repeats `count` times.
pub fn serialized_bit_size(num_bits: Option<usize>, native_bits: usize, count: usize) -> usize {
    match num_bits {
        Some(bits) if bits <= native_bits => bits,
        _ => native_bits * count,
    }
}

/// Serialized position of an element.
///
/// Authored positions are kept as written, also after dynamic content.
pub fn serialized_position(
    element: &Element,
    previous: Option<&ElementTypeInfo>,
    after_dynamic: bool,
) -> Option<BitPosition> {
    if let Some(byte) = element.serialized.byte_pos {
        return Some(BitPosition::new(byte, element.serialized.bit_pos.unwrap_or(0)));
    }
    if after_dynamic {
        return None;
    }
    match previous {
        None => Some(BitPosition::default()),
        Some(prev) => prev.serialized_end().map(BitPosition::from_bits),
    }
}

/// Deserialized byte position of an element.
pub fn deserialized_position(
    previous: Option<&ElementTypeInfo>,
    alignment: usize,
    after_dynamic: bool,
) -> Option<usize> {
    if after_dynamic {
        return None;
    }
    match previous {
        None => Some(0),
        Some(prev) => prev.deserialized_end().map(|end| align_up(end, alignment)),
    }
}

/// Deserialized size of `count` repetitions of `referenced`.
///
/// From 3.0 on every repetition pays its padding; before, the last one is
/// unpadded.
pub fn deserialized_size(referenced: &TypeInfo, count: usize, version: FormatVersion) -> usize {
    if count == 0 {
        return 0;
    }
    if version.pads_every_repetition() {
        count * referenced.aligned_byte_size
    } else {
        referenced.byte_size + (count - 1) * referenced.aligned_byte_size
    }
}

/// Full layout of one element.
pub fn element_layout(
    element: &Element,
    referenced: &TypeInfo,
    type_class: TypeClass,
    previous: Option<&ElementTypeInfo>,
    version: FormatVersion,
) -> ElementTypeInfo {
    let count = layout_count(&element.array_size);
    let dynamic = element.array_size.is_dynamic() || referenced.dynamic;
    let after_dynamic = previous.is_some_and(ElementTypeInfo::blocks_successors);
    let alignment = element
        .deserialized
        .alignment
        .unwrap_or(referenced.alignment)
        .max(1);

    ElementTypeInfo {
        serialized: serialized_position(element, previous, after_dynamic),
        bit_size: serialized_bit_size(element.serialized.num_bits, referenced.bit_size, count),
        deserialized: deserialized_position(previous, alignment, after_dynamic),
        deserialized_size: (!dynamic).then(|| {
            let unit = TypeInfo {
                aligned_byte_size: align_up(referenced.byte_size, alignment),
                ..*referenced
            };
            deserialized_size(&unit, count, version)
        }),
        type_bit_size: referenced.bit_size,
        type_byte_size: referenced.byte_size,
        type_aligned_byte_size: align_up(referenced.byte_size, alignment),
        alignment,
        type_class,
        dynamic,
        after_dynamic,
        valid: referenced.valid && type_class != TypeClass::Unresolved,
    }
}

/// Layout of a data type.
pub fn data_type_info(data_type: &DataType) -> TypeInfo {
    let count = data_type.array_size.unwrap_or(1).max(1);
    let bit_size = data_type.bit_size * count;
    let byte_size = bit_size.div_ceil(8);
    let alignment = data_type.alignment.unwrap_or(1).max(1);
    TypeInfo {
        bit_size,
        byte_size,
        aligned_byte_size: align_up(byte_size, alignment),
        alignment,
        dynamic: false,
        valid: data_type.bit_size > 0 && alignment.is_power_of_two(),
    }
}

/// Layout of an enum: its underlying type's layout.
pub fn enum_type_info(underlying: &TypeInfo) -> TypeInfo {
    *underlying
}

/// Aggregate layout of a struct from its element layouts.
pub fn struct_type_info(
    explicit_alignment: Option<usize>,
    elements: &[ElementTypeInfo],
    version: FormatVersion,
) -> TypeInfo {
    let alignment = explicit_alignment
        .unwrap_or_else(|| elements.iter().map(|e| e.alignment).max().unwrap_or(1))
        .max(1);
    let dynamic = elements.iter().any(|e| e.dynamic);

    // Explicit positions may place elements out of declaration order. A
    // dynamic element counts with its single static repetition.
    let bit_size = elements
        .iter()
        .filter_map(ElementTypeInfo::serialized_end)
        .max()
        .unwrap_or(0);

    let (byte_size, aligned_byte_size) = if dynamic {
        let prefix = elements
            .iter()
            .take_while(|e| !e.dynamic)
            .last()
            .and_then(ElementTypeInfo::deserialized_end)
            .unwrap_or(0);
        (prefix, align_up(prefix, alignment))
    } else {
        let raw = elements
            .last()
            .and_then(ElementTypeInfo::deserialized_end)
            .unwrap_or(0);
        let aligned = align_up(raw, alignment);
        if version.pads_every_repetition() {
            (aligned, aligned)
        } else {
            (raw, aligned)
        }
    };

    TypeInfo {
        bit_size,
        byte_size,
        aligned_byte_size,
        alignment,
        dynamic,
        valid: elements.iter().all(|e| e.valid) && alignment.is_power_of_two(),
    }
}
