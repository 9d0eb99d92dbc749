// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime objects binding a compiled schema to a caller buffer.
//!
//! | object          | dynamic arrays | writes |
//! |-----------------|----------------|--------|
//! | [`Decoder`]       | yes            | no     |
//! | [`Codec`]         | yes            | yes    |
//! | [`StaticDecoder`] | no             | no     |
//! | [`StaticCodec`]   | no             | yes    |
//!
//! None of them owns its buffer. Read-only objects do not implement
//! [`ValueAccessMut`], so there is nothing to reject at runtime.

use crate::codec::access::{ElementAccess, ValueAccess, ValueAccessMut};
use crate::codec::factory::LeafTable;
use crate::codec::traverse::{self, Traversal};
use crate::codec::{resolve, transform, CodecIndex, LeafCodecIndex, Representation, StructLayout};
use crate::error::{CodecError, Result};
use std::sync::Arc;

/// Schema side shared by all runtime objects of one factory.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub layout: Arc<StructLayout>,
    pub repr: Representation,
    pub schema_valid: bool,
    pub leaves: Option<Arc<LeafTable>>,
    pub zero_unset: bool,
    pub strict: bool,
}

impl Binding {
    fn fast_leaf(&self, index: &CodecIndex) -> Option<LeafCodecIndex> {
        self.leaves.as_ref().and_then(|t| t.get(index))
    }

    fn fits(&self, buf: &[u8], exact: bool) -> bool {
        if !self.schema_valid {
            return false;
        }
        match resolve::instance_size(&self.layout, self.repr, Some(buf)) {
            Ok(size) if exact => buf.len() == size,
            Ok(size) => buf.len() >= size,
            Err(e) => {
                log::debug!("[Codec] '{}' instance not resolvable: {}", self.layout.name, e);
                false
            }
        }
    }
}

macro_rules! runtime_object {
    ($name:ident, $doc:literal $(, $m:tt)?) => {
        #[doc = $doc]
        #[derive(Debug)]
        pub struct $name<'b> {
            binding: Binding,
            buf: &'b $($m)? [u8],
        }

        impl<'b> $name<'b> {
            pub(crate) fn new(binding: Binding, buf: &'b $($m)? [u8]) -> Self {
                Self { binding, buf }
            }

            pub fn len(&self) -> usize {
                self.buf.len()
            }

            pub fn is_empty(&self) -> bool {
                self.buf.is_empty()
            }

            /// Byte size of the instance held by the buffer.
            pub fn extent(&self) -> Result<usize> {
                resolve::instance_size(&self.binding.layout, self.binding.repr, Some(&self.buf[..]))
            }

            /// Number of leaves in this instance.
            pub fn element_count(&self) -> Result<usize> {
                if let Some(table) = &self.binding.leaves {
                    return Ok(table.len());
                }
                traverse::leaves(self).try_fold(0, |n, leaf| leaf.map(|_| n + 1))
            }

            /// Index of leaf number `leaf` in this instance.
            pub fn leaf_index(&self, leaf: usize) -> Result<CodecIndex> {
                if let Some(table) = &self.binding.leaves {
                    return table
                        .entry(leaf)
                        .map(|(index, _)| index.clone())
                        .ok_or(CodecError::InvalidIndex {
                            index: leaf,
                            bound: table.len(),
                        });
                }
                let mut count = 0;
                for handle in traverse::leaves(self) {
                    let handle = handle?;
                    if count == leaf {
                        return Ok(handle.into_index());
                    }
                    count += 1;
                }
                Err(CodecError::InvalidIndex {
                    index: leaf,
                    bound: count,
                })
            }

            /// Strict leaf descriptor (predefined scalar or enum of exact
            /// machine width) at this instance's positions.
            pub fn leaf_codec_index(&self, index: &CodecIndex) -> Result<LeafCodecIndex> {
                LeafCodecIndex::new(&self.resolve(index)?)
            }

            pub fn elements(&self) -> Traversal<'_, Self> {
                traverse::elements(self)
            }

            pub fn leaves(&self) -> Traversal<'_, Self> {
                traverse::leaves(self)
            }
        }

        impl ElementAccess for $name<'_> {
            fn layout(&self) -> &Arc<StructLayout> {
                &self.binding.layout
            }

            fn representation(&self) -> Representation {
                self.binding.repr
            }

            fn buffer(&self) -> Option<&[u8]> {
                Some(&self.buf[..])
            }

            fn leaf_access(&self, index: &CodecIndex) -> Result<LeafCodecIndex> {
                match self.binding.fast_leaf(index) {
                    Some(leaf) => Ok(leaf),
                    None => self.resolve(index)?.leaf_access(),
                }
            }
        }

        impl ValueAccess for $name<'_> {
            fn data(&self) -> &[u8] {
                &self.buf[..]
            }
        }
    };
}

macro_rules! writable {
    ($name:ident) => {
        impl ValueAccessMut for $name<'_> {
            fn data_mut(&mut self) -> &mut [u8] {
                &mut self.buf[..]
            }
        }

        impl $name<'_> {
            /// Restore every static leaf to its constant, else its default,
            /// else zero when configured. Returns the number of leaves written.
            pub fn reset(&mut self) -> Result<usize> {
                let zero_unset = self.binding.zero_unset;
                transform::reset(self, zero_unset)
            }

            /// Copy every leaf of `src` that resolves here by name.
            pub fn transform_from<S: ValueAccess>(&mut self, src: &S) -> Result<usize> {
                transform::transform(src, self)
            }
        }
    };
}

runtime_object!(Decoder, "Read-only access to an instance that may contain dynamic arrays.");
runtime_object!(Codec, "Read-write access to an instance that may contain dynamic arrays.", mut);
runtime_object!(StaticDecoder, "Read-only access to an instance of a schema without dynamic arrays.");
runtime_object!(StaticCodec, "Read-write access to an instance of a schema without dynamic arrays.", mut);

writable!(Codec);
writable!(StaticCodec);

impl Decoder<'_> {
    /// Valid schema and a buffer holding at least one full instance.
    pub fn is_valid(&self) -> bool {
        self.binding.fits(&self.buf[..], false)
    }
}

impl Codec<'_> {
    /// Valid schema and a buffer holding at least one full instance.
    pub fn is_valid(&self) -> bool {
        self.binding.fits(&self.buf[..], false)
    }
}

impl StaticDecoder<'_> {
    /// Valid schema and a buffer of the static size (or larger when not strict).
    pub fn is_valid(&self) -> bool {
        self.binding.fits(&self.buf[..], self.binding.strict)
    }
}

impl StaticCodec<'_> {
    /// Valid schema and a buffer of the static size (or larger when not strict).
    pub fn is_valid(&self) -> bool {
        self.binding.fits(&self.buf[..], self.binding.strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecFactory;
    use crate::config::CodecConfig;
    use crate::model::{ElementBuilder, EnumBuilder, StructBuilder, TypeModel};

    fn model() -> TypeModel {
        let mut m = TypeModel::new();
        m.add_enum_type(EnumBuilder::new("Mode", "tUInt8").value("Off").value("On").build())
            .unwrap();
        m.add_struct_type(
            StructBuilder::new("Sample")
                .element(ElementBuilder::new("mode", "Mode").default_value("On"))
                .element(ElementBuilder::new("gain", "tFloat32").default_value("1.5"))
                .element(ElementBuilder::new("id", "tUInt16").constant("7"))
                .field("raw", "tInt32")
                .build()
                .unwrap(),
        )
        .unwrap();
        m.add_struct_type(
            StructBuilder::new("Message")
                .field("n", "tUInt8")
                .element(ElementBuilder::new("values", "tInt32").dynamic_array("n"))
                .field("tail", "tUInt16")
                .build()
                .unwrap(),
        )
        .unwrap();
        m
    }

    #[test]
    fn test_static_size_validity() {
        let mut m = model();
        let factory = CodecFactory::new(&mut m, "Sample").unwrap();
        assert!(factory.is_valid());
        assert_eq!(factory.static_size(Representation::Deserialized), Some(16));

        let buf = [0u8; 16];
        assert!(factory.static_decoder(&buf, Representation::Deserialized).unwrap().is_valid());
        let long = [0u8; 17];
        assert!(!factory.static_decoder(&long, Representation::Deserialized).unwrap().is_valid());
        // Dynamic-capable objects accept trailing bytes.
        assert!(factory.decoder(&long, Representation::Deserialized).is_valid());
        let short = [0u8; 15];
        assert!(!factory.decoder(&short, Representation::Deserialized).is_valid());

        let config = CodecConfig {
            strict_static_size: false,
            ..CodecConfig::default()
        };
        let relaxed = CodecFactory::with_config(&mut m, "Sample", config).unwrap();
        assert!(relaxed.static_decoder(&long, Representation::Deserialized).unwrap().is_valid());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut m = model();
        let factory = CodecFactory::new(&mut m, "Sample").unwrap();
        let mut buf = [0xFFu8; 16];
        let mut codec = factory.static_codec(&mut buf, Representation::Deserialized).unwrap();
        assert_eq!(codec.reset().unwrap(), 4);
        assert_eq!(codec.get_by_name::<f32>("gain").unwrap(), 1.5);
        assert_eq!(codec.get_by_name::<u16>("id").unwrap(), 7);
        assert_eq!(codec.get_by_name::<i32>("raw").unwrap(), 0);
        let mode = codec.index_of("mode").unwrap();
        assert_eq!(codec.get_string(&mode).unwrap(), "On");
    }

    #[test]
    fn test_leaf_table_matches_resolution() {
        let mut m = model();
        let factory = CodecFactory::new(&mut m, "Sample").unwrap();
        let mut buf = [0u8; 16];
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = i as u8 * 17;
        }
        for repr in [Representation::Deserialized, Representation::Serialized] {
            let decoder = factory.decoder(&buf, repr);
            assert_eq!(decoder.element_count().unwrap(), 4);
            for i in 0..4 {
                let index = decoder.leaf_index(i).unwrap();
                let fast = decoder.get_value(&index).unwrap();
                let slow = decoder.resolve(&index).unwrap().leaf_access().unwrap().read(&buf).unwrap();
                assert_eq!(fast, slow);
            }
            assert!(matches!(decoder.leaf_index(4), Err(CodecError::InvalidIndex { .. })));
        }
    }

    #[test]
    fn test_dynamic_element_count() {
        let mut m = model();
        let factory = CodecFactory::new(&mut m, "Message").unwrap();
        assert!(factory.is_dynamic());
        assert_eq!(factory.static_size(Representation::Serialized), None);
        assert!(matches!(
            factory.static_decoder(&[], Representation::Serialized),
            Err(CodecError::InvalidSchema(_))
        ));

        let mut buf = vec![0u8; 32];
        {
            let mut codec = factory.codec(&mut buf, Representation::Serialized);
            codec.set_by_name("n", 3u8).unwrap();
            codec.set_by_name("values[2]", -5i32).unwrap();
            codec.set_by_name("tail", 0xBEEFu16).unwrap();
            assert_eq!(codec.element_count().unwrap(), 1 + 3 + 1);
            assert_eq!(codec.extent().unwrap(), 1 + 12 + 2);
        }
        assert_eq!(&buf[13..15], &0xBEEFu16.to_le_bytes());

        let decoder = factory.decoder(&buf, Representation::Serialized);
        let names: Vec<String> = decoder
            .leaves()
            .map(|leaf| leaf.and_then(|l| l.full_name()).unwrap())
            .collect();
        assert_eq!(names, ["n", "values[0]", "values[1]", "values[2]", "tail"]);
        assert_eq!(decoder.get_by_name::<i32>("values[2]").unwrap(), -5);
    }

    #[test]
    fn test_traversal_restarts() {
        let mut m = model();
        let factory = CodecFactory::new(&mut m, "Message").unwrap();
        let mut buf = [0u8; 16];
        buf[0] = 1;
        let decoder = factory.decoder(&buf, Representation::Deserialized);
        let mut walk = decoder.elements();
        let first: Vec<_> = walk.by_ref().map(|e| e.unwrap().into_index()).collect();
        // n, values, values[0], tail
        assert_eq!(first.len(), 4);
        walk.restart();
        assert_eq!(walk.count(), 4);
    }

    #[test]
    fn test_short_buffer() {
        let mut m = model();
        let factory = CodecFactory::new(&mut m, "Message").unwrap();
        let buf = [200u8, 0, 0, 0];
        let decoder = factory.decoder(&buf, Representation::Serialized);
        assert!(!decoder.is_valid());
        // 200 values cannot fit in four bytes.
        assert!(matches!(
            decoder.element_count(),
            Err(CodecError::OutOfBounds { .. })
        ));
        assert!(matches!(
            decoder.get_by_name::<u16>("tail"),
            Err(CodecError::OutOfBounds { .. })
        ));

        let empty: [u8; 0] = [];
        let decoder = factory.decoder(&empty, Representation::Serialized);
        let results: Vec<_> = decoder.leaves().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(CodecError::OutOfBounds { .. })));
    }
}
