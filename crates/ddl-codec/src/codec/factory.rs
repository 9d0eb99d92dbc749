// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec factory.
//!
//! A [`CodecFactory`] snapshots one struct of a validated, laid-out model and
//! hands out runtime objects bound to caller buffers. The model may be edited
//! afterwards without affecting factories already built.

use crate::codec::access::{ElementAccess, SchemaView};
use crate::codec::runtime::{Binding, Codec, Decoder, StaticCodec, StaticDecoder};
use crate::codec::traverse;
use crate::codec::{schema, CodecIndex, LeafCodecIndex, Representation, StructLayout};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::model::TypeModel;
use crate::validation::ValidationLevel;
use std::collections::HashMap;
use std::sync::Arc;

/// Precomputed leaf descriptors of a static layout, in leaf numbering order.
#[derive(Debug, Default)]
pub struct LeafTable {
    entries: Vec<(CodecIndex, LeafCodecIndex)>,
    by_index: HashMap<CodecIndex, usize>,
}

impl LeafTable {
    fn build(layout: &Arc<StructLayout>, repr: Representation) -> Result<Self> {
        let view = SchemaView::new(layout, repr);
        let mut table = Self::default();
        for handle in traverse::leaves(&view) {
            let index = handle?.into_index();
            let leaf = view.resolve(&index)?.leaf_access()?;
            table.by_index.insert(index.clone(), table.entries.len());
            table.entries.push((index, leaf));
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Leaf descriptor for `index`, if it names a leaf repetition.
    pub fn get(&self, index: &CodecIndex) -> Option<LeafCodecIndex> {
        self.by_index.get(index).map(|&i| self.entries[i].1)
    }

    /// Entry by flat leaf number.
    pub fn entry(&self, leaf: usize) -> Option<&(CodecIndex, LeafCodecIndex)> {
        self.entries.get(leaf)
    }
}

/// Compiled schema of one struct plus runtime settings.
#[derive(Debug, Clone)]
pub struct CodecFactory {
    layout: Arc<StructLayout>,
    config: CodecConfig,
    level: ValidationLevel,
    valid: bool,
    deserialized: Option<Arc<LeafTable>>,
    serialized: Option<Arc<LeafTable>>,
}

impl CodecFactory {
    /// Factory for struct `name` with default runtime settings.
    pub fn new(model: &mut TypeModel, name: &str) -> Result<Self> {
        Self::build(model, name, CodecConfig::default())
    }

    /// Factory for struct `name`; the layout settings of `config` are applied
    /// to the model first.
    pub fn with_config(model: &mut TypeModel, name: &str, config: CodecConfig) -> Result<Self> {
        model
            .apply_config(&config)
            .map_err(|e| CodecError::InvalidSchema(e.to_string()))?;
        Self::build(model, name, config)
    }

    fn build(model: &mut TypeModel, name: &str, config: CodecConfig) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CodecError::InvalidSchema("empty struct name".into()));
        }
        model.revalidate();
        let level_of = |m: &TypeModel| {
            m.validation_info(name)
                .map_or(ValidationLevel::Unknown, |info| info.level())
        };
        if level_of(model) == ValidationLevel::Unknown {
            model.validate_all();
        }
        let level = level_of(model);

        let layout = schema::compile(model, name)?;
        let valid = layout.valid && level >= ValidationLevel::GoodEnough;
        if !valid {
            log::warn!(
                "[CodecFactory] '{}' is not usable for layout (level {:?})",
                name,
                level
            );
        }

        let (deserialized, serialized) = if config.leaf_fast_path && !layout.dynamic {
            (
                Some(Arc::new(LeafTable::build(&layout, Representation::Deserialized)?)),
                Some(Arc::new(LeafTable::build(&layout, Representation::Serialized)?)),
            )
        } else {
            (None, None)
        };
        log::debug!(
            "[CodecFactory] '{}' compiled: {} fields, dynamic={}, leaf table={}",
            name,
            layout.len(),
            layout.dynamic,
            deserialized.as_ref().map_or(0, |t| t.len())
        );

        Ok(Self {
            layout,
            config,
            level,
            valid,
            deserialized,
            serialized,
        })
    }

    pub fn layout(&self) -> &Arc<StructLayout> {
        &self.layout
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Schema usable for layout: laid out without cycles and validated at
    /// `GoodEnough` or better.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn validation_level(&self) -> ValidationLevel {
        self.level
    }

    pub fn is_dynamic(&self) -> bool {
        self.layout.dynamic
    }

    /// Byte size of every instance; `None` when the size depends on the buffer.
    pub fn static_size(&self, repr: Representation) -> Option<usize> {
        (!self.layout.dynamic).then(|| self.layout.static_size(repr))
    }

    /// Schema-only view in `repr`.
    pub fn schema(&self, repr: Representation) -> SchemaView<'_> {
        SchemaView::new(&self.layout, repr)
    }

    pub fn leaf_table(&self, repr: Representation) -> Option<&Arc<LeafTable>> {
        match repr {
            Representation::Deserialized => self.deserialized.as_ref(),
            Representation::Serialized => self.serialized.as_ref(),
        }
    }

    /// Number of leaves of every instance.
    pub fn element_count(&self) -> Result<usize> {
        self.require_static()?;
        match &self.deserialized {
            Some(table) => Ok(table.len()),
            None => {
                let view = self.schema(Representation::Deserialized);
                traverse::leaves(&view).try_fold(0, |n, leaf| leaf.map(|_| n + 1))
            }
        }
    }

    /// Index of leaf number `leaf`.
    pub fn leaf_index(&self, leaf: usize) -> Result<CodecIndex> {
        self.require_static()?;
        if let Some(table) = &self.deserialized {
            return table
                .entry(leaf)
                .map(|(index, _)| index.clone())
                .ok_or(CodecError::InvalidIndex {
                    index: leaf,
                    bound: table.len(),
                });
        }
        let view = self.schema(Representation::Deserialized);
        let mut count = 0;
        for handle in traverse::leaves(&view) {
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

    /// Leaf descriptor valid for every buffer of this static schema.
    pub fn leaf_codec_index(&self, index: &CodecIndex, repr: Representation) -> Result<LeafCodecIndex> {
        self.require_static()?;
        LeafCodecIndex::new(&self.schema(repr).resolve(index)?)
    }

    fn require_static(&self) -> Result<()> {
        if self.layout.dynamic {
            return Err(CodecError::InvalidSchema(format!(
                "'{}' contains dynamic arrays; leaf positions depend on the buffer",
                self.layout.name
            )));
        }
        Ok(())
    }

    fn binding(&self, repr: Representation) -> Binding {
        Binding {
            layout: self.layout.clone(),
            repr,
            schema_valid: self.valid,
            leaves: self.leaf_table(repr).cloned(),
            zero_unset: self.config.reset_zero_unset,
            strict: self.config.strict_static_size,
        }
    }

    /// Read-only access to `buf`.
    pub fn decoder<'b>(&self, buf: &'b [u8], repr: Representation) -> Decoder<'b> {
        Decoder::new(self.binding(repr), buf)
    }

    /// Read-write access to `buf`.
    pub fn codec<'b>(&self, buf: &'b mut [u8], repr: Representation) -> Codec<'b> {
        Codec::new(self.binding(repr), buf)
    }

    /// Read-only access to `buf` for a schema without dynamic arrays.
    pub fn static_decoder<'b>(&self, buf: &'b [u8], repr: Representation) -> Result<StaticDecoder<'b>> {
        self.require_static()?;
        Ok(StaticDecoder::new(self.binding(repr), buf))
    }

    /// Read-write access to `buf` for a schema without dynamic arrays.
    pub fn static_codec<'b>(&self, buf: &'b mut [u8], repr: Representation) -> Result<StaticCodec<'b>> {
        self.require_static()?;
        Ok(StaticCodec::new(self.binding(repr), buf))
    }
}

impl ElementAccess for CodecFactory {
    fn layout(&self) -> &Arc<StructLayout> {
        &self.layout
    }

    fn representation(&self) -> Representation {
        Representation::Deserialized
    }

    fn buffer(&self) -> Option<&[u8]> {
        None
    }
}
