// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The type model: every DataType, EnumType, StructType and Unit of one schema.
//!
//! All edits go through the model so it can invalidate cached layouts of the
//! edited type and everything depending on it, and queue a [`ModelEvent`] for
//! the next [`TypeModel::revalidate`] pass.

use crate::config::{CodecConfig, ConfigError};
use crate::error::{CodecError, Result};
use crate::layout::LayoutUpdate;
use crate::model::{predefined, DataType, Element, EnumType, FormatVersion, StructType, Unit};
use crate::validation::{ModelEvent, ValidationService};
use std::collections::{HashMap, HashSet};

/// Position of a model type inside its kind's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Data(usize),
    Enum(usize),
    Struct(usize),
}

/// In-memory schema graph.
#[derive(Debug, Clone, Default)]
pub struct TypeModel {
    pub(crate) file_version: Option<FormatVersion>,
    pub(crate) default_version: FormatVersion,
    pub(crate) layout_update: LayoutUpdate,
    pub(crate) units: Vec<Unit>,
    pub(crate) data_types: Vec<DataType>,
    pub(crate) enums: Vec<EnumType>,
    pub(crate) structs: Vec<StructType>,
    index: HashMap<String, TypeRef>,
    pub(crate) validation: ValidationService,
}

impl TypeModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Model tagged with a file format version.
    pub fn with_file_version(version: FormatVersion) -> Self {
        Self {
            file_version: Some(version),
            ..Self::default()
        }
    }

    /// Apply the layout-related parts of a configuration.
    pub fn apply_config(&mut self, config: &CodecConfig) -> std::result::Result<(), ConfigError> {
        let version = config.version()?;
        if version != self.default_version {
            self.default_version = version;
            self.invalidate_all_layouts();
        }
        self.layout_update = config.layout_update;
        Ok(())
    }

    pub fn file_version(&self) -> Option<FormatVersion> {
        self.file_version
    }

    pub fn set_file_version(&mut self, version: Option<FormatVersion>) {
        if self.file_version != version {
            self.file_version = version;
            self.invalidate_all_layouts();
        }
    }

    /// Version governing a struct: its own, else the file's, else the default.
    pub fn relevant_version(&self, st: &StructType) -> FormatVersion {
        st.format_version
            .or(self.file_version)
            .unwrap_or(self.default_version)
    }

    pub fn layout_update(&self) -> LayoutUpdate {
        self.layout_update
    }

    pub fn set_layout_update(&mut self, policy: LayoutUpdate) {
        self.layout_update = policy;
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Resolve a model-defined type (predefined primitives are not included).
    pub fn lookup(&self, name: &str) -> Option<TypeRef> {
        self.index.get(name).copied()
    }

    /// Whether a type name resolves locally or to a predefined primitive.
    pub fn resolves(&self, name: &str) -> bool {
        self.lookup(name).is_some() || predefined::scalar_type(name).is_some()
    }

    pub fn data_type(&self, name: &str) -> Option<&DataType> {
        match self.lookup(name)? {
            TypeRef::Data(i) => self.data_types.get(i),
            _ => None,
        }
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        match self.lookup(name)? {
            TypeRef::Enum(i) => self.enums.get(i),
            _ => None,
        }
    }

    pub fn struct_type(&self, name: &str) -> Option<&StructType> {
        match self.lookup(name)? {
            TypeRef::Struct(i) => self.structs.get(i),
            _ => None,
        }
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn data_types(&self) -> &[DataType] {
        &self.data_types
    }

    pub fn enum_types(&self) -> &[EnumType] {
        &self.enums
    }

    pub fn struct_types(&self) -> &[StructType] {
        &self.structs
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Names of every model-defined type.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.data_types
            .iter()
            .map(|t| t.name.as_str())
            .chain(self.enums.iter().map(|t| t.name.as_str()))
            .chain(self.structs.iter().map(|t| t.name.as_str()))
    }

    // ------------------------------------------------------------------
    // Adding
    // ------------------------------------------------------------------

    pub fn add_data_type(&mut self, data_type: DataType) -> Result<()> {
        self.check_new_type_name(&data_type.name)?;
        let name = data_type.name.clone();
        self.data_types.push(data_type);
        self.index.insert(name.clone(), TypeRef::Data(self.data_types.len() - 1));
        self.type_added(&name);
        Ok(())
    }

    pub fn add_enum_type(&mut self, enum_type: EnumType) -> Result<()> {
        self.check_new_type_name(&enum_type.name)?;
        let name = enum_type.name.clone();
        self.enums.push(enum_type);
        self.index.insert(name.clone(), TypeRef::Enum(self.enums.len() - 1));
        self.type_added(&name);
        Ok(())
    }

    pub fn add_struct_type(&mut self, struct_type: StructType) -> Result<()> {
        self.check_new_type_name(&struct_type.name)?;
        let name = struct_type.name.clone();
        self.structs.push(struct_type);
        self.index.insert(name.clone(), TypeRef::Struct(self.structs.len() - 1));
        self.type_added(&name);
        Ok(())
    }

    pub fn add_unit(&mut self, unit: Unit) -> Result<()> {
        if unit.name.is_empty() {
            return Err(CodecError::InvalidSchema("empty unit name".into()));
        }
        if self.unit(&unit.name).is_some() {
            return Err(CodecError::InvalidSchema(format!(
                "duplicate unit '{}'",
                unit.name
            )));
        }
        let name = unit.name.clone();
        self.units.push(unit);
        self.validation.notify(ModelEvent::UnitAdded(name));
        Ok(())
    }

    fn check_new_type_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CodecError::InvalidSchema("empty type name".into()));
        }
        if self.lookup(name).is_some() {
            return Err(CodecError::InvalidSchema(format!(
                "duplicate type '{}'",
                name
            )));
        }
        Ok(())
    }

    fn type_added(&mut self, name: &str) {
        // Dependents may have been dangling until now.
        self.invalidate_dependents(name);
        self.validation.notify(ModelEvent::Added(name.to_string()));
    }

    // ------------------------------------------------------------------
    // Renaming / removal
    // ------------------------------------------------------------------

    /// Rename a type. References elsewhere are left as authored and are
    /// re-checked by the next revalidation.
    pub fn rename_type(&mut self, old: &str, new: &str) -> Result<()> {
        let type_ref = self.lookup(old).ok_or_else(|| CodecError::not_found(old))?;
        if old == new {
            return Ok(());
        }
        self.check_new_type_name(new)?;
        self.invalidate_type(old);
        match type_ref {
            TypeRef::Data(i) => self.data_types[i].name = new.to_string(),
            TypeRef::Enum(i) => self.enums[i].name = new.to_string(),
            TypeRef::Struct(i) => self.structs[i].name = new.to_string(),
        }
        self.index.remove(old);
        self.index.insert(new.to_string(), type_ref);
        self.invalidate_type(new);
        self.validation.notify(ModelEvent::Renamed {
            old: old.to_string(),
            new: new.to_string(),
        });
        Ok(())
    }

    pub fn remove_type(&mut self, name: &str) -> Result<()> {
        let type_ref = self.lookup(name).ok_or_else(|| CodecError::not_found(name))?;
        self.invalidate_type(name);
        match type_ref {
            TypeRef::Data(i) => {
                self.data_types.remove(i);
            }
            TypeRef::Enum(i) => {
                self.enums.remove(i);
            }
            TypeRef::Struct(i) => {
                self.structs.remove(i);
            }
        }
        self.rebuild_index();
        self.validation.notify(ModelEvent::Removed(name.to_string()));
        Ok(())
    }

    pub fn rename_unit(&mut self, old: &str, new: &str) -> Result<()> {
        if self.unit(old).is_none() {
            return Err(CodecError::not_found(old));
        }
        if old == new {
            return Ok(());
        }
        if self.unit(new).is_some() {
            return Err(CodecError::InvalidSchema(format!("duplicate unit '{}'", new)));
        }
        if let Some(unit) = self.units.iter_mut().find(|u| u.name == old) {
            unit.name = new.to_string();
        }
        self.validation.notify(ModelEvent::UnitRenamed {
            old: old.to_string(),
            new: new.to_string(),
        });
        Ok(())
    }

    pub fn remove_unit(&mut self, name: &str) -> Result<()> {
        let index = self
            .units
            .iter()
            .position(|u| u.name == name)
            .ok_or_else(|| CodecError::not_found(name))?;
        self.units.remove(index);
        self.validation.notify(ModelEvent::UnitRemoved(name.to_string()));
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, t) in self.data_types.iter().enumerate() {
            self.index.insert(t.name.clone(), TypeRef::Data(i));
        }
        for (i, t) in self.enums.iter().enumerate() {
            self.index.insert(t.name.clone(), TypeRef::Enum(i));
        }
        for (i, t) in self.structs.iter().enumerate() {
            self.index.insert(t.name.clone(), TypeRef::Struct(i));
        }
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Edit a data type in place (the name must not change; use `rename_type`).
    pub fn edit_data_type<F: FnOnce(&mut DataType)>(&mut self, name: &str, edit: F) -> Result<()> {
        let i = match self.lookup(name) {
            Some(TypeRef::Data(i)) => i,
            _ => return Err(CodecError::not_found(name)),
        };
        edit(&mut self.data_types[i]);
        self.data_types[i].name = name.to_string();
        self.type_changed(name);
        Ok(())
    }

    /// Edit an enum type in place (the name must not change; use `rename_type`).
    pub fn edit_enum_type<F: FnOnce(&mut EnumType)>(&mut self, name: &str, edit: F) -> Result<()> {
        let i = match self.lookup(name) {
            Some(TypeRef::Enum(i)) => i,
            _ => return Err(CodecError::not_found(name)),
        };
        edit(&mut self.enums[i]);
        self.enums[i].name = name.to_string();
        self.type_changed(name);
        Ok(())
    }

    /// Edit a struct's header or elements; all of its cached layout is dropped.
    pub fn edit_struct_type<F, R>(&mut self, name: &str, edit: F) -> Result<R>
    where
        F: FnOnce(&mut StructType) -> Result<R>,
    {
        let i = self.struct_index(name)?;
        let result = edit(&mut self.structs[i]);
        self.structs[i].name = name.to_string();
        self.structs[i].invalidate_all();
        self.type_changed(name);
        result
    }

    /// Append an element; only that element's layout needs computing.
    pub fn add_element(&mut self, struct_name: &str, element: Element) -> Result<()> {
        let i = self.struct_index(struct_name)?;
        self.structs[i].push_element(element)?;
        self.type_changed(struct_name);
        Ok(())
    }

    pub fn insert_element(&mut self, struct_name: &str, index: usize, element: Element) -> Result<()> {
        let i = self.struct_index(struct_name)?;
        self.structs[i].insert_element(index, element)?;
        self.type_changed(struct_name);
        Ok(())
    }

    pub fn remove_element(&mut self, struct_name: &str, element: &str) -> Result<Element> {
        let i = self.struct_index(struct_name)?;
        let removed = self.structs[i].remove_element(element)?;
        self.type_changed(struct_name);
        Ok(removed)
    }

    pub fn rename_element(&mut self, struct_name: &str, old: &str, new: &str) -> Result<()> {
        let i = self.struct_index(struct_name)?;
        self.structs[i].rename_element(old, new)?;
        self.type_changed(struct_name);
        Ok(())
    }

    pub fn edit_element<F: FnOnce(&mut Element)>(
        &mut self,
        struct_name: &str,
        element: &str,
        edit: F,
    ) -> Result<()> {
        let i = self.struct_index(struct_name)?;
        self.structs[i].edit_element(element, edit)?;
        self.type_changed(struct_name);
        Ok(())
    }

    fn struct_index(&self, name: &str) -> Result<usize> {
        match self.lookup(name) {
            Some(TypeRef::Struct(i)) => Ok(i),
            _ => Err(CodecError::not_found(name)),
        }
    }

    fn type_changed(&mut self, name: &str) {
        self.clear_own_type_info(name);
        self.invalidate_dependents(name);
        self.validation.notify(ModelEvent::Changed(name.to_string()));
    }

    // ------------------------------------------------------------------
    // Dependency tracking and invalidation
    // ------------------------------------------------------------------

    /// Types directly referencing `name` (struct elements, enum underlying types).
    pub fn direct_dependents(&self, name: &str) -> Vec<String> {
        let structs = self
            .structs
            .iter()
            .filter(|s| s.elements().iter().any(|e| e.type_name == name))
            .map(|s| s.name.clone());
        let enums = self
            .enums
            .iter()
            .filter(|e| e.data_type == name)
            .map(|e| e.name.clone());
        structs.chain(enums).collect()
    }

    /// Transitive dependents of `name`, excluding `name` itself.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = vec![name.to_string()];
        while let Some(current) = queue.pop() {
            for dep in self.direct_dependents(&current) {
                if dep != name && seen.insert(dep.clone()) {
                    order.push(dep.clone());
                    queue.push(dep);
                }
            }
        }
        order
    }

    /// Types and data types carrying a reference to unit `name`.
    pub(crate) fn unit_dependents(&self, name: &str) -> Vec<String> {
        let data = self
            .data_types
            .iter()
            .filter(|d| d.unit.as_deref() == Some(name))
            .map(|d| d.name.clone());
        let structs = self
            .structs
            .iter()
            .filter(|s| s.elements().iter().any(|e| e.unit.as_deref() == Some(name)))
            .map(|s| s.name.clone());
        data.chain(structs).collect()
    }

    fn clear_own_type_info(&mut self, name: &str) {
        match self.lookup(name) {
            Some(TypeRef::Data(i)) => {
                self.data_types[i].type_info = None;
                self.data_types[i].validation.mark_stale();
            }
            Some(TypeRef::Enum(i)) => {
                self.enums[i].type_info = None;
                self.enums[i].validation.mark_stale();
            }
            Some(TypeRef::Struct(i)) => {
                self.structs[i].type_info = None;
                self.structs[i].validation.mark_stale();
            }
            None => {}
        }
    }

    /// Drop the cached layout of `name` entirely, plus dependents.
    fn invalidate_type(&mut self, name: &str) {
        if let Some(TypeRef::Struct(i)) = self.lookup(name) {
            self.structs[i].invalidate_all();
        }
        self.clear_own_type_info(name);
        self.invalidate_dependents(name);
    }

    /// Drop cached layouts of everything transitively referencing `name`.
    ///
    /// A dependent struct keeps the layouts of elements that precede its
    /// first reference to a changed type.
    fn invalidate_dependents(&mut self, name: &str) {
        let mut changed: HashSet<String> = HashSet::new();
        changed.insert(name.to_string());
        let mut queue = vec![name.to_string()];
        while let Some(current) = queue.pop() {
            for s in self.structs.iter_mut() {
                if let Some(first) = s.elements().iter().position(|e| e.type_name == current) {
                    s.invalidate_from(first);
                    s.validation.mark_stale();
                    if changed.insert(s.name.clone()) {
                        queue.push(s.name.clone());
                    }
                }
            }
            for e in self.enums.iter_mut() {
                if e.data_type == current {
                    e.type_info = None;
                    e.validation.mark_stale();
                    if changed.insert(e.name.clone()) {
                        queue.push(e.name.clone());
                    }
                }
            }
        }
    }

    /// Drop every cached layout in the model.
    pub fn invalidate_all_layouts(&mut self) {
        for d in self.data_types.iter_mut() {
            d.type_info = None;
        }
        for e in self.enums.iter_mut() {
            e.type_info = None;
        }
        for s in self.structs.iter_mut() {
            s.invalidate_all();
        }
    }
}
