// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Model-wide validation service.
//!
//! Edits place [`ModelEvent`]s on a queue; [`TypeModel::revalidate`] drains
//! it and re-checks exactly the affected types and their dependents instead of
//! validating eagerly on every read.

use crate::model::{predefined, ArraySize, StructType, TypeModel, TypeRef};
use crate::validation::{Problem, ProblemKind, ValidationInfo, ValidationLevel};
use std::collections::HashSet;

/// Structural change recorded by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    Added(String),
    Changed(String),
    Renamed { old: String, new: String },
    Removed(String),
    UnitAdded(String),
    UnitRenamed { old: String, new: String },
    UnitRemoved(String),
}

/// Pending-event queue owned by a [`TypeModel`].
#[derive(Debug, Clone, Default)]
pub struct ValidationService {
    queue: Vec<ModelEvent>,
}

impl ValidationService {
    pub fn notify(&mut self, event: ModelEvent) {
        self.queue.push(event);
    }

    pub fn pending(&self) -> &[ModelEvent] {
        &self.queue
    }

    pub fn drain(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.queue)
    }
}

impl TypeModel {
    /// Events queued since the last revalidation.
    pub fn pending_events(&self) -> &[ModelEvent] {
        self.validation.pending()
    }

    /// Drain the event queue and re-validate every affected type.
    ///
    /// Returns the number of types validated.
    pub fn revalidate(&mut self) -> usize {
        let events = self.validation.drain();
        if events.is_empty() {
            return 0;
        }
        let mut affected: Vec<String> = Vec::new();
        for event in &events {
            match event {
                ModelEvent::Added(name) | ModelEvent::Changed(name) => {
                    affected.push(name.clone());
                    affected.extend(self.dependents(name));
                }
                ModelEvent::Renamed { old, new } => {
                    affected.push(new.clone());
                    affected.extend(self.dependents(old));
                    affected.extend(self.dependents(new));
                }
                ModelEvent::Removed(name) => affected.extend(self.dependents(name)),
                ModelEvent::UnitAdded(name) | ModelEvent::UnitRemoved(name) => {
                    affected.extend(self.unit_dependents(name));
                }
                ModelEvent::UnitRenamed { old, new } => {
                    affected.extend(self.unit_dependents(old));
                    affected.extend(self.unit_dependents(new));
                }
            }
        }
        let mut seen = HashSet::new();
        affected.retain(|n| self.lookup(n).is_some() && seen.insert(n.clone()));
        for name in &affected {
            self.set_validation(name, ValidationInfo::default());
        }
        for name in &affected {
            self.validate_type(name);
        }
        log::debug!(
            "[ValidationService] {} event(s) revalidated {} type(s)",
            events.len(),
            affected.len()
        );
        affected.len()
    }

    /// Validate every type in the model, discarding queued events.
    pub fn validate_all(&mut self) {
        self.validation.drain();
        let names: Vec<String> = self.type_names().map(str::to_string).collect();
        for name in &names {
            self.set_validation(name, ValidationInfo::default());
        }
        for name in &names {
            self.validate_type(name);
        }
    }

    /// Lowest cached level across all types (`Valid` for an empty model).
    pub fn validation_level(&self) -> ValidationLevel {
        self.data_types
            .iter()
            .map(|t| t.validation.level())
            .chain(self.enums.iter().map(|t| t.validation.level()))
            .chain(self.structs.iter().map(|t| t.validation.level()))
            .min()
            .unwrap_or(ValidationLevel::Valid)
    }

    /// Monotone check of the cached model level; never fails.
    pub fn is_valid(&self, level: ValidationLevel) -> bool {
        self.validation_level() >= level
    }

    /// Cached validation info of one type.
    pub fn validation_info(&self, name: &str) -> Option<&ValidationInfo> {
        match self.lookup(name)? {
            TypeRef::Data(i) => Some(&self.data_types[i].validation),
            TypeRef::Enum(i) => Some(&self.enums[i].validation),
            TypeRef::Struct(i) => Some(&self.structs[i].validation),
        }
    }

    /// Every cached problem of the model.
    pub fn problems(&self) -> Vec<Problem> {
        self.data_types
            .iter()
            .flat_map(|t| t.validation.problems().iter())
            .chain(self.enums.iter().flat_map(|t| t.validation.problems().iter()))
            .chain(self.structs.iter().flat_map(|t| t.validation.problems().iter()))
            .cloned()
            .collect()
    }

    fn set_validation(&mut self, name: &str, info: ValidationInfo) {
        match self.lookup(name) {
            Some(TypeRef::Data(i)) => self.data_types[i].validation = info,
            Some(TypeRef::Enum(i)) => self.enums[i].validation = info,
            Some(TypeRef::Struct(i)) => self.structs[i].validation = info,
            None => {}
        }
    }

    /// Validate one type (and, first, any unvalidated type it references).
    fn validate_type(&mut self, name: &str) -> ValidationLevel {
        let mut visiting = Vec::new();
        self.validate_with(name, &mut visiting)
    }

    fn validate_with(&mut self, name: &str, visiting: &mut Vec<String>) -> ValidationLevel {
        if let Some(info) = self.validation_info(name) {
            if info.level() != ValidationLevel::Unknown {
                return info.level();
            }
        } else {
            // Predefined or unresolved: judged by the referencing type.
            return ValidationLevel::Valid;
        }
        if visiting.iter().any(|v| v == name) {
            // Cycle; reported by the struct's own recursion check.
            return ValidationLevel::Unknown;
        }
        visiting.push(name.to_string());
        let mut problems = self.own_problems(name);
        let recursive = problems.iter().any(|p| p.kind == ProblemKind::RecursiveType);
        if !recursive {
            for referenced in self.referenced_types(name) {
                if self.validate_with(&referenced, visiting) == ValidationLevel::Invalid {
                    problems.push(Problem::new(
                        ProblemKind::ReferencedTypeInvalid,
                        name,
                        format!("referenced type '{}' is invalid", referenced),
                    ));
                }
            }
        }
        visiting.pop();
        let info = ValidationInfo::from_problems(problems);
        let level = info.level();
        if level == ValidationLevel::Invalid {
            log::debug!(
                "[ValidationService] '{}' invalid: {}",
                name,
                info.problems()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            );
        }
        self.set_validation(name, info);
        level
    }

    /// Model types referenced directly by `name`.
    fn referenced_types(&self, name: &str) -> Vec<String> {
        let mut out: Vec<String> = match self.lookup(name) {
            Some(TypeRef::Enum(i)) => vec![self.enums[i].data_type.clone()],
            Some(TypeRef::Struct(i)) => self.structs[i]
                .elements()
                .iter()
                .map(|e| e.type_name.clone())
                .collect(),
            _ => Vec::new(),
        };
        let mut seen = HashSet::new();
        out.retain(|n| self.lookup(n).is_some() && seen.insert(n.clone()));
        out
    }

    fn own_problems(&self, name: &str) -> Vec<Problem> {
        match self.lookup(name) {
            Some(TypeRef::Data(i)) => {
                let dt = &self.data_types[i];
                let mut problems = Vec::new();
                if dt.bit_size == 0 {
                    problems.push(Problem::new(ProblemKind::InvalidSize, name, "bit size is 0"));
                }
                if let Some(a) = dt.alignment {
                    check_alignment(a, name, &mut problems);
                }
                if let Some(unit) = &dt.unit {
                    self.check_unit(unit, name, &mut problems);
                }
                problems
            }
            Some(TypeRef::Enum(i)) => {
                let en = &self.enums[i];
                let mut problems = Vec::new();
                let underlying_ok = match self.lookup(&en.data_type) {
                    Some(TypeRef::Data(_)) => true,
                    Some(_) => false,
                    None => predefined::scalar_type(&en.data_type).is_some(),
                };
                if !underlying_ok {
                    problems.push(Problem::new(
                        ProblemKind::EnumUnderlyingNotFound,
                        name,
                        format!("underlying data type '{}' not found", en.data_type),
                    ));
                }
                let mut names = HashSet::new();
                for v in &en.values {
                    if !names.insert(v.name.as_str()) {
                        problems.push(Problem::new(
                            ProblemKind::EnumDuplicateValueName,
                            format!("{}.{}", name, v.name),
                            "duplicate enum value name",
                        ));
                    }
                }
                problems
            }
            Some(TypeRef::Struct(i)) => self.struct_problems(&self.structs[i]),
            None => vec![Problem::new(ProblemKind::TypeNotFound, name, "type not found")],
        }
    }

    fn struct_problems(&self, st: &StructType) -> Vec<Problem> {
        let mut problems = Vec::new();
        if let Some(a) = st.alignment {
            check_alignment(a, &st.name, &mut problems);
        }
        if self.composition_reaches(&st.name, &st.name) {
            problems.push(Problem::new(
                ProblemKind::RecursiveType,
                &st.name,
                "struct contains itself",
            ));
        }
        for (index, element) in st.elements().iter().enumerate() {
            let path = format!("{}.{}", st.name, element.name);
            if !self.resolves(&element.type_name) {
                problems.push(Problem::new(
                    ProblemKind::TypeNotFound,
                    &path,
                    format!("type '{}' not found", element.type_name),
                ));
            }
            if let Some(a) = element.deserialized.alignment {
                check_alignment(a, &path, &mut problems);
            }
            if let Some(unit) = &element.unit {
                self.check_unit(unit, &path, &mut problems);
            }
            if let Some(bits) = element.serialized.num_bits {
                if let Some(native) = self.native_bits(&element.type_name) {
                    if bits > native {
                        problems.push(Problem::new(
                            ProblemKind::BitWidthTooLarge,
                            &path,
                            format!("{} bits exceed the native {} bits", bits, native),
                        ));
                    }
                }
            }
            if let ArraySize::Dynamic(count) = &element.array_size {
                self.check_dynamic_count(st, index, count, &path, &mut problems);
            }
        }
        problems
    }

    fn check_dynamic_count(
        &self,
        st: &StructType,
        index: usize,
        count: &str,
        path: &str,
        problems: &mut Vec<Problem>,
    ) {
        let Some(count_index) = st.element_index(count) else {
            problems.push(Problem::new(
                ProblemKind::DynamicArraySizeNotFound,
                path,
                format!("array size element '{}' not found", count),
            ));
            return;
        };
        if count_index >= index {
            problems.push(Problem::new(
                ProblemKind::DynamicArraySizeNotBefore,
                path,
                format!("array size element '{}' does not precede it", count),
            ));
        }
        let counter = &st.elements()[count_index];
        if counter.array_size.is_array() {
            problems.push(Problem::new(
                ProblemKind::DynamicArraySizeNotScalar,
                path,
                format!("array size element '{}' is an array", count),
            ));
        }
        if !self.is_integral(&counter.type_name) {
            problems.push(Problem::new(
                ProblemKind::DynamicArraySizeNotIntegral,
                path,
                format!("array size element '{}' is not integral", count),
            ));
        }
    }

    /// Whether following struct/enum composition from `from` reaches `target`.
    pub(crate) fn composition_reaches(&self, from: &str, target: &str) -> bool {
        let mut seen: HashSet<String> = HashSet::new();
        let mut stack = self.referenced_types(from);
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if seen.insert(current.clone()) {
                stack.extend(self.referenced_types(&current));
            }
        }
        false
    }

    fn check_unit(&self, unit: &str, owner: &str, problems: &mut Vec<Problem>) {
        if self.unit(unit).is_none() && !predefined::is_base_unit(unit) {
            problems.push(Problem::new(
                ProblemKind::UnitNotFound,
                owner,
                format!("unit '{}' not found", unit),
            ));
        }
    }

    fn native_bits(&self, type_name: &str) -> Option<usize> {
        match self.lookup(type_name) {
            Some(TypeRef::Data(i)) => Some(self.data_types[i].bit_size),
            Some(TypeRef::Enum(i)) => self.native_bits(&self.enums[i].data_type),
            Some(TypeRef::Struct(_)) => None,
            None => predefined::scalar_type(type_name).map(|t| t.bit_size()),
        }
    }

    fn is_integral(&self, type_name: &str) -> bool {
        match self.lookup(type_name) {
            Some(TypeRef::Data(_)) => true,
            Some(TypeRef::Enum(i)) => self.is_integral(&self.enums[i].data_type),
            Some(TypeRef::Struct(_)) => false,
            None => predefined::scalar_type(type_name).is_some_and(|t| t.is_integer()),
        }
    }
}

fn check_alignment(alignment: usize, owner: &str, problems: &mut Vec<Problem>) {
    if alignment == 0 || !alignment.is_power_of_two() {
        problems.push(Problem::new(
            ProblemKind::InvalidAlignment,
            owner,
            format!("alignment {} is not a power of two", alignment),
        ));
    }
}
