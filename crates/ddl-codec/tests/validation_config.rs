// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event-driven revalidation and TOML configuration.

use ddl_codec::codec::{CodecFactory, Representation};
use ddl_codec::layout::LayoutUpdate;
use ddl_codec::model::{DataType, StructBuilder, TypeModel};
use ddl_codec::validation::{ModelEvent, ProblemKind, ValidationLevel};
use ddl_codec::{CodecConfig, CodecError, ConfigError};
use std::io::Write;

fn model() -> TypeModel {
    let mut m = TypeModel::new();
    m.add_data_type(DataType::new("tSpeed", 16).with_unit("Knot"))
        .unwrap();
    m.add_struct_type(
        StructBuilder::new("Track")
            .field("speed", "tSpeed")
            .field("heading", "tFloat32")
            .build()
            .unwrap(),
    )
    .unwrap();
    m.add_struct_type(StructBuilder::new("Report").field("track", "Track").build().unwrap())
        .unwrap();
    m
}

#[test]
fn test_rename_revalidates_dependents() {
    let mut m = model();
    m.validate_all();
    // Unknown unit is informational only.
    assert_eq!(m.validation_level(), ValidationLevel::GoodEnough);
    assert!(CodecFactory::new(&mut m, "Report").unwrap().is_valid());

    m.rename_type("tSpeed", "tVelocity").unwrap();
    assert!(matches!(m.pending_events(), [ModelEvent::Renamed { .. }]));
    assert!(m.revalidate() >= 3);
    assert!(m.pending_events().is_empty());

    let track = m.validation_info("Track").unwrap();
    assert_eq!(track.level(), ValidationLevel::Invalid);
    assert!(track.problems().iter().any(|p| p.kind == ProblemKind::TypeNotFound));
    let report = m.validation_info("Report").unwrap();
    assert!(report
        .problems()
        .iter()
        .any(|p| p.kind == ProblemKind::ReferencedTypeInvalid));

    let factory = CodecFactory::new(&mut m, "Report").unwrap();
    assert!(!factory.is_valid());
    assert_eq!(factory.validation_level(), ValidationLevel::Invalid);

    m.rename_type("tVelocity", "tSpeed").unwrap();
    m.revalidate();
    assert_eq!(m.validation_level(), ValidationLevel::GoodEnough);
}

#[test]
fn test_removed_type_invalidates_users() {
    let mut m = model();
    m.validate_all();
    m.remove_type("Track").unwrap();
    m.revalidate();
    assert!(!m.is_valid(ValidationLevel::GoodEnough));
    assert!(m
        .problems()
        .iter()
        .any(|p| p.kind == ProblemKind::TypeNotFound && p.name.contains("Report")));
}

#[test]
fn test_factory_rejects_bad_names() {
    let mut m = model();
    assert!(matches!(CodecFactory::new(&mut m, ""), Err(CodecError::InvalidSchema(_))));
    assert!(matches!(CodecFactory::new(&mut m, "Missing"), Err(CodecError::NotFound(_))));
    assert!(matches!(CodecFactory::new(&mut m, "tSpeed"), Err(CodecError::NotFound(_))));
}

#[test]
fn test_config_file_drives_layout() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
default_version = "2.0"
layout_update = "append"
leaf_fast_path = false
strict_static_size = false
"#
    )
    .unwrap();
    let config = CodecConfig::from_file(file.path()).unwrap();
    assert_eq!(config.layout_update, LayoutUpdate::Append);
    assert!(config.reset_zero_unset);

    let mut m = TypeModel::new();
    m.add_struct_type(
        StructBuilder::new("S")
            .field("a", "tInt32")
            .field("b", "tInt8")
            .build()
            .unwrap(),
    )
    .unwrap();
    let latest = CodecFactory::new(&mut m, "S").unwrap();
    assert_eq!(latest.static_size(Representation::Deserialized), Some(8));
    assert!(latest.leaf_table(Representation::Deserialized).is_some());

    let legacy = CodecFactory::with_config(&mut m, "S", config).unwrap();
    assert_eq!(m.layout_update(), LayoutUpdate::Append);
    assert_eq!(legacy.static_size(Representation::Deserialized), Some(5));
    assert!(legacy.leaf_table(Representation::Deserialized).is_none());
    let buf = [0u8; 8];
    assert!(legacy.static_decoder(&buf, Representation::Deserialized).unwrap().is_valid());
}

#[test]
fn test_invalid_config() {
    let err = CodecConfig::from_toml_str("default_version = \"banana\"").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(matches!(
        CodecConfig::from_toml_str("leaf_fast_path = 3"),
        Err(ConfigError::Toml(_))
    ));
    assert!(matches!(
        CodecConfig::from_file("/nonexistent/ddl-codec.toml"),
        Err(ConfigError::Io(_))
    ));

    let mut m = model();
    let config = CodecConfig {
        default_version: "x.y".into(),
        ..CodecConfig::default()
    };
    assert!(matches!(
        CodecFactory::with_config(&mut m, "Track", config),
        Err(CodecError::InvalidSchema(_))
    ));
}
