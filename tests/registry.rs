//! Tests for the type registry.

mod common;

use serde_json::json;
use sluice::data::Artifact;
use sluice::processor::Processor;
use sluice::registry::{Params, TypeRegistry};
use sluice::resolver::ResolveError;

use common::*;

fn params(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn builtins_are_installed() {
    let registry = TypeRegistry::with_builtins();
    assert!(registry.has_artifact_type("file"));
    assert!(registry.has_processor_type("command"));
    assert!(registry.has_processor_type("noop"));
    assert!(!registry.has_artifact_type("s3"));
}

#[test]
fn empty_registry_knows_nothing() {
    let registry = TypeRegistry::empty();
    assert!(!registry.has_artifact_type("file"));
    let err = registry
        .build_artifact("file", "d", &Params::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::UnknownDataType { tag, name } if tag == "file" && name == "d"
    ));
}

#[test]
fn file_artifact_checks_the_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("present.txt");
    std::fs::write(&path, "x").unwrap();

    let registry = TypeRegistry::with_builtins();
    let present = registry
        .build_artifact("file", "d", &params(json!({ "path": path })))
        .unwrap();
    assert!(present.exists());

    let absent = registry
        .build_artifact(
            "file",
            "d",
            &params(json!({ "path": dir.path().join("absent.txt") })),
        )
        .unwrap();
    assert!(!absent.exists());
}

#[test]
fn file_artifact_without_path_is_invalid_params() {
    let registry = TypeRegistry::with_builtins();
    let err = registry
        .build_artifact("file", "d", &Params::default())
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidParams { name, .. } if name == "d"));
}

#[tokio::test]
async fn command_list_is_chained_into_one_invocation() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");

    let registry = TypeRegistry::with_builtins();
    let processor = registry
        .build_processor(
            "command",
            "pa",
            &params(json!({
                "command": [
                    format!("echo one > {}", out.display()),
                    format!("echo two >> {}", out.display()),
                ]
            })),
        )
        .unwrap();
    processor.run().await.unwrap();
    assert_file_content(&out, "one\ntwo\n");
}

#[test]
fn custom_artifact_type_can_be_registered() {
    let mut registry = TypeRegistry::with_builtins();
    registry.register_artifact("always", |_name, _params| Ok(Box::new(PresentArtifact)));
    let artifact = registry
        .build_artifact("always", "d", &Params::default())
        .unwrap();
    assert!(artifact.exists());
}
