//! Tests for the workflow builder: round-trips, downstream wiring, and the
//! construction-time error taxonomy.

mod common;

use sluice::processor::{NoopProcessor, Processor};
use sluice::workflow::{BuildError, ModuleSpec, Workflow};

use common::*;

#[test]
fn builder_round_trip_is_addressable_by_name() {
    let workflow = Workflow::builder()
        .add_data("d1", PresentArtifact)
        .add_data("d2", PresentArtifact)
        .add_processor(NoopProcessor::new("p1"))
        .add_processor(NoopProcessor::new("p2"))
        .add_module(ModuleSpec::new("a", "p1").with_outputs(["d1"]))
        .add_module(
            ModuleSpec::new("b", "p2")
                .with_inputs(["d1"])
                .with_outputs(["d2"]),
        )
        .add_start_module("a")
        .build()
        .unwrap();

    assert_eq!(workflow.module_count(), 2);
    assert_eq!(workflow.data_count(), 2);
    assert_eq!(workflow.processor_count(), 2);
    assert!(workflow.module("a").is_some());
    assert!(workflow.module("b").is_some());
    assert!(workflow.data("d1").is_some());
    assert!(workflow.processor("p2").is_some());
    assert!(workflow.module("missing").is_none());

    let start: Vec<_> = workflow
        .start_modules()
        .iter()
        .map(|m| m.name().to_string())
        .collect();
    assert_eq!(start, vec!["a".to_string()]);
}

#[test]
fn downstream_lists_record_consumers_in_declaration_order() {
    let workflow = Workflow::builder()
        .add_data("seed", PresentArtifact)
        .add_processor(NoopProcessor::new("p"))
        .add_module(ModuleSpec::new("first", "p").with_inputs(["seed"]))
        .add_module(ModuleSpec::new("second", "p").with_inputs(["seed"]))
        .add_start_module("first")
        .build()
        .unwrap();

    let seed = workflow.data("seed").unwrap();
    assert_eq!(
        seed.downstream(),
        ["first".to_string(), "second".to_string()]
    );
}

#[test]
fn module_wiring_resolves_inputs_and_outputs() {
    let workflow = Workflow::builder()
        .add_data("in", PresentArtifact)
        .add_data("out", PresentArtifact)
        .add_processor(NoopProcessor::new("p"))
        .add_module(
            ModuleSpec::new("m", "p")
                .with_inputs(["in"])
                .with_outputs(["out"]),
        )
        .add_start_module("m")
        .build()
        .unwrap();

    let module = workflow.module("m").unwrap();
    let inputs: Vec<_> = module.inputs().iter().map(|d| d.name()).collect();
    let outputs: Vec<_> = module.outputs().iter().map(|d| d.name()).collect();
    assert_eq!(inputs, ["in"]);
    assert_eq!(outputs, ["out"]);
    assert_eq!(module.processor().name(), "p");
}

#[test]
fn undeclared_processor_is_a_build_error() {
    let result = Workflow::builder()
        .add_module(ModuleSpec::new("m", "ghost"))
        .build();
    match result {
        Err(BuildError::UnresolvedProcessor { module, processor }) => {
            assert_eq!(module, "m");
            assert_eq!(processor, "ghost");
        }
        other => panic!("expected UnresolvedProcessor, got {other:?}"),
    }
}

#[test]
fn undeclared_data_is_a_build_error() {
    let result = Workflow::builder()
        .add_processor(NoopProcessor::new("p"))
        .add_module(ModuleSpec::new("m", "p").with_inputs(["ghost"]))
        .build();
    match result {
        Err(BuildError::UnresolvedData { module, data }) => {
            assert_eq!(module, "m");
            assert_eq!(data, "ghost");
        }
        other => panic!("expected UnresolvedData, got {other:?}"),
    }
}

#[test]
fn unknown_start_module_is_a_build_error() {
    let result = Workflow::builder()
        .add_processor(NoopProcessor::new("p"))
        .add_module(ModuleSpec::new("m", "p"))
        .add_start_module("ghost")
        .build();
    match result {
        Err(BuildError::UnknownStartModule { name }) => assert_eq!(name, "ghost"),
        other => panic!("expected UnknownStartModule, got {other:?}"),
    }
}

#[test]
fn duplicate_names_are_build_errors() {
    let result = Workflow::builder()
        .add_data("d", PresentArtifact)
        .add_data("d", PresentArtifact)
        .build();
    assert!(matches!(result, Err(BuildError::DuplicateData { name }) if name == "d"));

    let result = Workflow::builder()
        .add_processor(NoopProcessor::new("p"))
        .add_processor(NoopProcessor::new("p"))
        .build();
    assert!(matches!(result, Err(BuildError::DuplicateProcessor { name }) if name == "p"));

    let result = Workflow::builder()
        .add_processor(NoopProcessor::new("p"))
        .add_module(ModuleSpec::new("m", "p"))
        .add_module(ModuleSpec::new("m", "p"))
        .build();
    assert!(matches!(result, Err(BuildError::DuplicateModule { name }) if name == "m"));
}
