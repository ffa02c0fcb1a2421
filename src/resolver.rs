//! Resolver: from a declarative definition document to a built [`Workflow`].
//!
//! The definition is a four-section JSON document (`datas`, `processors`,
//! `modules`, `startNodes`). The resolver constructs every node through the
//! [`TypeRegistry`](crate::registry::TypeRegistry) and delegates reference
//! validation to the workflow builder, so every failure mode is a
//! descriptive construction-time error: an unknown type tag, a missing
//! processor `type`, malformed type-specific fields, or an unresolved name.
//!
//! ```json
//! {
//!   "datas": {
//!     "o1": { "path": "out/one.txt" }
//!   },
//!   "processors": {
//!     "p1": { "type": "command", "command": "echo one > out/one.txt" }
//!   },
//!   "modules": {
//!     "a": { "processor": "p1", "outputs": ["o1"] }
//!   },
//!   "startNodes": ["a"]
//! }
//! ```
//!
//! Data entries default their `type` to `"file"`. Processor entries must
//! name a `type` explicitly; there is deliberately no fallback.

use std::time::Duration;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::data::DataNode;
use crate::registry::{DEFAULT_DATA_TYPE, Params, TypeRegistry};
use crate::types::DEFAULT_CHECK_INTERVAL;
use crate::workflow::{BuildError, ModuleSpec, Workflow};

/// A data entry: optional type tag plus type-specific fields.
#[derive(Debug, Clone, Deserialize)]
pub struct DataDef {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub params: Params,
}

/// A processor entry: mandatory type tag plus type-specific fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorDef {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub params: Params,
}

/// A module entry: processor reference, data references, optional re-check
/// interval in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDef {
    pub processor: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub check_interval: Option<u64>,
}

/// The four-section workflow definition document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowDef {
    #[serde(default)]
    pub datas: FxHashMap<String, DataDef>,
    #[serde(default)]
    pub processors: FxHashMap<String, ProcessorDef>,
    #[serde(default)]
    pub modules: FxHashMap<String, ModuleDef>,
    #[serde(default, rename = "startNodes")]
    pub start_nodes: Vec<String>,
}

impl WorkflowDef {
    /// Parse a definition from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, ResolveError> {
        serde_json::from_str(json).map_err(ResolveError::Parse)
    }
}

/// Translates a [`WorkflowDef`] into a built [`Workflow`].
///
/// # Examples
///
/// ```rust
/// use sluice::resolver::{Resolver, WorkflowDef};
///
/// let def = WorkflowDef::from_json(
///     r#"{
///         "datas": { "out": { "path": "/tmp/out.txt" } },
///         "processors": { "touch": { "type": "command", "command": "touch /tmp/out.txt" } },
///         "modules": { "a": { "processor": "touch", "outputs": ["out"] } },
///         "startNodes": ["a"]
///     }"#,
/// )
/// .unwrap();
///
/// let workflow = Resolver::default().resolve(&def).unwrap();
/// assert_eq!(workflow.module_count(), 1);
/// assert!(workflow.data("out").is_some());
/// ```
#[derive(Debug)]
pub struct Resolver {
    registry: TypeRegistry,
}

impl Resolver {
    /// Resolver over a custom registry (extended or stripped-down types).
    #[must_use]
    pub fn new(registry: TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Construct every node and build the workflow.
    pub fn resolve(&self, def: &WorkflowDef) -> Result<Workflow, ResolveError> {
        let mut builder = Workflow::builder();

        for (name, data) in &def.datas {
            let tag = data.kind.as_deref().unwrap_or(DEFAULT_DATA_TYPE);
            let artifact = self.registry.build_artifact(tag, name, &data.params)?;
            builder = builder.add_data_node(DataNode::from_boxed(name.clone(), artifact));
        }

        for (name, processor) in &def.processors {
            let tag = processor
                .kind
                .as_deref()
                .ok_or_else(|| ResolveError::MissingProcessorType { name: name.clone() })?;
            let processor = self.registry.build_processor(tag, name, &processor.params)?;
            builder = builder.add_shared_processor(processor);
        }

        for (name, module) in &def.modules {
            let check_interval = module
                .check_interval
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CHECK_INTERVAL);
            builder = builder.add_module(
                ModuleSpec::new(name.clone(), module.processor.clone())
                    .with_inputs(module.inputs.iter().cloned())
                    .with_outputs(module.outputs.iter().cloned())
                    .with_check_interval(check_interval),
            );
        }

        for name in &def.start_nodes {
            builder = builder.add_start_module(name.clone());
        }

        Ok(builder.build()?)
    }

    /// Parse and resolve in one step.
    pub fn resolve_json(&self, json: &str) -> Result<Workflow, ResolveError> {
        self.resolve(&WorkflowDef::from_json(json)?)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(TypeRegistry::with_builtins())
    }
}

/// Errors from translating a definition into a workflow. All surface
/// synchronously from the resolve step, before any worker exists.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// A data entry's type tag has no registered implementation.
    #[error("unknown data type `{tag}` for data node `{name}`")]
    #[diagnostic(
        code(sluice::resolve::unknown_data_type),
        help("Register the type on the TypeRegistry, or fix the `type` tag.")
    )]
    UnknownDataType { tag: String, name: String },

    /// A processor entry's type tag has no registered implementation.
    #[error("unknown processor type `{tag}` for processor `{name}`")]
    #[diagnostic(
        code(sluice::resolve::unknown_processor_type),
        help("Register the type on the TypeRegistry, or fix the `type` tag.")
    )]
    UnknownProcessorType { tag: String, name: String },

    /// A processor entry omitted its mandatory `type` tag.
    #[error("processor `{name}` has no `type` tag")]
    #[diagnostic(
        code(sluice::resolve::missing_processor_type),
        help("Processor entries must name their type explicitly, e.g. \"type\": \"command\".")
    )]
    MissingProcessorType { name: String },

    /// Type-specific fields of an entry did not deserialize.
    #[error("invalid parameters for `{name}`")]
    #[diagnostic(code(sluice::resolve::invalid_params))]
    InvalidParams {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The document is not valid JSON (or not the expected shape).
    #[error("workflow definition is not valid JSON")]
    #[diagnostic(code(sluice::resolve::parse))]
    Parse(#[source] serde_json::Error),

    /// Cross-reference validation failed in the workflow builder.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] BuildError),
}
