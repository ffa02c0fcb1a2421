//! Workflow container and builder.
//!
//! A [`Workflow`] owns every named module, data node, and processor of one
//! pipeline, plus the ordered start-module list. It is produced either by
//! the [`WorkflowBuilder`] fluent API or by the
//! [`Resolver`](crate::resolver::Resolver) from a definition document, and
//! is consumed by [`run`](Workflow::run): the completion bookkeeping is not
//! resettable, so one workflow value backs exactly one run.
//!
//! The builder is where topology freezes. It validates every cross-reference
//! (module to processor, module to data, start name to module) and wires the
//! data nodes' downstream lists before anything is wrapped in an `Arc`, so
//! construction-time failures are descriptive [`BuildError`]s and the built
//! graph is immutable.

use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::data::{Artifact, DataNode};
use crate::module::Module;
use crate::processor::Processor;
use crate::runtimes::{RunError, RunReport, RuntimeConfig, WorkflowRunner};
use crate::types::DEFAULT_CHECK_INTERVAL;

/// Declarative description of one module, consumed by the builder.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use sluice::workflow::ModuleSpec;
///
/// let spec = ModuleSpec::new("transcode", "ffmpeg")
///     .with_inputs(["raw"])
///     .with_outputs(["encoded"])
///     .with_check_interval(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    name: String,
    processor: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    check_interval: Duration,
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>, processor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            processor: processor.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Input data-node names, in order.
    #[must_use]
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Output data-node names, in order.
    #[must_use]
    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    /// Override the interval between input re-checks for this module.
    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }
}

/// Fluent builder for a [`Workflow`].
///
/// Adds are infallible; all validation happens in [`build`](Self::build) so
/// chains stay uncluttered. Names must be unique per kind (module, data,
/// processor namespaces are independent).
#[derive(Default)]
pub struct WorkflowBuilder {
    datas: Vec<DataNode>,
    processors: Vec<Arc<dyn Processor>>,
    modules: Vec<ModuleSpec>,
    start: Vec<String>,
}

impl WorkflowBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named artifact as a data node.
    #[must_use]
    pub fn add_data(mut self, name: impl Into<String>, artifact: impl Artifact + 'static) -> Self {
        self.datas.push(DataNode::new(name, artifact));
        self
    }

    /// Register a pre-built data node (resolver path).
    #[must_use]
    pub fn add_data_node(mut self, node: DataNode) -> Self {
        self.datas.push(node);
        self
    }

    /// Register a processor under its own name.
    #[must_use]
    pub fn add_processor(self, processor: impl Processor + 'static) -> Self {
        self.add_shared_processor(Arc::new(processor))
    }

    /// Register an already-shared processor (resolver path).
    #[must_use]
    pub fn add_shared_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Register a module description.
    #[must_use]
    pub fn add_module(mut self, spec: ModuleSpec) -> Self {
        self.modules.push(spec);
        self
    }

    /// Append a module name to the ordered start set.
    #[must_use]
    pub fn add_start_module(mut self, name: impl Into<String>) -> Self {
        self.start.push(name.into());
        self
    }

    /// Validate every cross-reference, wire downstream lists, and freeze
    /// the graph.
    pub fn build(self) -> Result<Workflow, BuildError> {
        let mut datas: FxHashMap<String, DataNode> = FxHashMap::default();
        for node in self.datas {
            let name = node.name().to_string();
            if datas.insert(name.clone(), node).is_some() {
                return Err(BuildError::DuplicateData { name });
            }
        }

        let mut processors: FxHashMap<String, Arc<dyn Processor>> = FxHashMap::default();
        for processor in self.processors {
            let name = processor.name().to_string();
            if processors.insert(name.clone(), processor).is_some() {
                return Err(BuildError::DuplicateProcessor { name });
            }
        }

        // First pass: validate references and wire each input's downstream
        // list while the data nodes are still mutable.
        let mut seen_modules: FxHashSet<&str> = FxHashSet::default();
        let mut resolved_processors: Vec<Arc<dyn Processor>> = Vec::with_capacity(self.modules.len());
        for spec in &self.modules {
            if !seen_modules.insert(spec.name.as_str()) {
                return Err(BuildError::DuplicateModule {
                    name: spec.name.clone(),
                });
            }
            let processor = processors.get(&spec.processor).cloned().ok_or_else(|| {
                BuildError::UnresolvedProcessor {
                    module: spec.name.clone(),
                    processor: spec.processor.clone(),
                }
            })?;
            resolved_processors.push(processor);
            for data_name in spec.inputs.iter().chain(spec.outputs.iter()) {
                if !datas.contains_key(data_name) {
                    return Err(BuildError::UnresolvedData {
                        module: spec.name.clone(),
                        data: data_name.clone(),
                    });
                }
            }
            for input in &spec.inputs {
                if let Some(node) = datas.get_mut(input) {
                    node.add_downstream(&spec.name);
                }
            }
        }

        // Topology is complete; freeze the data nodes.
        let datas: FxHashMap<String, Arc<DataNode>> = datas
            .into_iter()
            .map(|(name, node)| (name, Arc::new(node)))
            .collect();

        // Second pass: materialize the modules against the frozen graph.
        let mut modules: FxHashMap<String, Arc<Module>> = FxHashMap::default();
        for (spec, processor) in self.modules.iter().zip(resolved_processors) {
            let resolve = |names: &[String]| -> Vec<Arc<DataNode>> {
                names
                    .iter()
                    .filter_map(|n| datas.get(n).cloned())
                    .collect()
            };
            let module = Module::new(
                spec.name.clone(),
                processor,
                resolve(&spec.inputs),
                resolve(&spec.outputs),
                spec.check_interval,
            );
            modules.insert(spec.name.clone(), Arc::new(module));
        }

        let mut start = Vec::with_capacity(self.start.len());
        for name in &self.start {
            match modules.get(name) {
                Some(module) => start.push(Arc::clone(module)),
                None => {
                    return Err(BuildError::UnknownStartModule { name: name.clone() });
                }
            }
        }

        Ok(Workflow {
            modules,
            datas,
            processors,
            start,
        })
    }
}

/// Construction-time validation errors. All of them fail fast, before any
/// worker is spawned.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("duplicate data node `{name}`")]
    #[diagnostic(code(sluice::build::duplicate_data))]
    DuplicateData { name: String },

    #[error("duplicate processor `{name}`")]
    #[diagnostic(code(sluice::build::duplicate_processor))]
    DuplicateProcessor { name: String },

    #[error("duplicate module `{name}`")]
    #[diagnostic(code(sluice::build::duplicate_module))]
    DuplicateModule { name: String },

    #[error("module `{module}` references undeclared processor `{processor}`")]
    #[diagnostic(
        code(sluice::build::unresolved_processor),
        help("Declare the processor in the builder (or the `processors` section) before building.")
    )]
    UnresolvedProcessor { module: String, processor: String },

    #[error("module `{module}` references undeclared data node `{data}`")]
    #[diagnostic(
        code(sluice::build::unresolved_data),
        help("Declare the data node in the builder (or the `datas` section) before building.")
    )]
    UnresolvedData { module: String, data: String },

    #[error("start module `{name}` is not declared")]
    #[diagnostic(code(sluice::build::unknown_start_module))]
    UnknownStartModule { name: String },
}

/// The graph container: every named node of one pipeline, topology frozen.
///
/// # Examples
///
/// ```rust,no_run
/// use sluice::data::FileArtifact;
/// use sluice::processor::CommandProcessor;
/// use sluice::workflow::{ModuleSpec, Workflow};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let workflow = Workflow::builder()
///     .add_data("greeting", FileArtifact::new("/tmp/greeting.txt"))
///     .add_processor(CommandProcessor::new("hello", "echo hello > /tmp/greeting.txt"))
///     .add_module(ModuleSpec::new("produce", "hello").with_outputs(["greeting"]))
///     .add_start_module("produce")
///     .build()?;
///
/// let report = workflow.run().await?;
/// assert_eq!(report.modules_finished, 1);
/// # Ok(())
/// # }
/// ```
pub struct Workflow {
    modules: FxHashMap<String, Arc<Module>>,
    datas: FxHashMap<String, Arc<DataNode>>,
    processors: FxHashMap<String, Arc<dyn Processor>>,
    start: Vec<Arc<Module>>,
}

impl Workflow {
    #[must_use]
    pub fn builder() -> WorkflowBuilder {
        WorkflowBuilder::new()
    }

    pub fn module(&self, name: &str) -> Option<&Arc<Module>> {
        self.modules.get(name)
    }

    pub fn data(&self, name: &str) -> Option<&Arc<DataNode>> {
        self.datas.get(name)
    }

    pub fn processor(&self, name: &str) -> Option<&Arc<dyn Processor>> {
        self.processors.get(name)
    }

    pub fn modules(&self) -> &FxHashMap<String, Arc<Module>> {
        &self.modules
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn data_count(&self) -> usize {
        self.datas.len()
    }

    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// The designated start modules, in declaration order.
    pub fn start_modules(&self) -> &[Arc<Module>] {
        &self.start
    }

    /// Run to completion with default runtime configuration.
    ///
    /// Consumes the workflow: completion bookkeeping is single-use.
    pub async fn run(self) -> Result<RunReport, RunError> {
        self.run_with(RuntimeConfig::default()).await
    }

    /// Run to completion with an explicit [`RuntimeConfig`].
    pub async fn run_with(self, config: RuntimeConfig) -> Result<RunReport, RunError> {
        WorkflowRunner::new(self, config).run().await
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("modules", &self.modules.len())
            .field("datas", &self.datas.len())
            .field("processors", &self.processors.len())
            .field(
                "start",
                &self.start.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
