//! Module nodes and the readiness/execution state machine.
//!
//! A [`Module`] is a named unit of work: declared input and output data
//! nodes, exactly one processor, and a per-module re-check interval. One
//! [`attempt`](Module::attempt) either reports missing inputs (soft, the
//! scheduler re-enqueues later) or runs the processor to completion (any
//! processor error is fatal to the run).
//!
//! All cross-worker mutable state on a module is atomic: the dispatch guard
//! (prevents duplicate enqueue when several upstream completions race), the
//! attempt counter (drives the configurable retry bound), and the state tag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::data::DataNode;
use crate::processor::{Processor, ProcessorError};
use crate::types::ModuleState;

/// Outcome of one readiness-and-execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// All inputs existed, the processor ran and returned normally.
    Completed,
    /// At least one input is missing; the processor was not invoked.
    NotReady {
        /// Names of the missing input data nodes, in declaration order.
        missing: Vec<String>,
    },
}

/// A named unit of work in the dependency graph.
///
/// Constructed by the [`WorkflowBuilder`](crate::workflow::WorkflowBuilder)
/// (directly or through the resolver) and shared with the worker pool via
/// `Arc`. Topology is frozen at construction; everything mutable afterwards
/// is atomic.
pub struct Module {
    name: String,
    processor: Arc<dyn Processor>,
    inputs: Vec<Arc<DataNode>>,
    outputs: Vec<Arc<DataNode>>,
    check_interval: Duration,
    dispatched: AtomicBool,
    attempts: AtomicU32,
    state: AtomicU8,
}

impl Module {
    pub(crate) fn new(
        name: String,
        processor: Arc<dyn Processor>,
        inputs: Vec<Arc<DataNode>>,
        outputs: Vec<Arc<DataNode>>,
        check_interval: Duration,
    ) -> Self {
        Self {
            name,
            processor,
            inputs,
            outputs,
            check_interval,
            dispatched: AtomicBool::new(false),
            attempts: AtomicU32::new(0),
            state: AtomicU8::new(ModuleState::NotReady as u8),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processor(&self) -> &Arc<dyn Processor> {
        &self.processor
    }

    pub fn inputs(&self) -> &[Arc<DataNode>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Arc<DataNode>] {
        &self.outputs
    }

    /// Interval the scheduler waits before re-checking missing inputs.
    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    /// Current state of the module's execution state machine.
    pub fn state(&self) -> ModuleState {
        ModuleState::from_tag(self.state.load(Ordering::Acquire))
    }

    /// Number of readiness attempts that found inputs missing.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }

    /// Claim the dispatch guard.
    ///
    /// Returns `true` exactly once per module: the single atomic swap is
    /// what guarantees a fan-in module reachable from several
    /// independently-completing upstream modules is enqueued once, never N
    /// times. Callers must only enqueue when this returns `true`.
    pub fn claim_dispatch(&self) -> bool {
        !self.dispatched.swap(true, Ordering::AcqRel)
    }

    /// Whether the dispatch guard has been claimed.
    pub fn is_dispatched(&self) -> bool {
        self.dispatched.load(Ordering::Acquire)
    }

    /// Record one not-ready attempt, returning the new total.
    pub(crate) fn note_not_ready(&self) -> u32 {
        self.attempts.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn set_state(&self, state: ModuleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// One readiness-and-execution attempt.
    ///
    /// Checks every declared input's existence first. If any is missing the
    /// attempt is soft: [`Attempt::NotReady`] names the absent inputs and
    /// the processor is not invoked, so a module never partially executes.
    /// With all inputs present the processor runs exactly once; an error
    /// from it is wrapped with the module and processor names and aborts
    /// the run. A module with no declared inputs is ready immediately.
    pub async fn attempt(&self) -> Result<Attempt, ModuleError> {
        let missing: Vec<String> = self
            .inputs
            .iter()
            .filter(|input| !input.exists())
            .map(|input| input.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Ok(Attempt::NotReady { missing });
        }

        self.set_state(ModuleState::Running);
        self.processor
            .run()
            .await
            .map_err(|source| ModuleError::Processor {
                module: self.name.clone(),
                processor: self.processor.name().to_string(),
                source,
            })?;
        self.set_state(ModuleState::Succeeded);
        Ok(Attempt::Completed)
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("processor", &self.processor.name())
            .field("inputs", &self.inputs.iter().map(|d| d.name()).collect::<Vec<_>>())
            .field("outputs", &self.outputs.iter().map(|d| d.name()).collect::<Vec<_>>())
            .field("check_interval", &self.check_interval)
            .field("state", &self.state())
            .finish()
    }
}

/// Fatal errors from module execution.
#[derive(Debug, Error, Diagnostic)]
pub enum ModuleError {
    /// The module's processor failed; the run is aborted.
    #[error("module `{module}`: processor `{processor}` failed")]
    #[diagnostic(code(sluice::module::processor))]
    Processor {
        module: String,
        processor: String,
        #[source]
        source: ProcessorError,
    },
}
