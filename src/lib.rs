//! # Sluice: Artifact-Gated Batch Pipeline Engine
//!
//! Sluice executes a declared dependency graph of work units ("modules") and
//! artifacts ("data nodes") on a fixed pool of concurrent workers. A module
//! is ready when every data node it declares as input exists; ready modules
//! are drained from a shared dispatch queue, and each success dispatches the
//! downstream modules its outputs feed. The run completes when every module
//! has finished, or aborts on the first fatal error.
//!
//! ## Core Concepts
//!
//! - **Data nodes**: Named artifacts with a pluggable existence check
//! - **Modules**: Named units of work with declared inputs, outputs, and one processor
//! - **Processors**: The executable behavior bound to a module (no-op, shell command)
//! - **Workflow**: The graph container, built fluently or resolved from JSON
//! - **Runner**: The worker pool draining the dispatch queue until completion
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sluice::data::FileArtifact;
//! use sluice::processor::CommandProcessor;
//! use sluice::workflow::{ModuleSpec, Workflow};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let workflow = Workflow::builder()
//!     .add_data("raw", FileArtifact::new("work/raw.csv"))
//!     .add_data("clean", FileArtifact::new("work/clean.csv"))
//!     .add_processor(CommandProcessor::new("fetch", "cp /srv/export.csv work/raw.csv"))
//!     .add_processor(CommandProcessor::new("scrub", "grep -v '^#' work/raw.csv > work/clean.csv"))
//!     .add_module(ModuleSpec::new("ingest", "fetch").with_outputs(["raw"]))
//!     .add_module(
//!         ModuleSpec::new("cleanse", "scrub")
//!             .with_inputs(["raw"])
//!             .with_outputs(["clean"]),
//!     )
//!     .add_start_module("ingest")
//!     .build()?;
//!
//! let report = workflow.run().await?;
//! println!("finished {} modules in {:?}", report.modules_finished, report.elapsed);
//! # Ok(())
//! # }
//! ```
//!
//! The same pipeline as a definition document goes through the resolver
//! instead; see [`resolver::Resolver`].
//!
//! ## Execution Model
//!
//! Workers are tokio tasks sharing one flume queue. The only cross-worker
//! mutable state is atomic (the finished counter, each module's dispatch
//! guard and state tag) or mutex-held (the first-error slot), and
//! termination is signalled through a single cancellation token, so no
//! check-then-act sequence ever spans two shared reads. A module whose
//! inputs are missing is re-enqueued by a timer after its check interval;
//! the worker that popped it is freed immediately.
//!
//! ## Module Guide
//!
//! - [`data`] - Artifacts and data nodes
//! - [`processor`] - Processor trait and built-in variants
//! - [`module`] - Module nodes and the readiness state machine
//! - [`workflow`] - Graph container and fluent builder
//! - [`registry`] - Type tag registry for resolver extensibility
//! - [`resolver`] - Definition documents and resolution
//! - [`runtimes`] - Worker pool, configuration, run reports
//! - [`types`] - Shared domain types

pub mod data;
pub mod module;
pub mod processor;
pub mod registry;
pub mod resolver;
pub mod runtimes;
pub mod types;
pub mod workflow;
