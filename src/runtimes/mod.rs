//! Runtime execution for built workflows.
//!
//! This module owns everything that happens after graph construction: the
//! [`RuntimeConfig`] knobs, the [`WorkflowRunner`] worker pool that drains
//! the dispatch queue, and the [`RunReport`] / [`RunError`] outcome surface.
//!
//! Most callers never touch the runner directly and go through
//! [`Workflow::run`](crate::workflow::Workflow::run) or
//! [`Workflow::run_with`](crate::workflow::Workflow::run_with).

mod config;
mod runner;

pub use config::{DEFAULT_WORKERS, RuntimeConfig, WORKERS_ENV_VAR};
pub use runner::{RunError, RunReport, WorkflowRunner};
