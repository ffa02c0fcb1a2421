//! Worker pool and scheduling core.
//!
//! [`WorkflowRunner`] executes a built workflow: it seeds the shared flume
//! dispatch queue with the start modules, spawns a fixed pool of workers
//! into a `JoinSet`, and blocks until every worker has observed termination.
//! Workers pop module references off the queue, attempt them, and on success
//! atomically bump the shared finished counter and dispatch newly-ready
//! downstream modules through their guards.
//!
//! Termination is signalled through one `CancellationToken` rather than a
//! repeated check of two shared values: the worker whose increment makes the
//! finished count equal the module total cancels it, and so does the first
//! worker to record a fatal error. Every suspension point (queue pop, retry
//! timer) selects against the token, so a fatal error also stops in-flight
//! waiting instead of letting the pool run to natural completion.
//!
//! A not-ready module never pins its worker: the worker hands the module to
//! a timer task that re-enqueues it after the module's check interval and
//! immediately goes back to the queue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::module::{Attempt, Module, ModuleError};
use crate::runtimes::RuntimeConfig;
use crate::workflow::Workflow;

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Unique id for this run, present in every log line it emitted.
    pub run_id: String,
    /// Wall-clock start time.
    pub started_at: DateTime<Utc>,
    /// Total run duration.
    pub elapsed: Duration,
    /// Modules that finished successfully; equals the module count.
    pub modules_finished: usize,
}

/// Fatal run outcomes. The first error any worker hits is the one surfaced.
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    /// The workflow has modules but no start modules, so no worker would
    /// ever receive work.
    #[error("workflow has no start modules")]
    #[diagnostic(
        code(sluice::runner::no_start_modules),
        help("Declare at least one start module so the dispatch queue can be seeded.")
    )]
    NoStartModules,

    /// A module's processor failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Module(#[from] ModuleError),

    /// A module exhausted its configured readiness attempts.
    #[error(
        "module `{module}` gave up after {attempts} attempts; missing inputs: {missing:?}"
    )]
    #[diagnostic(
        code(sluice::runner::retries_exhausted),
        help("Raise RuntimeConfig::max_attempts, or fix whatever should produce the missing inputs.")
    )]
    RetriesExhausted {
        module: String,
        attempts: u32,
        missing: Vec<String>,
    },

    /// A worker task panicked or was aborted.
    #[error("worker task failed to join")]
    #[diagnostic(code(sluice::runner::join))]
    Join(#[from] JoinError),
}

/// Executes one workflow on a fixed pool of concurrent workers.
pub struct WorkflowRunner {
    workflow: Arc<Workflow>,
    config: RuntimeConfig,
}

/// State shared by every worker and retry timer of one run.
struct Dispatcher {
    workflow: Arc<Workflow>,
    queue_tx: flume::Sender<Arc<Module>>,
    queue_rx: flume::Receiver<Arc<Module>>,
    total: usize,
    finished: AtomicUsize,
    max_attempts: Option<u32>,
    stop: CancellationToken,
    first_error: Mutex<Option<RunError>>,
}

impl Dispatcher {
    fn enqueue(&self, module: Arc<Module>) {
        // Only fails once every receiver is gone, i.e. during teardown.
        let _ = self.queue_tx.send(module);
    }

    /// Record the first fatal error and stop the pool.
    fn fail(&self, error: RunError) {
        let mut slot = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
        }
        drop(slot);
        self.stop.cancel();
    }

    fn take_error(&self) -> Option<RunError> {
        self.first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Success path: dispatch newly-ready consumers, then count this module
    /// as finished. The worker whose increment reaches the total cancels
    /// the stop token; at that point every module has succeeded, so neither
    /// the queue nor any retry timer can still hold work.
    fn complete(&self, module: &Module) {
        for output in module.outputs() {
            for name in output.downstream() {
                if let Some(consumer) = self.workflow.module(name) {
                    if consumer.claim_dispatch() {
                        debug!(module = %name, "downstream module dispatched");
                        self.enqueue(Arc::clone(consumer));
                    }
                }
            }
        }
        let finished = self.finished.fetch_add(1, Ordering::AcqRel) + 1;
        info!(module = %module.name(), finished, total = self.total, "module ran successfully");
        if finished == self.total {
            self.stop.cancel();
        }
    }

    /// Deferred re-enqueue: a timer owns the wait, not the worker.
    fn schedule_retry(&self, module: Arc<Module>) {
        let stop = self.stop.clone();
        let queue_tx = self.queue_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = stop.cancelled() => {}
                _ = tokio::time::sleep(module.check_interval()) => {
                    let _ = queue_tx.send(module);
                }
            }
        });
    }

    async fn process(&self, module: Arc<Module>) {
        match module.attempt().await {
            Ok(Attempt::Completed) => {
                self.complete(&module);
            }
            Ok(Attempt::NotReady { missing }) => {
                let attempts = module.note_not_ready();
                let exhausted = self.max_attempts.is_some_and(|max| attempts >= max);
                if exhausted {
                    self.fail(RunError::RetriesExhausted {
                        module: module.name().to_string(),
                        attempts,
                        missing,
                    });
                } else {
                    debug!(
                        module = %module.name(),
                        attempts,
                        ?missing,
                        interval_ms = module.check_interval().as_millis() as u64,
                        "inputs missing; deferring re-check"
                    );
                    self.schedule_retry(module);
                }
            }
            Err(module_error) => {
                self.fail(RunError::Module(module_error));
            }
        }
    }
}

/// One worker: drain the queue until the stop token fires.
#[instrument(skip(dispatcher))]
async fn worker_loop(worker: usize, dispatcher: Arc<Dispatcher>) {
    debug!("worker started");
    loop {
        let module = tokio::select! {
            biased;
            _ = dispatcher.stop.cancelled() => break,
            received = dispatcher.queue_rx.recv_async() => match received {
                Ok(module) => module,
                Err(_) => break,
            },
        };
        dispatcher.process(module).await;
    }
    debug!("worker stopped");
}

impl WorkflowRunner {
    #[must_use]
    pub fn new(workflow: Workflow, config: RuntimeConfig) -> Self {
        Self {
            workflow: Arc::new(workflow),
            config,
        }
    }

    /// Run the workflow to completion.
    ///
    /// Seeds the queue with the start modules (each guard pre-claimed so a
    /// start module is never re-enqueued by an upstream completion), spawns
    /// the worker pool, and waits for every worker to observe termination.
    /// Returns the first fatal error any worker recorded, or a
    /// [`RunReport`] once the finished count equals the module total.
    #[instrument(skip(self), fields(modules = self.workflow.module_count()))]
    pub async fn run(self) -> Result<RunReport, RunError> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        let total = self.workflow.module_count();

        info!(
            run_id = %run_id,
            modules = total,
            workers = self.config.workers,
            "workflow run starting"
        );

        if total == 0 {
            info!(run_id = %run_id, "workflow is empty; nothing to run");
            return Ok(RunReport {
                run_id,
                started_at,
                elapsed: clock.elapsed(),
                modules_finished: 0,
            });
        }
        if self.workflow.start_modules().is_empty() {
            return Err(RunError::NoStartModules);
        }

        let (queue_tx, queue_rx) = flume::unbounded();
        let dispatcher = Arc::new(Dispatcher {
            workflow: Arc::clone(&self.workflow),
            queue_tx,
            queue_rx,
            total,
            finished: AtomicUsize::new(0),
            max_attempts: self.config.max_attempts,
            stop: CancellationToken::new(),
            first_error: Mutex::new(None),
        });

        for module in self.workflow.start_modules() {
            if module.claim_dispatch() {
                dispatcher.enqueue(Arc::clone(module));
            }
        }

        let mut workers = JoinSet::new();
        for worker in 0..self.config.workers.max(1) {
            workers.spawn(worker_loop(worker, Arc::clone(&dispatcher)));
        }
        while let Some(joined) = workers.join_next().await {
            joined?;
        }

        if let Some(error) = dispatcher.take_error() {
            error!(run_id = %run_id, error = %error, "workflow run failed");
            return Err(error);
        }

        let modules_finished = dispatcher.finished.load(Ordering::Acquire);
        debug_assert_eq!(modules_finished, total);
        let elapsed = clock.elapsed();
        info!(
            run_id = %run_id,
            modules_finished,
            elapsed_ms = elapsed.as_millis() as u64,
            "workflow run finished"
        );
        Ok(RunReport {
            run_id,
            started_at,
            elapsed,
            modules_finished,
        })
    }
}
