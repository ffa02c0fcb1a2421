//! Worker-pool configuration.

use std::env;

/// Worker count used when nothing else is configured.
pub const DEFAULT_WORKERS: usize = 10;

/// Environment variable overriding the default worker count.
pub const WORKERS_ENV_VAR: &str = "SLUICE_WORKERS";

/// Tunables for one workflow run.
///
/// `Default` resolves the worker count from the environment (a `.env` file
/// is honored through dotenvy) and leaves the retry bound unset, which means
/// a module waits for its inputs indefinitely. Set
/// [`with_max_attempts`](Self::with_max_attempts) to turn a stalled
/// dependency into a fatal error instead.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of concurrent workers draining the dispatch queue.
    pub workers: usize,
    /// Maximum readiness attempts per module before the run fails; `None`
    /// retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            workers: Self::resolve_workers(None),
            max_attempts: None,
        }
    }
}

impl RuntimeConfig {
    fn resolve_workers(provided: Option<usize>) -> usize {
        if let Some(workers) = provided {
            return workers.max(1);
        }
        dotenvy::dotenv().ok();
        env::var(WORKERS_ENV_VAR)
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|&workers| workers > 0)
            .unwrap_or(DEFAULT_WORKERS)
    }

    pub fn new(workers: Option<usize>, max_attempts: Option<u32>) -> Self {
        Self {
            workers: Self::resolve_workers(workers),
            max_attempts,
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}
