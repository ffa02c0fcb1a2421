//! Processors: the polymorphic executable unit bound to a module.
//!
//! A [`Processor`] communicates success by returning normally; any error is
//! fatal to the whole run. Two variants ship with the crate: [`NoopProcessor`]
//! always succeeds, [`CommandProcessor`] runs one or more shell commands as a
//! single `sh -c` invocation.

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use tokio::process::Command;

/// Executable behavior bound to a module.
///
/// Implementations must be safe to share across workers. `run` is invoked at
/// most once per run for a given module: the scheduler retries readiness, not
/// processor execution.
#[async_trait]
pub trait Processor: Send + Sync {
    /// The processor's own name, independent of any module name.
    fn name(&self) -> &str;

    /// Execute the unit of work. Returning `Err` aborts the run.
    async fn run(&self) -> Result<(), ProcessorError>;
}

/// Processor that does nothing and always succeeds.
#[derive(Debug, Clone)]
pub struct NoopProcessor {
    name: String,
}

impl NoopProcessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Processor for NoopProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), ProcessorError> {
        Ok(())
    }
}

/// Processor that runs shell commands through `sh -c`.
///
/// Multiple commands are joined with `" && "` before invocation, so each
/// subsequent command only runs if the previous one succeeded and the whole
/// chain is a single external invocation. A non-zero exit status from the
/// chain is an error.
///
/// # Examples
///
/// ```rust
/// use sluice::processor::CommandProcessor;
///
/// let p = CommandProcessor::chained("stage", ["mkdir -p out", "date > out/stamp"]);
/// assert_eq!(p.command(), "mkdir -p out && date > out/stamp");
/// ```
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    name: String,
    command: String,
}

impl CommandProcessor {
    /// Single-command processor.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    /// Chain several commands with `" && "` into one invocation.
    pub fn chained<I, S>(name: impl Into<String>, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = commands
            .into_iter()
            .map(Into::into)
            .collect::<Vec<_>>()
            .join(" && ");
        Self {
            name: name.into(),
            command,
        }
    }

    /// The full command line handed to `sh -c`.
    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Processor for CommandProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), ProcessorError> {
        tracing::debug!(processor = %self.name, command = %self.command, "running command");
        let status = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .status()
            .await
            .map_err(|source| ProcessorError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !status.success() {
            return Err(ProcessorError::CommandFailed {
                command: self.command.clone(),
                status,
            });
        }
        Ok(())
    }
}

/// Errors raised by processor execution. All of them abort the run.
#[derive(Debug, Error, Diagnostic)]
pub enum ProcessorError {
    /// The shell itself could not be spawned.
    #[error("failed to spawn shell for `{command}`")]
    #[diagnostic(code(sluice::processor::spawn))]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command chain ran but exited non-zero.
    #[error("command `{command}` failed ({status})")]
    #[diagnostic(
        code(sluice::processor::command_failed),
        help("Inspect the command's own output; the chain stops at the first failing command.")
    )]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
    },
}
