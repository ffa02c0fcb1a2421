//! Core domain types for the sluice pipeline engine.
//!
//! This module defines the fundamental vocabulary used throughout the crate:
//! the observable module state machine and the default re-check interval for
//! modules whose inputs are not yet available.
//!
//! For runtime execution types (worker counts, retry bounds, run reports),
//! see [`crate::runtimes`].

use std::fmt;
use std::time::Duration;

/// Default interval between input re-checks for a not-ready module.
///
/// Individual modules can override this through
/// [`ModuleSpec::with_check_interval`](crate::workflow::ModuleSpec::with_check_interval)
/// or the `checkInterval` field of a workflow definition.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Observable execution state of a module.
///
/// A module starts as [`NotReady`](Self::NotReady), becomes
/// [`Running`](Self::Running) once all of its declared inputs exist and its
/// processor has been invoked, and ends as [`Succeeded`](Self::Succeeded)
/// when the processor returns normally. There is no failed state: a
/// processor failure is fatal to the whole run and is surfaced through the
/// run's error path instead of being recorded on the module.
///
/// # Examples
///
/// ```rust
/// use sluice::types::ModuleState;
///
/// let state = ModuleState::NotReady;
/// assert!(!state.is_succeeded());
/// assert_eq!(state.to_string(), "not-ready");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModuleState {
    /// At least one declared input does not exist yet (or the module has not
    /// been attempted at all).
    NotReady = 0,
    /// All inputs exist and the processor is executing.
    Running = 1,
    /// The processor returned normally; the module is finished.
    Succeeded = 2,
}

impl ModuleState {
    /// Decode the atomic tag stored on a module back into a state.
    ///
    /// Unknown tags map to [`NotReady`](Self::NotReady); the only writers
    /// are the state transitions in [`crate::module`], so this is a
    /// belt-and-braces fallback rather than a reachable path.
    pub(crate) fn from_tag(tag: u8) -> Self {
        match tag {
            1 => ModuleState::Running,
            2 => ModuleState::Succeeded,
            _ => ModuleState::NotReady,
        }
    }

    /// Returns `true` if this is [`NotReady`](Self::NotReady).
    #[must_use]
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    /// Returns `true` if this is [`Running`](Self::Running).
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns `true` if this is [`Succeeded`](Self::Succeeded).
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "not-ready"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
        }
    }
}
