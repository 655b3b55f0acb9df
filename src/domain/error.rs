//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// ── Configuration errors ──────────────────────────────────────────────────────

/// Errors raised while validating run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingField(&'static str),

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("shutdown timeout {timeout:?} is shorter than the poll interval {interval:?}")]
    TimeoutShorterThanInterval { interval: Duration, timeout: Duration },
}

// ── Precondition errors ───────────────────────────────────────────────────────

/// A local artifact required by the run is absent.
///
/// Reported before any guest contact and never retried.
#[derive(Debug, Error)]
pub enum PreconditionError {
    #[error("could not find {} in the current directory", .path.display())]
    MissingArchive { path: PathBuf },
}

// ── Poll errors ───────────────────────────────────────────────────────────────

/// Terminal outcomes of a bounded poll loop.
///
/// `TimedOut` and `Canceled` are kept distinct so callers can tell "the
/// guest never powered off" apart from "the operator gave up waiting".
#[derive(Debug, Error)]
pub enum PollError {
    /// The predicate never reported done within the window.
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The cancellation signal fired before the predicate reported done.
    #[error("wait cancelled")]
    Canceled,

    /// The predicate reported an unrecoverable error.
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

// ── Construct stages ──────────────────────────────────────────────────────────

/// The linear stage sequence of a construct run.
///
/// Used for progress reporting and for naming the failed stage in errors.
/// There are no backward transitions; the first failure is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preflight,
    ValidateConnection,
    EnableWinRm,
    ExecuteScript,
    WaitForShutdown,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preflight => "preflight check",
            Self::ValidateConnection => "connection validation",
            Self::EnableWinRm => "WinRM enablement",
            Self::ExecuteScript => "script execution",
            Self::WaitForShutdown => "shutdown wait",
        };
        f.write_str(name)
    }
}

/// A construct run halted at `stage`; no later stage ran.
#[derive(Debug, Error)]
#[error("{stage} failed: {cause:#}")]
pub struct StageError {
    pub stage: Stage,
    pub cause: anyhow::Error,
}

impl StageError {
    #[must_use]
    pub fn new(stage: Stage, cause: anyhow::Error) -> Self {
        Self { stage, cause }
    }
}
