//! Domain layer — pure types, configuration, and typed errors.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.

pub mod config;
pub mod error;

pub use config::{GuestCredentials, PollConfig, SourceConfig, VmHandle};
pub use error::{ConfigError, PollError, PreconditionError, Stage, StageError};
