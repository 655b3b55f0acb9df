//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution through
//! external CLIs, TCP probes, and local file hashing. Imports from
//! `crate::domain` and `crate::application::ports` are allowed; imports
//! from `crate::commands` or `crate::output` are forbidden.

pub mod archive;
pub mod fs;
pub mod govc;
pub mod winrm;

#[cfg(test)]
pub(crate) mod test_support;
