//! Command implementations

pub mod construct;
pub mod version;
