//! Unit tests for the stemprep CLI
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod construct_flow;
mod helpers;
