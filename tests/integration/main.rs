//! Integration tests for the stemprep binary
