//! Local filesystem helpers.

use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::application::ports::FileHasher;

/// `FileHasher` backed by the real filesystem.
pub struct Sha256FileHasher;

impl FileHasher for Sha256FileHasher {
    fn sha256_file(&self, path: &Path) -> Result<String> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let digest = Sha256::digest(&bytes);
        Ok(format!("{digest:x}"))
    }
}
