//! WinRM enablement — one-shot bootstrap of the remote channel.
//!
//! A freshly imported Windows VM may not accept WinRM connections at all,
//! so the first mutation goes through the hypervisor's guest-operations
//! channel instead: stage the helper toolset, run the native enablement
//! command, and unpack the toolset where later provisioning steps expect
//! to find it.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::{GuestOperations, Unarchiver};
use crate::domain::PreconditionError;

/// Helper toolset archive expected in the operator's working directory.
pub const LGPO_ARCHIVE: &str = "LGPO.zip";

/// Directory inside the guest where automation artifacts are staged.
pub const PROVISION_DIR: &str = "C:\\provision";

/// Guest directory the helper toolset is unpacked into.
const LGPO_DEST: &str = "C:\\provision\\lgpo";

/// Windows PowerShell binary inside the guest.
const GUEST_POWERSHELL: &str = "C:\\Windows\\System32\\WindowsPowerShell\\v1.0\\powershell.exe";

/// Arguments for the native WinRM enablement command.
const ENABLE_WINRM_ARGS: &str =
    "-NoProfile -NonInteractive -Command \"winrm quickconfig -quiet; Enable-PSRemoting -Force\"";

/// Enables WinRM inside a guest that may not yet support it.
pub struct WinRmEnabler<'a, G: GuestOperations, U: Unarchiver> {
    guest_ops: &'a G,
    unarchiver: &'a U,
    working_dir: PathBuf,
}

impl<'a, G: GuestOperations, U: Unarchiver> WinRmEnabler<'a, G, U> {
    #[must_use]
    pub fn new(guest_ops: &'a G, unarchiver: &'a U, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            guest_ops,
            unarchiver,
            working_dir: working_dir.into(),
        }
    }

    /// Enable WinRM inside the guest and stage the helper toolset.
    ///
    /// Any failure here is terminal for the run: enablement is a one-shot
    /// precondition, and retrying a partially-applied enablement could
    /// corrupt guest state.
    ///
    /// # Errors
    ///
    /// Returns a [`PreconditionError`] if the helper archive is absent, and
    /// the underlying error if the upload, enablement command, or unpack
    /// fails.
    pub async fn prepare_vm(&self) -> Result<()> {
        let archive = self.working_dir.join(LGPO_ARCHIVE);
        if !archive.exists() {
            return Err(PreconditionError::MissingArchive { path: archive }.into());
        }

        let staged = format!("{PROVISION_DIR}\\{LGPO_ARCHIVE}");
        self.guest_ops
            .upload(&archive, &staged)
            .await
            .with_context(|| format!("uploading {LGPO_ARCHIVE} to the guest"))?;

        self.guest_ops
            .run_program(GUEST_POWERSHELL, ENABLE_WINRM_ARGS)
            .await
            .context("enabling WinRM inside the guest")?;

        self.unarchiver
            .unzip(&staged, LGPO_DEST)
            .await
            .with_context(|| format!("unpacking {LGPO_ARCHIVE} inside the guest"))?;

        Ok(())
    }
}
