//! In-guest archive extraction.

use anyhow::{Context, Result};

use crate::application::ports::{GuestOperations, Unarchiver};

/// Windows PowerShell binary inside the guest.
const GUEST_POWERSHELL: &str = "C:\\Windows\\System32\\WindowsPowerShell\\v1.0\\powershell.exe";

/// `Unarchiver` that runs `Expand-Archive` inside the guest through the
/// hypervisor's guest-operations channel. The archive never touches the
/// operator's machine once staged.
pub struct GuestUnarchiver<'a, G: GuestOperations> {
    guest_ops: &'a G,
}

impl<'a, G: GuestOperations> GuestUnarchiver<'a, G> {
    #[must_use]
    pub fn new(guest_ops: &'a G) -> Self {
        Self { guest_ops }
    }
}

impl<G: GuestOperations> Unarchiver for GuestUnarchiver<'_, G> {
    async fn unzip(&self, archive: &str, dest: &str) -> Result<()> {
        let args = format!(
            "-NoProfile -NonInteractive -Command \
             \"Expand-Archive -Force -Path '{archive}' -DestinationPath '{dest}'\""
        );
        self.guest_ops
            .run_program(GUEST_POWERSHELL, &args)
            .await
            .with_context(|| format!("extracting {archive} to {dest}"))
    }
}
