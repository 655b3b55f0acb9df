//! Provisioning-script handoff.
//!
//! Execution is fire-and-forget: the payload is expected to reboot or
//! power off the guest as its own completion signal, so this component
//! only guarantees a successful launch.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::RemoteManager;
use crate::application::services::construct::enabler::PROVISION_DIR;

/// Automation payload archive expected in the operator's working directory.
pub const AUTOMATION_ARCHIVE: &str = "StemcellAutomation.zip";

/// Command that unpacks the payload and starts the provisioning entry
/// script. Launched detached — the guest powering off would sever any
/// session still waiting on it.
const LAUNCH_COMMAND: &str = "Expand-Archive -Force C:\\provision\\StemcellAutomation.zip \
     C:\\provision\\automation; & C:\\provision\\automation\\Setup.ps1";

/// Hands the automation payload to the guest and starts it.
pub struct ScriptExecutor<'a, R: RemoteManager> {
    remote: &'a R,
    working_dir: PathBuf,
}

impl<'a, R: RemoteManager> ScriptExecutor<'a, R> {
    #[must_use]
    pub fn new(remote: &'a R, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            remote,
            working_dir: working_dir.into(),
        }
    }

    /// Transfer the automation payload and launch it.
    ///
    /// Returns as soon as the launch succeeds. The payload's exit status is
    /// never observed here; completion is detected by waiting for the guest
    /// to power itself off.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer or the launch fails; both are fatal
    /// for the run.
    pub async fn execute(&self) -> Result<()> {
        let payload = self.working_dir.join(AUTOMATION_ARCHIVE);
        let remote_path = format!("{PROVISION_DIR}\\{AUTOMATION_ARCHIVE}");

        self.remote
            .transfer_file(&payload, &remote_path)
            .await
            .with_context(|| format!("transferring {AUTOMATION_ARCHIVE} to the guest"))?;

        self.remote
            .run_command(LAUNCH_COMMAND)
            .await
            .context("launching the stemcell automation script")?;

        Ok(())
    }
}
