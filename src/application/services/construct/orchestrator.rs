//! The construct orchestration — a linear stage sequence with no backward
//! transitions.
//!
//! `validate → enable WinRM → execute script → wait for shutdown`. Each
//! stage must fully succeed before the next begins; the first failure
//! halts the run with a [`StageError`] naming the stage. State flows
//! strictly forward — no stage mutates another stage's inputs and there is
//! no partial-progress resume.

use std::path::{Path, PathBuf};

use tokio::sync::watch;

use crate::application::ports::{
    FileHasher, GuestOperations, Messenger, RemoteManager, Unarchiver,
};
use crate::application::services::construct::enabler::{LGPO_ARCHIVE, WinRmEnabler};
use crate::application::services::construct::reboot;
use crate::application::services::construct::script::{AUTOMATION_ARCHIVE, ScriptExecutor};
use crate::application::services::construct::validator;
use crate::domain::{PollConfig, PreconditionError, Stage, StageError};

/// Inputs for one construct run.
pub struct ConstructOptions {
    /// Directory holding `LGPO.zip` and `StemcellAutomation.zip`.
    pub working_dir: PathBuf,
    /// Interval/timeout for the shutdown wait.
    pub poll: PollConfig,
}

/// Check that both local archives exist before anything contacts vCenter
/// or the guest, so a doomed run never burns a WinRM enablement cycle.
///
/// # Errors
///
/// Returns a [`PreconditionError`] naming the first missing archive.
pub fn preflight(working_dir: &Path) -> Result<(), PreconditionError> {
    for name in [AUTOMATION_ARCHIVE, LGPO_ARCHIVE] {
        let path = working_dir.join(name);
        if !path.exists() {
            return Err(PreconditionError::MissingArchive { path });
        }
    }
    Ok(())
}

/// Run the full guest-preparation sequence against an already-located VM.
///
/// Progress is reported to `messenger` at every transition; the messages
/// are descriptive only. Only the shutdown wait observes `cancel` —
/// earlier stages are short, atomic calls with no partial-cancellation
/// contract.
///
/// # Errors
///
/// Returns a [`StageError`] naming the first stage that failed; later
/// stages are never invoked.
pub async fn prepare_vm(
    remote: &impl RemoteManager,
    guest_ops: &impl GuestOperations,
    unarchiver: &impl Unarchiver,
    hasher: &impl FileHasher,
    messenger: &impl Messenger,
    mut cancel: watch::Receiver<bool>,
    opts: &ConstructOptions,
) -> Result<(), StageError> {
    preflight(&opts.working_dir)
        .map_err(|cause| StageError::new(Stage::Preflight, cause.into()))?;

    messenger.step("validating the connection to the guest vm...");
    validator::validate(remote)
        .await
        .map_err(|cause| StageError::new(Stage::ValidateConnection, cause))?;
    messenger.success("guest vm connection validated");

    messenger.step("attempting to enable WinRM on the guest vm...");
    let enabler = WinRmEnabler::new(guest_ops, unarchiver, &opts.working_dir);
    enabler
        .prepare_vm()
        .await
        .map_err(|cause| StageError::new(Stage::EnableWinRm, cause))?;
    messenger.success("WinRM enabled on the guest vm");

    let payload = opts.working_dir.join(AUTOMATION_ARCHIVE);
    messenger.step(&format!("transferring {AUTOMATION_ARCHIVE} to the guest vm..."));
    let digest = hasher
        .sha256_file(&payload)
        .map_err(|cause| StageError::new(Stage::ExecuteScript, cause))?;
    messenger.step(&format!("{AUTOMATION_ARCHIVE} sha256: {digest}"));
    let executor = ScriptExecutor::new(remote, &opts.working_dir);
    executor
        .execute()
        .await
        .map_err(|cause| StageError::new(Stage::ExecuteScript, cause))?;
    messenger.success("stemcell automation script started");

    messenger.step("waiting for the guest vm to power off...");
    reboot::wait_for_shutdown(remote, opts.poll, &mut cancel)
        .await
        .map_err(|cause| StageError::new(Stage::WaitForShutdown, cause.into()))?;
    messenger.success("guest vm powered off");

    Ok(())
}
