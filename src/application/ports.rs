//! Port trait definitions for the application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;

use anyhow::Result;

use crate::domain::VmHandle;

// ── Hypervisor Port ───────────────────────────────────────────────────────────

/// Authenticated access to the vCenter management plane.
///
/// Used once per run to establish the session and locate the target VM.
/// Inventory lifecycle (create/delete) is deliberately absent.
#[allow(async_fn_in_trait)]
pub trait Hypervisor {
    /// Validate the vCenter session credentials.
    async fn login(&self) -> Result<()>;

    /// Locate a VM by its full inventory path.
    async fn find_vm(&self, inventory_path: &str) -> Result<VmHandle>;
}

// ── Guest Operations Port ─────────────────────────────────────────────────────

/// Hypervisor-mediated channel into the guest.
///
/// Only used to bootstrap the remote-management protocol before WinRM is
/// reachable; everything afterwards goes through [`RemoteManager`].
#[allow(async_fn_in_trait)]
pub trait GuestOperations {
    /// Copy a local file to a path inside the guest.
    async fn upload(&self, local: &Path, guest_path: &str) -> Result<()>;

    /// Start a program inside the guest and wait for it to exit.
    async fn run_program(&self, program: &str, args: &str) -> Result<()>;
}

// ── Remote Manager Port ───────────────────────────────────────────────────────

/// The remote-execution and file-transfer channel into the guest, used for
/// every step after WinRM enablement.
///
/// Implementations are not assumed to survive a guest reboot — callers
/// re-probe reachability after any step that can trigger one — and the
/// underlying session is not assumed thread-safe: one call in flight at a
/// time.
#[allow(async_fn_in_trait)]
pub trait RemoteManager {
    /// Probe whether the guest endpoint is reachable at all.
    async fn can_reach_vm(&self) -> Result<()>;

    /// Probe whether the guest accepts the configured credentials.
    async fn can_login_vm(&self) -> Result<()>;

    /// Transfer a local file to a path inside the guest.
    async fn transfer_file(&self, local: &Path, remote: &str) -> Result<()>;

    /// Launch a command inside the guest, returning once it has started.
    ///
    /// The command's eventual exit status is not observed; callers that
    /// care about completion must watch for an out-of-band signal.
    async fn run_command(&self, command: &str) -> Result<()>;
}

// ── Unarchiver Port ───────────────────────────────────────────────────────────

/// Extracts an archive already staged inside the guest into a guest-local
/// directory.
#[allow(async_fn_in_trait)]
pub trait Unarchiver {
    /// Extract `archive` (a guest path) into `dest` (a guest directory).
    async fn unzip(&self, archive: &str, dest: &str) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit human-readable stage
/// messages without depending on the presentation layer. Messages are
/// descriptive only and never parsed by any other component. Sync trait —
/// no async needed.
pub trait Messenger {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);

    /// Emit a success message.
    fn success(&self, message: &str);

    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Filesystem Ports ──────────────────────────────────────────────────────────

/// Abstracts file hashing operations.
pub trait FileHasher {
    /// Compute the SHA-256 hash of a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn sha256_file(&self, path: &Path) -> Result<String>;
}
