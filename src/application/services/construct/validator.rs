//! Connection validation — the precondition gate before any guest mutation.

use anyhow::{Context, Result};

use crate::application::ports::RemoteManager;

/// Fixed cause attached to a failed guest login so operators can tell
/// authentication failures apart from connectivity failures.
pub const GUEST_LOGIN_CAUSE: &str =
    "cannot complete login due to an incorrect VM user name or password";

/// Check that the guest is reachable and accepts the configured credentials.
///
/// The reachability error is surfaced unchanged — it already says "cannot
/// reach" — and the login probe is skipped when reachability fails. A login
/// failure is wrapped with [`GUEST_LOGIN_CAUSE`].
///
/// # Errors
///
/// Returns an error if either probe fails.
pub async fn validate(remote: &impl RemoteManager) -> Result<()> {
    remote.can_reach_vm().await?;
    remote.can_login_vm().await.context(GUEST_LOGIN_CAUSE)?;
    Ok(())
}
