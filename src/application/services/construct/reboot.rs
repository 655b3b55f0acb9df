//! Shutdown detection — waiting for the guest to power itself off.

use anyhow::Result;
use tokio::sync::watch;

use crate::application::ports::RemoteManager;
use crate::application::services::construct::poller::{self, Probe, ProbeOutcome};
use crate::domain::{PollConfig, PollError};

/// Probe that inverts the reachability check: an unreachable guest is the
/// success condition.
///
/// This is the only completion signal available — the channel used to run
/// the payload cannot report its outcome once the guest powers off. The
/// signal is ambiguous by nature: it cannot distinguish an intended
/// shutdown from a crash or a severed network. Success only means "the
/// guest became unreachable".
pub struct RebootChecker<'a, R: RemoteManager> {
    remote: &'a R,
}

impl<'a, R: RemoteManager> RebootChecker<'a, R> {
    #[must_use]
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }
}

impl<R: RemoteManager> Probe for RebootChecker<'_, R> {
    async fn probe(&self) -> Result<ProbeOutcome> {
        match self.remote.can_reach_vm().await {
            Ok(()) => Ok(ProbeOutcome::Pending),
            Err(_) => Ok(ProbeOutcome::Done),
        }
    }
}

/// Wait until the guest has shut itself down.
///
/// # Errors
///
/// [`PollError::TimedOut`] if the guest never became unreachable within
/// the window — a distinct, non-crash outcome — and [`PollError::Canceled`]
/// on external cancellation.
pub async fn wait_for_shutdown(
    remote: &impl RemoteManager,
    config: PollConfig,
    cancel: &mut watch::Receiver<bool>,
) -> Result<(), PollError> {
    let checker = RebootChecker::new(remote);
    poller::poll(&checker, config, cancel).await
}
