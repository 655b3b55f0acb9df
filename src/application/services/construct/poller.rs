//! Generic bounded-interval retry driver.

use anyhow::Result;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::{PollConfig, PollError};

/// One observation made by a poll predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The awaited condition holds; stop polling.
    Done,
    /// Not yet; poll again after the interval.
    Pending,
}

/// A repeatable, side-effect-free observation.
///
/// `probe` may be invoked an unbounded number of times, so implementations
/// must be idempotent. An `Err` is treated as fatal and ends the poll
/// immediately — transient conditions belong in [`ProbeOutcome::Pending`].
#[allow(async_fn_in_trait)]
pub trait Probe {
    async fn probe(&self) -> Result<ProbeOutcome>;
}

/// Repeatedly invoke `probe` until it reports done, fails, the deadline
/// elapses, or `cancel` fires.
///
/// The interval sleep and the cancellation signal are observed
/// concurrently, so cancellation is honored within one interval. Total
/// wall-clock time never exceeds the timeout by more than one interval.
/// A dropped cancellation sender counts as cancellation.
///
/// # Errors
///
/// [`PollError::TimedOut`] when the deadline elapses before the probe
/// reports done, [`PollError::Canceled`] when `cancel` fires, and
/// [`PollError::Fatal`] when the probe itself fails.
pub async fn poll(
    probe: &impl Probe,
    config: PollConfig,
    cancel: &mut watch::Receiver<bool>,
) -> Result<(), PollError> {
    let deadline = Instant::now() + config.timeout();

    if *cancel.borrow() {
        return Err(PollError::Canceled);
    }

    loop {
        match probe.probe().await {
            Ok(ProbeOutcome::Done) => return Ok(()),
            Ok(ProbeOutcome::Pending) => {}
            Err(err) => return Err(PollError::Fatal(err)),
        }

        if Instant::now() >= deadline {
            return Err(PollError::TimedOut(config.timeout()));
        }

        tokio::select! {
            () = tokio::time::sleep(config.interval()) => {}
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    return Err(PollError::Canceled);
                }
            }
        }
    }
}
