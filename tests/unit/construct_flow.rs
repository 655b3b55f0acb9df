//! End-to-end tests for the construct orchestration, with every port
//! replaced by a recording double.
//!
//! Covers the four observable scenarios: full success, missing payload,
//! a guest that never powers off, and an unreachable guest.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use stemprep::application::services::construct::orchestrator::{
    self, ConstructOptions,
};
use stemprep::domain::{PollConfig, PollError, PreconditionError, Stage};
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::helpers::{FixedHasher, GuestOpsSpy, RecordingMessenger, ScriptedRemote, UnzipSpy};

fn archives_dir(with_payload: bool, with_lgpo: bool) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    if with_payload {
        std::fs::write(dir.path().join("StemcellAutomation.zip"), b"payload").expect("write");
    }
    if with_lgpo {
        std::fs::write(dir.path().join("LGPO.zip"), b"lgpo").expect("write");
    }
    dir
}

fn options(dir: &TempDir, interval_ms: u64, timeout_ms: u64) -> ConstructOptions {
    ConstructOptions {
        working_dir: dir.path().to_path_buf(),
        poll: PollConfig::new(
            Duration::from_millis(interval_ms),
            Duration::from_millis(timeout_ms),
        )
        .expect("poll config"),
    }
}

/// Assert that `needles` appear in `haystack` in the given relative order.
fn assert_in_order(haystack: &[String], needles: &[&str]) {
    let mut position = 0;
    for needle in needles {
        let found = haystack[position..]
            .iter()
            .position(|line| line.contains(needle));
        let Some(offset) = found else {
            panic!("expected {needle:?} after index {position} in {haystack:#?}");
        };
        position += offset + 1;
    }
}

// ── Scenario A: full success ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn a_full_run_succeeds_when_the_guest_powers_off() {
    let dir = archives_dir(true, true);
    // Reachable for validation and the first two shutdown probes, then gone.
    let remote = ScriptedRemote::new(&[true, true, true, false], true);
    let guest_ops = GuestOpsSpy::default();
    let unarchiver = UnzipSpy::default();
    let messenger = RecordingMessenger::default();
    let (_tx, rx) = watch::channel(false);

    orchestrator::prepare_vm(
        &remote,
        &guest_ops,
        &unarchiver,
        &FixedHasher,
        &messenger,
        rx,
        &options(&dir, 50, 10_000),
    )
    .await
    .expect("prepare_vm");

    // Stage messages in order: validate → enable → execute → wait → done.
    assert_in_order(
        &messenger.lines(),
        &[
            "validating the connection",
            "guest vm connection validated",
            "attempting to enable WinRM",
            "WinRM enabled on the guest vm",
            "transferring StemcellAutomation.zip",
            "sha256: cafebabe",
            "stemcell automation script started",
            "waiting for the guest vm to power off",
            "guest vm powered off",
        ],
    );

    // The remote channel saw: both validation probes, the transfer and
    // launch, then shutdown probes until the guest disappeared.
    assert_in_order(
        &remote.calls(),
        &[
            "can_reach_vm",
            "can_login_vm",
            "transfer_file",
            "run_command",
            "can_reach_vm",
        ],
    );

    // WinRM enablement went through guest operations, then unpacked.
    assert_eq!(
        guest_ops.calls(),
        vec![
            "upload C:\\provision\\LGPO.zip".to_string(),
            "run_program C:\\Windows\\System32\\WindowsPowerShell\\v1.0\\powershell.exe"
                .to_string(),
        ]
    );
    assert_eq!(unarchiver.calls.lock().expect("lock").len(), 1);
}

// ── Scenario B: missing payload archive ───────────────────────────────────────

#[tokio::test]
async fn b_a_missing_payload_fails_before_any_guest_contact() {
    let dir = archives_dir(false, true);
    let remote = ScriptedRemote::new(&[true], true);
    let guest_ops = GuestOpsSpy::default();
    let messenger = RecordingMessenger::default();
    let (_tx, rx) = watch::channel(false);

    let err = orchestrator::prepare_vm(
        &remote,
        &guest_ops,
        &UnzipSpy::default(),
        &FixedHasher,
        &messenger,
        rx,
        &options(&dir, 50, 1_000),
    )
    .await
    .expect_err("expected Err");

    assert_eq!(err.stage, Stage::Preflight);
    let precondition = err
        .cause
        .downcast_ref::<PreconditionError>()
        .expect("PreconditionError");
    assert!(
        precondition.to_string().contains("StemcellAutomation.zip"),
        "{precondition}"
    );
    assert!(remote.calls().is_empty(), "no remote calls were expected");
    assert!(guest_ops.calls().is_empty(), "no guest ops were expected");
    assert!(messenger.lines().is_empty(), "no progress was expected");
}

// ── Scenario C: guest never powers off ────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn c_a_guest_that_stays_up_times_out_after_the_window() {
    let dir = archives_dir(true, true);
    let remote = ScriptedRemote::new(&[true], true);
    let messenger = RecordingMessenger::default();
    let (_tx, rx) = watch::channel(false);

    let start = Instant::now();
    let err = orchestrator::prepare_vm(
        &remote,
        &GuestOpsSpy::default(),
        &UnzipSpy::default(),
        &FixedHasher,
        &messenger,
        rx,
        &options(&dir, 50, 300),
    )
    .await
    .expect_err("expected Err");
    let elapsed = start.elapsed();

    assert_eq!(err.stage, Stage::WaitForShutdown);
    let poll_err = err.cause.downcast_ref::<PollError>().expect("PollError");
    assert!(matches!(poll_err, PollError::TimedOut(_)), "{poll_err}");
    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed <= Duration::from_millis(350), "{elapsed:?}");

    let lines = messenger.lines();
    assert!(
        lines.iter().any(|l| l.contains("waiting for the guest vm")),
        "{lines:#?}"
    );
    assert!(
        !lines.iter().any(|l| l.contains("guest vm powered off")),
        "{lines:#?}"
    );
}

// ── Scenario D: unreachable during validation ─────────────────────────────────

#[tokio::test]
async fn d_an_unreachable_guest_fails_validation_with_the_raw_error() {
    let dir = archives_dir(true, true);
    let remote = ScriptedRemote::new(&[false], true);
    let guest_ops = GuestOpsSpy::default();
    let messenger = RecordingMessenger::default();
    let (_tx, rx) = watch::channel(false);

    let err = orchestrator::prepare_vm(
        &remote,
        &guest_ops,
        &UnzipSpy::default(),
        &FixedHasher,
        &messenger,
        rx,
        &options(&dir, 50, 1_000),
    )
    .await
    .expect_err("expected Err");

    assert_eq!(err.stage, Stage::ValidateConnection);
    assert_eq!(err.cause.to_string(), "connection refused");
    assert_eq!(remote.calls(), vec!["can_reach_vm".to_string()]);
    assert!(guest_ops.calls().is_empty(), "enablement must not run");
}
