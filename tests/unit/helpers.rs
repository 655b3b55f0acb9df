//! Shared test helpers: recording doubles for the construct ports.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use stemprep::application::ports::{
    FileHasher, GuestOperations, Messenger, RemoteManager, Unarchiver,
};

// ── Remote manager double ─────────────────────────────────────────────────────

/// `RemoteManager` whose reachability follows a script (true = reachable);
/// the last entry is sticky. Every call is recorded in order.
pub struct ScriptedRemote {
    reach_script: Mutex<VecDeque<bool>>,
    login_ok: bool,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    pub fn new(reach_script: &[bool], login_ok: bool) -> Self {
        Self {
            reach_script: Mutex::new(reach_script.iter().copied().collect()),
            login_ok,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().expect("lock").push(call.into());
    }
}

impl RemoteManager for ScriptedRemote {
    async fn can_reach_vm(&self) -> Result<()> {
        self.record("can_reach_vm");
        let mut script = self.reach_script.lock().expect("lock");
        let reachable = if script.len() > 1 {
            script.pop_front().expect("non-empty script")
        } else {
            *script.front().unwrap_or(&false)
        };
        if reachable {
            Ok(())
        } else {
            anyhow::bail!("connection refused")
        }
    }

    async fn can_login_vm(&self) -> Result<()> {
        self.record("can_login_vm");
        if self.login_ok {
            Ok(())
        } else {
            anyhow::bail!("access is denied")
        }
    }

    async fn transfer_file(&self, _local: &Path, remote: &str) -> Result<()> {
        self.record(format!("transfer_file {remote}"));
        Ok(())
    }

    async fn run_command(&self, _command: &str) -> Result<()> {
        self.record("run_command");
        Ok(())
    }
}

// ── Guest operations double ───────────────────────────────────────────────────

#[derive(Default)]
pub struct GuestOpsSpy {
    pub calls: Mutex<Vec<String>>,
}

impl GuestOpsSpy {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

impl GuestOperations for GuestOpsSpy {
    async fn upload(&self, _local: &Path, guest_path: &str) -> Result<()> {
        self.calls
            .lock()
            .expect("lock")
            .push(format!("upload {guest_path}"));
        Ok(())
    }

    async fn run_program(&self, program: &str, _args: &str) -> Result<()> {
        self.calls
            .lock()
            .expect("lock")
            .push(format!("run_program {program}"));
        Ok(())
    }
}

// ── Unarchiver double ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UnzipSpy {
    pub calls: Mutex<Vec<(String, String)>>,
}

impl Unarchiver for UnzipSpy {
    async fn unzip(&self, archive: &str, dest: &str) -> Result<()> {
        self.calls
            .lock()
            .expect("lock")
            .push((archive.to_string(), dest.to_string()));
        Ok(())
    }
}

// ── File hasher double ────────────────────────────────────────────────────────

pub struct FixedHasher;

impl FileHasher for FixedHasher {
    fn sha256_file(&self, _path: &Path) -> Result<String> {
        Ok("cafebabe".to_string())
    }
}

// ── Messenger double ──────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingMessenger {
    pub lines: Mutex<Vec<String>>,
}

impl RecordingMessenger {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("lock").clone()
    }
}

impl Messenger for RecordingMessenger {
    fn step(&self, message: &str) {
        self.lines
            .lock()
            .expect("lock")
            .push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.lines
            .lock()
            .expect("lock")
            .push(format!("success: {message}"));
    }

    fn warn(&self, message: &str) {
        self.lines
            .lock()
            .expect("lock")
            .push(format!("warn: {message}"));
    }
}
