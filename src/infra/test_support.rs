//! Shared test doubles for infra adapters: a scripted `CommandRunner` and
//! cross-platform `Output` constructors.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;

use crate::command_runner::CommandRunner;

/// Build an `ExitStatus` from a logical exit code (0 = success).
///
/// On Unix the raw wait-status encodes the exit code in bits 8–15.
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(code: i32, stderr: &[u8]) -> Output {
    Output {
        status: exit_status(code),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

/// One recorded invocation: program, args, and any env vars passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

/// `CommandRunner` double that records every call and replays scripted
/// outputs in order. Once the script is exhausted it keeps returning
/// empty successes.
#[derive(Default)]
pub struct ScriptedRunner {
    pub calls: Mutex<Vec<RecordedCall>>,
    pub outputs: Mutex<VecDeque<Result<Output>>>,
}

impl ScriptedRunner {
    pub fn with_outputs(outputs: Vec<Result<Output>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outputs: Mutex::new(outputs.into_iter().collect()),
        }
    }

    fn record_and_reply(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> Result<Output> {
        self.calls.lock().expect("lock").push(RecordedCall {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self.outputs
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| Ok(ok_output(b"")))
    }

    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock").clone()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.record_and_reply(program, args, &[])
    }

    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> Result<Output> {
        self.record_and_reply(program, args, envs)
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.record_and_reply(program, args, &[])
    }
}
