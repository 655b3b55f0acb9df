//! External process execution with timeout and guaranteed kill.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default timeout for govc and pwsh invocations. Guest-side operations
/// (uploads, remote launches) can be slow, so this errs generous.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(60);

/// Abstracts process execution so infrastructure can be swapped or mocked.
///
/// The production implementation uses tokio; test doubles return canned
/// results without spawning processes.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with extra environment variables.
    ///
    /// Credentials are passed this way so they never appear in argv, where
    /// any local user could read them from the process table.
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds the
    /// timeout. On timeout the child is killed, not left orphaned.
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

/// Production `CommandRunner` on tokio.
///
/// The timeout arm kills the child explicitly: dropping the output future
/// alone does not terminate the OS process on all platforms.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> Result<Output> {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args);
        for (key, value) in envs {
            cmd.env(key, value);
        }
        wait_with_timeout(cmd, program, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args);
        wait_with_timeout(cmd, program, timeout).await
    }
}

/// Spawn `cmd`, drain stdout/stderr while waiting, and kill on timeout.
///
/// The pipes are read concurrently with `wait()`: a child that writes more
/// than the OS pipe buffer would otherwise block on write and never exit.
async fn wait_with_timeout(
    mut cmd: tokio::process::Command,
    program: &str,
    timeout: Duration,
) -> Result<Output> {
    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))?;

    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();

    tokio::select! {
        result = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                drain(&mut stdout_pipe),
                drain(&mut stderr_pipe),
            );
            Ok(Output {
                status: status.with_context(|| format!("waiting for {program}"))?,
                stdout,
                stderr,
            })
        } => result,
        () = tokio::time::sleep(timeout) => {
            let _ = child.kill().await;
            anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
        }
    }
}

async fn drain(pipe: &mut Option<impl AsyncRead + Unpin>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(handle) = pipe {
        let _ = handle.read_to_end(&mut buf).await;
    }
    buf
}
