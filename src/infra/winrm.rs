//! WinRM access to the guest through PowerShell remoting.
//!
//! Reachability is probed with a plain TCP connect; everything else shells
//! out to `pwsh` through a [`CommandRunner`]. The WinRM wire protocol
//! itself stays PowerShell's problem.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::RemoteManager;
use crate::command_runner::CommandRunner;
use crate::domain::GuestCredentials;

/// WinRM HTTP listener port.
const WINRM_PORT: u16 = 5985;

/// TCP connect timeout for the reachability probe.
const REACH_TIMEOUT: Duration = Duration::from_secs(3);

/// Env var the guest password travels through on its way into pwsh.
const PASSWORD_ENV: &str = "STEMPREP_GUEST_PASSWORD";

/// `RemoteManager` backed by PowerShell remoting over WinRM.
///
/// Sessions are established per call — nothing here survives a guest
/// reboot, which is exactly what the shutdown wait relies on.
pub struct WinRmRemoteManager<'a, R: CommandRunner> {
    runner: &'a R,
    host: String,
    port: u16,
    credentials: GuestCredentials,
}

impl<'a, R: CommandRunner> WinRmRemoteManager<'a, R> {
    #[must_use]
    pub fn new(runner: &'a R, host: impl Into<String>, credentials: GuestCredentials) -> Self {
        Self {
            runner,
            host: host.into(),
            port: WINRM_PORT,
            credentials,
        }
    }

    #[cfg(test)]
    fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Prefix `body` with the credential preamble shared by every pwsh
    /// invocation. The password is read from the environment, never
    /// spliced into the script text.
    fn session_script(&self, body: &str) -> String {
        format!(
            "$pw = ConvertTo-SecureString -AsPlainText -Force $env:{PASSWORD_ENV}; \
             $cred = New-Object System.Management.Automation.PSCredential('{user}', $pw); \
             {body}",
            user = self.credentials.username,
        )
    }

    async fn pwsh(&self, script: &str) -> Result<std::process::Output> {
        self.runner
            .run_with_env(
                "pwsh",
                &["-NoProfile", "-NonInteractive", "-Command", script],
                &[(PASSWORD_ENV, self.credentials.password.as_str())],
            )
            .await
    }
}

impl<R: CommandRunner> RemoteManager for WinRmRemoteManager<'_, R> {
    async fn can_reach_vm(&self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let reachable = tokio::task::spawn_blocking(move || {
            let addr: std::net::SocketAddr = addr
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid guest address {addr}: {e}"))?;
            Ok::<bool, anyhow::Error>(
                std::net::TcpStream::connect_timeout(&addr, REACH_TIMEOUT).is_ok(),
            )
        })
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking panicked: {e}"))??;
        if reachable {
            Ok(())
        } else {
            anyhow::bail!(
                "guest {host} is unreachable on port {port}",
                host = self.host,
                port = self.port
            )
        }
    }

    async fn can_login_vm(&self) -> Result<()> {
        let script = self.session_script(&format!(
            "Test-WSMan -ComputerName {host} -Credential $cred -Authentication Negotiate | Out-Null",
            host = self.host,
        ));
        let output = self.pwsh(&script).await.context("pwsh Test-WSMan")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("guest login probe failed: {}", stderr.trim());
        }
        Ok(())
    }

    async fn transfer_file(&self, local: &Path, remote: &str) -> Result<()> {
        let local_str = local.to_str().context("local path is not valid UTF-8")?;
        let script = self.session_script(&format!(
            "$s = New-PSSession -ComputerName {host} -Credential $cred; \
             Copy-Item -ToSession $s -Path '{local_str}' -Destination '{remote}'; \
             Remove-PSSession $s",
            host = self.host,
        ));
        let output = self.pwsh(&script).await.context("pwsh Copy-Item")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("transferring {local_str} to {remote}: {}", stderr.trim());
        }
        Ok(())
    }

    async fn run_command(&self, command: &str) -> Result<()> {
        // Launched detached via Start-Process: the command is expected to
        // power the guest off, which would sever a session still waiting
        // on it.
        let escaped = command.replace('\'', "''");
        let script = self.session_script(&format!(
            "$cmd = '{escaped}'; \
             Invoke-Command -ComputerName {host} -Credential $cred -ScriptBlock \
             {{ Start-Process -FilePath powershell.exe -ArgumentList \
             @('-NoProfile', '-ExecutionPolicy', 'Bypass', '-Command', $using:cmd) }}",
            host = self.host,
        ));
        let output = self.pwsh(&script).await.context("pwsh Invoke-Command")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("launching command inside the guest: {}", stderr.trim());
        }
        Ok(())
    }
}
