//! vCenter access through the govc CLI.
//!
//! Every vSphere call shells out to `govc` through a [`CommandRunner`],
//! with credentials carried in `GOVC_*` environment variables so they never
//! appear in argv. JSON output is parsed with serde.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::{GuestOperations, Hypervisor};
use crate::command_runner::CommandRunner;
use crate::domain::{GuestCredentials, SourceConfig, VmHandle};

/// Oldest govc release whose guest-operations flags this adapter is known
/// to work with.
const GOVC_MIN_VERSION: semver::Version = semver::Version::new(0, 30, 0);

/// vCenter session driven by the govc CLI.
///
/// Generic over `R: CommandRunner` so tests can inject a scripted runner
/// without spawning real processes.
pub struct GovcClient<'a, R: CommandRunner> {
    runner: &'a R,
    url: String,
    username: String,
    password: String,
    ca_cert: Option<String>,
}

impl<'a, R: CommandRunner> GovcClient<'a, R> {
    #[must_use]
    pub fn new(runner: &'a R, config: &SourceConfig) -> Self {
        Self {
            runner,
            url: config.vcenter_url.clone(),
            username: config.vcenter_username.clone(),
            password: config.vcenter_password.clone(),
            ca_cert: config
                .ca_cert_file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }

    fn envs(&self) -> Vec<(&str, &str)> {
        let mut envs = vec![
            ("GOVC_URL", self.url.as_str()),
            ("GOVC_USERNAME", self.username.as_str()),
            ("GOVC_PASSWORD", self.password.as_str()),
        ];
        if let Some(ca) = &self.ca_cert {
            envs.push(("GOVC_TLS_CA_CERTS", ca.as_str()));
        }
        envs
    }

    async fn govc(&self, args: &[&str]) -> Result<std::process::Output> {
        self.runner.run_with_env("govc", args, &self.envs()).await
    }

    /// Reject govc releases older than [`GOVC_MIN_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns an error if govc is absent from the PATH or too old.
    pub async fn check_version(&self) -> Result<()> {
        let output = self
            .runner
            .run("govc", &["version"])
            .await
            .context("govc is not available on the PATH")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        // `govc version` prints e.g. "govc 0.34.2".
        if let Some(raw) = stdout.split_whitespace().nth(1)
            && let Ok(version) = semver::Version::parse(raw.trim_start_matches('v'))
            && version < GOVC_MIN_VERSION
        {
            anyhow::bail!("govc {version} is too old; {GOVC_MIN_VERSION} or newer is required");
        }
        Ok(())
    }
}

impl<R: CommandRunner> Hypervisor for GovcClient<'_, R> {
    async fn login(&self) -> Result<()> {
        let output = self.govc(&["about"]).await.context("govc about")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("vCenter login failed: {}", stderr.trim());
        }
        Ok(())
    }

    async fn find_vm(&self, inventory_path: &str) -> Result<VmHandle> {
        let output = self
            .govc(&["vm.info", "-json", inventory_path])
            .await
            .context("govc vm.info")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("looking up {inventory_path}: {}", stderr.trim());
        }
        let info: VmInfo =
            serde_json::from_slice(&output.stdout).context("parsing govc vm.info output")?;
        let vm = info
            .virtual_machines
            .first()
            .with_context(|| format!("no VM found at {inventory_path}"))?;
        Ok(VmHandle::new(&vm.moref.value))
    }
}

// ── vm.info JSON schema (the subset we read) ──────────────────────────────────

#[derive(Deserialize)]
struct VmInfo {
    #[serde(rename = "virtualMachines", alias = "VirtualMachines", default)]
    virtual_machines: Vec<VmEntry>,
}

#[derive(Deserialize)]
struct VmEntry {
    #[serde(rename = "self", alias = "Self")]
    moref: ManagedRef,
}

#[derive(Deserialize)]
struct ManagedRef {
    #[serde(rename = "value", alias = "Value")]
    value: String,
}

// ── Guest operations ──────────────────────────────────────────────────────────

/// Guest-operations channel for one VM, authenticated with guest
/// credentials. Lives for a single construct run.
pub struct GovcGuestOperations<'a, R: CommandRunner> {
    client: &'a GovcClient<'a, R>,
    vm: VmHandle,
    guest_login: String,
}

impl<'a, R: CommandRunner> GovcGuestOperations<'a, R> {
    #[must_use]
    pub fn new(client: &'a GovcClient<'a, R>, vm: VmHandle, creds: &GuestCredentials) -> Self {
        Self {
            client,
            vm,
            guest_login: format!("{}:{}", creds.username, creds.password),
        }
    }
}

impl<R: CommandRunner> GuestOperations for GovcGuestOperations<'_, R> {
    async fn upload(&self, local: &Path, guest_path: &str) -> Result<()> {
        let local_str = local.to_str().context("local path is not valid UTF-8")?;
        let output = self
            .client
            .govc(&[
                "guest.upload",
                "-vm.moref",
                self.vm.as_str(),
                "-l",
                &self.guest_login,
                local_str,
                guest_path,
            ])
            .await
            .context("govc guest.upload")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("uploading {local_str} to {guest_path}: {}", stderr.trim());
        }
        Ok(())
    }

    async fn run_program(&self, program: &str, args: &str) -> Result<()> {
        let output = self
            .client
            .govc(&[
                "guest.run",
                "-vm.moref",
                self.vm.as_str(),
                "-l",
                &self.guest_login,
                program,
                args,
            ])
            .await
            .context("govc guest.run")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("running {program} inside the guest: {}", stderr.trim());
        }
        Ok(())
    }
}
