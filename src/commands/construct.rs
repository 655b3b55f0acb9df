//! The construct command — wires infrastructure and runs the preparation
//! sequence.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::watch;

use crate::application::ports::Hypervisor as _;
use crate::application::services::construct::orchestrator::{self, ConstructOptions};
use crate::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::domain::{GuestCredentials, PollConfig, PollError, SourceConfig};
use crate::infra::archive::GuestUnarchiver;
use crate::infra::fs::Sha256FileHasher;
use crate::infra::govc::{GovcClient, GovcGuestOperations};
use crate::infra::winrm::WinRmRemoteManager;
use crate::output::OutputContext;
use crate::output::messenger::TerminalMessenger;

/// Fixed cause attached to a failed vCenter login so operators can tell it
/// apart from a guest-level credential failure.
const VCENTER_LOGIN_CAUSE: &str =
    "cannot complete login due to an incorrect vCenter user name or password";

/// Default seconds between shutdown probes.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default shutdown wait window. Provisioning runs Windows updates, so
/// this errs very generous.
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 2 * 60 * 60;

/// Arguments for the construct command.
#[derive(Args)]
pub struct ConstructArgs {
    /// vCenter endpoint URL, e.g. <https://vcenter.example.com/sdk>
    #[arg(long)]
    pub vcenter_url: String,

    /// vCenter user name
    #[arg(long)]
    pub vcenter_username: String,

    /// vCenter password
    #[arg(long, env = "STEMPREP_VCENTER_PASSWORD", hide_env_values = true)]
    pub vcenter_password: String,

    /// Path to a CA bundle for the vCenter TLS endpoint
    #[arg(long)]
    pub vcenter_ca_certs: Option<PathBuf>,

    /// Full inventory path of the target VM, e.g. /dc/vm/folder/vm-name
    #[arg(long)]
    pub vm_inventory_path: String,

    /// IP address of the guest OS
    #[arg(long)]
    pub vm_ip: String,

    /// Guest OS user name
    #[arg(long)]
    pub vm_username: String,

    /// Guest OS password
    #[arg(long, env = "STEMPREP_GUEST_PASSWORD", hide_env_values = true)]
    pub vm_password: String,

    /// Seconds between shutdown probes
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval: u64,

    /// Seconds to wait for the guest to power itself off
    #[arg(long, default_value_t = DEFAULT_SHUTDOWN_TIMEOUT_SECS)]
    pub shutdown_timeout: u64,
}

impl ConstructArgs {
    fn into_parts(self) -> (SourceConfig, u64, u64) {
        let config = SourceConfig {
            vcenter_url: self.vcenter_url,
            vcenter_username: self.vcenter_username,
            vcenter_password: self.vcenter_password,
            ca_cert_file: self.vcenter_ca_certs,
            vm_inventory_path: self.vm_inventory_path,
            guest_ip: self.vm_ip,
            guest_credentials: GuestCredentials::new(self.vm_username, self.vm_password),
        };
        (config, self.poll_interval, self.shutdown_timeout)
    }
}

/// Run the construct command.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a local archive is
/// missing, vCenter or the guest rejects us, or the guest never powers
/// off within the configured window.
pub async fn run(ctx: &OutputContext, args: ConstructArgs) -> Result<()> {
    let (config, interval_secs, timeout_secs) = args.into_parts();
    config.validate()?;
    let poll = PollConfig::new(
        Duration::from_secs(interval_secs),
        Duration::from_secs(timeout_secs),
    )?;

    let working_dir = std::env::current_dir().context("resolving the working directory")?;
    orchestrator::preflight(&working_dir)?;

    ctx.header("construct");
    ctx.kv("vm", &config.vm_inventory_path);
    ctx.kv("guest ip", &config.guest_ip);

    let runner = TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT);
    let client = GovcClient::new(&runner, &config);
    client.check_version().await?;
    client.login().await.context(VCENTER_LOGIN_CAUSE)?;
    let vm = client.find_vm(&config.vm_inventory_path).await?;

    let guest_ops = GovcGuestOperations::new(&client, vm, &config.guest_credentials);
    let unarchiver = GuestUnarchiver::new(&guest_ops);
    let remote = WinRmRemoteManager::new(
        &runner,
        config.guest_ip.clone(),
        config.guest_credentials.clone(),
    );
    let messenger = TerminalMessenger::new(ctx);

    // Ctrl-C cancels the shutdown wait; the sender lives in the signal
    // task for the rest of the process. A dropped sender reads as
    // cancellation, so on a failed signal hook the task parks instead of
    // exiting.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = cancel_tx.send(true);
            }
            Err(_) => std::future::pending::<()>().await,
        }
    });

    let opts = ConstructOptions { working_dir, poll };
    let result = orchestrator::prepare_vm(
        &remote,
        &guest_ops,
        &unarchiver,
        &Sha256FileHasher,
        &messenger,
        cancel_rx,
        &opts,
    )
    .await;
    drop(messenger);

    match result {
        Ok(()) => {
            ctx.success("the guest vm is ready for image capture");
            Ok(())
        }
        Err(err) => match err.cause.downcast_ref::<PollError>() {
            Some(PollError::TimedOut(window)) => {
                anyhow::bail!(
                    "the guest vm did not power off within {}s; \
                     it may still be running the automation script",
                    window.as_secs()
                )
            }
            Some(PollError::Canceled) => {
                anyhow::bail!("construct was cancelled before the guest powered off")
            }
            _ => Err(err.into()),
        },
    }
}
