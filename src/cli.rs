//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Prepare Windows VMs on vSphere for stemcell packaging
#[derive(Parser)]
#[command(
    name = "stemprep",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Enable WinRM on the target VM, run the stemcell automation, and
    /// wait for the guest to power itself off
    Construct(commands::construct::ConstructArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli { no_color, quiet, command } = self;
        match command {
            Command::Version => {
                commands::version::run();
                Ok(())
            }
            Command::Construct(args) => {
                let ctx = crate::output::OutputContext::new(no_color, quiet);
                commands::construct::run(&ctx, args).await
            }
        }
    }
}
