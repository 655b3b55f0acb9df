//! stemprep — prepare Windows VMs on vSphere for stemcell packaging.

use clap::Parser;

use stemprep::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
