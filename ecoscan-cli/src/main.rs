//! ecoscan - environmental conditions around a location from the command line.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ecoscan",
    version,
    about = "Air quality, temperature, traffic pollution, green spaces and infrastructure around a location"
)]
struct Cli {
    /// TOML configuration file (API keys, endpoints, thresholds)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: ecoscan_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    ecoscan_cmd::run(cli.command, cli.config.as_deref()).await
}
