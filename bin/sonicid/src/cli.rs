use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "sonicid")]
#[command(author, version, about = "Deploy and verify the SonicID contract suite")]
pub struct Cli {
    /// The verbosity level.
    #[arg(
        short,
        long,
        global = true,
        env = "SONICID_VERBOSITY",
        default_value_t = LevelFilter::INFO
    )]
    pub verbosity: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy the contract suite and wire the authorizations.
    Deploy(DeployArgs),
    /// Verify the latest recorded deployment against the network explorer.
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct DeployArgs {
    /// Target network (local, sonic-testnet, sonic).
    #[arg(short, long, env = "SONICID_NETWORK", default_value = "sonic-testnet")]
    pub network: String,

    /// Directory holding compiled creation bytecode (one <Contract>.bin per component).
    #[arg(long, env = "SONICID_ARTIFACTS", default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Directory where deployment records are written.
    #[arg(long, env = "SONICID_DEPLOYMENTS", default_value = "deployments")]
    pub deployments: PathBuf,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Target network (local, sonic-testnet, sonic).
    #[arg(short, long, env = "SONICID_NETWORK", default_value = "sonic-testnet")]
    pub network: String,

    /// Directory where deployment records are read from.
    #[arg(long, env = "SONICID_DEPLOYMENTS", default_value = "deployments")]
    pub deployments: PathBuf,
}
