//! sonicid is the CLI for deploying and verifying the SonicID contract suite.

mod cli;

use std::collections::HashMap;

use anyhow::Result;
use clap::Parser;
use comfy_table::Table;

use cli::{Cli, Command, DeployArgs, VerifyArgs};
use sonicid_deploy::{
    ArtifactStore, ConfigResolver, DeploymentOutcome, DeploymentRecorder, HttpChainClient,
    RunStatus, SonicscanClient, VerificationOutcome, run_deployment, run_verification,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    match cli.command {
        Command::Deploy(args) => deploy(args).await,
        Command::Verify(args) => verify(args).await,
    }
}

async fn deploy(args: DeployArgs) -> Result<()> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let config = ConfigResolver::new(&env).resolve(&args.network)?;

    let client = HttpChainClient::new(&config)?;
    let artifacts = ArtifactStore::new(&args.artifacts);
    let recorder = DeploymentRecorder::new(&args.deployments);

    let outcome = run_deployment(&config, &env, &client, &artifacts, &recorder).await?;
    print_deploy_summary(&outcome);

    if config.auto_verify && outcome.record.status == RunStatus::Success {
        tracing::info!("Auto-verify enabled, verifying deployed contracts...");
        let service = SonicscanClient::new(&config)?;
        let outcomes = run_verification(&config.network_name(), &recorder, &service).await?;
        print_verify_summary(&outcomes);
    }

    Ok(())
}

async fn verify(args: VerifyArgs) -> Result<()> {
    let env: HashMap<String, String> = std::env::vars().collect();
    let config = ConfigResolver::new(&env).resolve(&args.network)?;

    let recorder = DeploymentRecorder::new(&args.deployments);
    let service = SonicscanClient::new(&config)?;

    let outcomes = run_verification(&config.network_name(), &recorder, &service).await?;
    print_verify_summary(&outcomes);

    Ok(())
}

fn print_deploy_summary(outcome: &DeploymentOutcome) {
    let mut table = Table::new();
    table.set_header(["Contract", "Address", "Transaction"]);
    for (name, contract) in &outcome.record.contracts {
        table.add_row([
            name.clone(),
            contract.address.to_string(),
            contract.tx_hash.to_string(),
        ]);
    }
    println!("{table}");
    println!("Deployment status: {}", outcome.record.status);
}

fn print_verify_summary(outcomes: &[(String, VerificationOutcome)]) {
    let mut table = Table::new();
    table.set_header(["Contract", "Verification"]);
    for (component, outcome) in outcomes {
        let result = match outcome {
            VerificationOutcome::Verified => "verified".to_string(),
            VerificationOutcome::AlreadyVerified => "already verified".to_string(),
            VerificationOutcome::Failed(reason) => format!("failed: {reason}"),
        };
        table.add_row([component.clone(), result]);
    }
    println!("{table}");
}
