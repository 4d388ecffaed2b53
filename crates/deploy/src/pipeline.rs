//! The single-process deployment pipeline.
//!
//! Preflight, deploy, wire, record - in that order, with the record persisted
//! at every phase boundary so a crash mid-run still leaves a truthful file
//! behind. Validation failures abort before a record exists.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;

use crate::artifacts::ArtifactStore;
use crate::chain::ChainClient;
use crate::config::RuntimeConfig;
use crate::deployer::{Deployer, address_map};
use crate::preflight::PreflightValidator;
use crate::record::{DeploymentRecord, DeploymentRecorder, RunStatus};
use crate::topology::{deployment_sequence, wiring_graph};
use crate::wiring::{EdgeOutcome, wire_components};

/// Everything a completed (or partially completed) run produced.
#[derive(Debug)]
pub struct DeploymentOutcome {
    pub record: DeploymentRecord,
    pub wiring: Vec<EdgeOutcome>,
}

/// Run the full orchestration: preflight, deployment, wiring, recording.
///
/// Returns an error only for fatal failures (validation, deployment). A
/// wiring failure is not fatal: the run completes with status PARTIAL and the
/// process exits zero.
pub async fn run_deployment<C: ChainClient>(
    config: &RuntimeConfig,
    env: &HashMap<String, String>,
    client: &C,
    artifacts: &ArtifactStore,
    recorder: &DeploymentRecorder,
) -> Result<DeploymentOutcome> {
    // All three preflight checks must pass before anything is submitted.
    PreflightValidator::validate_environment(env)?;
    PreflightValidator::validate_network(&config.network_name())?;
    let preflight = PreflightValidator::new(config);
    let balance = preflight.validate_balance(client, config.deployer).await?;
    preflight.confirmation_pause().await;

    tracing::info!(
        network = %config.network,
        chain_id = config.chain_id,
        deployer = %config.deployer,
        "Starting SonicID deployment..."
    );

    let started = std::time::Instant::now();
    let mut record = DeploymentRecord::start(config, balance, Utc::now());

    let confirmed = match Deployer::new(config, artifacts)
        .deploy_all(client, &deployment_sequence())
        .await
    {
        Ok(confirmed) => confirmed,
        Err(e) => {
            // Persist whatever the chain confirmed before the failure.
            record.set_components(&e.confirmed);
            record.status = RunStatus::Failed;
            record.error = Some(e.to_string());
            record.duration_ms = started.elapsed().as_millis() as u64;
            recorder.record(&record)?;
            return Err(e.into());
        }
    };

    // Phase boundary: the components are live. If the process dies during
    // wiring, the record already names them.
    record.set_components(&confirmed);
    record.status = RunStatus::Partial;
    record.duration_ms = started.elapsed().as_millis() as u64;
    recorder.record(&record)?;

    let wiring = wire_components(client, config, &wiring_graph(), &address_map(&confirmed)).await;

    record.status = if wiring.iter().all(EdgeOutcome::succeeded) {
        RunStatus::Success
    } else {
        RunStatus::Partial
    };
    record.duration_ms = started.elapsed().as_millis() as u64;
    recorder.record(&record)?;

    match record.status {
        RunStatus::Success => {
            tracing::info!("SonicID deployment completed successfully");
        }
        _ => {
            let failed = wiring.iter().filter(|outcome| !outcome.succeeded()).count();
            tracing::warn!(
                failed_edges = failed,
                "Components deployed but wiring is incomplete - manual remediation required"
            );
        }
    }

    Ok(DeploymentOutcome { record, wiring })
}
