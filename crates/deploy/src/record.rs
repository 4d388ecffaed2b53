//! Durable deployment records.
//!
//! Every attempt that got past preflight leaves a record: a timestamp-named
//! snapshot per attempt, plus a per-network "latest" pointer that always
//! contains an exact copy of the newest attempt's record. The latest pointer
//! is updated with a write-then-rename so concurrent readers never observe a
//! half-written file. Snapshots are append-only history; only the Verifier
//! ever touches the latest pointer after the run, to stamp verification.

use std::collections::BTreeMap;
use std::path::PathBuf;

use alloy_core::primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RuntimeConfig;
use crate::deployer::DeployedComponent;

/// Final state of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RunStatus {
    /// All components deployed and all wiring edges confirmed.
    Success,
    /// Components deployed but at least one wiring edge failed. Manual
    /// remediation required; nothing is rolled back.
    Partial,
    /// The deployment sequence itself failed.
    Failed,
}

/// Per-component entry in the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub address: Address,
    pub tx_hash: B256,
    /// Gas limit the deployment was submitted with.
    pub gas_limit: u64,
}

/// The persisted shape of one deployment attempt.
///
/// Field names are stable once written; readers depend on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub network: String,
    pub chain_id: u64,
    pub timestamp: DateTime<Utc>,
    pub deployer: Address,
    /// Deployer balance at the start of the run, in wei.
    pub deployer_balance: U256,
    pub duration_ms: u64,
    pub status: RunStatus,
    pub contracts: BTreeMap<String, ContractRecord>,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub verification_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_timestamp: Option<DateTime<Utc>>,
}

impl DeploymentRecord {
    /// Start a record for a fresh attempt. Status is pessimistically FAILED
    /// until the run proves otherwise.
    pub fn start(config: &RuntimeConfig, deployer_balance: U256, timestamp: DateTime<Utc>) -> Self {
        Self {
            network: config.network_name(),
            chain_id: config.chain_id,
            timestamp,
            deployer: config.deployer,
            deployer_balance,
            duration_ms: 0,
            status: RunStatus::Failed,
            contracts: BTreeMap::new(),
            environment: config.environment.clone(),
            error: None,
            verification_completed: false,
            verification_timestamp: None,
        }
    }

    /// Fill the contract map from confirmed deployments.
    pub fn set_components(&mut self, confirmed: &[DeployedComponent]) {
        self.contracts = confirmed
            .iter()
            .map(|deployed| {
                (
                    deployed.component.to_string(),
                    ContractRecord {
                        address: deployed.address,
                        tx_hash: deployed.tx_hash,
                        gas_limit: deployed.gas_limit,
                    },
                )
            })
            .collect();
    }
}

/// Persists deployment records under a directory (one snapshot per attempt,
/// one latest pointer per network).
#[derive(Debug, Clone)]
pub struct DeploymentRecorder {
    dir: PathBuf,
}

impl DeploymentRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the latest pointer for `network`.
    pub fn latest_path(&self, network: &str) -> PathBuf {
        self.dir.join(format!("{network}-latest.json"))
    }

    /// Snapshot path for an attempt. Stable for a given record, so recording
    /// again at the next phase boundary overwrites the same snapshot.
    pub fn snapshot_path(&self, record: &DeploymentRecord) -> PathBuf {
        self.dir.join(format!(
            "{}-{}.json",
            record.network,
            record.timestamp.format("%Y%m%d-%H%M%S")
        ))
    }

    /// Persist `record`: write the snapshot, then atomically update the
    /// latest pointer with identical bytes.
    pub fn record(&self, record: &DeploymentRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create deployments directory {}", self.dir.display())
        })?;

        let json = serde_json::to_string_pretty(record)
            .context("Failed to serialize deployment record")?;

        let snapshot = self.snapshot_path(record);
        std::fs::write(&snapshot, &json)
            .with_context(|| format!("Failed to write snapshot {}", snapshot.display()))?;

        self.write_latest(&record.network, &json)?;

        tracing::info!(path = %snapshot.display(), "Deployment record saved");
        Ok(snapshot)
    }

    /// Load the latest record for `network`.
    pub fn load_latest(&self, network: &str) -> Result<DeploymentRecord> {
        let path = self.latest_path(network);
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "No deployment data found for {network} (expected {})",
                path.display()
            )
        })?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deployment record {}", path.display()))
    }

    /// Stamp the latest record as verified, in place. The historical snapshot
    /// is left untouched.
    pub fn mark_verified(
        &self,
        network: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<DeploymentRecord> {
        let mut record = self.load_latest(network)?;
        record.verification_completed = true;
        record.verification_timestamp = Some(timestamp);

        let json = serde_json::to_string_pretty(&record)
            .context("Failed to serialize deployment record")?;
        self.write_latest(network, &json)?;

        tracing::info!(network, "Deployment record updated with verification status");
        Ok(record)
    }

    /// Write the latest pointer via a temp file and an atomic rename, so a
    /// reader never sees a partially written pointer.
    fn write_latest(&self, network: &str, json: &str) -> Result<()> {
        let latest = self.latest_path(network);
        let tmp = self.dir.join(format!("{network}-latest.json.tmp"));

        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &latest)
            .with_context(|| format!("Failed to move {} into place", tmp.display()))?;

        Ok(())
    }
}
