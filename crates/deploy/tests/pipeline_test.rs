//! End-to-end pipeline tests against a scripted chain.
//!
//! These cover the orchestration properties: preflight rejects before any
//! chain call, partial wiring downgrades the run without failing it, fatal
//! deployment errors still leave a truthful record, and the verification
//! pipeline runs independently off the persisted record.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_core::primitives::{Address, B256, Bytes, U256};
use anyhow::Result;
use tempdir::TempDir;

use sonicid_deploy::error::TxFailure;
use sonicid_deploy::verify::{VerificationOutcome, VerificationRequest};
use sonicid_deploy::{
    ArtifactStore, ChainClient, ConfigResolver, DeploymentRecorder, RunStatus, RuntimeConfig,
    ValidationError, VerificationClient, run_deployment, run_verification,
};

// Anvil/Hardhat development account 0.
const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

const ONE_TOKEN_WEI: u64 = 1_000_000_000_000_000_000;

fn full_env() -> HashMap<String, String> {
    HashMap::from([
        ("PRIVATE_KEY".to_string(), DEV_KEY.to_string()),
        ("DEPLOYER_ADDRESS".to_string(), DEV_ADDRESS.to_string()),
    ])
}

fn resolve_config(env: &HashMap<String, String>) -> RuntimeConfig {
    ConfigResolver::new(env).resolve("sonic-testnet").unwrap()
}

/// Test fixture: artifacts and a deployments directory on disk.
struct Fixture {
    _artifacts_dir: TempDir,
    _records_dir: TempDir,
    artifacts: ArtifactStore,
    recorder: DeploymentRecorder,
    records_path: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let artifacts_dir = TempDir::new("sonicid-artifacts").unwrap();
        for name in ["IdentityRegistry", "ZKVerifier", "ReputationEngine"] {
            std::fs::write(
                artifacts_dir.path().join(format!("{name}.bin")),
                "6080604052600a600c",
            )
            .unwrap();
        }

        let records_dir = TempDir::new("sonicid-records").unwrap();
        let artifacts = ArtifactStore::new(artifacts_dir.path());
        let recorder = DeploymentRecorder::new(records_dir.path());
        let records_path = records_dir.path().to_path_buf();

        Self {
            _artifacts_dir: artifacts_dir,
            _records_dir: records_dir,
            artifacts,
            recorder,
            records_path,
        }
    }

    fn record_files(&self) -> Vec<String> {
        std::fs::read_dir(&self.records_path)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect()
    }
}

#[derive(Default)]
struct ChainState {
    balance_queries: u32,
    deployments: Vec<Bytes>,
    calls: Vec<(Address, Bytes)>,
}

/// Scripted chain: deployment n confirms at `Address::with_last_byte(n)`,
/// failures are injected per 1-based transaction index.
struct MockChain {
    balance: U256,
    revert_deployment: Option<usize>,
    revert_call: Option<usize>,
    state: Mutex<ChainState>,
}

impl MockChain {
    fn healthy() -> Self {
        Self {
            balance: U256::from(ONE_TOKEN_WEI),
            revert_deployment: None,
            revert_call: None,
            state: Mutex::new(ChainState::default()),
        }
    }

    fn transactions_submitted(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.deployments.len() + state.calls.len()
    }
}

impl ChainClient for MockChain {
    async fn balance_of(&self, _address: Address) -> Result<U256> {
        self.state.lock().unwrap().balance_queries += 1;
        Ok(self.balance)
    }

    async fn estimate_deployment_gas(&self, _data: &Bytes) -> Result<u64> {
        Ok(1_500_000)
    }

    async fn estimate_call_gas(&self, _to: Address, _data: &Bytes) -> Result<u64> {
        Ok(60_000)
    }

    async fn submit_deployment(&self, data: Bytes, _gas_limit: u64) -> Result<B256> {
        let mut state = self.state.lock().unwrap();
        state.deployments.push(data);
        Ok(B256::with_last_byte(state.deployments.len() as u8))
    }

    async fn submit_call(&self, to: Address, data: Bytes, _gas_limit: u64) -> Result<B256> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((to, data));
        Ok(B256::with_last_byte(state.calls.len() as u8))
    }

    async fn await_deployment(&self, tx_hash: B256) -> Result<Address, TxFailure> {
        let index = tx_hash[31] as usize;
        if self.revert_deployment == Some(index) {
            return Err(TxFailure::Reverted);
        }
        Ok(Address::with_last_byte(index as u8))
    }

    async fn await_confirmation(&self, tx_hash: B256) -> Result<(), TxFailure> {
        if self.revert_call == Some(tx_hash[31] as usize) {
            return Err(TxFailure::Reverted);
        }
        Ok(())
    }
}

/// Verification stub that reports every component as already verified.
struct AlreadyVerifiedService {
    calls: Mutex<Vec<String>>,
}

impl VerificationClient for AlreadyVerifiedService {
    async fn verify(&self, request: &VerificationRequest) -> VerificationOutcome {
        self.calls.lock().unwrap().push(request.component.clone());
        VerificationOutcome::AlreadyVerified
    }
}

#[tokio::test]
async fn test_full_success() {
    let fixture = Fixture::new();
    let env = full_env();
    let config = resolve_config(&env);
    let chain = MockChain::healthy();

    let outcome = run_deployment(&config, &env, &chain, &fixture.artifacts, &fixture.recorder)
        .await
        .unwrap();

    assert_eq!(outcome.record.status, RunStatus::Success);
    assert_eq!(outcome.record.contracts.len(), 3);
    assert!(!outcome.record.verification_completed);
    assert!(outcome.wiring.iter().all(|edge| edge.succeeded()));

    // Three deployments, three authorization calls.
    let state = chain.state.lock().unwrap();
    assert_eq!(state.deployments.len(), 3);
    assert_eq!(state.calls.len(), 3);

    // The persisted latest record matches what the run returned.
    let latest = fixture.recorder.load_latest("sonic-testnet").unwrap();
    assert_eq!(latest, outcome.record);
}

#[tokio::test]
async fn test_partial_wiring_is_not_fatal() {
    let fixture = Fixture::new();
    let env = full_env();
    let config = resolve_config(&env);
    let chain = MockChain {
        revert_call: Some(2),
        ..MockChain::healthy()
    };

    // A failed wiring edge must not produce an error: the process exits zero
    // and the record carries the PARTIAL status instead.
    let outcome = run_deployment(&config, &env, &chain, &fixture.artifacts, &fixture.recorder)
        .await
        .unwrap();

    assert_eq!(outcome.record.status, RunStatus::Partial);
    assert_eq!(outcome.record.contracts.len(), 3);

    let failures: Vec<_> = outcome
        .wiring
        .iter()
        .filter(|edge| !edge.succeeded())
        .collect();
    assert_eq!(failures.len(), 1);

    let latest = fixture.recorder.load_latest("sonic-testnet").unwrap();
    assert_eq!(latest.status, RunStatus::Partial);
}

#[tokio::test]
async fn test_missing_credential_makes_no_chain_call_and_no_record() {
    let fixture = Fixture::new();
    let env = full_env();
    let config = resolve_config(&env);

    let mut stripped = env.clone();
    stripped.remove("PRIVATE_KEY");

    let chain = MockChain::healthy();
    let err = run_deployment(&config, &stripped, &chain, &fixture.artifacts, &fixture.recorder)
        .await
        .unwrap_err();

    let validation = err.downcast_ref::<ValidationError>().unwrap();
    assert!(matches!(validation, ValidationError::MissingConfiguration(_)));

    // Rejected before any chain call; the deployments directory is untouched.
    assert_eq!(chain.state.lock().unwrap().balance_queries, 0);
    assert_eq!(chain.transactions_submitted(), 0);
    assert!(fixture.record_files().is_empty());
}

#[tokio::test]
async fn test_insufficient_balance_submits_nothing() {
    let fixture = Fixture::new();
    let env = full_env();
    let config = resolve_config(&env);

    // Below the default 0.1 token minimum, on a non-local network.
    let chain = MockChain {
        balance: U256::from(1_000u64),
        ..MockChain::healthy()
    };

    let err = run_deployment(&config, &env, &chain, &fixture.artifacts, &fixture.recorder)
        .await
        .unwrap_err();

    let validation = err.downcast_ref::<ValidationError>().unwrap();
    assert!(matches!(validation, ValidationError::InsufficientFunds { .. }));
    assert_eq!(chain.transactions_submitted(), 0);
    assert!(fixture.record_files().is_empty());
}

#[tokio::test]
async fn test_fatal_deployment_failure_still_records_confirmed_components() {
    let fixture = Fixture::new();
    let env = full_env();
    let config = resolve_config(&env);
    let chain = MockChain {
        revert_deployment: Some(2),
        ..MockChain::healthy()
    };

    let err = run_deployment(&config, &env, &chain, &fixture.artifacts, &fixture.recorder)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ZKVerifier"));

    // The record names the one confirmed component and the triggering error.
    let latest = fixture.recorder.load_latest("sonic-testnet").unwrap();
    assert_eq!(latest.status, RunStatus::Failed);
    assert_eq!(latest.contracts.len(), 1);
    assert!(latest.contracts.contains_key("IdentityRegistry"));
    assert!(latest.error.as_deref().unwrap().contains("ZKVerifier"));

    // Nothing was wired and the third deployment was never submitted.
    let state = chain.state.lock().unwrap();
    assert_eq!(state.deployments.len(), 2);
    assert!(state.calls.is_empty());
}

#[tokio::test]
async fn test_failure_on_first_deployment_leaves_failed_record_with_empty_map() {
    let fixture = Fixture::new();
    let env = full_env();
    let config = resolve_config(&env);
    let chain = MockChain {
        revert_deployment: Some(1),
        ..MockChain::healthy()
    };

    run_deployment(&config, &env, &chain, &fixture.artifacts, &fixture.recorder)
        .await
        .unwrap_err();

    let latest = fixture.recorder.load_latest("sonic-testnet").unwrap();
    assert_eq!(latest.status, RunStatus::Failed);
    assert!(latest.contracts.is_empty());
    assert!(latest.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_verification_runs_off_the_persisted_record() {
    let fixture = Fixture::new();
    let env = full_env();
    let config = resolve_config(&env);
    let chain = MockChain::healthy();

    run_deployment(&config, &env, &chain, &fixture.artifacts, &fixture.recorder)
        .await
        .unwrap();

    // Second, independent invocation: only the recorder's output is needed.
    let service = AlreadyVerifiedService {
        calls: Mutex::new(Vec::new()),
    };
    let outcomes = run_verification("sonic-testnet", &fixture.recorder, &service)
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|(_, outcome)| outcome.is_success()));
    assert_eq!(service.calls.lock().unwrap().len(), 3);

    let latest = fixture.recorder.load_latest("sonic-testnet").unwrap();
    assert!(latest.verification_completed);
    assert!(latest.verification_timestamp.is_some());
    assert_eq!(latest.status, RunStatus::Success);
}
