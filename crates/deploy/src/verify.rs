//! Source verification against the network's explorer.
//!
//! Runs as its own pipeline invocation: it reads the latest deployment record
//! and submits each recorded component to the verification service. Each
//! component is an independent failure domain, and a component the service
//! already knows is treated as success.

use std::future::Future;
use std::time::Duration;

use alloy_core::primitives::Address;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tokio::time::sleep;

use crate::config::RuntimeConfig;
use crate::record::{DeploymentRecord, DeploymentRecorder};
use crate::topology::{ConstructorArg, deployment_sequence, encode_constructor_args};

/// Delay between successive verification requests, to stay under the
/// explorer's rate limits. Independent of the preflight confirmation pause.
pub const VERIFICATION_PACING: Duration = Duration::from_secs(5);

/// Typed result of one verification request. The orchestrator never inspects
/// service response text; any translation happens inside the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The service accepted and verified the submission.
    Verified,
    /// The service already knew this contract. Success, nothing to do.
    AlreadyVerified,
    /// The request failed; the reason is reported but does not abort the batch.
    Failed(String),
}

impl VerificationOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, VerificationOutcome::Failed(_))
    }
}

/// What gets submitted for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub component: String,
    pub address: Address,
    /// ABI-encoded constructor arguments, hex without a 0x prefix.
    pub constructor_args: String,
}

/// The verification-service seam.
pub trait VerificationClient {
    fn verify(
        &self,
        request: &VerificationRequest,
    ) -> impl Future<Output = VerificationOutcome> + Send;
}

/// Rebuild the verification requests for every component in the record, in
/// deployment order. Constructor arguments are resolved from the recorded
/// addresses, exactly as they were at deployment time.
pub fn build_requests(record: &DeploymentRecord) -> Vec<VerificationRequest> {
    deployment_sequence()
        .iter()
        .filter_map(|spec| {
            let name = spec.component.to_string();
            let entry = record.contracts.get(&name)?;

            let args: Vec<Address> = spec
                .constructor_args
                .iter()
                .filter_map(|arg| match arg {
                    ConstructorArg::Address(address) => Some(*address),
                    ConstructorArg::Deployed(dependency) => record
                        .contracts
                        .get(&dependency.to_string())
                        .map(|c| c.address),
                })
                .collect();

            Some(VerificationRequest {
                component: name,
                address: entry.address,
                constructor_args: hex::encode(encode_constructor_args(&args)),
            })
        })
        .collect()
}

/// Verify every component recorded in the latest record for `network`.
///
/// Individual failures are logged and do not abort the batch. On completion
/// the latest record is stamped with a verification timestamp; the historical
/// snapshot is untouched.
pub async fn run_verification<V: VerificationClient>(
    network: &str,
    recorder: &DeploymentRecorder,
    client: &V,
) -> Result<Vec<(String, VerificationOutcome)>> {
    let record = recorder.load_latest(network)?;
    let requests = build_requests(&record);
    anyhow::ensure!(
        !requests.is_empty(),
        "the latest record for {network} has no contracts to verify"
    );

    tracing::info!(network, count = requests.len(), "Starting contract verification...");

    let mut outcomes = Vec::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        if index > 0 {
            sleep(VERIFICATION_PACING).await;
        }

        let outcome = client.verify(request).await;
        match &outcome {
            VerificationOutcome::Verified => {
                tracing::info!(component = %request.component, "Verified");
            }
            VerificationOutcome::AlreadyVerified => {
                tracing::info!(component = %request.component, "Already verified");
            }
            VerificationOutcome::Failed(reason) => {
                tracing::warn!(
                    component = %request.component,
                    reason,
                    "Verification failed, continuing with remaining components"
                );
            }
        }
        outcomes.push((request.component.clone(), outcome));
    }

    recorder.mark_verified(network, Utc::now())?;
    Ok(outcomes)
}

/// Etherscan-compatible response envelope.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    result: String,
}

/// Map the explorer's response semantics onto the typed outcome. The
/// already-verified translation lives here and nowhere else.
fn classify_response(status: &str, result: &str) -> VerificationOutcome {
    if status == "1" {
        VerificationOutcome::Verified
    } else if result.to_lowercase().contains("already verified") {
        VerificationOutcome::AlreadyVerified
    } else {
        VerificationOutcome::Failed(result.to_string())
    }
}

/// [`VerificationClient`] backed by the network's Sonicscan API.
pub struct SonicscanClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl SonicscanClient {
    /// Build a client for the configured network. Fails if the network has no
    /// verification service (the local chain).
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let api_url = config
            .network
            .explorer_api_url()
            .with_context(|| format!("{} has no verification service", config.network))?;

        let http = reqwest::Client::builder()
            .timeout(config.verification_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

impl VerificationClient for SonicscanClient {
    async fn verify(&self, request: &VerificationRequest) -> VerificationOutcome {
        let mut form: Vec<(&str, String)> = vec![
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("contractaddress", request.address.to_string()),
            ("contractname", request.component.clone()),
            // Etherscan-compatible field name, including their spelling.
            ("constructorArguements", request.constructor_args.clone()),
        ];
        if let Some(key) = &self.api_key {
            form.push(("apikey", key.clone()));
        }

        let response = match self.http.post(&self.api_url).form(&form).send().await {
            Ok(response) => response,
            Err(e) => return VerificationOutcome::Failed(format!("request failed: {e}")),
        };

        match response.json::<ExplorerResponse>().await {
            Ok(body) => classify_response(&body.status, &body.result),
            Err(e) => VerificationOutcome::Failed(format!("malformed response: {e}")),
        }
    }
}
