//! Chain client: the seam between the orchestrator and the target network.
//!
//! The pipeline talks to [`ChainClient`] only; [`HttpChainClient`] is the
//! JSON-RPC implementation. Tests substitute mocks to script failures and
//! count calls.

use std::future::Future;
use std::time::Duration;

use alloy_core::primitives::{Address, B256, Bytes, U256};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tokio::time::{Instant, sleep};

use crate::config::RuntimeConfig;
use crate::error::TxFailure;
use crate::rpc;

/// Transaction-level view of the target chain.
///
/// Submission and confirmation are split so the deployer can enforce strict
/// sequencing: a new transaction is never submitted while another from the
/// same account is awaiting confirmation.
pub trait ChainClient {
    /// Current balance of an account, in wei.
    fn balance_of(&self, address: Address) -> impl Future<Output = Result<U256>> + Send;

    /// Estimate gas for a contract-creation transaction.
    fn estimate_deployment_gas(&self, data: &Bytes) -> impl Future<Output = Result<u64>> + Send;

    /// Estimate gas for a call to a deployed contract.
    fn estimate_call_gas(
        &self,
        to: Address,
        data: &Bytes,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Submit a contract-creation transaction; returns the transaction hash.
    fn submit_deployment(
        &self,
        data: Bytes,
        gas_limit: u64,
    ) -> impl Future<Output = Result<B256>> + Send;

    /// Submit a call transaction to a deployed contract.
    fn submit_call(
        &self,
        to: Address,
        data: Bytes,
        gas_limit: u64,
    ) -> impl Future<Output = Result<B256>> + Send;

    /// Wait until a deployment transaction is confirmed and the contract code
    /// is live on chain; returns the contract address.
    ///
    /// Resolving before the code is observable would let an address into the
    /// record for a contract that never materialized.
    fn await_deployment(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<Address, TxFailure>> + Send;

    /// Wait until a call transaction is confirmed.
    fn await_confirmation(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<(), TxFailure>> + Send;
}

/// Relevant slice of an `eth_getTransactionReceipt` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxReceipt {
    status: Option<String>,
    contract_address: Option<Address>,
}

impl TxReceipt {
    fn succeeded(&self) -> bool {
        self.status.as_deref() == Some("0x1")
    }
}

/// JSON-RPC implementation of [`ChainClient`].
///
/// Transactions are submitted with `eth_sendTransaction` from the resolved
/// deployer account; the node holds the key. Confirmation waits poll at a
/// fixed interval and respect the configured timeout.
pub struct HttpChainClient {
    client: reqwest::Client,
    rpc_url: String,
    from: Address,
    confirmation_timeout: Duration,
}

impl HttpChainClient {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            rpc_url: config.rpc_url.to_string(),
            from: config.deployer,
            confirmation_timeout: config.confirmation_timeout,
        })
    }

    /// Poll for a transaction receipt until it appears or the timeout lapses.
    ///
    /// Transient RPC failures are retried; only the timeout is fatal here.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, TxFailure> {
        let started = Instant::now();

        loop {
            if started.elapsed() > self.confirmation_timeout {
                return Err(TxFailure::ConfirmationTimeout(self.confirmation_timeout));
            }

            match rpc::json_rpc_call::<Option<TxReceipt>>(
                &self.client,
                &self.rpc_url,
                "eth_getTransactionReceipt",
                vec![json!(tx_hash)],
            )
            .await
            {
                Ok(Some(receipt)) => return Ok(receipt),
                Ok(None) => {}
                Err(e) => {
                    tracing::trace!(error = %e, tx = %tx_hash, "Receipt poll failed, retrying...");
                }
            }

            sleep(rpc::POLL_INTERVAL).await;
        }
    }

    /// Poll until the chain reports live code at `address`.
    async fn wait_for_code(&self, address: Address, started: Instant) -> Result<(), TxFailure> {
        loop {
            if started.elapsed() > self.confirmation_timeout {
                return Err(TxFailure::ConfirmationTimeout(self.confirmation_timeout));
            }

            match rpc::json_rpc_call::<String>(
                &self.client,
                &self.rpc_url,
                "eth_getCode",
                vec![json!(address), json!("latest")],
            )
            .await
            {
                Ok(code) if code != "0x" && !code.is_empty() => return Ok(()),
                Ok(_) => {}
                Err(e) => {
                    tracing::trace!(error = %e, %address, "Code poll failed, retrying...");
                }
            }

            sleep(rpc::POLL_INTERVAL).await;
        }
    }
}

impl ChainClient for HttpChainClient {
    async fn balance_of(&self, address: Address) -> Result<U256> {
        let raw: String = rpc::json_rpc_call(
            &self.client,
            &self.rpc_url,
            "eth_getBalance",
            vec![json!(address), json!("latest")],
        )
        .await?;

        U256::from_str_radix(raw.trim_start_matches("0x"), 16)
            .with_context(|| format!("Failed to parse balance '{raw}'"))
    }

    async fn estimate_deployment_gas(&self, data: &Bytes) -> Result<u64> {
        let raw: String = rpc::json_rpc_call(
            &self.client,
            &self.rpc_url,
            "eth_estimateGas",
            vec![json!({ "from": self.from, "data": data })],
        )
        .await?;
        rpc::parse_hex_u64(&raw)
    }

    async fn estimate_call_gas(&self, to: Address, data: &Bytes) -> Result<u64> {
        let raw: String = rpc::json_rpc_call(
            &self.client,
            &self.rpc_url,
            "eth_estimateGas",
            vec![json!({ "from": self.from, "to": to, "data": data })],
        )
        .await?;
        rpc::parse_hex_u64(&raw)
    }

    async fn submit_deployment(&self, data: Bytes, gas_limit: u64) -> Result<B256> {
        rpc::json_rpc_call(
            &self.client,
            &self.rpc_url,
            "eth_sendTransaction",
            vec![json!({
                "from": self.from,
                "data": data,
                "gas": format!("0x{gas_limit:x}"),
            })],
        )
        .await
        .context("Failed to submit deployment transaction")
    }

    async fn submit_call(&self, to: Address, data: Bytes, gas_limit: u64) -> Result<B256> {
        rpc::json_rpc_call(
            &self.client,
            &self.rpc_url,
            "eth_sendTransaction",
            vec![json!({
                "from": self.from,
                "to": to,
                "data": data,
                "gas": format!("0x{gas_limit:x}"),
            })],
        )
        .await
        .context("Failed to submit authorization transaction")
    }

    async fn await_deployment(&self, tx_hash: B256) -> Result<Address, TxFailure> {
        let started = Instant::now();
        let receipt = self.wait_for_receipt(tx_hash).await?;

        if !receipt.succeeded() {
            return Err(TxFailure::Reverted);
        }

        let address = receipt
            .contract_address
            .ok_or_else(|| TxFailure::Transport(anyhow::anyhow!("receipt has no contract address")))?;

        self.wait_for_code(address, started).await?;
        Ok(address)
    }

    async fn await_confirmation(&self, tx_hash: B256) -> Result<(), TxFailure> {
        let receipt = self.wait_for_receipt(tx_hash).await?;
        if receipt.succeeded() {
            Ok(())
        } else {
            Err(TxFailure::Reverted)
        }
    }
}
