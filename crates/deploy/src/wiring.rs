//! Post-deployment authorization wiring.
//!
//! Each edge of the wiring graph is its own failure domain: a reverted
//! authorization is reported and the remaining edges still run. There is no
//! retry and no rollback; the caller downgrades the run to PARTIAL and leaves
//! remediation to the operator.

use std::collections::BTreeMap;

use alloy_core::primitives::{Address, B256};

use crate::chain::ChainClient;
use crate::config::RuntimeConfig;
use crate::error::{TxFailure, WiringError};
use crate::topology::{Component, WiringEdge};

/// Result of one wiring edge.
#[derive(Debug)]
pub struct EdgeOutcome {
    pub edge: WiringEdge,
    pub result: Result<B256, WiringError>,
}

impl EdgeOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Submit every authorization edge in order, one transaction at a time.
///
/// Returns one outcome per edge, in input order. Never fails as a whole.
pub async fn wire_components<C: ChainClient>(
    client: &C,
    config: &RuntimeConfig,
    edges: &[WiringEdge],
    addresses: &BTreeMap<Component, Address>,
) -> Vec<EdgeOutcome> {
    let mut outcomes = Vec::with_capacity(edges.len());

    for edge in edges {
        let result = wire_edge(client, config, edge, addresses).await;
        match &result {
            Ok(tx_hash) => {
                tracing::info!(
                    grantee = %edge.grantee,
                    target = %edge.target,
                    operation = %edge.operation,
                    tx = %tx_hash,
                    "Authorization granted"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Authorization failed, continuing with remaining edges");
            }
        }
        outcomes.push(EdgeOutcome { edge: *edge, result });
    }

    outcomes
}

async fn wire_edge<C: ChainClient>(
    client: &C,
    config: &RuntimeConfig,
    edge: &WiringEdge,
    addresses: &BTreeMap<Component, Address>,
) -> Result<B256, WiringError> {
    let fail = |reason: TxFailure| WiringError {
        grantee: edge.grantee.to_string(),
        target: edge.target.to_string(),
        operation: edge.operation.to_string(),
        reason,
    };

    let lookup = |component: Component| {
        addresses.get(&component).copied().ok_or_else(|| {
            fail(TxFailure::Transport(anyhow::anyhow!(
                "{component} has no confirmed address"
            )))
        })
    };

    let grantee = lookup(edge.grantee)?;
    let target = lookup(edge.target)?;
    let calldata = edge.operation.calldata(grantee);

    let gas_limit = match client.estimate_call_gas(target, &calldata).await {
        Ok(estimate) => estimate,
        Err(e) => {
            tracing::warn!(
                operation = %edge.operation,
                error = %e,
                fallback = config.transaction_gas_limit,
                "Gas estimation failed, falling back to the default gas limit"
            );
            config.transaction_gas_limit
        }
    };

    let tx_hash = client
        .submit_call(target, calldata, gas_limit)
        .await
        .map_err(|e| fail(TxFailure::Transport(e)))?;

    client
        .await_confirmation(tx_hash)
        .await
        .map_err(&fail)?;

    Ok(tx_hash)
}
