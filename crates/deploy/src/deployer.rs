//! Sequential component deployment.
//!
//! Components deploy one at a time in the fixed topology order. The signing
//! account never has two transactions in flight: each deployment is submitted
//! only after the previous one is confirmed, which also guarantees that any
//! constructor argument referencing an earlier component resolves to a
//! confirmed address.

use std::collections::BTreeMap;

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::anyhow;

use crate::artifacts::ArtifactStore;
use crate::chain::ChainClient;
use crate::config::RuntimeConfig;
use crate::error::{DeploymentError, TxFailure};
use crate::topology::{Component, ComponentSpec, ConstructorArg, encode_constructor_args};

/// A component whose deployment the chain has confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedComponent {
    pub component: Component,
    /// Address of the live contract. Recorded only after the chain reports
    /// code at this address.
    pub address: Address,
    pub tx_hash: B256,
    /// Gas limit the deployment was submitted with (estimate or fallback).
    pub gas_limit: u64,
}

/// Map confirmed components by name, for wiring and records.
pub fn address_map(confirmed: &[DeployedComponent]) -> BTreeMap<Component, Address> {
    confirmed
        .iter()
        .map(|deployed| (deployed.component, deployed.address))
        .collect()
}

/// Issues the ordered sequence of component deployments.
pub struct Deployer<'a> {
    config: &'a RuntimeConfig,
    artifacts: &'a ArtifactStore,
}

impl<'a> Deployer<'a> {
    pub fn new(config: &'a RuntimeConfig, artifacts: &'a ArtifactStore) -> Self {
        Self { config, artifacts }
    }

    /// Deploy every spec in order.
    ///
    /// The first failure stops the sequence; the error carries everything
    /// confirmed up to that point so the caller can persist it.
    pub async fn deploy_all<C: ChainClient>(
        &self,
        client: &C,
        specs: &[ComponentSpec],
    ) -> Result<Vec<DeployedComponent>, DeploymentError> {
        let mut confirmed: Vec<DeployedComponent> = Vec::with_capacity(specs.len());

        for spec in specs {
            match self.deploy_one(client, spec, &confirmed).await {
                Ok(deployed) => {
                    tracing::info!(
                        component = %deployed.component,
                        address = %deployed.address,
                        tx = %deployed.tx_hash,
                        "Component deployed"
                    );
                    confirmed.push(deployed);
                }
                Err(reason) => {
                    return Err(DeploymentError {
                        component: spec.component.to_string(),
                        reason,
                        confirmed,
                    });
                }
            }
        }

        Ok(confirmed)
    }

    async fn deploy_one<C: ChainClient>(
        &self,
        client: &C,
        spec: &ComponentSpec,
        confirmed: &[DeployedComponent],
    ) -> Result<DeployedComponent, TxFailure> {
        let args = resolve_constructor_args(spec, confirmed)?;

        let code = self
            .artifacts
            .creation_code(spec.component)
            .map_err(TxFailure::Transport)?;
        let mut calldata = code.to_vec();
        calldata.extend_from_slice(&encode_constructor_args(&args));
        let calldata: Bytes = calldata.into();

        let gas_limit = self.resolve_gas_limit(client, spec, &calldata).await;

        tracing::info!(component = %spec.component, gas_limit, "Submitting deployment transaction...");
        let tx_hash = client
            .submit_deployment(calldata, gas_limit)
            .await
            .map_err(TxFailure::Transport)?;

        let address = client.await_deployment(tx_hash).await?;

        Ok(DeployedComponent {
            component: spec.component,
            address,
            tx_hash,
            gas_limit,
        })
    }

    /// An explicit per-spec gas limit wins; otherwise estimate, and on
    /// estimation failure fall back to the configured default. Estimation
    /// failure is never fatal.
    async fn resolve_gas_limit<C: ChainClient>(
        &self,
        client: &C,
        spec: &ComponentSpec,
        calldata: &Bytes,
    ) -> u64 {
        if let Some(gas_limit) = spec.gas_limit {
            return gas_limit;
        }

        match client.estimate_deployment_gas(calldata).await {
            Ok(estimate) => estimate,
            Err(e) => {
                tracing::warn!(
                    component = %spec.component,
                    error = %e,
                    fallback = self.config.deployment_gas_limit,
                    "Gas estimation failed, falling back to the default gas limit"
                );
                self.config.deployment_gas_limit
            }
        }
    }
}

fn resolve_constructor_args(
    spec: &ComponentSpec,
    confirmed: &[DeployedComponent],
) -> Result<Vec<Address>, TxFailure> {
    spec.constructor_args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::Address(address) => Ok(*address),
            ConstructorArg::Deployed(dependency) => confirmed
                .iter()
                .find(|deployed| deployed.component == *dependency)
                .map(|deployed| deployed.address)
                .ok_or_else(|| {
                    TxFailure::Transport(anyhow!(
                        "constructor of {} references {} before it is confirmed",
                        spec.component,
                        dependency
                    ))
                }),
        })
        .collect()
}
