//! Error taxonomy for the deployment pipeline.
//!
//! Validation failures abort before any state-changing call. A deployment
//! failure is fatal for the remaining sequence and carries every component
//! that was already confirmed so the caller can persist a truthful record.
//! Wiring failures are collected per edge and never abort the run.

use alloy_core::primitives::{Address, U256};
use std::time::Duration;

use crate::deployer::DeployedComponent;

/// Fatal pre-deployment validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required configuration: {0}")]
    MissingConfiguration(String),

    #[error("unsupported network: {0} (supported: local, sonic-testnet, sonic)")]
    UnsupportedNetwork(String),

    #[error("insufficient funds: {address} holds {balance} wei, minimum is {minimum} wei")]
    InsufficientFunds {
        address: Address,
        balance: U256,
        minimum: U256,
    },

    #[error("PRIVATE_KEY must be 64 hex characters, optionally 0x-prefixed")]
    InvalidSigningKey,

    #[error("malformed account address: {0}")]
    InvalidAddress(String),

    #[error("DEPLOYER_ADDRESS {configured} does not match the signing key address {derived}")]
    AddressMismatch { configured: Address, derived: Address },

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Why a submitted transaction did not reach a confirmed, live state.
#[derive(Debug, thiserror::Error)]
pub enum TxFailure {
    #[error("transaction reverted on chain")]
    Reverted,

    #[error("confirmation timed out after {0:?}")]
    ConfirmationTimeout(Duration),

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Fatal failure in the component deployment sequence.
///
/// Carries the components confirmed before the failure; the recorder persists
/// them even though the run is aborted.
#[derive(Debug, thiserror::Error)]
#[error("deployment of {component} failed: {reason}")]
pub struct DeploymentError {
    /// The component whose deployment failed.
    pub component: String,
    /// What went wrong.
    pub reason: TxFailure,
    /// Components confirmed before the failure, in deployment order.
    pub confirmed: Vec<DeployedComponent>,
}

/// A failed authorization transaction. Non-fatal: the edge is reported and
/// the remaining edges still run; the run's status drops to PARTIAL.
#[derive(Debug, thiserror::Error)]
#[error("granting {operation} to {grantee} on {target} failed: {reason}")]
pub struct WiringError {
    pub grantee: String,
    pub target: String,
    pub operation: String,
    pub reason: TxFailure,
}
