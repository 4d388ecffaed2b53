//! Preflight validation: everything that must hold before the first
//! state-changing call.
//!
//! All checks are read-only. Any failure here aborts the run before a record
//! file exists, so a rejected run leaves the deployments directory untouched.

use std::collections::HashMap;
use std::time::Duration;

use alloy_core::primitives::{Address, U256};
use anyhow::Result;
use tokio::time::sleep;

use crate::chain::ChainClient;
use crate::config::RuntimeConfig;
use crate::error::ValidationError;
use crate::network::Network;

/// Environment variables that must be present before any deployment.
pub const REQUIRED_VARS: [&str; 2] = ["PRIVATE_KEY", "DEPLOYER_ADDRESS"];

/// Operator abort window before deploying to a non-local network.
///
/// This is a deliberate human-in-the-loop pause, independent of the
/// verification pacing delay. Keep them separate.
pub const CONFIRMATION_PAUSE: Duration = Duration::from_secs(5);

/// Validates the run before the deployer is allowed to submit anything.
pub struct PreflightValidator<'a> {
    config: &'a RuntimeConfig,
}

impl<'a> PreflightValidator<'a> {
    pub fn new(config: &'a RuntimeConfig) -> Self {
        Self { config }
    }

    /// Check that every required environment variable is present.
    pub fn validate_environment(env: &HashMap<String, String>) -> Result<(), ValidationError> {
        for var in REQUIRED_VARS {
            if env.get(var).map(String::as_str).unwrap_or("").is_empty() {
                return Err(ValidationError::MissingConfiguration(var.to_string()));
            }
        }
        Ok(())
    }

    /// Check that the target network is in the fixed allow-list.
    pub fn validate_network(name: &str) -> Result<Network, ValidationError> {
        Network::parse(name)
    }

    /// Check that `address` holds at least the configured minimum balance.
    ///
    /// Returns the balance on success so the caller can store it in the
    /// deployment record.
    pub async fn validate_balance<C: ChainClient>(
        &self,
        client: &C,
        address: Address,
    ) -> Result<U256> {
        let balance = client.balance_of(address).await?;

        if balance < self.config.min_balance {
            return Err(ValidationError::InsufficientFunds {
                address,
                balance,
                minimum: self.config.min_balance,
            }
            .into());
        }

        tracing::info!(%address, %balance, "Deployer balance checked");
        Ok(balance)
    }

    /// Pause before a non-local deployment when the confirmation toggle is
    /// set, giving the operator a window to abort with Ctrl+C.
    pub async fn confirmation_pause(&self) {
        if self.config.confirmation_delay && !self.config.network.is_local() {
            tracing::warn!(
                network = %self.config.network,
                "Deploying to {} in {:?} - press Ctrl+C to abort",
                self.config.network,
                CONFIRMATION_PAUSE
            );
            sleep(CONFIRMATION_PAUSE).await;
        }
    }
}
