//! Runtime configuration resolved from the process environment.
//!
//! All environment access happens here, once, at startup. The resolver is
//! pure: it reads a key-value map and either produces an immutable
//! [`RuntimeConfig`] that every downstream component receives by parameter,
//! or a [`ValidationError`] before any chain call is made.

use std::collections::HashMap;
use std::time::Duration;

use alloy_core::primitives::{Address, U256};
use alloy_signer_local::PrivateKeySigner;
use url::Url;

use crate::error::ValidationError;
use crate::network::Network;

/// Fallback gas limit for contract-creation transactions when estimation fails.
pub const DEFAULT_DEPLOYMENT_GAS_LIMIT: u64 = 5_000_000;

/// Fallback gas limit for authorization transactions when estimation fails.
pub const DEFAULT_TRANSACTION_GAS_LIMIT: u64 = 200_000;

/// Minimum deployer balance required by preflight: 0.1 native token, in wei.
pub const DEFAULT_MIN_BALANCE_WEI: u64 = 100_000_000_000_000_000;

/// Default per-request verification timeout, in milliseconds.
pub const DEFAULT_VERIFICATION_TIMEOUT_MS: u64 = 120_000;

/// Default wait for a submitted transaction to confirm, in seconds.
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 180;

/// Immutable configuration for one orchestration run.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Target network.
    pub network: Network,
    /// Chain id (network default unless overridden).
    pub chain_id: u64,
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Resolved signing credential.
    pub signer: PrivateKeySigner,
    /// The deploying account, derived from the signing key and cross-checked
    /// against `DEPLOYER_ADDRESS`.
    pub deployer: Address,
    /// Gas limit used for deployments when estimation fails.
    pub deployment_gas_limit: u64,
    /// Gas limit used for authorization calls when estimation fails.
    pub transaction_gas_limit: u64,
    /// Minimum balance the deployer must hold before anything is submitted.
    pub min_balance: U256,
    /// Pause before deploying to a non-local network, giving the operator a
    /// window to abort.
    pub confirmation_delay: bool,
    /// How long to wait for a submitted transaction to confirm.
    pub confirmation_timeout: Duration,
    /// Per-request timeout for the verification service.
    pub verification_timeout: Duration,
    /// Run the verification pipeline right after a successful deployment.
    pub auto_verify: bool,
    /// Environment tag stored in the deployment record.
    pub environment: String,
    /// Verification API key for the target network, if configured.
    pub api_key: Option<String>,
}

impl RuntimeConfig {
    /// The network's canonical name, as used in record file names.
    pub fn network_name(&self) -> String {
        self.network.to_string()
    }
}

/// Builds a [`RuntimeConfig`] from an external key-value environment.
pub struct ConfigResolver<'a> {
    env: &'a HashMap<String, String>,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(env: &'a HashMap<String, String>) -> Self {
        Self { env }
    }

    /// Resolve the configuration for `network_name`.
    ///
    /// Rejects malformed signing-key material and account addresses before
    /// they can reach any downstream component.
    pub fn resolve(&self, network_name: &str) -> Result<RuntimeConfig, ValidationError> {
        let network = Network::parse(network_name)?;

        let signer = validate_signing_key(self.required("PRIVATE_KEY")?)?;
        let configured = validate_address(self.required("DEPLOYER_ADDRESS")?)?;
        let derived = signer.address();
        if configured != derived {
            return Err(ValidationError::AddressMismatch { configured, derived });
        }

        let chain_id = match network.chain_id_override_var() {
            Some(var) => self.parse_u64(var)?.unwrap_or(network.default_chain_id()),
            None => network.default_chain_id(),
        };

        let rpc_var = network.rpc_override_var();
        let raw_rpc = self
            .optional(rpc_var)
            .unwrap_or(network.default_rpc_url());
        let rpc_url = Url::parse(raw_rpc).map_err(|e| ValidationError::InvalidValue {
            name: rpc_var.to_string(),
            reason: e.to_string(),
        })?;

        let deployment_gas_limit = self
            .parse_u64("DEPLOYMENT_GAS_LIMIT")?
            .unwrap_or(DEFAULT_DEPLOYMENT_GAS_LIMIT);
        let transaction_gas_limit = self
            .parse_u64("TRANSACTION_GAS_LIMIT")?
            .unwrap_or(DEFAULT_TRANSACTION_GAS_LIMIT);
        let min_balance = self
            .parse_u256("MIN_DEPLOYER_BALANCE")?
            .unwrap_or(U256::from(DEFAULT_MIN_BALANCE_WEI));

        let confirmation_timeout = Duration::from_secs(
            self.parse_u64("CONFIRMATION_TIMEOUT")?
                .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
        );
        let verification_timeout = Duration::from_millis(
            self.parse_u64("VERIFICATION_TIMEOUT")?
                .unwrap_or(DEFAULT_VERIFICATION_TIMEOUT_MS),
        );

        let confirmation_delay = self.parse_toggle("ENABLE_DEPLOYMENT_CONFIRMATION")?;
        let auto_verify = self.parse_toggle("AUTO_VERIFY_CONTRACTS")?;

        let environment = self
            .optional("DEPLOYMENT_ENVIRONMENT")
            .unwrap_or("development")
            .to_string();

        let api_key = network
            .api_key_var()
            .and_then(|var| self.optional(var))
            .map(String::from);

        Ok(RuntimeConfig {
            network,
            chain_id,
            rpc_url,
            signer,
            deployer: derived,
            deployment_gas_limit,
            transaction_gas_limit,
            min_balance,
            confirmation_delay,
            confirmation_timeout,
            verification_timeout,
            auto_verify,
            environment,
            api_key,
        })
    }

    fn required(&self, name: &str) -> Result<&str, ValidationError> {
        self.optional(name)
            .ok_or_else(|| ValidationError::MissingConfiguration(name.to_string()))
    }

    fn optional(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    fn parse_u64(&self, name: &str) -> Result<Option<u64>, ValidationError> {
        self.optional(name)
            .map(|raw| {
                raw.parse::<u64>().map_err(|e| ValidationError::InvalidValue {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn parse_u256(&self, name: &str) -> Result<Option<U256>, ValidationError> {
        self.optional(name)
            .map(|raw| {
                raw.parse::<U256>().map_err(|e| ValidationError::InvalidValue {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn parse_toggle(&self, name: &str) -> Result<bool, ValidationError> {
        match self.optional(name) {
            None => Ok(false),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                other => Err(ValidationError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("expected a boolean toggle, got '{other}'"),
                }),
            },
        }
    }
}

/// Validate signing-key material: 64 hex characters, optional 0x prefix.
fn validate_signing_key(raw: &str) -> Result<PrivateKeySigner, ValidationError> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    if stripped.len() != 64 || !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidSigningKey);
    }
    stripped
        .parse::<PrivateKeySigner>()
        .map_err(|_| ValidationError::InvalidSigningKey)
}

/// Validate an account address: 0x prefix plus 40 hex characters.
fn validate_address(raw: &str) -> Result<Address, ValidationError> {
    if !raw.starts_with("0x") || raw.len() != 42 || !raw[2..].chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(ValidationError::InvalidAddress(raw.to_string()));
    }
    raw.parse()
        .map_err(|_| ValidationError::InvalidAddress(raw.to_string()))
}
