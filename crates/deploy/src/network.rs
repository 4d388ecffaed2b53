//! Target network catalogue.
//!
//! The orchestrator only ever deploys to this fixed allow-list. Chain ids and
//! RPC endpoints come from the network's public defaults and can be overridden
//! per network through the environment (see [`crate::config`]).

use crate::error::ValidationError;

/// Networks the deployment pipeline is allowed to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    /// Local development chain (Hardhat/Anvil).
    Local,
    /// Sonic testnet.
    SonicTestnet,
    /// Sonic mainnet.
    Sonic,
}

/// The fixed allow-list of deployable networks.
pub const SUPPORTED_NETWORKS: [Network; 3] = [Network::Local, Network::SonicTestnet, Network::Sonic];

impl Network {
    /// Default chain id for this network.
    pub fn default_chain_id(&self) -> u64 {
        match self {
            Network::Local => 1337,
            Network::SonicTestnet => 64165,
            Network::Sonic => 146,
        }
    }

    /// Default public RPC endpoint for this network.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Local => "http://127.0.0.1:8545/",
            Network::SonicTestnet => "https://rpc.testnet.soniclabs.com/",
            Network::Sonic => "https://rpc.sonic.fantom.network/",
        }
    }

    /// Environment variable that overrides the RPC endpoint.
    pub fn rpc_override_var(&self) -> &'static str {
        match self {
            Network::Local => "LOCAL_RPC_URL",
            Network::SonicTestnet => "SONIC_TESTNET_RPC_URL",
            Network::Sonic => "SONIC_MAINNET_RPC_URL",
        }
    }

    /// Environment variable that overrides the chain id, if any.
    pub fn chain_id_override_var(&self) -> Option<&'static str> {
        match self {
            Network::Local => None,
            Network::SonicTestnet => Some("SONIC_TESTNET_CHAIN_ID"),
            Network::Sonic => Some("SONIC_MAINNET_CHAIN_ID"),
        }
    }

    /// Etherscan-compatible verification API endpoint, if the network has one.
    pub fn explorer_api_url(&self) -> Option<&'static str> {
        match self {
            Network::Local => None,
            Network::SonicTestnet => Some("https://api-testnet.sonicscan.org/api"),
            Network::Sonic => Some("https://api.sonicscan.org/api"),
        }
    }

    /// Environment variable holding the verification API key, if any.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Network::Local => None,
            Network::SonicTestnet => Some("SONIC_TESTNET_API_KEY"),
            Network::Sonic => Some("SONIC_MAINNET_API_KEY"),
        }
    }

    /// True for the local development chain. The operator confirmation pause
    /// is skipped on local networks.
    pub fn is_local(&self) -> bool {
        matches!(self, Network::Local)
    }

    /// Parse a network name against the allow-list.
    pub fn parse(name: &str) -> Result<Network, ValidationError> {
        name.parse()
            .map_err(|_| ValidationError::UnsupportedNetwork(name.to_string()))
    }
}
