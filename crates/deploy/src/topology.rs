//! The fixed SonicID deployment topology.
//!
//! Three contracts in a hard dependency order, plus the authorization edges
//! wired between them after deployment. Both are data: the deployer walks the
//! spec list and the wirer walks the edge list, neither hard-codes a contract
//! pair.

use alloy_core::primitives::{Address, Bytes, keccak256};
use serde::{Deserialize, Serialize};

/// The three on-chain components managed by this orchestrator.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
pub enum Component {
    IdentityRegistry,
    #[strum(serialize = "ZKVerifier")]
    #[serde(rename = "ZKVerifier")]
    ZkVerifier,
    ReputationEngine,
}

/// A constructor argument for a component deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorArg {
    /// A literal address.
    Address(Address),
    /// The confirmed address of a previously deployed component. This is a
    /// hard ordering dependency: the referenced component must confirm first.
    Deployed(Component),
}

/// What to deploy and how.
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub component: Component,
    /// Ordered constructor arguments.
    pub constructor_args: Vec<ConstructorArg>,
    /// Explicit gas limit. When set, gas estimation is skipped entirely.
    pub gas_limit: Option<u64>,
}

/// Authorization operations that appear in the wiring graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum AuthorizationOp {
    #[strum(serialize = "addVerifier")]
    AddVerifier,
    #[strum(serialize = "addPlatformOperator")]
    AddPlatformOperator,
}

impl AuthorizationOp {
    /// Solidity signature of the authorization function.
    pub fn signature(&self) -> &'static str {
        match self {
            AuthorizationOp::AddVerifier => "addVerifier(address)",
            AuthorizationOp::AddPlatformOperator => "addPlatformOperator(address)",
        }
    }

    /// Four-byte function selector.
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// ABI-encoded calldata granting `account` this authorization:
    /// selector followed by the address left-padded to one 32-byte word.
    pub fn calldata(&self, account: Address) -> Bytes {
        let mut data = Vec::with_capacity(36);
        data.extend_from_slice(&self.selector());
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(account.as_slice());
        data.into()
    }
}

/// One edge of the wiring graph: `grantee` is granted `operation` on `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WiringEdge {
    pub grantee: Component,
    pub target: Component,
    pub operation: AuthorizationOp,
}

/// The deployment sequence, in dependency order.
///
/// ReputationEngine's constructor takes the IdentityRegistry address, so it
/// must come after IdentityRegistry confirms.
pub fn deployment_sequence() -> Vec<ComponentSpec> {
    vec![
        ComponentSpec {
            component: Component::IdentityRegistry,
            constructor_args: vec![],
            gas_limit: None,
        },
        ComponentSpec {
            component: Component::ZkVerifier,
            constructor_args: vec![],
            gas_limit: None,
        },
        ComponentSpec {
            component: Component::ReputationEngine,
            constructor_args: vec![ConstructorArg::Deployed(Component::IdentityRegistry)],
            gas_limit: None,
        },
    ]
}

/// The wiring graph: which components may act on which.
pub fn wiring_graph() -> Vec<WiringEdge> {
    vec![
        WiringEdge {
            grantee: Component::ZkVerifier,
            target: Component::IdentityRegistry,
            operation: AuthorizationOp::AddVerifier,
        },
        WiringEdge {
            grantee: Component::ReputationEngine,
            target: Component::IdentityRegistry,
            operation: AuthorizationOp::AddVerifier,
        },
        WiringEdge {
            grantee: Component::ZkVerifier,
            target: Component::ReputationEngine,
            operation: AuthorizationOp::AddPlatformOperator,
        },
    ]
}

/// ABI-encode constructor arguments: each address left-padded to a 32-byte word.
pub fn encode_constructor_args(args: &[Address]) -> Vec<u8> {
    let mut out = Vec::with_capacity(args.len() * 32);
    for arg in args {
        out.extend_from_slice(&[0u8; 12]);
        out.extend_from_slice(arg.as_slice());
    }
    out
}
