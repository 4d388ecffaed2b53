//! sonicid-deploy - Deployment orchestration for the SonicID contract suite.
//!
//! This crate deploys the fixed three-contract topology (IdentityRegistry,
//! ZKVerifier, ReputationEngine), wires their mutual authorizations, records
//! every attempt durably, and verifies deployed sources against the network
//! explorer on a later invocation.

pub mod artifacts;
pub mod chain;
pub mod config;
pub mod deployer;
pub mod error;
pub mod network;
pub mod pipeline;
pub mod preflight;
pub mod record;
mod rpc;
pub mod topology;
pub mod verify;
pub mod wiring;

pub use artifacts::ArtifactStore;
pub use chain::{ChainClient, HttpChainClient};
pub use config::{ConfigResolver, RuntimeConfig};
pub use deployer::{DeployedComponent, Deployer};
pub use error::{DeploymentError, TxFailure, ValidationError, WiringError};
pub use network::Network;
pub use pipeline::{DeploymentOutcome, run_deployment};
pub use record::{DeploymentRecord, DeploymentRecorder, RunStatus};
pub use topology::{Component, ComponentSpec, WiringEdge, deployment_sequence, wiring_graph};
pub use verify::{
    SonicscanClient, VerificationClient, VerificationOutcome, VerificationRequest,
    run_verification,
};
pub use wiring::{EdgeOutcome, wire_components};
