//! Compiled contract artifacts.
//!
//! The orchestrator does not compile contracts; it consumes creation bytecode
//! emitted by the contract build (`<artifacts-dir>/<ContractName>.bin`, hex,
//! optional 0x prefix).

use std::path::PathBuf;

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};

use crate::topology::Component;

/// Directory of compiled creation bytecode, one `.bin` file per component.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the creation bytecode for `component`.
    pub fn creation_code(&self, component: Component) -> Result<Bytes> {
        let path = self.dir.join(format!("{component}.bin"));
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;

        let stripped = raw.trim().trim_start_matches("0x");
        let code = hex::decode(stripped)
            .with_context(|| format!("Artifact {} is not valid hex", path.display()))?;

        anyhow::ensure!(!code.is_empty(), "Artifact {} is empty", path.display());
        Ok(code.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_load_creation_code() {
        let dir = TempDir::new("sonicid-artifacts").unwrap();
        std::fs::write(dir.path().join("IdentityRegistry.bin"), "0x6080604052\n").unwrap();

        let store = ArtifactStore::new(dir.path());
        let code = store.creation_code(Component::IdentityRegistry).unwrap();
        assert_eq!(code.as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);
    }

    #[test]
    fn test_unprefixed_hex_accepted() {
        let dir = TempDir::new("sonicid-artifacts").unwrap();
        std::fs::write(dir.path().join("ZKVerifier.bin"), "deadbeef").unwrap();

        let store = ArtifactStore::new(dir.path());
        let code = store.creation_code(Component::ZkVerifier).unwrap();
        assert_eq!(code.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_missing_artifact_is_an_error() {
        let dir = TempDir::new("sonicid-artifacts").unwrap();
        let store = ArtifactStore::new(dir.path());
        let err = store.creation_code(Component::ReputationEngine).unwrap_err();
        assert!(err.to_string().contains("ReputationEngine.bin"));
    }

    #[test]
    fn test_non_hex_artifact_is_an_error() {
        let dir = TempDir::new("sonicid-artifacts").unwrap();
        std::fs::write(dir.path().join("IdentityRegistry.bin"), "not hex").unwrap();

        let store = ArtifactStore::new(dir.path());
        assert!(store.creation_code(Component::IdentityRegistry).is_err());
    }
}
