// Compiled contract artifacts
//
// The orchestrator consumes already-compiled contracts; it never invokes a
// compiler. Artifacts are the hardhat-style JSON files produced by the build:
// contract name, ABI, and creation bytecode.

use anyhow::{Context, Result};
use ethers::abi::Abi;
use ethers::types::Bytes;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A compiled contract ready to be instantiated on-chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractArtifact {
    /// Contract name as emitted by the compiler
    #[serde(rename = "contractName")]
    pub contract_name: String,
    /// Contract ABI
    pub abi: Abi,
    /// Creation bytecode (constructor code included)
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Load an artifact from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read artifact {}", path.display()))?;
        let artifact = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse artifact {}", path.display()))?;
        Ok(artifact)
    }

    /// Load `<dir>/<name>.json`.
    pub fn load(dir: &Path, name: &str) -> Result<Self> {
        Self::from_file(dir.join(format!("{name}.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hardhat_artifact_json() {
        // Trimmed-down hardhat output; unknown fields are ignored.
        let raw = r#"{
            "_format": "hh-sol-artifact-1",
            "contractName": "PythAdapter",
            "sourceName": "contracts/PythAdapter.sol",
            "abi": [
                {
                    "type": "constructor",
                    "stateMutability": "nonpayable",
                    "inputs": [
                        { "name": "_pyth", "type": "address", "internalType": "address" },
                        { "name": "_priceId", "type": "bytes32", "internalType": "bytes32" }
                    ]
                }
            ],
            "bytecode": "0x6080604052",
            "deployedBytecode": "0x00"
        }"#;

        let artifact: ContractArtifact = serde_json::from_str(raw).unwrap();
        assert_eq!(artifact.contract_name, "PythAdapter");
        assert_eq!(artifact.bytecode.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        assert!(artifact.abi.constructor().is_some());
        assert_eq!(artifact.abi.constructor().unwrap().inputs.len(), 2);
    }

    #[test]
    fn load_reads_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let raw = r#"{ "contractName": "Minimal", "abi": [], "bytecode": "0x60006000" }"#;
        std::fs::write(dir.path().join("Minimal.json"), raw).unwrap();

        let artifact = ContractArtifact::load(dir.path(), "Minimal").unwrap();
        assert_eq!(artifact.contract_name, "Minimal");
        assert!(artifact.abi.constructor().is_none());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ContractArtifact::load(Path::new("/nonexistent"), "Nope").unwrap_err();
        assert!(err.to_string().contains("Nope.json"));
    }
}
