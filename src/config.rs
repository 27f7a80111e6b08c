// Configuration for moondeploy
//
// All network, compiler and explorer settings live in one explicit
// configuration object loaded from a JSON file and passed into the
// orchestrator at call time. Secrets never live in the file itself:
// string fields may carry `${VAR}` placeholders that are expanded from the
// process environment when the value is used.

use anyhow::{anyhow, Context, Result};
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Top-level deployment configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Networks keyed by name
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    /// Compiler versions the artifacts were produced with. Pure data: the
    /// orchestrator never compiles, but explorer verification needs the
    /// exact version string.
    #[serde(default)]
    pub compilers: Vec<CompilerConfig>,

    /// Block-explorer verification endpoints keyed by network name
    #[serde(default)]
    pub explorers: HashMap<String, ExplorerConfig>,
}

/// Connection and signing settings for one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// RPC endpoint URL (may contain `${VAR}` placeholders)
    pub url: String,
    /// Numeric chain identifier
    pub chain_id: u64,
    /// Signing credentials for the whole run
    pub accounts: CredentialSource,
    /// Fixed gas price in wei; omit to let the node estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
}

/// Where the run's signing key comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialSource {
    /// Raw hex private key (may contain `${VAR}` placeholders)
    PrivateKey { key: String },
    /// BIP-39 seed phrase with an optional derivation path prefix
    Mnemonic {
        phrase: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(default)]
        initial_index: u32,
    },
}

/// One compiler the contracts were built with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Solidity version, e.g. "0.8.19"
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizer: Option<OptimizerSettings>,
}

/// Optimizer settings recorded for verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub enabled: bool,
    pub runs: u32,
}

/// Block-explorer verification endpoint for one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Verification API URL, e.g. "https://testnet.monadexplorer.com/api"
    pub api_url: String,
    /// Human-facing explorer URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_url: Option<String>,
    /// API key (may contain `${VAR}` placeholders); some explorers need none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl DeployConfig {
    /// Load configuration from a JSON file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse configuration {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Look up a network by name.
    pub fn network(&self, name: &str) -> Result<&NetworkConfig> {
        self.networks.get(name).ok_or_else(|| {
            let mut known: Vec<&str> = self.networks.keys().map(String::as_str).collect();
            known.sort_unstable();
            anyhow!("unknown network `{name}` (known: {})", known.join(", "))
        })
    }

    /// Explorer settings for a network, if configured.
    pub fn explorer(&self, name: &str) -> Option<&ExplorerConfig> {
        self.explorers.get(name)
    }
}

impl NetworkConfig {
    /// Endpoint URL with `${VAR}` placeholders expanded.
    pub fn resolved_url(&self) -> Result<String> {
        expand_env(&self.url)
    }
}

/// Expand `${VAR}` placeholders from the process environment.
pub fn expand_env(value: &str) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let end = tail
            .find('}')
            .ok_or_else(|| anyhow!("unterminated ${{...}} placeholder in `{value}`"))?;
        let name = &tail[..end];
        let expanded = env::var(name)
            .with_context(|| format!("environment variable `{name}` is not set"))?;
        out.push_str(&expanded);
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "networks": {
            "ganache": {
                "url": "http://ganache:8545",
                "chain_id": 1337,
                "accounts": {
                    "kind": "mnemonic",
                    "phrase": "test test test test test test test test test test test junk",
                    "path": "m/44'/60'/0'/0/",
                    "initial_index": 0
                }
            },
            "monadDevnet": {
                "url": "${MONAD_RPC_URL}",
                "chain_id": 10143,
                "accounts": { "kind": "private_key", "key": "${PRIVATE_KEY}" },
                "gas_price": "0x3b9aca00"
            }
        },
        "compilers": [
            { "version": "0.5.16" },
            { "version": "0.8.19", "optimizer": { "enabled": true, "runs": 1000 } }
        ],
        "explorers": {
            "monadDevnet": {
                "api_url": "https://testnet.monadexplorer.com/api",
                "browser_url": "https://testnet.monadexplorer.com"
            }
        }
    }"#;

    #[test]
    fn parses_sample_config() {
        let config: DeployConfig = serde_json::from_str(SAMPLE).unwrap();

        let monad = config.network("monadDevnet").unwrap();
        assert_eq!(monad.chain_id, 10143);
        assert_eq!(monad.gas_price, Some(U256::from(1_000_000_000u64)));

        let ganache = config.network("ganache").unwrap();
        match &ganache.accounts {
            CredentialSource::Mnemonic { path, initial_index, .. } => {
                assert_eq!(path.as_deref(), Some("m/44'/60'/0'/0/"));
                assert_eq!(*initial_index, 0);
            }
            other => panic!("unexpected credential source: {other:?}"),
        }

        assert_eq!(config.compilers.len(), 2);
        let optimized = &config.compilers[1];
        assert_eq!(optimized.optimizer.as_ref().unwrap().runs, 1000);

        assert!(config.explorer("monadDevnet").is_some());
        assert!(config.explorer("ganache").is_none());
    }

    #[test]
    fn unknown_network_lists_known_names() {
        let config: DeployConfig = serde_json::from_str(SAMPLE).unwrap();
        let err = config.network("sepolia").unwrap_err();
        assert!(err.to_string().contains("ganache"));
        assert!(err.to_string().contains("monadDevnet"));
    }

    #[test]
    fn expands_env_placeholders() {
        env::set_var("MOONDEPLOY_TEST_RPC", "http://localhost:8545");
        assert_eq!(
            expand_env("${MOONDEPLOY_TEST_RPC}/v1").unwrap(),
            "http://localhost:8545/v1"
        );
        assert_eq!(expand_env("no placeholders").unwrap(), "no placeholders");
        assert!(expand_env("${MOONDEPLOY_TEST_UNSET_VAR}").is_err());
        assert!(expand_env("${broken").is_err());
    }

    #[test]
    fn round_trips_through_file() {
        let config: DeployConfig = serde_json::from_str(SAMPLE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deploy.json");

        config.save_to_file(&path).unwrap();
        let reloaded = DeployConfig::load_from_file(&path).unwrap();

        assert_eq!(reloaded.networks.len(), config.networks.len());
        assert_eq!(
            reloaded.network("monadDevnet").unwrap().gas_price,
            config.network("monadDevnet").unwrap().gas_price
        );
    }
}
