// Block-explorer source verification
//
// Etherscan-compatible verification API client: submit the source for a
// deployed address, then poll the returned ticket until the explorer accepts
// or rejects it. Runs after a deployment plan completes, never inside it.

use crate::config::{expand_env, ExplorerConfig, OptimizerSettings};
use anyhow::{anyhow, Context, Result};
use ethers::abi::Token;
use ethers::types::Address;
use ethers::utils::to_checksum;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Verification API client for one explorer.
pub struct ExplorerClient {
    api_url: String,
    api_key: Option<String>,
    client: Client,
}

/// Everything the explorer needs to reproduce the deployed bytecode.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    /// Deployed contract address
    pub address: Address,
    /// Fully qualified name, e.g. "contracts/PythAdapter.sol:PythAdapter"
    pub contract_name: String,
    /// Flattened Solidity source
    pub source: String,
    /// Exact compiler version string, e.g. "v0.8.19+commit.7dd6d404"
    pub compiler_version: String,
    /// Optimizer settings used for the build, if any
    pub optimizer: Option<OptimizerSettings>,
    /// ABI-encoded constructor arguments, hex without the 0x prefix
    pub constructor_args: Option<String>,
}

/// Explorer-side state of a submitted verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Failed(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: String,
}

impl ExplorerClient {
    /// Create a client for a configured explorer endpoint.
    pub fn new(config: &ExplorerConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) => Some(expand_env(key)?),
            None => None,
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            api_url: config.api_url.clone(),
            api_key,
            client,
        })
    }

    /// Submit a contract for verification, returning the explorer's ticket id.
    pub async fn submit(&self, request: &VerificationRequest) -> Result<String> {
        let mut form: Vec<(&str, String)> = vec![
            ("module", "contract".to_string()),
            ("action", "verifysourcecode".to_string()),
            ("codeformat", "solidity-single-file".to_string()),
            ("contractaddress", to_checksum(&request.address, None)),
            ("contractname", request.contract_name.clone()),
            ("sourceCode", request.source.clone()),
            ("compilerversion", request.compiler_version.clone()),
        ];
        match &request.optimizer {
            Some(optimizer) => {
                form.push((
                    "optimizationUsed",
                    if optimizer.enabled { "1" } else { "0" }.to_string(),
                ));
                form.push(("runs", optimizer.runs.to_string()));
            }
            None => form.push(("optimizationUsed", "0".to_string())),
        }
        if let Some(args) = &request.constructor_args {
            // The API has kept etherscan's historical field spelling.
            form.push(("constructorArguements", args.clone()));
        }
        if let Some(key) = &self.api_key {
            form.push(("apikey", key.clone()));
        }

        let response = self
            .client
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .with_context(|| format!("verification request to {} failed", self.api_url))?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "explorer API request failed: {}",
                response.status()
            ));
        }

        let parsed: ExplorerResponse = response
            .json()
            .await
            .context("unexpected explorer response")?;
        if parsed.status != "1" {
            return Err(anyhow!("verification rejected: {}", parsed.result));
        }
        Ok(parsed.result)
    }

    /// Check the state of a previously submitted verification.
    pub async fn check(&self, ticket: &str) -> Result<VerificationStatus> {
        let mut query: Vec<(&str, String)> = vec![
            ("module", "contract".to_string()),
            ("action", "checkverifystatus".to_string()),
            ("guid", ticket.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.clone()));
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&query)
            .send()
            .await
            .context("verification status request failed")?;
        let parsed: ExplorerResponse = response
            .json()
            .await
            .context("unexpected explorer response")?;
        Ok(parse_status(&parsed))
    }

    /// Submit and poll until the explorer reaches a terminal state.
    pub async fn verify(
        &self,
        request: &VerificationRequest,
        poll_interval: Duration,
        max_attempts: u32,
    ) -> Result<()> {
        let ticket = self.submit(request).await?;
        for _ in 0..max_attempts {
            tokio::time::sleep(poll_interval).await;
            match self.check(&ticket).await? {
                VerificationStatus::Pending => continue,
                VerificationStatus::Verified => return Ok(()),
                VerificationStatus::Failed(reason) => {
                    return Err(anyhow!("verification failed: {reason}"))
                }
            }
        }
        Err(anyhow!(
            "verification still pending after {max_attempts} checks (ticket {ticket})"
        ))
    }
}

fn parse_status(response: &ExplorerResponse) -> VerificationStatus {
    if response.result.contains("Pending") {
        VerificationStatus::Pending
    } else if response.status == "1" {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Failed(response.result.clone())
    }
}

/// Hex-encode constructor arguments for a verification request.
pub fn encode_constructor_args(args: &[Token]) -> String {
    hex::encode(ethers::abi::encode(args))
}
