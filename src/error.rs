// Error taxonomy for the deployment pipeline
//
// `ClientError` covers the transaction layer (connectivity, rejection, revert,
// confirmation timeout); `DeployError` wraps it with plan-level attribution so
// a failed run always names the step that broke it.

use ethers::types::TxHash;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the transaction layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The RPC endpoint could not be reached or its URL is invalid.
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The node rejected the transaction before inclusion.
    #[error("transaction rejected: {reason}")]
    Rejected { reason: String },

    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash:?} reverted")]
    Reverted { tx_hash: TxHash },

    /// No receipt arrived within the configured confirmation window.
    #[error("transaction {tx_hash:?} not confirmed within {waited:?}")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    /// Constructor or function arguments could not be ABI-encoded.
    #[error("abi error: {0}")]
    Abi(String),
}

/// Errors raised while executing a deployment plan.
///
/// Any transaction failure aborts the run immediately; instances deployed by
/// earlier steps stay on-chain (no rollback is attempted).
#[derive(Debug, Error)]
pub enum DeployError {
    /// The plan failed static validation before any transaction was sent.
    #[error("invalid deployment plan: {0}")]
    InvalidPlan(String),

    /// A step's constructor-argument resolver returned an error.
    #[error("step `{step}`: argument resolution failed: {reason}")]
    ArgumentResolution { step: String, reason: String },

    /// The contract-creation transaction for a step failed.
    #[error("step `{step}` failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: ClientError,
    },

    /// A step's post-deployment call failed after the instance was created.
    #[error("step `{step}`: post-deploy call `{method}` failed: {source}")]
    PostDeployFailed {
        step: String,
        method: String,
        #[source]
        source: ClientError,
    },
}
