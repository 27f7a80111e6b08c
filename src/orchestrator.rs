// Deployment orchestrator
//
// Executes a plan strictly sequentially: later steps read the addresses of
// earlier ones, so there is nothing to parallelize. Each transaction is
// awaited to confirmation before the next step starts; the first failure
// aborts the run with the offending step attached.

use crate::error::{ClientError, DeployError};
use crate::plan::{DeployedInstance, DeployedInstances, DeploymentPlan};
use crate::artifact::ContractArtifact;
use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::types::{Address, TxHash};
use ethers::utils::to_checksum;
use log::info;

/// Outcome of one contract-creation transaction.
#[derive(Debug, Clone, Copy)]
pub struct DeployedContract {
    pub address: Address,
    pub transaction_hash: TxHash,
}

/// Transaction layer the orchestrator drives.
///
/// One implementation talks to a real network ([`EthersDeployer`]); tests
/// substitute an in-memory one. The signing identity lives inside the
/// implementation: every transaction of a run is signed by the same account.
///
/// [`EthersDeployer`]: crate::ethereum::EthersDeployer
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    /// Submit a contract-creation transaction and await its confirmation.
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        args: Vec<Token>,
    ) -> Result<DeployedContract, ClientError>;

    /// Submit a function call against a deployed instance and await its
    /// confirmation.
    async fn call(
        &self,
        to: Address,
        abi: &Abi,
        method: &str,
        args: Vec<Token>,
    ) -> Result<TxHash, ClientError>;
}

/// Execute a deployment plan.
///
/// Validates the plan, then for each step in order: resolves constructor
/// arguments from the snapshot of earlier instances, deploys, records the
/// instance, and runs the step's post-deployment call if it declares one.
/// Returns one [`DeployedInstance`] per step, in step order.
///
/// Deployment is not idempotent: every run creates fresh on-chain instances,
/// and a failed run leaves the instances of completed steps on-chain.
pub async fn run_plan<D>(
    plan: &DeploymentPlan,
    deployer: &D,
) -> Result<Vec<DeployedInstance>, DeployError>
where
    D: ContractDeployer + ?Sized,
{
    plan.validate()?;

    let mut deployed = DeployedInstances::new();
    for step in plan.steps() {
        let args = (step.args)(&deployed).map_err(|e| DeployError::ArgumentResolution {
            step: step.id.clone(),
            reason: format!("{e:#}"),
        })?;

        info!("deploying {}", step.id);
        let contract = deployer
            .deploy(&step.artifact, args.clone())
            .await
            .map_err(|source| DeployError::StepFailed {
                step: step.id.clone(),
                source,
            })?;
        info!(
            "{} deployed to {}",
            step.id,
            to_checksum(&contract.address, None)
        );

        deployed.record(DeployedInstance {
            id: step.id.clone(),
            contract_name: step.artifact.contract_name.clone(),
            address: contract.address,
            transaction_hash: contract.transaction_hash,
            constructor_args: args,
        });

        if let Some(call) = &step.post_deploy {
            let call_args =
                (call.args)(&deployed).map_err(|e| DeployError::ArgumentResolution {
                    step: step.id.clone(),
                    reason: format!("{e:#}"),
                })?;
            // validate() guarantees the target is already recorded.
            let target = deployed.address_of(&call.target).map_err(|e| {
                DeployError::InvalidPlan(format!("{e:#}"))
            })?;
            let abi = plan.abi_of(&call.target).ok_or_else(|| {
                DeployError::InvalidPlan(format!("no step named `{}`", call.target))
            })?;

            info!("calling {}.{}", call.target, call.method);
            deployer
                .call(target, abi, &call.method, call_args)
                .await
                .map_err(|source| DeployError::PostDeployFailed {
                    step: step.id.clone(),
                    method: call.method.clone(),
                    source,
                })?;
        }
    }

    Ok(deployed.into_vec())
}
