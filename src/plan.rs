// Deployment plans
//
// A plan is an ordered list of steps. Each step deploys one contract; its
// constructor arguments are produced by a pure resolver that reads the
// addresses recorded by strictly earlier steps. A step may also declare one
// post-deployment call that links already-deployed instances together.

use crate::artifact::ContractArtifact;
use crate::error::DeployError;
use anyhow::{anyhow, Result};
use ethers::abi::{Abi, Token};
use ethers::types::{Address, TxHash};

/// Produces argument tokens from a snapshot of previously deployed instances.
///
/// Resolvers must be pure: they read the snapshot and return tokens, nothing
/// else. The snapshot handed to a step only ever contains instances recorded
/// by earlier steps.
pub type ArgResolver = Box<dyn Fn(&DeployedInstances) -> Result<Vec<Token>> + Send + Sync>;

/// One successfully deployed contract instance.
#[derive(Debug, Clone)]
pub struct DeployedInstance {
    /// Step identifier that produced this instance
    pub id: String,
    /// Name of the compiled contract
    pub contract_name: String,
    /// On-chain address of the new instance
    pub address: Address,
    /// Hash of the creation transaction
    pub transaction_hash: TxHash,
    /// Constructor arguments as resolved for this run
    pub constructor_args: Vec<Token>,
}

/// Append-only, ordered collection of deployed instances.
#[derive(Debug, Clone, Default)]
pub struct DeployedInstances {
    instances: Vec<DeployedInstance>,
}

impl DeployedInstances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly deployed instance. Entries are never replaced or removed.
    pub fn record(&mut self, instance: DeployedInstance) {
        self.instances.push(instance);
    }

    /// Look up an instance by step identifier.
    pub fn get(&self, id: &str) -> Option<&DeployedInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// Address of a previously deployed instance, for use inside resolvers.
    pub fn address_of(&self, id: &str) -> Result<Address> {
        self.get(id)
            .map(|i| i.address)
            .ok_or_else(|| anyhow!("no deployed instance recorded for `{id}`"))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeployedInstance> {
        self.instances.iter()
    }

    pub fn into_vec(self) -> Vec<DeployedInstance> {
        self.instances
    }
}

/// A call made against an already-deployed instance right after a step lands.
pub struct PostDeployCall {
    /// Step identifier of the instance receiving the call
    pub target: String,
    /// ABI function name to invoke
    pub method: String,
    /// Resolver for the call arguments
    pub args: ArgResolver,
}

/// One contract deployment within a plan.
pub struct PlanStep {
    /// Unique identifier within the plan
    pub id: String,
    /// Compiled contract to instantiate
    pub artifact: ContractArtifact,
    /// Identifiers of earlier steps whose addresses the resolver reads
    pub depends_on: Vec<String>,
    /// Constructor-argument resolver
    pub args: ArgResolver,
    /// Optional linking call run after this step confirms
    pub post_deploy: Option<PostDeployCall>,
}

impl PlanStep {
    /// Create a step with a constructor-argument resolver.
    pub fn new<F>(id: &str, artifact: ContractArtifact, args: F) -> Self
    where
        F: Fn(&DeployedInstances) -> Result<Vec<Token>> + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            artifact,
            depends_on: Vec::new(),
            args: Box::new(args),
            post_deploy: None,
        }
    }

    /// Declare that the resolver reads the address of an earlier step.
    pub fn depends_on(mut self, id: &str) -> Self {
        self.depends_on.push(id.to_string());
        self
    }

    /// Attach a post-deployment call against `target` (this step or an earlier one).
    pub fn post_deploy<F>(mut self, target: &str, method: &str, args: F) -> Self
    where
        F: Fn(&DeployedInstances) -> Result<Vec<Token>> + Send + Sync + 'static,
    {
        self.post_deploy = Some(PostDeployCall {
            target: target.to_string(),
            method: method.to_string(),
            args: Box::new(args),
        });
        self
    }
}

/// Ordered sequence of deployment steps.
#[derive(Default)]
pub struct DeploymentPlan {
    steps: Vec<PlanStep>,
}

impl DeploymentPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// ABI of the contract a step deploys, by step identifier.
    pub fn abi_of(&self, id: &str) -> Option<&Abi> {
        self.steps.iter().find(|s| s.id == id).map(|s| &s.artifact.abi)
    }

    /// Static validation: identifiers are unique, declared dependencies refer
    /// to strictly earlier steps, and post-deploy targets refer to this step
    /// or an earlier one. No forward references of any kind.
    pub fn validate(&self) -> Result<(), DeployError> {
        for (index, step) in self.steps.iter().enumerate() {
            if self.steps[..index].iter().any(|s| s.id == step.id) {
                return Err(DeployError::InvalidPlan(format!(
                    "duplicate step identifier `{}`",
                    step.id
                )));
            }
            for dep in &step.depends_on {
                if !self.steps[..index].iter().any(|s| s.id == *dep) {
                    return Err(DeployError::InvalidPlan(format!(
                        "step `{}` depends on `{dep}`, which is not a strictly earlier step",
                        step.id
                    )));
                }
            }
            if let Some(call) = &step.post_deploy {
                let visible = &self.steps[..=index];
                if !visible.iter().any(|s| s.id == call.target) {
                    return Err(DeployError::InvalidPlan(format!(
                        "step `{}` post-deploy call targets `{}`, which is not deployed yet at that point",
                        step.id, call.target
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::Bytes;

    fn artifact(name: &str) -> ContractArtifact {
        ContractArtifact {
            contract_name: name.to_string(),
            abi: Abi::default(),
            bytecode: Bytes::from(vec![0x60, 0x00]),
        }
    }

    fn instance(id: &str, low: u64) -> DeployedInstance {
        DeployedInstance {
            id: id.to_string(),
            contract_name: id.to_string(),
            address: Address::from_low_u64_be(low),
            transaction_hash: TxHash::from_low_u64_be(low),
            constructor_args: vec![],
        }
    }

    #[test]
    fn lookup_by_id() {
        let mut deployed = DeployedInstances::new();
        deployed.record(instance("A", 1));
        deployed.record(instance("B", 2));

        assert_eq!(deployed.len(), 2);
        assert_eq!(
            deployed.address_of("B").unwrap(),
            Address::from_low_u64_be(2)
        );
        assert!(deployed.address_of("C").is_err());
    }

    #[test]
    fn validate_accepts_backward_references() {
        let mut plan = DeploymentPlan::new();
        plan.push(PlanStep::new("A", artifact("A"), |_| Ok(vec![])));
        plan.push(
            PlanStep::new("B", artifact("B"), |d| {
                Ok(vec![Token::Address(d.address_of("A")?)])
            })
            .depends_on("A")
            .post_deploy("A", "initialize", |d| {
                Ok(vec![Token::Address(d.address_of("B")?)])
            }),
        );
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn validate_rejects_forward_reference() {
        let mut plan = DeploymentPlan::new();
        plan.push(PlanStep::new("A", artifact("A"), |_| Ok(vec![])).depends_on("B"));
        plan.push(PlanStep::new("B", artifact("B"), |_| Ok(vec![])));

        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("not a strictly earlier step"));
    }

    #[test]
    fn validate_rejects_self_dependency() {
        let mut plan = DeploymentPlan::new();
        plan.push(PlanStep::new("A", artifact("A"), |_| Ok(vec![])).depends_on("A"));
        assert!(plan.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let mut plan = DeploymentPlan::new();
        plan.push(PlanStep::new("A", artifact("A"), |_| Ok(vec![])));
        plan.push(PlanStep::new("A", artifact("A"), |_| Ok(vec![])));

        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate step identifier"));
    }

    #[test]
    fn validate_rejects_unknown_post_deploy_target() {
        let mut plan = DeploymentPlan::new();
        plan.push(
            PlanStep::new("A", artifact("A"), |_| Ok(vec![])).post_deploy(
                "B",
                "initialize",
                |_| Ok(vec![]),
            ),
        );
        assert!(plan.validate().is_err());
    }
}
