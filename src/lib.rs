pub mod artifact;
pub mod config;
pub mod error;
pub mod ethereum;
pub mod orchestrator;
pub mod plan;
pub mod suite;

pub use artifact::ContractArtifact;
pub use config::{CredentialSource, DeployConfig, NetworkConfig};
pub use error::{ClientError, DeployError};
pub use orchestrator::{run_plan, ContractDeployer, DeployedContract};
pub use plan::{DeployedInstance, DeployedInstances, DeploymentPlan, PlanStep};
