// Moon-or-doom deployment CLI
//
// Deploys the three-contract suite to a configured network, printing each
// address as it lands. Exits zero on success; any failure is printed to
// stderr and exits non-zero.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ethers::signers::Signer;
use ethers::types::Address;
use ethers::utils::to_checksum;
use moondeploy::config::DeployConfig;
use moondeploy::ethereum::explorer::{ExplorerClient, VerificationRequest};
use moondeploy::ethereum::signer::build_wallet;
use moondeploy::ethereum::EthersDeployer;
use moondeploy::orchestrator::run_plan;
use moondeploy::suite::{moon_or_doom_plan, SuiteArtifacts, SuiteParams};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[clap(author, version, about = "Deploy the moon-or-doom contract suite", long_about = None)]
struct Cli {
    /// Path to the deployment configuration file
    #[clap(long, short, default_value = "deploy.json")]
    config: PathBuf,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the full suite to a network
    Deploy {
        /// Network name from the configuration
        #[clap(long, short)]
        network: String,

        /// Directory containing compiled contract artifacts
        #[clap(long, short, default_value = "artifacts")]
        artifacts: PathBuf,

        /// Admin address (defaults to the deployer account)
        #[clap(long)]
        admin: Option<Address>,

        /// Operator address (defaults to the deployer account)
        #[clap(long)]
        operator: Option<Address>,

        /// Per-transaction confirmation timeout in seconds
        #[clap(long, default_value_t = 120)]
        timeout_secs: u64,
    },

    /// List networks defined in the configuration
    ListNetworks,

    /// Submit a deployed contract for explorer source verification
    Verify {
        /// Network name from the configuration
        #[clap(long, short)]
        network: String,

        /// Deployed contract address
        #[clap(long)]
        address: Address,

        /// Fully qualified contract name, e.g. "contracts/PythAdapter.sol:PythAdapter"
        #[clap(long)]
        contract: String,

        /// Path to the flattened Solidity source
        #[clap(long)]
        source: PathBuf,

        /// Compiler version string; defaults to the last configured compiler
        #[clap(long)]
        compiler: Option<String>,

        /// ABI-encoded constructor arguments (hex, no 0x prefix)
        #[clap(long)]
        constructor_args: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = DeployConfig::load_from_file(&cli.config)?;
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Deploy {
            network,
            artifacts,
            admin,
            operator,
            timeout_secs,
        } => rt.block_on(deploy(
            &config,
            &network,
            &artifacts,
            admin,
            operator,
            Duration::from_secs(timeout_secs),
        )),
        Commands::ListNetworks => {
            let mut names: Vec<&String> = config.networks.keys().collect();
            names.sort_unstable();
            for name in names {
                let network = &config.networks[name];
                println!("{name} (chain id {})", network.chain_id);
            }
            Ok(())
        }
        Commands::Verify {
            network,
            address,
            contract,
            source,
            compiler,
            constructor_args,
        } => rt.block_on(verify(
            &config,
            &network,
            address,
            &contract,
            &source,
            compiler,
            constructor_args,
        )),
    }
}

async fn deploy(
    config: &DeployConfig,
    network_name: &str,
    artifacts_dir: &Path,
    admin: Option<Address>,
    operator: Option<Address>,
    confirmation_timeout: Duration,
) -> Result<()> {
    let network = config.network(network_name)?;
    let wallet = build_wallet(&network.accounts, network.chain_id)?;
    let deployer_address = wallet.address();
    println!(
        "Deploying contracts with account: {}",
        to_checksum(&deployer_address, None)
    );

    let deployer = EthersDeployer::connect(network, wallet, confirmation_timeout)?;
    let params = SuiteParams::monad(
        admin.unwrap_or(deployer_address),
        operator.unwrap_or(deployer_address),
    )?;
    let artifacts = SuiteArtifacts::load(artifacts_dir)?;
    let plan = moon_or_doom_plan(params, artifacts);

    let instances = run_plan(&plan, &deployer).await?;

    println!("\nDeployment summary:");
    for instance in &instances {
        println!("  {}: {}", instance.id, to_checksum(&instance.address, None));
    }
    Ok(())
}

async fn verify(
    config: &DeployConfig,
    network_name: &str,
    address: Address,
    contract: &str,
    source_path: &Path,
    compiler: Option<String>,
    constructor_args: Option<String>,
) -> Result<()> {
    let explorer = config
        .explorer(network_name)
        .ok_or_else(|| anyhow!("no explorer configured for network `{network_name}`"))?;
    let compiler_version = match compiler {
        Some(version) => version,
        None => config
            .compilers
            .last()
            .map(|c| c.version.clone())
            .ok_or_else(|| anyhow!("no compiler configured and none given"))?,
    };
    let optimizer = config
        .compilers
        .iter()
        .find(|c| compiler_version.contains(&c.version))
        .and_then(|c| c.optimizer.clone());
    let source = fs::read_to_string(source_path)
        .with_context(|| format!("failed to read source {}", source_path.display()))?;

    let client = ExplorerClient::new(explorer)?;
    let request = VerificationRequest {
        address,
        contract_name: contract.to_string(),
        source,
        compiler_version,
        optimizer,
        constructor_args,
    };
    client
        .verify(&request, Duration::from_secs(5), 12)
        .await?;
    println!("Verified {}", to_checksum(&address, None));
    Ok(())
}
