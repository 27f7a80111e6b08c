// The moon-or-doom contract suite
//
// Three contracts, deployed in dependency order:
//   1. PythAdapter           — oracle adapter over the on-chain Pyth contract
//   2. MoonOrDoomOperator    — operator/admin control surface
//   3. MoonOrDoomNativeToken — the prediction game, wired to both
// followed by operator.initialize(game, adapter) to link them.

use crate::artifact::ContractArtifact;
use crate::plan::{DeploymentPlan, PlanStep};
use anyhow::{Context, Result};
use ethers::abi::Token;
use ethers::types::{Address, H256, U256};
use std::path::Path;

/// Pyth contract on monad devnet.
pub const MONAD_PYTH_CONTRACT: &str = "0x2880aB155794e7179c9eE2e38200202908C17B43";
/// Pyth price feed id for the native token.
pub const MONAD_NATIVE_FEED_ID: &str =
    "0xff61491a931112ddf1bd8147cd1b641375f79f5825126d665480874634fd0ace";

/// Step identifiers within the suite plan.
pub const ADAPTER_STEP: &str = "PythAdapter";
pub const OPERATOR_STEP: &str = "MoonOrDoomOperator";
pub const GAME_STEP: &str = "MoonOrDoomNativeToken";

/// Constructor parameters for the suite.
#[derive(Debug, Clone)]
pub struct SuiteParams {
    /// On-chain Pyth contract the adapter wraps
    pub pyth_contract: Address,
    /// Pyth price feed id the game settles against
    pub price_feed_id: H256,
    /// Human-readable adapter description
    pub adapter_description: String,
    /// Admin account for all three contracts
    pub admin: Address,
    /// Operator account (round management)
    pub operator: Address,
    /// Round length in seconds
    pub interval_seconds: U256,
    /// Grace period for round transitions, in seconds
    pub buffer_seconds: U256,
    /// Minimum wager in wei
    pub min_entry: U256,
    /// Max staleness accepted from the oracle, in seconds
    pub oracle_update_allowance: U256,
    /// Treasury fee in basis points
    pub treasury_fee: U256,
}

impl SuiteParams {
    /// Monad devnet parameters: 60 s rounds, 30 s buffer, 0.01 native token
    /// minimum entry, 60 s oracle allowance, 2% treasury fee.
    pub fn monad(admin: Address, operator: Address) -> Result<Self> {
        Ok(Self {
            pyth_contract: MONAD_PYTH_CONTRACT
                .parse()
                .context("bad pyth contract address")?,
            price_feed_id: MONAD_NATIVE_FEED_ID
                .parse()
                .context("bad price feed id")?,
            adapter_description: "pyth adapter on monad".to_string(),
            admin,
            operator,
            interval_seconds: U256::from(60u64),
            buffer_seconds: U256::from(30u64),
            min_entry: U256::exp10(16), // 0.01 * 10^18
            oracle_update_allowance: U256::from(60u64),
            treasury_fee: U256::from(200u64),
        })
    }
}

/// Compiled artifacts for the suite.
pub struct SuiteArtifacts {
    pub adapter: ContractArtifact,
    pub operator: ContractArtifact,
    pub game: ContractArtifact,
}

impl SuiteArtifacts {
    /// Load all three artifacts from a directory of hardhat JSON files.
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            adapter: ContractArtifact::load(dir, ADAPTER_STEP)?,
            operator: ContractArtifact::load(dir, OPERATOR_STEP)?,
            game: ContractArtifact::load(dir, GAME_STEP)?,
        })
    }
}

/// Build the deployment plan for the suite.
///
/// The game's oracle and operator constructor arguments are the addresses
/// deployed by the first two steps of the same run, never configured
/// literals.
pub fn moon_or_doom_plan(params: SuiteParams, artifacts: SuiteArtifacts) -> DeploymentPlan {
    let mut plan = DeploymentPlan::new();

    {
        let p = params.clone();
        plan.push(PlanStep::new(ADAPTER_STEP, artifacts.adapter, move |_| {
            Ok(vec![
                Token::Address(p.pyth_contract),
                Token::FixedBytes(p.price_feed_id.as_bytes().to_vec()),
                Token::String(p.adapter_description.clone()),
                Token::Address(p.admin),
            ])
        }));
    }

    {
        let p = params.clone();
        plan.push(PlanStep::new(OPERATOR_STEP, artifacts.operator, move |_| {
            Ok(vec![Token::Address(p.admin), Token::Address(p.operator)])
        }));
    }

    plan.push(
        PlanStep::new(GAME_STEP, artifacts.game, move |deployed| {
            Ok(vec![
                Token::Address(deployed.address_of(ADAPTER_STEP)?),
                Token::Address(params.admin),
                Token::Address(deployed.address_of(OPERATOR_STEP)?),
                Token::Uint(params.interval_seconds),
                Token::Uint(params.buffer_seconds),
                Token::Uint(params.min_entry),
                Token::Uint(params.oracle_update_allowance),
                Token::Uint(params.treasury_fee),
            ])
        })
        .depends_on(ADAPTER_STEP)
        .depends_on(OPERATOR_STEP)
        .post_deploy(OPERATOR_STEP, "initialize", |deployed| {
            Ok(vec![
                Token::Address(deployed.address_of(GAME_STEP)?),
                Token::Address(deployed.address_of(ADAPTER_STEP)?),
            ])
        }),
    );

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{DeployedInstance, DeployedInstances};
    use ethers::abi::Abi;
    use ethers::types::{Bytes, TxHash};

    fn artifacts() -> SuiteArtifacts {
        let artifact = |name: &str| ContractArtifact {
            contract_name: name.to_string(),
            abi: Abi::default(),
            bytecode: Bytes::from(vec![0x60, 0x00]),
        };
        SuiteArtifacts {
            adapter: artifact(ADAPTER_STEP),
            operator: artifact(OPERATOR_STEP),
            game: artifact(GAME_STEP),
        }
    }

    fn params() -> SuiteParams {
        SuiteParams::monad(
            Address::from_low_u64_be(0xad),
            Address::from_low_u64_be(0x09),
        )
        .unwrap()
    }

    fn record(deployed: &mut DeployedInstances, id: &str, low: u64) {
        deployed.record(DeployedInstance {
            id: id.to_string(),
            contract_name: id.to_string(),
            address: Address::from_low_u64_be(low),
            transaction_hash: TxHash::from_low_u64_be(low),
            constructor_args: vec![],
        });
    }

    #[test]
    fn plan_is_valid_and_ordered() {
        let plan = moon_or_doom_plan(params(), artifacts());
        plan.validate().unwrap();

        let ids: Vec<&str> = plan.steps().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![ADAPTER_STEP, OPERATOR_STEP, GAME_STEP]);
        assert_eq!(
            plan.steps()[2].depends_on,
            vec![ADAPTER_STEP.to_string(), OPERATOR_STEP.to_string()]
        );
    }

    #[test]
    fn game_args_reference_deployed_addresses() {
        let plan = moon_or_doom_plan(params(), artifacts());

        let mut deployed = DeployedInstances::new();
        record(&mut deployed, ADAPTER_STEP, 0xa1);
        record(&mut deployed, OPERATOR_STEP, 0xb2);

        let args = (plan.steps()[2].args)(&deployed).unwrap();
        assert_eq!(args.len(), 8);
        assert_eq!(args[0], Token::Address(Address::from_low_u64_be(0xa1)));
        assert_eq!(args[2], Token::Address(Address::from_low_u64_be(0xb2)));
        assert_eq!(args[3], Token::Uint(U256::from(60u64)));
        assert_eq!(args[5], Token::Uint(U256::exp10(16)));
        assert_eq!(args[7], Token::Uint(U256::from(200u64)));
    }

    #[test]
    fn game_args_fail_without_earlier_instances() {
        let plan = moon_or_doom_plan(params(), artifacts());
        let empty = DeployedInstances::new();
        assert!((plan.steps()[2].args)(&empty).is_err());
    }

    #[test]
    fn initialize_links_game_and_adapter() {
        let plan = moon_or_doom_plan(params(), artifacts());

        let mut deployed = DeployedInstances::new();
        record(&mut deployed, ADAPTER_STEP, 0xa1);
        record(&mut deployed, OPERATOR_STEP, 0xb2);
        record(&mut deployed, GAME_STEP, 0xc3);

        let call = plan.steps()[2].post_deploy.as_ref().unwrap();
        assert_eq!(call.target, OPERATOR_STEP);
        assert_eq!(call.method, "initialize");

        let args = (call.args)(&deployed).unwrap();
        assert_eq!(
            args,
            vec![
                Token::Address(Address::from_low_u64_be(0xc3)),
                Token::Address(Address::from_low_u64_be(0xa1)),
            ]
        );
    }

    #[test]
    fn adapter_args_carry_feed_id_bytes() {
        let plan = moon_or_doom_plan(params(), artifacts());
        let args = (plan.steps()[0].args)(&DeployedInstances::new()).unwrap();
        assert_eq!(args.len(), 4);
        match &args[1] {
            Token::FixedBytes(bytes) => {
                assert_eq!(bytes.len(), 32);
                assert_eq!(bytes[0], 0xff);
                assert_eq!(bytes[1], 0x61);
            }
            other => panic!("unexpected token: {other:?}"),
        }
        assert_eq!(
            args[2],
            Token::String("pyth adapter on monad".to_string())
        );
    }
}
