// Interface to Ethereum-compatible networks
//
// `EthersDeployer` is the production `ContractDeployer`: a signer middleware
// over an HTTP provider. Creation transactions carry the artifact bytecode
// with ABI-encoded constructor arguments appended; calls carry the encoded
// function selector and arguments. Every transaction is awaited to a receipt
// under a configurable timeout.

pub mod explorer;
pub mod signer;

use crate::artifact::ContractArtifact;
use crate::error::ClientError;
use crate::orchestrator::{ContractDeployer, DeployedContract};
use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, TransactionRequest, TxHash, U256, U64};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::NetworkConfig;

/// `ContractDeployer` backed by an ethers signer middleware.
pub struct EthersDeployer<M> {
    client: Arc<M>,
    gas_price: Option<U256>,
    confirmation_timeout: Duration,
}

impl EthersDeployer<SignerMiddleware<Provider<Http>, LocalWallet>> {
    /// Connect to a configured network with the given wallet.
    ///
    /// The wallet must already be bound to the network's chain id (see
    /// [`signer::build_wallet`]).
    pub fn connect(
        network: &NetworkConfig,
        wallet: LocalWallet,
        confirmation_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let url = network.resolved_url().map_err(|e| ClientError::Connect {
            url: network.url.clone(),
            reason: format!("{e:#}"),
        })?;
        let provider = Provider::<Http>::try_from(url.as_str()).map_err(|e| {
            ClientError::Connect {
                url,
                reason: e.to_string(),
            }
        })?;
        let client = SignerMiddleware::new(provider, wallet);
        Ok(Self {
            client: Arc::new(client),
            gas_price: network.gas_price,
            confirmation_timeout,
        })
    }
}

impl<M> EthersDeployer<M>
where
    M: Middleware + 'static,
{
    /// Wrap an existing middleware stack.
    pub fn new(client: Arc<M>, gas_price: Option<U256>, confirmation_timeout: Duration) -> Self {
        Self {
            client,
            gas_price,
            confirmation_timeout,
        }
    }

    /// Creation transaction payload: bytecode plus encoded constructor args.
    fn creation_data(artifact: &ContractArtifact, args: &[Token]) -> Result<Vec<u8>, ClientError> {
        match artifact.abi.constructor() {
            Some(constructor) => constructor
                .encode_input(artifact.bytecode.to_vec(), args)
                .map_err(|e| ClientError::Abi(e.to_string())),
            None if args.is_empty() => Ok(artifact.bytecode.to_vec()),
            None => Err(ClientError::Abi(format!(
                "{} has no constructor but {} argument(s) were supplied",
                artifact.contract_name,
                args.len()
            ))),
        }
    }

    /// Call transaction payload: function selector plus encoded args.
    fn call_data(abi: &Abi, method: &str, args: &[Token]) -> Result<Vec<u8>, ClientError> {
        let function = abi
            .function(method)
            .map_err(|e| ClientError::Abi(e.to_string()))?;
        function
            .encode_input(args)
            .map_err(|e| ClientError::Abi(e.to_string()))
    }

    /// Submit a transaction and await its receipt under the timeout.
    async fn submit(&self, mut tx: TransactionRequest) -> Result<(TxHash, Address), ClientError> {
        if let Some(gas_price) = self.gas_price {
            tx = tx.gas_price(gas_price);
        }

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| ClientError::Rejected {
                reason: e.to_string(),
            })?;
        let tx_hash = *pending;
        debug!("submitted transaction {tx_hash:?}");

        let receipt = timeout(self.confirmation_timeout, pending)
            .await
            .map_err(|_| ClientError::ConfirmationTimeout {
                tx_hash,
                waited: self.confirmation_timeout,
            })?
            .map_err(|e| ClientError::Rejected {
                reason: e.to_string(),
            })?
            // A dropped transaction yields no receipt at all.
            .ok_or(ClientError::ConfirmationTimeout {
                tx_hash,
                waited: self.confirmation_timeout,
            })?;

        if receipt.status != Some(U64::one()) {
            return Err(ClientError::Reverted { tx_hash });
        }

        Ok((
            receipt.transaction_hash,
            receipt.contract_address.unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl<M> ContractDeployer for EthersDeployer<M>
where
    M: Middleware + 'static,
{
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        args: Vec<Token>,
    ) -> Result<DeployedContract, ClientError> {
        let data = Self::creation_data(artifact, &args)?;
        let tx = TransactionRequest::new().data(data);
        let (transaction_hash, address) = self.submit(tx).await?;
        if address == Address::zero() {
            // Mined without a contract address: not a creation receipt.
            return Err(ClientError::Rejected {
                reason: format!(
                    "no contract address in receipt for {}",
                    artifact.contract_name
                ),
            });
        }
        Ok(DeployedContract {
            address,
            transaction_hash,
        })
    }

    async fn call(
        &self,
        to: Address,
        abi: &Abi,
        method: &str,
        args: Vec<Token>,
    ) -> Result<TxHash, ClientError> {
        let data = Self::call_data(abi, method, &args)?;
        let tx = TransactionRequest::new().to(to).data(data);
        let (transaction_hash, _) = self.submit(tx).await?;
        Ok(transaction_hash)
    }
}
