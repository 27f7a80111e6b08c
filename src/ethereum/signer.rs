// Signing identity
//
// One wallet signs every transaction of a run. Credentials come from the
// network configuration: a raw private key, or a BIP-39 phrase with an
// optional derivation path prefix and account index.

use crate::config::{expand_env, CredentialSource};
use anyhow::{Context, Result};
use ethers::signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer};

/// Build the run's wallet from configured credentials, bound to `chain_id`.
pub fn build_wallet(credentials: &CredentialSource, chain_id: u64) -> Result<LocalWallet> {
    let wallet = match credentials {
        CredentialSource::PrivateKey { key } => {
            let key = expand_env(key)?;
            key.trim()
                .trim_start_matches("0x")
                .parse::<LocalWallet>()
                .context("invalid private key")?
        }
        CredentialSource::Mnemonic {
            phrase,
            path,
            initial_index,
        } => {
            let phrase = expand_env(phrase)?;
            let builder = MnemonicBuilder::<English>::default().phrase(phrase.as_str());
            let builder = match path {
                // Path prefix + index, hardhat style ("m/44'/60'/0'/0/" + 0).
                Some(prefix) => builder
                    .derivation_path(&format!("{}{initial_index}", prefix.trim()))
                    .context("invalid derivation path")?,
                None => builder
                    .index(*initial_index)
                    .context("invalid account index")?,
            };
            builder
                .build()
                .context("failed to derive wallet from mnemonic")?
        }
    };
    Ok(wallet.with_chain_id(chain_id))
}
