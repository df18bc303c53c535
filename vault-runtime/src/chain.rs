//! Chain client for connecting to the EVM network that hosts the vault.
//!
//! Provides a configured provider whose wallet holds every actor key, so a
//! transaction is signed by whichever actor it is sent `from`.

use alloy::network::{Ethereum, EthereumWallet};
use alloy::providers::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
};
use alloy::providers::{Identity, ProviderBuilder, RootProvider};
use alloy::signers::local::PrivateKeySigner;

use crate::error::LifecycleError;
use crate::types::{ActorKeys, ActorSet};

/// The concrete provider type produced by `ProviderBuilder::new().wallet(...).connect_http(...)`.
pub type HttpProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
    Ethereum,
>;

/// A chain client wrapping an alloy provider with the actor signers.
pub struct ChainClient {
    pub provider: HttpProvider,
    pub actors: ActorSet,
}

fn parse_signer(role: &str, key: &str) -> Result<PrivateKeySigner, LifecycleError> {
    key.parse()
        .map_err(|e| LifecycleError::ConfigError(format!("Invalid {role} private key: {e}")))
}

impl ChainClient {
    /// Create a new chain client from an RPC URL and the actor keys.
    ///
    /// The deployer is the wallet's default signer.
    pub fn new(rpc_url: &str, keys: &ActorKeys) -> Result<Self, LifecycleError> {
        let deployer = parse_signer("deployer", &keys.deployer)?;
        let keeper = parse_signer("keeper", &keys.keeper)?;
        let other = parse_signer("other", &keys.other)?;

        let actors = ActorSet {
            deployer: deployer.address(),
            keeper: keeper.address(),
            other: other.address(),
        };

        let mut wallet = EthereumWallet::from(deployer);
        wallet.register_signer(keeper);
        wallet.register_signer(other);

        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| LifecycleError::ConfigError(format!("Invalid RPC URL: {e}")))?;

        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(url);

        Ok(Self { provider, actors })
    }

    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_chain_client_creation() {
        let client = ChainClient::new("http://localhost:8545", &ActorKeys::default()).unwrap();
        assert_eq!(
            client.actors.deployer,
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );
        assert_eq!(
            client.actors.keeper,
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
        assert_eq!(
            client.actors.other,
            address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC")
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let keys = ActorKeys {
            keeper: "not-a-key".into(),
            ..ActorKeys::default()
        };
        let result = ChainClient::new("http://localhost:8545", &keys);
        assert!(matches!(result, Err(LifecycleError::ConfigError(msg)) if msg.contains("keeper")));
    }

    #[test]
    fn test_invalid_rpc_url() {
        let result = ChainClient::new("not a url", &ActorKeys::default());
        assert!(result.is_err());
    }
}
