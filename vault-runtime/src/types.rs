use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// The three signing identities a lifecycle run acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSet {
    /// Deployer and primary depositor; receives the swapped test funds.
    pub deployer: Address,
    pub keeper: Address,
    /// Second depositor used by the share-price non-interference scenario.
    pub other: Address,
}

/// Hex-encoded private keys for the actor set.
#[derive(Clone, Serialize, Deserialize)]
pub struct ActorKeys {
    pub deployer: String,
    pub keeper: String,
    pub other: String,
}

impl std::fmt::Debug for ActorKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorKeys").finish_non_exhaustive()
    }
}

/// Well-known local development keys (accounts #0, #1 and #2 of anvil and hardhat).
pub const DEV_DEPLOYER_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_KEEPER_KEY: &str =
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const DEV_OTHER_KEY: &str =
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

impl Default for ActorKeys {
    fn default() -> Self {
        Self {
            deployer: DEV_DEPLOYER_KEY.into(),
            keeper: DEV_KEEPER_KEY.into(),
            other: DEV_OTHER_KEY.into(),
        }
    }
}

/// Which output route of an LP strategy to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputRoute {
    Lp0,
    Lp1,
}

impl OutputRoute {
    pub fn label(&self) -> &'static str {
        match self {
            OutputRoute::Lp0 => "lp0",
            OutputRoute::Lp1 => "lp1",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            OutputRoute::Lp0 => "outputToLp0Route",
            OutputRoute::Lp1 => "outputToLp1Route",
        }
    }
}

/// Router dialect: which payable swap entry point the router exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterKind {
    /// `swapExactETHForTokens` (Uniswap V2 and most forks).
    #[default]
    Eth,
    /// `swapExactAVAXForTokens` (Trader Joe style routers).
    Avax,
}

impl RouterKind {
    pub fn swap_signature(&self) -> &'static str {
        match self {
            RouterKind::Eth => "swapExactETHForTokens",
            RouterKind::Avax => "swapExactAVAXForTokens",
        }
    }
}
