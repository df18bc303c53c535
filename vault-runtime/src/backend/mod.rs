pub mod rpc;
pub mod simulated;

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::error::LifecycleError;
use crate::types::{OutputRoute, RouterKind};

/// Shared, type-erased backend handed to every contract handle.
pub type SharedBackend = Arc<dyn ChainBackend>;

/// Remote call surface of the vault, strategy, tokens and router.
///
/// Every method is a single pass-through call. State-changing methods take
/// the acting address as `from`; the backend signs or attributes the call
/// as that actor. A contract-level rejection is reported as
/// [`LifecycleError::Reverted`].
#[async_trait]
pub trait ChainBackend: Send + Sync {
    // ── vault ────────────────────────────────────────────────────────────
    async fn vault_strategy(&self, vault: Address) -> Result<Address, LifecycleError>;
    async fn vault_want(&self, vault: Address) -> Result<Address, LifecycleError>;
    async fn vault_token(&self, vault: Address) -> Result<Address, LifecycleError>;
    async fn vault_balance(&self, vault: Address) -> Result<U256, LifecycleError>;
    async fn price_per_full_share(&self, vault: Address) -> Result<U256, LifecycleError>;
    async fn vault_owner(&self, vault: Address) -> Result<Address, LifecycleError>;
    async fn deposit_all(&self, vault: Address, from: Address) -> Result<(), LifecycleError>;
    async fn withdraw_all(&self, vault: Address, from: Address) -> Result<(), LifecycleError>;

    // ── strategy ─────────────────────────────────────────────────────────
    async fn strategy_vault(&self, strategy: Address) -> Result<Address, LifecycleError>;
    async fn strategy_router(&self, strategy: Address) -> Result<Address, LifecycleError>;
    async fn harvest_with_call_fee_recipient(
        &self,
        strategy: Address,
        recipient: Address,
        from: Address,
    ) -> Result<(), LifecycleError>;
    async fn panic(&self, strategy: Address, from: Address) -> Result<(), LifecycleError>;
    async fn paused(&self, strategy: Address) -> Result<bool, LifecycleError>;
    async fn unpause(&self, strategy: Address, from: Address) -> Result<(), LifecycleError>;
    async fn balance_of_pool(&self, strategy: Address) -> Result<U256, LifecycleError>;
    async fn balance_of_want(&self, strategy: Address) -> Result<U256, LifecycleError>;
    async fn last_harvest(&self, strategy: Address) -> Result<U256, LifecycleError>;
    async fn call_fee(&self, strategy: Address) -> Result<U256, LifecycleError>;
    async fn withdrawal_fee(&self, strategy: Address) -> Result<U256, LifecycleError>;
    async fn harvest_on_deposit(&self, strategy: Address) -> Result<bool, LifecycleError>;
    async fn strategy_owner(&self, strategy: Address) -> Result<Address, LifecycleError>;
    async fn strategy_keeper(&self, strategy: Address) -> Result<Address, LifecycleError>;
    async fn output_route(
        &self,
        strategy: Address,
        route: OutputRoute,
        index: u64,
    ) -> Result<Address, LifecycleError>;

    // ── tokens ───────────────────────────────────────────────────────────
    async fn token_balance(&self, token: Address, holder: Address)
    -> Result<U256, LifecycleError>;
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError>;
    async fn transfer(
        &self,
        token: Address,
        to: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError>;
    /// `token0()` / `token1()` of an LP pair. Reverts for plain tokens.
    async fn pair_tokens(&self, token: Address) -> Result<(Address, Address), LifecycleError>;
    async fn wrap_native(
        &self,
        wnative: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError>;

    // ── router ───────────────────────────────────────────────────────────
    async fn swap_native_for_tokens(&self, swap: NativeSwap) -> Result<(), LifecycleError>;
    async fn add_liquidity(&self, request: AddLiquidity) -> Result<(), LifecycleError>;

    // ── chain ────────────────────────────────────────────────────────────
    /// Move chain time forward and mine a block. Only meaningful on local
    /// development nodes.
    async fn advance_time(&self, secs: u64) -> Result<(), LifecycleError>;
}

/// A payable `swapExact<NATIVE>ForTokens` call.
#[derive(Debug, Clone)]
pub struct NativeSwap {
    pub router: Address,
    pub kind: RouterKind,
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub recipient: Address,
    pub deadline: U256,
    pub from: Address,
}

/// An `addLiquidity` call on a V2-style router.
#[derive(Debug, Clone)]
pub struct AddLiquidity {
    pub router: Address,
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a: U256,
    pub amount_b: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
    pub recipient: Address,
    pub deadline: U256,
    pub from: Address,
}
