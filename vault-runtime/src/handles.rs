//! Remote references to the vault, strategy, router and tokens.
//!
//! Each handle pairs a contract address with the shared backend, giving the
//! scenarios a contract-shaped API instead of raw backend calls.

use std::fmt;

use alloy::primitives::{Address, U256};

use crate::backend::{AddLiquidity, NativeSwap, SharedBackend};
use crate::error::LifecycleError;
use crate::types::{OutputRoute, RouterKind};

macro_rules! impl_handle_debug {
    ($name:ident) => {
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("address", &self.address)
                    .finish_non_exhaustive()
            }
        }
    };
}

#[derive(Clone)]
pub struct VaultHandle {
    backend: SharedBackend,
    address: Address,
}

impl_handle_debug!(VaultHandle);

impl VaultHandle {
    pub fn new(backend: SharedBackend, address: Address) -> Self {
        Self { backend, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    pub async fn strategy(&self) -> Result<Address, LifecycleError> {
        self.backend.vault_strategy(self.address).await
    }

    pub async fn want(&self) -> Result<Address, LifecycleError> {
        self.backend.vault_want(self.address).await
    }

    pub async fn token(&self) -> Result<Address, LifecycleError> {
        self.backend.vault_token(self.address).await
    }

    /// Total want under management (vault + strategy).
    pub async fn balance(&self) -> Result<U256, LifecycleError> {
        self.backend.vault_balance(self.address).await
    }

    pub async fn price_per_full_share(&self) -> Result<U256, LifecycleError> {
        self.backend.price_per_full_share(self.address).await
    }

    pub async fn owner(&self) -> Result<Address, LifecycleError> {
        self.backend.vault_owner(self.address).await
    }

    pub async fn deposit_all(&self, from: Address) -> Result<(), LifecycleError> {
        self.backend.deposit_all(self.address, from).await
    }

    pub async fn withdraw_all(&self, from: Address) -> Result<(), LifecycleError> {
        self.backend.withdraw_all(self.address, from).await
    }
}

#[derive(Clone)]
pub struct StrategyHandle {
    backend: SharedBackend,
    address: Address,
}

impl_handle_debug!(StrategyHandle);

impl StrategyHandle {
    pub fn new(backend: SharedBackend, address: Address) -> Self {
        Self { backend, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn vault(&self) -> Result<Address, LifecycleError> {
        self.backend.strategy_vault(self.address).await
    }

    pub async fn unirouter(&self) -> Result<Address, LifecycleError> {
        self.backend.strategy_router(self.address).await
    }

    pub async fn harvest_with_call_fee_recipient(
        &self,
        recipient: Address,
        from: Address,
    ) -> Result<(), LifecycleError> {
        self.backend
            .harvest_with_call_fee_recipient(self.address, recipient, from)
            .await
    }

    pub async fn panic(&self, from: Address) -> Result<(), LifecycleError> {
        self.backend.panic(self.address, from).await
    }

    pub async fn paused(&self) -> Result<bool, LifecycleError> {
        self.backend.paused(self.address).await
    }

    pub async fn unpause(&self, from: Address) -> Result<(), LifecycleError> {
        self.backend.unpause(self.address, from).await
    }

    pub async fn balance_of_pool(&self) -> Result<U256, LifecycleError> {
        self.backend.balance_of_pool(self.address).await
    }

    pub async fn balance_of_want(&self) -> Result<U256, LifecycleError> {
        self.backend.balance_of_want(self.address).await
    }

    pub async fn last_harvest(&self) -> Result<U256, LifecycleError> {
        self.backend.last_harvest(self.address).await
    }

    pub async fn call_fee(&self) -> Result<U256, LifecycleError> {
        self.backend.call_fee(self.address).await
    }

    pub async fn withdrawal_fee(&self) -> Result<U256, LifecycleError> {
        self.backend.withdrawal_fee(self.address).await
    }

    pub async fn harvest_on_deposit(&self) -> Result<bool, LifecycleError> {
        self.backend.harvest_on_deposit(self.address).await
    }

    pub async fn owner(&self) -> Result<Address, LifecycleError> {
        self.backend.strategy_owner(self.address).await
    }

    pub async fn keeper(&self) -> Result<Address, LifecycleError> {
        self.backend.strategy_keeper(self.address).await
    }

    pub async fn output_route(
        &self,
        route: OutputRoute,
        index: u64,
    ) -> Result<Address, LifecycleError> {
        self.backend.output_route(self.address, route, index).await
    }
}

#[derive(Clone)]
pub struct TokenHandle {
    backend: SharedBackend,
    address: Address,
}

impl_handle_debug!(TokenHandle);

impl TokenHandle {
    pub fn new(backend: SharedBackend, address: Address) -> Self {
        Self { backend, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn balance_of(&self, holder: Address) -> Result<U256, LifecycleError> {
        self.backend.token_balance(self.address, holder).await
    }

    pub async fn approve(
        &self,
        spender: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        self.backend.approve(self.address, spender, amount, from).await
    }

    pub async fn transfer(
        &self,
        to: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        self.backend.transfer(self.address, to, amount, from).await
    }

    /// `(token0, token1)` when this token is an LP pair, `None` otherwise.
    ///
    /// Any failure of the probe is read as "not a pair".
    pub async fn lp_components(&self) -> Option<(Address, Address)> {
        self.backend.pair_tokens(self.address).await.ok()
    }
}

#[derive(Clone)]
pub struct RouterHandle {
    backend: SharedBackend,
    address: Address,
    kind: RouterKind,
}

impl fmt::Debug for RouterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterHandle")
            .field("address", &self.address)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl RouterHandle {
    pub fn new(backend: SharedBackend, address: Address, kind: RouterKind) -> Self {
        Self {
            backend,
            address,
            kind,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn kind(&self) -> RouterKind {
        self.kind
    }

    pub async fn swap_exact_native_for_tokens(
        &self,
        amount_in: U256,
        amount_out_min: U256,
        path: Vec<Address>,
        recipient: Address,
        deadline: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        self.backend
            .swap_native_for_tokens(NativeSwap {
                router: self.address,
                kind: self.kind,
                amount_in,
                amount_out_min,
                path,
                recipient,
                deadline,
                from,
            })
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_liquidity(
        &self,
        token_a: Address,
        token_b: Address,
        amount_a: U256,
        amount_b: U256,
        amount_a_min: U256,
        amount_b_min: U256,
        recipient: Address,
        deadline: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        self.backend
            .add_liquidity(AddLiquidity {
                router: self.address,
                token_a,
                token_b,
                amount_a,
                amount_b,
                amount_a_min,
                amount_b_min,
                recipient,
                deadline,
                from,
            })
            .await
    }
}
