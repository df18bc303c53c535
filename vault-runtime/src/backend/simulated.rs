//! In-memory [`ChainBackend`] used to exercise the lifecycle scenarios
//! without a network.
//!
//! The bookkeeping is the minimum the scenarios can observe: token balances
//! and allowances, proportional vault shares, a strategy with pooled and
//! idle funds, and a router that mints its output token at a fixed rate.
//! It makes no attempt to mirror any real strategy's accounting.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use alloy::primitives::{Address, U256, address};
use async_trait::async_trait;

use super::{AddLiquidity, ChainBackend, NativeSwap};
use crate::error::LifecycleError;
use crate::types::{ActorSet, OutputRoute, RouterKind};

pub const SIM_VAULT: Address = address!("00000000000000000000000000000000000000a1");
pub const SIM_STRATEGY: Address = address!("00000000000000000000000000000000000000a2");
pub const SIM_ROUTER: Address = address!("00000000000000000000000000000000000000a3");
pub const SIM_WANT: Address = address!("00000000000000000000000000000000000000a4");
pub const SIM_WNATIVE: Address = address!("00000000000000000000000000000000000000a5");
pub const SIM_LP0: Address = address!("00000000000000000000000000000000000000a6");
pub const SIM_LP1: Address = address!("00000000000000000000000000000000000000a7");
pub const SIM_OWNER: Address = address!("00000000000000000000000000000000000000b1");

/// Share price scale used by `getPricePerFullShare`.
const PRICE_SCALE: u64 = 1_000_000_000_000_000_000;
const BPS: u64 = 10_000;
const SIM_GENESIS_TIME: u64 = 1_700_000_000;

/// Shape of the want token the simulated vault holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WantKind {
    /// A plain ERC-20 bought straight from the router.
    Token,
    /// An LP pair of [`SIM_LP0`] / [`SIM_LP1`].
    LpPair,
    /// The wrapped native token itself.
    Native,
}

/// Builder for a [`SimulatedBackend`].
#[derive(Debug, Clone)]
pub struct SimulationBuilder {
    actors: ActorSet,
    want_kind: WantKind,
    expose_token_getter: bool,
    router_kind: RouterKind,
    swap_rate_bps: u64,
    harvest_yield_bps: u64,
    call_fee: u64,
    withdrawal_fee_bps: u64,
    harvest_on_deposit: bool,
    paused: bool,
    lp0_route: Vec<Address>,
    lp1_route: Vec<Address>,
    paused_deposit_reason: String,
    idle_want: U256,
    panic_release_bps: u64,
    strategy_owner: Address,
    vault_owner: Address,
    strategy_keeper: Address,
}

impl SimulationBuilder {
    pub fn new(actors: ActorSet) -> Self {
        Self {
            actors,
            want_kind: WantKind::Token,
            expose_token_getter: false,
            router_kind: RouterKind::Eth,
            swap_rate_bps: BPS,
            harvest_yield_bps: 50,
            call_fee: 111,
            withdrawal_fee_bps: 10,
            harvest_on_deposit: false,
            paused: false,
            lp0_route: Vec::new(),
            lp1_route: Vec::new(),
            paused_deposit_reason: "TransferHelper: TRANSFER_FROM_FAILED".into(),
            idle_want: U256::ZERO,
            panic_release_bps: BPS,
            strategy_owner: SIM_OWNER,
            vault_owner: SIM_OWNER,
            strategy_keeper: actors.keeper,
        }
    }

    pub fn want_kind(mut self, kind: WantKind) -> Self {
        self.want_kind = kind;
        self
    }

    /// Make the vault answer `token()` in addition to `want()`.
    pub fn expose_token_getter(mut self, expose: bool) -> Self {
        self.expose_token_getter = expose;
        self
    }

    pub fn router_kind(mut self, kind: RouterKind) -> Self {
        self.router_kind = kind;
        self
    }

    /// Output tokens minted per native token swapped, in basis points.
    pub fn swap_rate_bps(mut self, bps: u64) -> Self {
        self.swap_rate_bps = bps;
        self
    }

    pub fn harvest_yield_bps(mut self, bps: u64) -> Self {
        self.harvest_yield_bps = bps;
        self
    }

    pub fn call_fee(mut self, fee: u64) -> Self {
        self.call_fee = fee;
        self
    }

    pub fn withdrawal_fee_bps(mut self, bps: u64) -> Self {
        self.withdrawal_fee_bps = bps;
        self
    }

    pub fn harvest_on_deposit(mut self, enabled: bool) -> Self {
        self.harvest_on_deposit = enabled;
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn routes(mut self, lp0: Vec<Address>, lp1: Vec<Address>) -> Self {
        self.lp0_route = lp0;
        self.lp1_route = lp1;
        self
    }

    pub fn paused_deposit_reason(mut self, reason: impl Into<String>) -> Self {
        self.paused_deposit_reason = reason.into();
        self
    }

    /// Want already sitting idle in the strategy that no shares claim.
    pub fn idle_want(mut self, amount: U256) -> Self {
        self.idle_want = amount;
        self
    }

    /// Share of the pooled funds `panic()` pulls back into the strategy.
    pub fn panic_release_bps(mut self, bps: u64) -> Self {
        self.panic_release_bps = bps;
        self
    }

    pub fn roles(mut self, vault_owner: Address, strategy_owner: Address, keeper: Address) -> Self {
        self.vault_owner = vault_owner;
        self.strategy_owner = strategy_owner;
        self.strategy_keeper = keeper;
        self
    }

    pub fn build(self) -> SimulatedBackend {
        let want = match self.want_kind {
            WantKind::Token | WantKind::LpPair => SIM_WANT,
            WantKind::Native => SIM_WNATIVE,
        };
        let mut pairs = HashMap::new();
        if self.want_kind == WantKind::LpPair {
            pairs.insert(SIM_WANT, (SIM_LP0, SIM_LP1));
        }

        let state = SimState {
            now: SIM_GENESIS_TIME,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            pairs,
            vault: SimVault {
                want,
                owner: self.vault_owner,
                expose_token_getter: self.expose_token_getter,
                total_shares: U256::ZERO,
                shares: HashMap::new(),
            },
            strategy: SimStrategy {
                owner: self.strategy_owner,
                keeper: self.strategy_keeper,
                pool: U256::ZERO,
                idle: self.idle_want,
                paused: self.paused,
                last_harvest: 0,
                call_fee: self.call_fee,
                withdrawal_fee_bps: self.withdrawal_fee_bps,
                harvest_on_deposit: self.harvest_on_deposit,
                harvest_yield_bps: self.harvest_yield_bps,
                lp0_route: self.lp0_route,
                lp1_route: self.lp1_route,
                paused_deposit_reason: self.paused_deposit_reason,
                panic_release_bps: self.panic_release_bps,
            },
            router_kind: self.router_kind,
            swap_rate_bps: self.swap_rate_bps,
            harvests: 0,
        };

        SimulatedBackend {
            actors: self.actors,
            state: Mutex::new(state),
        }
    }
}

#[derive(Debug)]
struct SimVault {
    want: Address,
    owner: Address,
    expose_token_getter: bool,
    total_shares: U256,
    shares: HashMap<Address, U256>,
}

#[derive(Debug)]
struct SimStrategy {
    owner: Address,
    keeper: Address,
    pool: U256,
    idle: U256,
    paused: bool,
    last_harvest: u64,
    call_fee: u64,
    withdrawal_fee_bps: u64,
    harvest_on_deposit: bool,
    harvest_yield_bps: u64,
    lp0_route: Vec<Address>,
    lp1_route: Vec<Address>,
    paused_deposit_reason: String,
    panic_release_bps: u64,
}

impl SimStrategy {
    fn is_manager(&self, who: Address) -> bool {
        who == self.owner || who == self.keeper
    }
}

#[derive(Debug)]
struct SimState {
    now: u64,
    /// (token, holder) → balance
    balances: HashMap<(Address, Address), U256>,
    /// (token, owner, spender) → allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    /// LP token → (token0, token1)
    pairs: HashMap<Address, (Address, Address)>,
    vault: SimVault,
    strategy: SimStrategy,
    router_kind: RouterKind,
    swap_rate_bps: u64,
    harvests: u64,
}

fn revert(method: &str, reason: Option<&str>) -> LifecycleError {
    LifecycleError::Reverted {
        method: method.to_string(),
        reason: reason.map(str::to_string),
    }
}

impl SimState {
    fn balance(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    fn credit(&mut self, token: Address, holder: Address, amount: U256) {
        *self.balances.entry((token, holder)).or_default() += amount;
    }

    fn debit(
        &mut self,
        method: &str,
        token: Address,
        holder: Address,
        amount: U256,
    ) -> Result<(), LifecycleError> {
        let balance = self.balance(token, holder);
        if balance < amount {
            return Err(revert(method, Some("ERC20: transfer amount exceeds balance")));
        }
        self.balances.insert((token, holder), balance - amount);
        Ok(())
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Fails the way `transferFrom` would, without touching any state.
    fn check_transfer_from(
        &self,
        method: &str,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), LifecycleError> {
        if self.allowance(token, owner, spender) < amount {
            return Err(revert(method, Some("ERC20: transfer amount exceeds allowance")));
        }
        if self.balance(token, owner) < amount {
            return Err(revert(method, Some("ERC20: transfer amount exceeds balance")));
        }
        Ok(())
    }

    /// Applies a transfer already accepted by [`SimState::check_transfer_from`].
    fn transfer_from(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        let allowance = self.allowance(token, owner, spender);
        self.allowances.insert((token, owner, spender), allowance - amount);
        let balance = self.balance(token, owner);
        self.balances.insert((token, owner), balance - amount);
    }

    fn vault_balance(&self) -> U256 {
        self.strategy.pool + self.strategy.idle
    }

    fn price_per_full_share(&self) -> U256 {
        if self.vault.total_shares.is_zero() {
            U256::from(PRICE_SCALE)
        } else {
            self.vault_balance() * U256::from(PRICE_SCALE) / self.vault.total_shares
        }
    }

    fn harvest(&mut self) {
        let reward = self.strategy.pool * U256::from(self.strategy.harvest_yield_bps) / U256::from(BPS);
        self.strategy.pool += reward;
        self.strategy.last_harvest = self.now;
        self.harvests += 1;
    }

    /// Pay `amount` out of the strategy, idle funds first.
    fn release(&mut self, amount: U256) {
        let from_idle = amount.min(self.strategy.idle);
        self.strategy.idle -= from_idle;
        self.strategy.pool -= amount - from_idle;
    }
}

/// In-memory backend with a single vault, strategy and router.
pub struct SimulatedBackend {
    actors: ActorSet,
    state: Mutex<SimState>,
}

impl SimulatedBackend {
    pub fn builder(actors: ActorSet) -> SimulationBuilder {
        SimulationBuilder::new(actors)
    }

    pub fn actors(&self) -> ActorSet {
        self.actors
    }

    /// Number of harvests executed so far.
    pub fn harvest_count(&self) -> u64 {
        self.lock().harvests
    }

    /// Seconds elapsed on the simulated clock.
    pub fn now(&self) -> u64 {
        self.lock().now
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_vault(method: &str, vault: Address) -> Result<(), LifecycleError> {
        if vault == SIM_VAULT {
            Ok(())
        } else {
            Err(LifecycleError::RpcError {
                method: method.to_string(),
                message: format!("no vault deployed at {vault}"),
            })
        }
    }

    fn check_strategy(method: &str, strategy: Address) -> Result<(), LifecycleError> {
        if strategy == SIM_STRATEGY {
            Ok(())
        } else {
            Err(LifecycleError::RpcError {
                method: method.to_string(),
                message: format!("no strategy deployed at {strategy}"),
            })
        }
    }

    fn check_router(method: &str, router: Address) -> Result<(), LifecycleError> {
        if router == SIM_ROUTER {
            Ok(())
        } else {
            Err(LifecycleError::RpcError {
                method: method.to_string(),
                message: format!("no router deployed at {router}"),
            })
        }
    }
}

#[async_trait]
impl ChainBackend for SimulatedBackend {
    async fn vault_strategy(&self, vault: Address) -> Result<Address, LifecycleError> {
        Self::check_vault("strategy", vault)?;
        Ok(SIM_STRATEGY)
    }

    async fn vault_want(&self, vault: Address) -> Result<Address, LifecycleError> {
        Self::check_vault("want", vault)?;
        Ok(self.lock().vault.want)
    }

    async fn vault_token(&self, vault: Address) -> Result<Address, LifecycleError> {
        Self::check_vault("token", vault)?;
        let state = self.lock();
        if state.vault.expose_token_getter {
            Ok(state.vault.want)
        } else {
            Err(revert("token", None))
        }
    }

    async fn vault_balance(&self, vault: Address) -> Result<U256, LifecycleError> {
        Self::check_vault("balance", vault)?;
        Ok(self.lock().vault_balance())
    }

    async fn price_per_full_share(&self, vault: Address) -> Result<U256, LifecycleError> {
        Self::check_vault("getPricePerFullShare", vault)?;
        Ok(self.lock().price_per_full_share())
    }

    async fn vault_owner(&self, vault: Address) -> Result<Address, LifecycleError> {
        Self::check_vault("owner", vault)?;
        Ok(self.lock().vault.owner)
    }

    async fn deposit_all(&self, vault: Address, from: Address) -> Result<(), LifecycleError> {
        Self::check_vault("depositAll", vault)?;
        let mut state = self.lock();
        let want = state.vault.want;
        let amount = state.balance(want, from);

        if state.strategy.paused {
            let reason = state.strategy.paused_deposit_reason.clone();
            return Err(revert("depositAll", Some(&reason)));
        }
        state.check_transfer_from("depositAll", want, from, SIM_VAULT, amount)?;

        if state.strategy.harvest_on_deposit && !state.strategy.pool.is_zero() {
            state.harvest();
        }
        let pool_before = state.vault_balance();
        state.transfer_from(want, from, SIM_VAULT, amount);
        state.strategy.pool += amount;

        let shares = if state.vault.total_shares.is_zero() || pool_before.is_zero() {
            amount
        } else {
            amount * state.vault.total_shares / pool_before
        };
        state.vault.total_shares += shares;
        *state.vault.shares.entry(from).or_default() += shares;
        Ok(())
    }

    async fn withdraw_all(&self, vault: Address, from: Address) -> Result<(), LifecycleError> {
        Self::check_vault("withdrawAll", vault)?;
        let mut state = self.lock();
        let shares = state.vault.shares.remove(&from).unwrap_or_default();
        if shares.is_zero() {
            return Ok(());
        }

        let owed = state.vault_balance() * shares / state.vault.total_shares;
        state.vault.total_shares -= shares;

        let fee = if state.strategy.paused {
            U256::ZERO
        } else {
            owed * U256::from(state.strategy.withdrawal_fee_bps) / U256::from(BPS)
        };
        let payout = owed - fee;
        state.release(payout);
        let want = state.vault.want;
        state.credit(want, from, payout);
        Ok(())
    }

    async fn strategy_vault(&self, strategy: Address) -> Result<Address, LifecycleError> {
        Self::check_strategy("vault", strategy)?;
        Ok(SIM_VAULT)
    }

    async fn strategy_router(&self, strategy: Address) -> Result<Address, LifecycleError> {
        Self::check_strategy("unirouter", strategy)?;
        Ok(SIM_ROUTER)
    }

    async fn harvest_with_call_fee_recipient(
        &self,
        strategy: Address,
        _recipient: Address,
        _from: Address,
    ) -> Result<(), LifecycleError> {
        Self::check_strategy("harvestWithCallFeeRecipient", strategy)?;
        let mut state = self.lock();
        if state.strategy.paused {
            return Err(revert("harvestWithCallFeeRecipient", Some("Pausable: paused")));
        }
        state.harvest();
        Ok(())
    }

    async fn panic(&self, strategy: Address, from: Address) -> Result<(), LifecycleError> {
        Self::check_strategy("panic", strategy)?;
        let mut state = self.lock();
        if !state.strategy.is_manager(from) {
            return Err(revert("panic", Some("!manager")));
        }
        let released =
            state.strategy.pool * U256::from(state.strategy.panic_release_bps) / U256::from(BPS);
        state.strategy.idle += released;
        state.strategy.pool -= released;
        state.strategy.paused = true;
        Ok(())
    }

    async fn paused(&self, strategy: Address) -> Result<bool, LifecycleError> {
        Self::check_strategy("paused", strategy)?;
        Ok(self.lock().strategy.paused)
    }

    async fn unpause(&self, strategy: Address, from: Address) -> Result<(), LifecycleError> {
        Self::check_strategy("unpause", strategy)?;
        let mut state = self.lock();
        if !state.strategy.is_manager(from) {
            return Err(revert("unpause", Some("!manager")));
        }
        let idle = state.strategy.idle;
        state.strategy.pool += idle;
        state.strategy.idle = U256::ZERO;
        state.strategy.paused = false;
        Ok(())
    }

    async fn balance_of_pool(&self, strategy: Address) -> Result<U256, LifecycleError> {
        Self::check_strategy("balanceOfPool", strategy)?;
        Ok(self.lock().strategy.pool)
    }

    async fn balance_of_want(&self, strategy: Address) -> Result<U256, LifecycleError> {
        Self::check_strategy("balanceOfWant", strategy)?;
        Ok(self.lock().strategy.idle)
    }

    async fn last_harvest(&self, strategy: Address) -> Result<U256, LifecycleError> {
        Self::check_strategy("lastHarvest", strategy)?;
        Ok(U256::from(self.lock().strategy.last_harvest))
    }

    async fn call_fee(&self, strategy: Address) -> Result<U256, LifecycleError> {
        Self::check_strategy("callFee", strategy)?;
        Ok(U256::from(self.lock().strategy.call_fee))
    }

    async fn withdrawal_fee(&self, strategy: Address) -> Result<U256, LifecycleError> {
        Self::check_strategy("withdrawalFee", strategy)?;
        Ok(U256::from(self.lock().strategy.withdrawal_fee_bps))
    }

    async fn harvest_on_deposit(&self, strategy: Address) -> Result<bool, LifecycleError> {
        Self::check_strategy("harvestOnDeposit", strategy)?;
        Ok(self.lock().strategy.harvest_on_deposit)
    }

    async fn strategy_owner(&self, strategy: Address) -> Result<Address, LifecycleError> {
        Self::check_strategy("owner", strategy)?;
        Ok(self.lock().strategy.owner)
    }

    async fn strategy_keeper(&self, strategy: Address) -> Result<Address, LifecycleError> {
        Self::check_strategy("keeper", strategy)?;
        Ok(self.lock().strategy.keeper)
    }

    async fn output_route(
        &self,
        strategy: Address,
        route: OutputRoute,
        index: u64,
    ) -> Result<Address, LifecycleError> {
        Self::check_strategy(route.method(), strategy)?;
        let state = self.lock();
        let hops = match route {
            OutputRoute::Lp0 => &state.strategy.lp0_route,
            OutputRoute::Lp1 => &state.strategy.lp1_route,
        };
        usize::try_from(index)
            .ok()
            .and_then(|i| hops.get(i))
            .copied()
            .ok_or_else(|| revert(route.method(), None))
    }

    async fn token_balance(
        &self,
        token: Address,
        holder: Address,
    ) -> Result<U256, LifecycleError> {
        Ok(self.lock().balance(token, holder))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        self.lock().allowances.insert((token, from, spender), amount);
        Ok(())
    }

    async fn transfer(
        &self,
        token: Address,
        to: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        let mut state = self.lock();
        state.debit("transfer", token, from, amount)?;
        state.credit(token, to, amount);
        Ok(())
    }

    async fn pair_tokens(&self, token: Address) -> Result<(Address, Address), LifecycleError> {
        self.lock()
            .pairs
            .get(&token)
            .copied()
            .ok_or_else(|| revert("token0", None))
    }

    async fn wrap_native(
        &self,
        wnative: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        if wnative != SIM_WNATIVE {
            return Err(LifecycleError::RpcError {
                method: "deposit".into(),
                message: format!("no wrapped native token at {wnative}"),
            });
        }
        self.lock().credit(wnative, from, amount);
        Ok(())
    }

    async fn swap_native_for_tokens(&self, swap: NativeSwap) -> Result<(), LifecycleError> {
        let method = swap.kind.swap_signature();
        Self::check_router(method, swap.router)?;
        let mut state = self.lock();
        if swap.kind != state.router_kind {
            // The router has no such entry point.
            return Err(revert(method, None));
        }
        if swap.path.first() != Some(&SIM_WNATIVE) {
            return Err(revert(method, Some("UniswapV2Router: INVALID_PATH")));
        }
        let out_token = match swap.path.last() {
            Some(token) if swap.path.len() >= 2 => *token,
            _ => return Err(revert(method, Some("UniswapV2Library: INVALID_PATH"))),
        };
        if U256::from(state.now) > swap.deadline {
            return Err(revert(method, Some("UniswapV2Router: EXPIRED")));
        }
        let amount_out = swap.amount_in * U256::from(state.swap_rate_bps) / U256::from(BPS);
        if amount_out < swap.amount_out_min {
            return Err(revert(method, Some("UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT")));
        }
        state.credit(out_token, swap.recipient, amount_out);
        Ok(())
    }

    async fn add_liquidity(&self, request: AddLiquidity) -> Result<(), LifecycleError> {
        Self::check_router("addLiquidity", request.router)?;
        let mut state = self.lock();
        let pair = state
            .pairs
            .iter()
            .find(|(_, (t0, t1))| {
                (*t0, *t1) == (request.token_a, request.token_b)
                    || (*t1, *t0) == (request.token_a, request.token_b)
            })
            .map(|(lp, _)| *lp)
            .ok_or_else(|| revert("addLiquidity", Some("UniswapV2Router: PAIR_MISSING")))?;

        let liquidity = request.amount_a.min(request.amount_b);
        if liquidity < request.amount_a_min || liquidity < request.amount_b_min {
            return Err(revert("addLiquidity", Some("UniswapV2Router: INSUFFICIENT_AMOUNT")));
        }

        let legs = [request.token_a, request.token_b];
        for token in legs {
            state.check_transfer_from("addLiquidity", token, request.from, SIM_ROUTER, liquidity)?;
        }
        for token in legs {
            state.transfer_from(token, request.from, SIM_ROUTER, liquidity);
        }
        state.credit(pair, request.recipient, liquidity);
        Ok(())
    }

    async fn advance_time(&self, secs: u64) -> Result<(), LifecycleError> {
        self.lock().now += secs;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actors() -> ActorSet {
        ActorSet {
            deployer: Address::with_last_byte(1),
            keeper: Address::with_last_byte(2),
            other: Address::with_last_byte(3),
        }
    }

    fn ether(n: u64) -> U256 {
        U256::from(n) * U256::from(PRICE_SCALE)
    }

    fn swap(kind: RouterKind, to: Address, amount: U256) -> NativeSwap {
        NativeSwap {
            router: SIM_ROUTER,
            kind,
            amount_in: amount,
            amount_out_min: U256::ZERO,
            path: vec![SIM_WNATIVE, SIM_WANT],
            recipient: to,
            deadline: U256::from(5_000_000_000u64),
            from: to,
        }
    }

    #[tokio::test]
    async fn test_swap_credits_output_token_at_rate() {
        let a = actors();
        let sim = SimulatedBackend::builder(a).swap_rate_bps(20_000).build();
        sim.swap_native_for_tokens(swap(RouterKind::Eth, a.deployer, ether(1)))
            .await
            .unwrap();
        assert_eq!(sim.token_balance(SIM_WANT, a.deployer).await.unwrap(), ether(2));
    }

    #[tokio::test]
    async fn test_swap_with_wrong_dialect_reverts() {
        let a = actors();
        let sim = SimulatedBackend::builder(a).router_kind(RouterKind::Avax).build();
        let err = sim
            .swap_native_for_tokens(swap(RouterKind::Eth, a.deployer, ether(1)))
            .await
            .unwrap_err();
        assert!(err.is_revert());
    }

    #[tokio::test]
    async fn test_deposit_requires_allowance() {
        let a = actors();
        let sim = SimulatedBackend::builder(a).build();
        sim.swap_native_for_tokens(swap(RouterKind::Eth, a.deployer, ether(1)))
            .await
            .unwrap();
        let err = sim.deposit_all(SIM_VAULT, a.deployer).await.unwrap_err();
        assert_eq!(err.revert_reason(), Some("ERC20: transfer amount exceeds allowance"));
    }

    #[tokio::test]
    async fn test_rejected_deposit_leaves_state_untouched() {
        let a = actors();
        let sim = SimulatedBackend::builder(a).harvest_on_deposit(true).build();
        for who in [a.deployer, a.other] {
            sim.swap_native_for_tokens(swap(RouterKind::Eth, who, ether(10)))
                .await
                .unwrap();
        }
        sim.approve(SIM_WANT, SIM_VAULT, ether(10), a.other).await.unwrap();
        sim.deposit_all(SIM_VAULT, a.other).await.unwrap();
        let vault_balance = sim.vault_balance(SIM_VAULT).await.unwrap();

        sim.approve(SIM_WANT, SIM_VAULT, ether(4), a.deployer).await.unwrap();
        let err = sim.deposit_all(SIM_VAULT, a.deployer).await.unwrap_err();
        assert_eq!(err.revert_reason(), Some("ERC20: transfer amount exceeds allowance"));

        assert_eq!(sim.harvest_count(), 0);
        assert_eq!(sim.vault_balance(SIM_VAULT).await.unwrap(), vault_balance);
        assert_eq!(sim.token_balance(SIM_WANT, a.deployer).await.unwrap(), ether(10));
        assert_eq!(sim.lock().allowance(SIM_WANT, a.deployer, SIM_VAULT), ether(4));
    }

    #[tokio::test]
    async fn test_rejected_add_liquidity_keeps_first_leg() {
        let a = actors();
        let sim = SimulatedBackend::builder(a).want_kind(WantKind::LpPair).build();
        for token in [SIM_LP0, SIM_LP1] {
            let mut leg = swap(RouterKind::Eth, a.deployer, ether(5));
            leg.path = vec![SIM_WNATIVE, token];
            sim.swap_native_for_tokens(leg).await.unwrap();
        }
        sim.approve(SIM_LP0, SIM_ROUTER, ether(5), a.deployer).await.unwrap();

        let request = AddLiquidity {
            router: SIM_ROUTER,
            token_a: SIM_LP0,
            token_b: SIM_LP1,
            amount_a: ether(5),
            amount_b: ether(5),
            amount_a_min: U256::ZERO,
            amount_b_min: U256::ZERO,
            recipient: a.deployer,
            deadline: U256::from(5_000_000_000u64),
            from: a.deployer,
        };
        let err = sim.add_liquidity(request.clone()).await.unwrap_err();
        assert_eq!(err.revert_reason(), Some("ERC20: transfer amount exceeds allowance"));
        assert_eq!(sim.token_balance(SIM_LP0, a.deployer).await.unwrap(), ether(5));
        assert_eq!(sim.lock().allowance(SIM_LP0, a.deployer, SIM_ROUTER), ether(5));
        assert!(sim.token_balance(SIM_WANT, a.deployer).await.unwrap().is_zero());

        sim.approve(SIM_LP1, SIM_ROUTER, ether(5), a.deployer).await.unwrap();
        sim.add_liquidity(request).await.unwrap();
        assert_eq!(sim.token_balance(SIM_WANT, a.deployer).await.unwrap(), ether(5));
        assert!(sim.token_balance(SIM_LP0, a.deployer).await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_panic_release_share() {
        let a = actors();
        let sim = SimulatedBackend::builder(a).panic_release_bps(0).build();
        sim.swap_native_for_tokens(swap(RouterKind::Eth, a.deployer, ether(10)))
            .await
            .unwrap();
        sim.approve(SIM_WANT, SIM_VAULT, ether(10), a.deployer).await.unwrap();
        sim.deposit_all(SIM_VAULT, a.deployer).await.unwrap();

        sim.panic(SIM_STRATEGY, a.keeper).await.unwrap();
        assert_eq!(sim.balance_of_pool(SIM_STRATEGY).await.unwrap(), ether(10));
        assert!(sim.balance_of_want(SIM_STRATEGY).await.unwrap().is_zero());
        assert!(sim.paused(SIM_STRATEGY).await.unwrap());
    }

    #[tokio::test]
    async fn test_harvest_raises_share_price() {
        let a = actors();
        let sim = SimulatedBackend::builder(a).build();
        sim.swap_native_for_tokens(swap(RouterKind::Eth, a.deployer, ether(10)))
            .await
            .unwrap();
        sim.approve(SIM_WANT, SIM_VAULT, ether(10), a.deployer).await.unwrap();
        sim.deposit_all(SIM_VAULT, a.deployer).await.unwrap();

        let before = sim.price_per_full_share(SIM_VAULT).await.unwrap();
        sim.harvest_with_call_fee_recipient(SIM_STRATEGY, a.other, a.deployer)
            .await
            .unwrap();
        let after = sim.price_per_full_share(SIM_VAULT).await.unwrap();
        assert!(after > before);
        assert_eq!(sim.harvest_count(), 1);
    }

    #[tokio::test]
    async fn test_panic_is_manager_only() {
        let a = actors();
        let sim = SimulatedBackend::builder(a).build();
        let err = sim.panic(SIM_STRATEGY, a.other).await.unwrap_err();
        assert_eq!(err.revert_reason(), Some("!manager"));
        sim.panic(SIM_STRATEGY, a.keeper).await.unwrap();
        assert!(sim.paused(SIM_STRATEGY).await.unwrap());
    }

    #[tokio::test]
    async fn test_route_past_end_reverts() {
        let a = actors();
        let sim = SimulatedBackend::builder(a)
            .routes(vec![SIM_WNATIVE, SIM_LP0], vec![])
            .build();
        assert_eq!(
            sim.output_route(SIM_STRATEGY, OutputRoute::Lp0, 1).await.unwrap(),
            SIM_LP0
        );
        assert!(sim.output_route(SIM_STRATEGY, OutputRoute::Lp0, 2).await.is_err());
        assert!(sim.output_route(SIM_STRATEGY, OutputRoute::Lp1, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_contract_is_rpc_error() {
        let sim = SimulatedBackend::builder(actors()).build();
        let err = sim.vault_strategy(Address::ZERO).await.unwrap_err();
        assert!(matches!(err, LifecycleError::RpcError { .. }));
    }

    #[tokio::test]
    async fn test_advance_time_moves_clock() {
        let sim = SimulatedBackend::builder(actors()).build();
        let start = sim.now();
        sim.advance_time(3600).await.unwrap();
        assert_eq!(sim.now(), start + 3600);
    }
}
