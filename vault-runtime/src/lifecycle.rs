//! The vault lifecycle scenarios.
//!
//! Every scenario starts from a fresh [`Fixture`]: the vault, its strategy
//! and router are resolved from chain, and the deployer is funded with the
//! configured amount of native currency zapped into the vault's want.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::backend::SharedBackend;
use crate::check::{
    ensure, ensure_eq, ensure_gt, ensure_gte, ensure_lte, expect_revert, tolerance_floor,
};
use crate::config::LifecycleConfig;
use crate::error::LifecycleError;
use crate::fees::{expected_call_fee, withdrawal_fee_consistent};
use crate::handles::{RouterHandle, StrategyHandle, TokenHandle, VaultHandle};
use crate::helpers::{self, Zap};
use crate::types::{ActorSet, OutputRoute};

/// Hop probes per route before giving up.
const MAX_ROUTE_HOPS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    DepositWithdraw,
    Harvest,
    Panic,
    SharePriceNonInterference,
    OwnersAndKeeper,
    VaultStrategyReferences,
    DisplayRouting,
    CallFee,
    WithdrawalFee,
}

impl Scenario {
    /// Registry order.
    pub const ALL: [Scenario; 9] = [
        Scenario::DepositWithdraw,
        Scenario::Harvest,
        Scenario::Panic,
        Scenario::SharePriceNonInterference,
        Scenario::OwnersAndKeeper,
        Scenario::VaultStrategyReferences,
        Scenario::DisplayRouting,
        Scenario::CallFee,
        Scenario::WithdrawalFee,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Scenario::DepositWithdraw => "deposit_withdraw",
            Scenario::Harvest => "harvest",
            Scenario::Panic => "panic",
            Scenario::SharePriceNonInterference => "share_price_non_interference",
            Scenario::OwnersAndKeeper => "owners_and_keeper",
            Scenario::VaultStrategyReferences => "vault_strategy_references",
            Scenario::DisplayRouting => "display_routing",
            Scenario::CallFee => "call_fee",
            Scenario::WithdrawalFee => "withdrawal_fee",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::DepositWithdraw => "User can deposit and withdraw from the vault.",
            Scenario::Harvest => "Harvests work as expected.",
            Scenario::Panic => "Manager can panic.",
            Scenario::SharePriceNonInterference => {
                "New user deposit/withdrawals don't lower other users balances."
            }
            Scenario::OwnersAndKeeper => "It has the correct owners and keeper.",
            Scenario::VaultStrategyReferences => "Vault and strat references are correct",
            Scenario::DisplayRouting => "Displays routing correctly",
            Scenario::CallFee => "Has correct call fee",
            Scenario::WithdrawalFee => "has withdraw fee of 0 if harvest on deposit is true",
        }
    }

    /// Only the deposit/withdraw and harvest flows run unless asked for.
    pub fn enabled_by_default(&self) -> bool {
        matches!(self, Scenario::DepositWithdraw | Scenario::Harvest)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Scenario {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| LifecycleError::ConfigError(format!("Unknown scenario: {s}")))
    }
}

/// Which scenarios a run executes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScenarioSelection {
    /// Scenarios enabled by default.
    #[default]
    Default,
    All,
    Only(Vec<Scenario>),
}

impl ScenarioSelection {
    pub fn includes(&self, scenario: Scenario) -> bool {
        match self {
            ScenarioSelection::Default => scenario.enabled_by_default(),
            ScenarioSelection::All => true,
            ScenarioSelection::Only(list) => list.contains(&scenario),
        }
    }
}

impl FromStr for ScenarioSelection {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "default" => Ok(ScenarioSelection::Default),
            "all" => Ok(ScenarioSelection::All),
            list => {
                let scenarios = list
                    .split(',')
                    .filter(|id| !id.trim().is_empty())
                    .map(str::parse)
                    .collect::<Result<Vec<Scenario>, _>>()?;
                if scenarios.is_empty() {
                    return Err(LifecycleError::ConfigError(format!(
                        "No scenarios selected in '{s}'"
                    )));
                }
                Ok(ScenarioSelection::Only(scenarios))
            }
        }
    }
}

/// Contracts and actors resolved for one scenario.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub vault: VaultHandle,
    pub strategy: StrategyHandle,
    pub router: RouterHandle,
    pub want: TokenHandle,
    pub actors: ActorSet,
}

/// One hop of a strategy's output route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteHop {
    pub address: Address,
    pub symbol: Option<String>,
}

impl fmt::Display for RouteHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => f.write_str(symbol),
            None => write!(f, "{}", self.address),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoutingReport {
    pub lp0: Vec<RouteHop>,
    pub lp1: Vec<RouteHop>,
}

/// Drives the scenarios against one vault.
pub struct VaultLifecycle {
    backend: SharedBackend,
    config: LifecycleConfig,
    actors: ActorSet,
}

impl VaultLifecycle {
    pub fn new(backend: SharedBackend, config: LifecycleConfig, actors: ActorSet) -> Self {
        Self {
            backend,
            config,
            actors,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn actors(&self) -> ActorSet {
        self.actors
    }

    /// Resolve contracts and fund the deployer with want.
    pub async fn setup(&self) -> Result<Fixture, LifecycleError> {
        let vault = VaultHandle::new(self.backend.clone(), self.config.vault);
        let strategy_addr = vault.strategy().await?;
        let strategy = StrategyHandle::new(self.backend.clone(), strategy_addr);

        let router_addr = strategy.unirouter().await?;
        let kind = helpers::router_data(router_addr, &self.config.router_overrides);
        let router = RouterHandle::new(self.backend.clone(), router_addr, kind);
        let want = helpers::resolve_want(&vault, self.config.wnative).await?;

        tracing::debug!(
            vault = %vault.address(),
            strategy = %strategy_addr,
            router = %router_addr,
            want = %want.address(),
            "resolved vault contracts"
        );

        helpers::zap_native_to_token(
            &self.backend,
            Zap {
                amount: self.config.test_amount,
                want: &want,
                native: self.config.wnative,
                router: &router,
                recipient: self.actors.deployer,
                sender: self.actors.deployer,
            },
        )
        .await?;

        let funded = want.balance_of(self.actors.deployer).await?;
        tracing::info!(%funded, "deployer funded with want");

        Ok(Fixture {
            vault,
            strategy,
            router,
            want,
            actors: self.actors,
        })
    }

    pub async fn run(&self, scenario: Scenario, fx: &Fixture) -> Result<(), LifecycleError> {
        match scenario {
            Scenario::DepositWithdraw => self.deposit_withdraw(fx).await,
            Scenario::Harvest => self.harvest(fx).await,
            Scenario::Panic => self.panic(fx).await,
            Scenario::SharePriceNonInterference => self.share_price_non_interference(fx).await,
            Scenario::OwnersAndKeeper => self.owners_and_keeper(fx).await,
            Scenario::VaultStrategyReferences => self.vault_strategy_references(fx).await,
            Scenario::DisplayRouting => self.display_routing(fx).await.map(|_| ()),
            Scenario::CallFee => self.call_fee(fx).await,
            Scenario::WithdrawalFee => self.withdrawal_fee(fx).await,
        }
    }

    /// Approve the vault for `amount` and deposit everything `who` holds.
    async fn deposit(&self, fx: &Fixture, amount: U256, who: Address) -> Result<(), LifecycleError> {
        fx.want.approve(fx.vault.address(), amount, who).await?;
        fx.vault.deposit_all(who).await
    }

    pub async fn deposit_withdraw(&self, fx: &Fixture) -> Result<(), LifecycleError> {
        let deployer = fx.actors.deployer;
        let start = fx.want.balance_of(deployer).await?;

        self.deposit(fx, start, deployer).await?;
        fx.vault.withdraw_all(deployer).await?;

        let end = fx.want.balance_of(deployer).await?;
        ensure_lte("final balance <= start", end, start)?;
        ensure_gt("final balance > 99% of start", end, tolerance_floor(start))
    }

    pub async fn harvest(&self, fx: &Fixture) -> Result<(), LifecycleError> {
        let deployer = fx.actors.deployer;
        let start = fx.want.balance_of(deployer).await?;
        self.deposit(fx, start, deployer).await?;

        let vault_bal = fx.vault.balance().await?;
        let price = fx.vault.price_per_full_share().await?;

        helpers::delay(self.config.harvest_delay).await;
        if let Some(secs) = self.config.fast_forward_secs {
            tracing::info!(secs, "fast-forwarding chain time");
            self.backend.advance_time(secs).await?;
        }

        fx.strategy
            .harvest_with_call_fee_recipient(self.config.call_fee_recipient, deployer)
            .await?;
        let vault_bal_after = fx.vault.balance().await?;
        let price_after = fx.vault.price_per_full_share().await?;
        tracing::info!(%vault_bal, %vault_bal_after, %price, %price_after, "harvested");

        fx.vault.withdraw_all(deployer).await?;
        let end = fx.want.balance_of(deployer).await?;

        ensure_gt("vault balance grows on harvest", vault_bal_after, vault_bal)?;
        ensure_gt("share price grows on harvest", price_after, price)?;
        ensure_gt("final balance > 99% of start", end, tolerance_floor(start))?;

        let last_harvest = fx.strategy.last_harvest().await?;
        ensure_gt("lastHarvest set", last_harvest, U256::ZERO)
    }

    pub async fn panic(&self, fx: &Fixture) -> Result<(), LifecycleError> {
        let deployer = fx.actors.deployer;
        let start = fx.want.balance_of(deployer).await?;
        self.deposit(fx, start, deployer).await?;

        let vault_bal = fx.vault.balance().await?;
        let pool = fx.strategy.balance_of_pool().await?;
        let idle = fx.strategy.balance_of_want().await?;

        fx.strategy.panic(fx.actors.keeper).await?;

        let vault_bal_after = fx.vault.balance().await?;
        let pool_after = fx.strategy.balance_of_pool().await?;
        let idle_after = fx.strategy.balance_of_want().await?;

        ensure_gt(
            "vault balance kept through panic",
            vault_bal_after,
            tolerance_floor(vault_bal),
        )?;
        ensure_gt("funds pooled before panic", pool, idle)?;
        ensure_gt("funds idle after panic", idle_after, pool_after)?;

        expect_revert(
            "depositAll",
            fx.vault.deposit_all(deployer),
            &self.config.expected_panic_revert,
        )
        .await?;

        fx.vault.withdraw_all(deployer).await?;
        let end = fx.want.balance_of(deployer).await?;
        ensure_gt("final balance > 99% of start", end, tolerance_floor(start))
    }

    pub async fn share_price_non_interference(&self, fx: &Fixture) -> Result<(), LifecycleError> {
        let ActorSet {
            deployer,
            keeper,
            other,
        } = fx.actors;
        helpers::unpause_if_paused(&fx.strategy, keeper).await?;

        let funded = fx.want.balance_of(deployer).await?;
        fx.want
            .transfer(other, funded / U256::from(2u8), deployer)
            .await?;

        let start = fx.want.balance_of(deployer).await?;
        self.deposit(fx, start, deployer).await?;
        let price = fx.vault.price_per_full_share().await?;

        let other_bal = fx.want.balance_of(other).await?;
        self.deposit(fx, other_bal, other).await?;
        let price_after_other = fx.vault.price_per_full_share().await?;

        fx.vault.withdraw_all(deployer).await?;
        let end = fx.want.balance_of(deployer).await?;
        let price_after_withdraw = fx.vault.price_per_full_share().await?;

        ensure_gte("share price after other deposit", price_after_other, price)?;
        ensure_gte(
            "share price after withdraw",
            price_after_withdraw,
            price_after_other,
        )?;
        ensure_gt("final balance > 99% of start", end, tolerance_floor(start))
    }

    /// Compare each configured role with the contracts. Roles the address
    /// book and config leave unset are skipped.
    pub async fn owners_and_keeper(&self, fx: &Fixture) -> Result<(), LifecycleError> {
        let config = &self.config;
        if [config.vault_owner, config.strategy_owner, config.keeper]
            .iter()
            .all(Option::is_none)
        {
            return Err(LifecycleError::ConfigError(format!(
                "no roles configured for {}",
                config.chain
            )));
        }

        let roles = [
            ("vault owner", config.vault_owner, fx.vault.owner().await?),
            ("strategy owner", config.strategy_owner, fx.strategy.owner().await?),
            ("strategy keeper", config.keeper, fx.strategy.keeper().await?),
        ];
        for (check, expected, actual) in roles {
            match expected {
                Some(expected) => ensure_eq(check, actual, expected)?,
                None => tracing::warn!(check, chain = %config.chain, "role not configured, skipping"),
            }
        }
        Ok(())
    }

    pub async fn vault_strategy_references(&self, fx: &Fixture) -> Result<(), LifecycleError> {
        ensure_eq(
            "vault.strategy()",
            fx.vault.strategy().await?,
            fx.strategy.address(),
        )?;
        ensure_eq(
            "strategy.vault()",
            fx.strategy.vault().await?,
            fx.vault.address(),
        )
    }

    /// Walk both output routes, logging each hop by symbol where known.
    pub async fn display_routing(&self, fx: &Fixture) -> Result<RoutingReport, LifecycleError> {
        Ok(RoutingReport {
            lp0: self.walk_route(fx, OutputRoute::Lp0).await,
            lp1: self.walk_route(fx, OutputRoute::Lp1).await,
        })
    }

    async fn walk_route(&self, fx: &Fixture, route: OutputRoute) -> Vec<RouteHop> {
        tracing::info!("{}:", route.method());
        let mut hops = Vec::new();
        for i in 0..MAX_ROUTE_HOPS {
            // A failing probe marks the end of the route.
            let Ok(address) = fx.strategy.output_route(route, i).await else {
                if i == 0 {
                    tracing::info!("No routing, output must be {}", route.label());
                }
                break;
            };
            let hop = RouteHop {
                address,
                symbol: self.config.token_symbols.get(&address).cloned(),
            };
            tracing::info!("{hop}");
            hops.push(hop);
        }
        hops
    }

    pub async fn call_fee(&self, fx: &Fixture) -> Result<(), LifecycleError> {
        let expected = expected_call_fee(&self.config.chain)?;
        ensure_eq("callFee", fx.strategy.call_fee().await?, U256::from(expected))
    }

    pub async fn withdrawal_fee(&self, fx: &Fixture) -> Result<(), LifecycleError> {
        let harvest_on_deposit = fx.strategy.harvest_on_deposit().await?;
        let fee = fx.strategy.withdrawal_fee().await?;
        let fee_bps = u64::try_from(fee).unwrap_or(u64::MAX);
        ensure(
            "withdrawalFee",
            withdrawal_fee_consistent(harvest_on_deposit, fee_bps),
            format!("harvestOnDeposit={harvest_on_deposit} with withdrawalFee={fee}"),
        )
    }
}
