//! Lifecycle scenarios end to end against the in-memory backend.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use vault_runtime::LifecycleError;
use vault_runtime::address_book::AddressBook;
use vault_runtime::backend::{ChainBackend, SharedBackend};
use vault_runtime::backend::simulated::{
    SIM_LP0, SIM_LP1, SIM_OWNER, SIM_ROUTER, SIM_STRATEGY, SIM_VAULT, SIM_WANT, SIM_WNATIVE,
    SimulatedBackend, SimulationBuilder, WantKind,
};
use vault_runtime::config::LifecycleConfig;
use vault_runtime::runner::Outcome;
use vault_runtime::types::{ActorSet, RouterKind};
use vault_runtime::{LifecycleRunner, Scenario, ScenarioSelection, VaultLifecycle};

fn actors() -> ActorSet {
    ActorSet {
        deployer: Address::with_last_byte(1),
        keeper: Address::with_last_byte(2),
        other: Address::with_last_byte(3),
    }
}

fn config(a: ActorSet) -> LifecycleConfig {
    let book = AddressBook::builtin().unwrap();
    let mut cfg = LifecycleConfig::for_chain("moonriver", &book).unwrap();
    cfg.vault = SIM_VAULT;
    cfg.wnative = SIM_WNATIVE;
    cfg.test_amount = U256::from(5_000u64) * U256::from(10u64).pow(U256::from(18u64));
    cfg.harvest_delay = Duration::ZERO;
    cfg.vault_owner = Some(SIM_OWNER);
    cfg.strategy_owner = Some(SIM_OWNER);
    cfg.keeper = Some(a.keeper);
    cfg
}

fn lifecycle(
    builder: SimulationBuilder,
    cfg: LifecycleConfig,
) -> (Arc<SimulatedBackend>, VaultLifecycle) {
    let sim = Arc::new(builder.build());
    let backend: SharedBackend = sim.clone();
    let actors = sim.actors();
    (sim, VaultLifecycle::new(backend, cfg, actors))
}

async fn run_one(lc: &VaultLifecycle, scenario: Scenario) -> Result<(), LifecycleError> {
    let fx = lc.setup().await?;
    lc.run(scenario, &fx).await
}

#[tokio::test]
async fn test_default_selection_runs_enabled_scenarios() {
    let a = actors();
    let (sim, lc) = lifecycle(SimulatedBackend::builder(a), config(a));

    let report = LifecycleRunner::new(lc, ScenarioSelection::Default).run().await;

    assert!(report.is_success(), "{:?}", report.results);
    assert_eq!(report.results.len(), Scenario::ALL.len());
    assert_eq!(report.count(|o| *o == Outcome::Passed), 2);
    assert_eq!(report.count(|o| *o == Outcome::Skipped), 7);
    assert_eq!(sim.harvest_count(), 1);
}

#[tokio::test]
async fn test_all_scenarios_pass_on_lp_vault() {
    let a = actors();
    let mut cfg = config(a);
    cfg.token_symbols.insert(SIM_LP0, "LP0".into());
    let builder = SimulatedBackend::builder(a)
        .want_kind(WantKind::LpPair)
        .expose_token_getter(true)
        .routes(vec![SIM_WANT, SIM_LP0], vec![SIM_WANT, SIM_WNATIVE, SIM_LP1]);
    let (_sim, lc) = lifecycle(builder, cfg);

    let report = LifecycleRunner::new(lc, ScenarioSelection::All).run().await;

    assert!(report.is_success(), "{:?}", report.results);
    assert_eq!(report.count(|o| *o == Outcome::Passed), Scenario::ALL.len());
}

#[tokio::test]
async fn test_avax_router_dialect_from_overrides() {
    let a = actors();
    let mut cfg = config(a);
    let builder = SimulatedBackend::builder(a).router_kind(RouterKind::Avax);

    let (_sim, lc) = lifecycle(builder.clone(), cfg.clone());
    assert!(lc.setup().await.unwrap_err().is_revert());

    cfg.router_overrides.insert(SIM_ROUTER, RouterKind::Avax);
    let (_sim, lc) = lifecycle(builder, cfg);
    run_one(&lc, Scenario::DepositWithdraw).await.unwrap();
}

#[tokio::test]
async fn test_harvest_without_yield_fails() {
    let a = actors();
    let (_sim, lc) = lifecycle(SimulatedBackend::builder(a).harvest_yield_bps(0), config(a));

    let err = run_one(&lc, Scenario::Harvest).await.unwrap_err();
    assert_eq!(failed_check(err), "vault balance grows on harvest");
}

fn failed_check(err: LifecycleError) -> String {
    match err {
        LifecycleError::AssertionFailed { check, .. } => check,
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_deposit_withdraw_rejects_heavy_withdrawal_fee() {
    let a = actors();
    let builder = SimulatedBackend::builder(a).withdrawal_fee_bps(200);
    let (_sim, lc) = lifecycle(builder, config(a));

    let err = run_one(&lc, Scenario::DepositWithdraw).await.unwrap_err();
    assert_eq!(failed_check(err), "final balance > 99% of start");
}

#[tokio::test]
async fn test_deposit_withdraw_rejects_gain_from_unclaimed_funds() {
    let a = actors();
    let cfg = config(a);
    let builder = SimulatedBackend::builder(a).idle_want(cfg.test_amount / U256::from(5u8));
    let (_sim, lc) = lifecycle(builder, cfg);

    let err = run_one(&lc, Scenario::DepositWithdraw).await.unwrap_err();
    assert_eq!(failed_check(err), "final balance <= start");
}

#[tokio::test]
async fn test_panic_rejects_funds_already_idle() {
    let a = actors();
    let cfg = config(a);
    let builder = SimulatedBackend::builder(a).idle_want(cfg.test_amount * U256::from(2u8));
    let (_sim, lc) = lifecycle(builder, cfg);

    let err = run_one(&lc, Scenario::Panic).await.unwrap_err();
    assert_eq!(failed_check(err), "funds pooled before panic");
}

#[tokio::test]
async fn test_panic_rejects_funds_left_in_pool() {
    let a = actors();
    let builder = SimulatedBackend::builder(a).panic_release_bps(0);
    let (sim, lc) = lifecycle(builder, config(a));

    let err = run_one(&lc, Scenario::Panic).await.unwrap_err();
    assert_eq!(failed_check(err), "funds idle after panic");
    assert!(sim.paused(SIM_STRATEGY).await.unwrap());
}

#[tokio::test]
async fn test_harvest_fast_forwards_chain_time() {
    let a = actors();
    let mut cfg = config(a);
    cfg.fast_forward_secs = Some(3600);
    let (sim, lc) = lifecycle(SimulatedBackend::builder(a), cfg);
    let start = sim.now();

    run_one(&lc, Scenario::Harvest).await.unwrap();
    assert_eq!(sim.now(), start + 3600);
}

#[tokio::test]
async fn test_panic_with_other_revert_reason_fails() {
    let a = actors();
    let builder = SimulatedBackend::builder(a).paused_deposit_reason("Pausable: paused");
    let (_sim, lc) = lifecycle(builder.clone(), config(a));

    let err = run_one(&lc, Scenario::Panic).await.unwrap_err();
    assert!(matches!(err, LifecycleError::RevertMismatch { .. }), "{err}");

    let mut cfg = config(a);
    cfg.expected_panic_revert = "Pausable: paused".into();
    let (_sim, lc) = lifecycle(builder, cfg);
    run_one(&lc, Scenario::Panic).await.unwrap();
}

#[tokio::test]
async fn test_panic_requires_manager_keeper() {
    let a = actors();
    let builder =
        SimulatedBackend::builder(a).roles(SIM_OWNER, SIM_OWNER, Address::with_last_byte(9));
    let (_sim, lc) = lifecycle(builder, config(a));

    let err = run_one(&lc, Scenario::Panic).await.unwrap_err();
    assert_eq!(err.revert_reason(), Some("!manager"));
}

#[tokio::test]
async fn test_non_interference_unpauses_first() {
    let a = actors();
    let (sim, lc) = lifecycle(SimulatedBackend::builder(a).paused(true), config(a));

    run_one(&lc, Scenario::SharePriceNonInterference).await.unwrap();
    assert!(!sim.paused(SIM_STRATEGY).await.unwrap());
}

#[tokio::test]
async fn test_owner_checks_cover_configured_roles_only() {
    let a = actors();
    let mut cfg = config(a);
    cfg.vault_owner = Some(Address::with_last_byte(0x77));
    let (_sim, lc) = lifecycle(SimulatedBackend::builder(a), cfg);
    let err = run_one(&lc, Scenario::OwnersAndKeeper).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AssertionFailed { ref check, .. } if check == "vault owner"));

    let mut cfg = config(a);
    cfg.vault_owner = None;
    cfg.strategy_owner = None;
    let (_sim, lc) = lifecycle(SimulatedBackend::builder(a), cfg.clone());
    run_one(&lc, Scenario::OwnersAndKeeper).await.unwrap();

    cfg.keeper = Some(Address::with_last_byte(0x78));
    let (_sim, lc) = lifecycle(SimulatedBackend::builder(a), cfg.clone());
    let err = run_one(&lc, Scenario::OwnersAndKeeper).await.unwrap_err();
    assert_eq!(failed_check(err), "strategy keeper");

    cfg.keeper = None;
    let (_sim, lc) = lifecycle(SimulatedBackend::builder(a), cfg);
    let err = run_one(&lc, Scenario::OwnersAndKeeper).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ConfigError(_)));
}

#[tokio::test]
async fn test_display_routing_uses_symbols_and_stops_at_end() {
    let a = actors();
    let mut cfg = config(a);
    cfg.token_symbols.insert(SIM_WANT, "WANT".into());
    let builder = SimulatedBackend::builder(a).routes(vec![SIM_WANT, SIM_LP0], vec![]);
    let (_sim, lc) = lifecycle(builder, cfg);

    let fx = lc.setup().await.unwrap();
    let routing = lc.display_routing(&fx).await.unwrap();
    assert_eq!(routing.lp0.len(), 2);
    assert_eq!(routing.lp0[0].symbol.as_deref(), Some("WANT"));
    assert_eq!(routing.lp0[1].symbol, None);
    assert_eq!(routing.lp0[1].address, SIM_LP0);
    assert!(routing.lp1.is_empty());
}

#[tokio::test]
async fn test_fee_checks() {
    let a = actors();
    let (_sim, lc) = lifecycle(SimulatedBackend::builder(a).call_fee(500), config(a));
    assert!(run_one(&lc, Scenario::CallFee).await.is_err());

    let mut cfg = config(a);
    cfg.chain = "atlantis".into();
    let (_sim, lc) = lifecycle(SimulatedBackend::builder(a), cfg);
    let err = run_one(&lc, Scenario::CallFee).await.unwrap_err();
    assert!(matches!(err, LifecycleError::ConfigError(_)));

    let builder = SimulatedBackend::builder(a).harvest_on_deposit(true);
    let (_sim, lc) = lifecycle(builder.clone(), config(a));
    assert!(run_one(&lc, Scenario::WithdrawalFee).await.is_err());

    let (_sim, lc) = lifecycle(builder.withdrawal_fee_bps(0), config(a));
    run_one(&lc, Scenario::WithdrawalFee).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_scenario_timeout_is_reported() {
    let a = actors();
    let mut cfg = config(a);
    cfg.harvest_delay = Duration::from_secs(60);
    cfg.scenario_timeout = Duration::from_secs(1);
    let (_sim, lc) = lifecycle(SimulatedBackend::builder(a), cfg);

    let report = LifecycleRunner::new(lc, ScenarioSelection::Only(vec![Scenario::Harvest]))
        .run()
        .await;

    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].scenario, Scenario::Harvest);
    match &failed[0].outcome {
        Outcome::Failed { error } => assert!(error.starts_with("Timeout"), "{error}"),
        other => panic!("unexpected outcome: {other:?}"),
    }
}
