//! Run configuration: built-in defaults, an optional TOML file, then
//! environment overrides, resolved against the address book.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256, address};
use serde::Deserialize;

use crate::address_book::{AddressBook, DEFAULT_PLATFORM};
use crate::error::LifecycleError;
use crate::lifecycle::ScenarioSelection;
use crate::types::{ActorKeys, RouterKind};

pub const DEFAULT_CHAIN: &str = "moonriver";
pub const DEFAULT_VAULT: Address = address!("36f2f0e069C9Aa9b7B02fa4Fd98Bb54129AD2F6c");
pub const DEFAULT_VAULT_CONTRACT: &str = "BeefyVaultV6";
pub const DEFAULT_STRATEGY_CONTRACT: &str = "StrategyMrSushiLP";
pub const DEFAULT_TEST_AMOUNT: &str = "5000";
pub const DEFAULT_CALL_FEE_RECIPIENT: Address =
    address!("f50225a84382c74cbdea10b0c176f71fc3de0c4d");
pub const DEFAULT_HARVEST_DELAY_MS: u64 = 20_000;
pub const DEFAULT_PANIC_REVERT: &str = "TransferHelper: TRANSFER_FROM_FAILED";
pub const DEFAULT_SCENARIO_TIMEOUT_MS: u64 = 1000 * 60 * 100_000;
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Immutable parameters of one lifecycle run.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Network name used for address-book and fee-table lookups.
    pub chain: String,
    pub vault: Address,
    /// Expected contract interface labels, reported alongside results.
    pub vault_contract: String,
    pub strategy_contract: String,
    /// Native currency swapped into the want per scenario, in wei.
    pub test_amount: U256,
    pub wnative: Address,
    pub keeper: Option<Address>,
    pub strategy_owner: Option<Address>,
    pub vault_owner: Option<Address>,
    pub call_fee_recipient: Address,
    pub harvest_delay: Duration,
    /// Chain time to skip after the harvest delay, for local fork nodes.
    pub fast_forward_secs: Option<u64>,
    pub expected_panic_revert: String,
    pub scenario_timeout: Duration,
    pub router_overrides: HashMap<Address, RouterKind>,
    /// Address → symbol, for route display.
    pub token_symbols: HashMap<Address, String>,
}

impl LifecycleConfig {
    /// Built-in defaults for `chain`, resolved against `book`.
    pub fn for_chain(chain: &str, book: &AddressBook) -> Result<Self, LifecycleError> {
        resolve(RawConfig::default().with_chain(chain), book).map(|s| s.lifecycle)
    }
}

/// Everything the binary needs besides the lifecycle parameters.
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    pub lifecycle: LifecycleConfig,
    pub rpc_url: String,
    pub keys: ActorKeys,
    pub scenarios: ScenarioSelection,
    pub report_path: Option<String>,
}

/// File / environment layer. Every field is optional; unset fields take the
/// built-in default when resolved.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub lifecycle: RawLifecycle,
    #[serde(default)]
    pub keys: RawKeys,
    /// Router address → dialect.
    #[serde(default)]
    pub routers: HashMap<Address, RouterKind>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawLifecycle {
    pub chain: Option<String>,
    pub vault: Option<Address>,
    pub vault_contract: Option<String>,
    pub strategy_contract: Option<String>,
    /// Decimal amount of native currency, e.g. `"5000"` or `"0.5"`.
    pub test_amount: Option<String>,
    pub wnative: Option<Address>,
    /// Address-book token name for the native token.
    pub wnative_token: Option<String>,
    pub platform: Option<String>,
    pub keeper: Option<Address>,
    pub strategy_owner: Option<Address>,
    pub vault_owner: Option<Address>,
    pub call_fee_recipient: Option<Address>,
    pub harvest_delay_ms: Option<u64>,
    pub fast_forward_secs: Option<u64>,
    pub expected_panic_revert: Option<String>,
    pub scenario_timeout_ms: Option<u64>,
    pub scenarios: Option<String>,
    pub address_book: Option<String>,
    pub rpc_url: Option<String>,
    pub report_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawKeys {
    pub deployer: Option<String>,
    pub keeper: Option<String>,
    pub other: Option<String>,
}

fn parse_env_address(key: &str, value: &str) -> Result<Address, LifecycleError> {
    value
        .parse()
        .map_err(|e| LifecycleError::ConfigError(format!("Invalid address in {key}: {e}")))
}

impl RawConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, LifecycleError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, LifecycleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LifecycleError::ConfigError(format!("Cannot read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_chain(mut self, chain: &str) -> Self {
        self.lifecycle.chain = Some(chain.to_string());
        self
    }

    /// Overlay environment variables read through `lookup`.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, LifecycleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let l = &mut self.lifecycle;
        if let Some(v) = lookup("CHAIN_NAME") {
            l.chain = Some(v);
        }
        if let Some(v) = lookup("VAULT_ADDRESS") {
            l.vault = Some(parse_env_address("VAULT_ADDRESS", &v)?);
        }
        if let Some(v) = lookup("RPC_URL") {
            l.rpc_url = Some(v);
        }
        if let Some(v) = lookup("SCENARIOS") {
            l.scenarios = Some(v);
        }
        if let Some(v) = lookup("HARVEST_DELAY_MS") {
            let ms = v.parse().map_err(|e| {
                LifecycleError::ConfigError(format!("Invalid HARVEST_DELAY_MS '{v}': {e}"))
            })?;
            l.harvest_delay_ms = Some(ms);
        }
        if let Some(v) = lookup("REPORT_PATH") {
            l.report_path = Some(v);
        }
        if let Some(v) = lookup("ADDRESS_BOOK") {
            l.address_book = Some(v);
        }
        if let Some(v) = lookup("DEPLOYER_PRIVATE_KEY") {
            self.keys.deployer = Some(v);
        }
        if let Some(v) = lookup("KEEPER_PRIVATE_KEY") {
            self.keys.keeper = Some(v);
        }
        if let Some(v) = lookup("OTHER_PRIVATE_KEY") {
            self.keys.other = Some(v);
        }
        Ok(self)
    }
}

/// Load the address book a config refers to: the built-in book, overlaid
/// with the configured file if any.
pub fn load_address_book(raw: &RawConfig) -> Result<AddressBook, LifecycleError> {
    let mut book = AddressBook::builtin()?;
    if let Some(path) = &raw.lifecycle.address_book {
        book.merge(AddressBook::load_file(path)?);
    }
    Ok(book)
}

/// Resolve a raw config against `book` into run settings.
pub fn resolve(raw: RawConfig, book: &AddressBook) -> Result<HarnessSettings, LifecycleError> {
    let l = raw.lifecycle;
    let chain = l.chain.unwrap_or_else(|| DEFAULT_CHAIN.to_string());
    let chain_data = book.chain(&chain)?;

    let wnative = match l.wnative {
        Some(addr) => addr,
        None => {
            let name = l.wnative_token.unwrap_or_else(|| {
                if chain == DEFAULT_CHAIN {
                    "WNATIVE_SUSHI".to_string()
                } else {
                    "WNATIVE".to_string()
                }
            });
            chain_data.token(&name)?.address
        }
    };

    let platform = l.platform.unwrap_or_else(|| DEFAULT_PLATFORM.to_string());
    let roles = chain_data.platform(&platform).cloned().unwrap_or_default();

    let amount_str = l.test_amount.unwrap_or_else(|| DEFAULT_TEST_AMOUNT.to_string());
    let test_amount = parse_ether(&amount_str).map_err(|e| {
        LifecycleError::ConfigError(format!("Invalid test_amount '{amount_str}': {e}"))
    })?;
    if test_amount.is_zero() {
        return Err(LifecycleError::ConfigError("test_amount must be positive".into()));
    }

    let scenarios = match l.scenarios {
        Some(s) => s.parse()?,
        None => ScenarioSelection::Default,
    };

    let defaults = ActorKeys::default();
    let keys = ActorKeys {
        deployer: raw.keys.deployer.unwrap_or(defaults.deployer),
        keeper: raw.keys.keeper.unwrap_or(defaults.keeper),
        other: raw.keys.other.unwrap_or(defaults.other),
    };

    let lifecycle = LifecycleConfig {
        vault: l.vault.unwrap_or(DEFAULT_VAULT),
        vault_contract: l
            .vault_contract
            .unwrap_or_else(|| DEFAULT_VAULT_CONTRACT.to_string()),
        strategy_contract: l
            .strategy_contract
            .unwrap_or_else(|| DEFAULT_STRATEGY_CONTRACT.to_string()),
        test_amount,
        wnative,
        keeper: l.keeper.or(roles.keeper),
        strategy_owner: l.strategy_owner.or(roles.strategy_owner),
        vault_owner: l.vault_owner.or(roles.vault_owner),
        call_fee_recipient: l.call_fee_recipient.unwrap_or(DEFAULT_CALL_FEE_RECIPIENT),
        harvest_delay: Duration::from_millis(
            l.harvest_delay_ms.unwrap_or(DEFAULT_HARVEST_DELAY_MS),
        ),
        fast_forward_secs: l.fast_forward_secs,
        expected_panic_revert: l
            .expected_panic_revert
            .unwrap_or_else(|| DEFAULT_PANIC_REVERT.to_string()),
        scenario_timeout: Duration::from_millis(
            l.scenario_timeout_ms.unwrap_or(DEFAULT_SCENARIO_TIMEOUT_MS),
        ),
        router_overrides: raw.routers,
        token_symbols: chain_data.token_address_map(),
        chain,
    };

    Ok(HarnessSettings {
        lifecycle,
        rpc_url: l.rpc_url.unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
        keys,
        scenarios,
        report_path: l.report_path,
    })
}
