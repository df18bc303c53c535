//! Per-network directory of token and platform role addresses.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

const BUILTIN_ADDRESS_BOOK: &str = include_str!("../address_book.toml");

/// Platform whose role addresses the lifecycle checks against.
pub const DEFAULT_PLATFORM: &str = "beefyfinance";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub address: Address,
    pub symbol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRoles {
    #[serde(default)]
    pub keeper: Option<Address>,
    #[serde(default)]
    pub strategy_owner: Option<Address>,
    #[serde(default)]
    pub vault_owner: Option<Address>,
}

impl PlatformRoles {
    /// Overlay the roles that `other` sets.
    fn merge(&mut self, other: PlatformRoles) {
        if other.keeper.is_some() {
            self.keeper = other.keeper;
        }
        if other.strategy_owner.is_some() {
            self.strategy_owner = other.strategy_owner;
        }
        if other.vault_owner.is_some() {
            self.vault_owner = other.vault_owner;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainAddresses {
    #[serde(default)]
    pub tokens: BTreeMap<String, TokenEntry>,
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformRoles>,
}

impl ChainAddresses {
    pub fn token(&self, name: &str) -> Result<&TokenEntry, LifecycleError> {
        self.tokens
            .get(name)
            .ok_or_else(|| LifecycleError::ConfigError(format!("Unknown token '{name}'")))
    }

    pub fn platform(&self, name: &str) -> Option<&PlatformRoles> {
        self.platforms.get(name)
    }

    /// Reverse lookup used when printing routes: address → symbol.
    pub fn token_address_map(&self) -> HashMap<Address, String> {
        self.tokens
            .values()
            .map(|t| (t.address, t.symbol.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    chains: BTreeMap<String, ChainAddresses>,
}

impl AddressBook {
    /// The directory shipped with the crate.
    pub fn builtin() -> Result<Self, LifecycleError> {
        Self::from_toml_str(BUILTIN_ADDRESS_BOOK)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LifecycleError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, LifecycleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LifecycleError::ConfigError(format!("Cannot read address book {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Overlay `other` on top of this book. Tokens are replaced by name,
    /// platform roles field by field.
    pub fn merge(&mut self, other: AddressBook) {
        for (chain, addresses) in other.chains {
            let entry = self.chains.entry(chain).or_default();
            entry.tokens.extend(addresses.tokens);
            for (platform, roles) in addresses.platforms {
                entry.platforms.entry(platform).or_default().merge(roles);
            }
        }
    }

    pub fn chain(&self, name: &str) -> Result<&ChainAddresses, LifecycleError> {
        self.chains
            .get(name)
            .ok_or_else(|| LifecycleError::ConfigError(format!("Unknown network '{name}'")))
    }

    pub fn networks(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }
}
