pub mod address_book;
pub mod backend;
pub mod chain;
pub mod check;
pub mod config;
pub mod contracts;
pub mod error;
pub mod fees;
pub mod handles;
pub mod helpers;
pub mod lifecycle;
pub mod runner;
pub mod types;

pub use error::LifecycleError;
pub use types::*;
pub use lifecycle::{Scenario, ScenarioSelection, VaultLifecycle};
pub use runner::{LifecycleReport, LifecycleRunner};
