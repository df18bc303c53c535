//! Binary runner for the vault lifecycle scenarios.
//!
//! Loads `.env`, an optional TOML config (`LIFECYCLE_CONFIG`) and environment
//! overrides, connects to the node at `RPC_URL` with the three actor keys,
//! runs the selected scenarios and exits non-zero if any of them failed.

use std::sync::Arc;

use vault_runtime::LifecycleError;
use vault_runtime::backend::SharedBackend;
use vault_runtime::backend::rpc::RpcBackend;
use vault_runtime::chain::ChainClient;
use vault_runtime::config::{self, RawConfig};
use vault_runtime::runner::Outcome;
use vault_runtime::{LifecycleRunner, VaultLifecycle};

#[tokio::main]
async fn main() -> Result<(), LifecycleError> {
    dotenvy::dotenv().ok();
    setup_log();

    // ── 1. Configuration: file, then env ─────────────────────────────────
    let raw = match std::env::var("LIFECYCLE_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading lifecycle config from {path}");
            RawConfig::load_file(&path)?
        }
        Err(_) => RawConfig::default(),
    };
    let raw = raw.apply_env(|key| std::env::var(key).ok())?;
    let book = config::load_address_book(&raw)?;
    let settings = config::resolve(raw, &book)?;

    tracing::info!(
        chain = %settings.lifecycle.chain,
        vault = %settings.lifecycle.vault,
        rpc = %settings.rpc_url,
        "Starting vault lifecycle run"
    );

    // ── 2. Chain access ──────────────────────────────────────────────────
    let client = ChainClient::new(&settings.rpc_url, &settings.keys)?;
    let backend = RpcBackend::new(client);
    let actors = backend.actors();
    tracing::info!(
        deployer = %actors.deployer,
        keeper = %actors.keeper,
        other = %actors.other,
        "Actors loaded"
    );
    let backend: SharedBackend = Arc::new(backend);

    // ── 3. Run ───────────────────────────────────────────────────────────
    let lifecycle = VaultLifecycle::new(backend, settings.lifecycle, actors);
    let report = LifecycleRunner::new(lifecycle, settings.scenarios).run().await;

    tracing::info!(
        passed = report.count(|o| *o == Outcome::Passed),
        skipped = report.count(|o| *o == Outcome::Skipped),
        failed = report.failed().count(),
        "Lifecycle run finished"
    );
    for result in report.failed() {
        if let Outcome::Failed { error } = &result.outcome {
            tracing::error!("{}: {error}", result.scenario);
        }
    }

    if let Some(path) = &settings.report_path {
        std::fs::write(path, report.to_json()?)?;
        tracing::info!("Report written to {path}");
    }

    if !report.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn setup_log() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};
    if tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .is_err()
    {}
}
