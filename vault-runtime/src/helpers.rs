//! Setup helpers: want resolution, router dialect lookup, test-fund zaps and
//! pause normalisation.

use std::collections::HashMap;
use std::time::Duration;

use alloy::primitives::{Address, U256, address};

use crate::backend::SharedBackend;
use crate::error::LifecycleError;
use crate::handles::{RouterHandle, StrategyHandle, TokenHandle, VaultHandle};
use crate::types::RouterKind;

/// Deadline passed to router calls; far enough out to never expire.
pub const SWAP_DEADLINE: u64 = 5_000_000_000;

/// Routers known to expose the AVAX-named swap entry point.
const KNOWN_ROUTERS: &[(Address, RouterKind)] = &[
    // Trader Joe
    (
        address!("60aE616a2155Ee3d9A68541Ba4544862310933d4"),
        RouterKind::Avax,
    ),
    // Pangolin
    (
        address!("E54Ca86531e17Ef3616d22Ca28b0D458b6C89106"),
        RouterKind::Avax,
    ),
];

/// Router dialect for `router`: configured overrides first, then the known
/// table, then the V2 default.
pub fn router_data(router: Address, overrides: &HashMap<Address, RouterKind>) -> RouterKind {
    overrides
        .get(&router)
        .copied()
        .or_else(|| {
            KNOWN_ROUTERS
                .iter()
                .find(|(addr, _)| *addr == router)
                .map(|(_, kind)| *kind)
        })
        .unwrap_or_default()
}

/// The vault's target asset: `token()`, else `want()`, else `fallback`.
pub async fn resolve_want(
    vault: &VaultHandle,
    fallback: Address,
) -> Result<TokenHandle, LifecycleError> {
    let address = match vault.token().await {
        Ok(token) => token,
        Err(_) => match vault.want().await {
            Ok(want) => want,
            Err(e) => {
                tracing::warn!(vault = %vault.address(), error = %e, "vault exposes neither token() nor want(); using native token");
                fallback
            }
        },
    };
    Ok(TokenHandle::new(vault.backend().clone(), address))
}

/// Inputs for [`zap_native_to_token`].
#[derive(Debug)]
pub struct Zap<'a> {
    pub amount: U256,
    pub want: &'a TokenHandle,
    pub native: Address,
    pub router: &'a RouterHandle,
    pub recipient: Address,
    /// Actor paying the native currency and signing every call.
    pub sender: Address,
}

/// Turn `amount` of native currency into the want token, crediting
/// `recipient`.
///
/// LP wants get half the amount swapped into each side and then paired on
/// the router; plain wants are bought directly.
pub async fn zap_native_to_token(backend: &SharedBackend, zap: Zap<'_>) -> Result<(), LifecycleError> {
    let Some((token0, token1)) = zap.want.lp_components().await else {
        tracing::debug!(want = %zap.want.address(), "want is a single token");
        return swap_native_for_token(backend, &zap, zap.want.address(), zap.amount).await;
    };

    tracing::debug!(want = %zap.want.address(), %token0, %token1, "want is an LP pair");
    let half = zap.amount / U256::from(2u8);
    swap_native_for_token(backend, &zap, token0, half).await?;
    swap_native_for_token(backend, &zap, token1, zap.amount - half).await?;

    let lp0 = TokenHandle::new(backend.clone(), token0);
    let lp1 = TokenHandle::new(backend.clone(), token1);
    let lp0_bal = lp0.balance_of(zap.recipient).await?;
    let lp1_bal = lp1.balance_of(zap.recipient).await?;

    lp0.approve(zap.router.address(), lp0_bal, zap.sender).await?;
    lp1.approve(zap.router.address(), lp1_bal, zap.sender).await?;

    zap.router
        .add_liquidity(
            token0,
            token1,
            lp0_bal,
            lp1_bal,
            U256::from(1u8),
            U256::from(1u8),
            zap.recipient,
            U256::from(SWAP_DEADLINE),
            zap.sender,
        )
        .await
}

async fn swap_native_for_token(
    backend: &SharedBackend,
    zap: &Zap<'_>,
    token: Address,
    amount: U256,
) -> Result<(), LifecycleError> {
    if token == zap.native {
        tracing::debug!(%amount, "wrapping native token");
        return backend.wrap_native(zap.native, amount, zap.sender).await;
    }

    tracing::debug!(%token, %amount, signature = zap.router.kind().swap_signature(), "swapping native for token");
    zap.router
        .swap_exact_native_for_tokens(
            amount,
            U256::ZERO,
            vec![zap.native, token],
            zap.recipient,
            U256::from(SWAP_DEADLINE),
            zap.sender,
        )
        .await
}

/// Unpause `strategy` through the keeper if it is paused. Returns whether an
/// unpause was sent.
pub async fn unpause_if_paused(
    strategy: &StrategyHandle,
    keeper: Address,
) -> Result<bool, LifecycleError> {
    if !strategy.paused().await? {
        return Ok(false);
    }
    tracing::info!(strategy = %strategy.address(), "strategy paused, unpausing as keeper");
    strategy.unpause(keeper).await?;
    Ok(true)
}

/// Wall-clock wait between deposit and harvest.
pub async fn delay(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    tracing::info!(ms = duration.as_millis() as u64, "waiting before harvest");
    tokio::time::sleep(duration).await;
}
