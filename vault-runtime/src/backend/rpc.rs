//! [`ChainBackend`] over a live JSON-RPC endpoint.
//!
//! View calls go through `eth_call`; state-changing calls are sent from the
//! requested actor and awaited until mined.

use alloy::contract::SolCallBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::sol_types::{Revert, SolCall, SolError};
use async_trait::async_trait;

use super::{AddLiquidity, ChainBackend, NativeSwap};
use crate::chain::{ChainClient, HttpProvider};
use crate::contracts::{
    IBeefyVault, IERC20, IStrategy, IUniswapRouterAVAX, IUniswapRouterETH, IUniswapV2Pair,
    IWrappedNative,
};
use crate::error::LifecycleError;
use crate::types::{ActorSet, OutputRoute, RouterKind};

pub struct RpcBackend {
    client: ChainClient,
}

impl RpcBackend {
    pub fn new(client: ChainClient) -> Self {
        Self { client }
    }

    pub fn actors(&self) -> ActorSet {
        self.client.actors
    }

    fn provider(&self) -> &HttpProvider {
        self.client.provider()
    }
}

/// Decode the revert payload returned by a node.
///
/// `Error(string)` yields its message; other payloads fall back to alloy's
/// generic decoder (panic codes and the like).
pub fn decode_revert(data: &Bytes) -> Option<String> {
    match Revert::abi_decode(data) {
        Ok(revert) => Some(revert.reason),
        Err(_) => alloy::sol_types::decode_revert_reason(data).filter(|r| !r.is_empty()),
    }
}

/// Recover a revert from a node error message such as
/// `execution reverted: Pausable: paused, data: "0x…"`.
fn revert_from_message(method: &str, message: String) -> LifecycleError {
    match message.split_once("execution reverted") {
        Some((_, rest)) => {
            let rest = rest.split(", data:").next().unwrap_or_default();
            let reason = rest.trim_start_matches(':').trim();
            LifecycleError::Reverted {
                method: method.to_string(),
                reason: (!reason.is_empty()).then(|| reason.to_string()),
            }
        }
        None => LifecycleError::RpcError {
            method: method.to_string(),
            message,
        },
    }
}

fn call_error(method: &str, err: alloy::contract::Error) -> LifecycleError {
    if let Some(data) = err.as_revert_data() {
        return LifecycleError::Reverted {
            method: method.to_string(),
            reason: decode_revert(&data),
        };
    }
    revert_from_message(method, err.to_string())
}

/// Send a state-changing call and wait for it to be mined successfully.
async fn transact<P, C>(method: &str, call: SolCallBuilder<P, C>) -> Result<(), LifecycleError>
where
    P: Provider,
    C: SolCall + Send + Sync,
{
    let pending = call.send().await.map_err(|e| call_error(method, e))?;
    let tx_hash = *pending.tx_hash();

    let receipt = pending
        .get_receipt()
        .await
        .map_err(|e| LifecycleError::RpcError {
            method: method.to_string(),
            message: format!("Receipt fetch failed for {tx_hash}: {e}"),
        })?;

    if !receipt.status() {
        return Err(LifecycleError::Reverted {
            method: method.to_string(),
            reason: None,
        });
    }

    tracing::debug!(
        method,
        %tx_hash,
        gas_used = receipt.gas_used,
        block = receipt.block_number.unwrap_or_default(),
        "transaction mined"
    );
    Ok(())
}

#[async_trait]
impl ChainBackend for RpcBackend {
    async fn vault_strategy(&self, vault: Address) -> Result<Address, LifecycleError> {
        IBeefyVault::new(vault, self.provider())
            .strategy()
            .call()
            .await
            .map_err(|e| call_error("strategy", e))
    }

    async fn vault_want(&self, vault: Address) -> Result<Address, LifecycleError> {
        IBeefyVault::new(vault, self.provider())
            .want()
            .call()
            .await
            .map_err(|e| call_error("want", e))
    }

    async fn vault_token(&self, vault: Address) -> Result<Address, LifecycleError> {
        IBeefyVault::new(vault, self.provider())
            .token()
            .call()
            .await
            .map_err(|e| call_error("token", e))
    }

    async fn vault_balance(&self, vault: Address) -> Result<U256, LifecycleError> {
        IBeefyVault::new(vault, self.provider())
            .balance()
            .call()
            .await
            .map_err(|e| call_error("balance", e))
    }

    async fn price_per_full_share(&self, vault: Address) -> Result<U256, LifecycleError> {
        IBeefyVault::new(vault, self.provider())
            .getPricePerFullShare()
            .call()
            .await
            .map_err(|e| call_error("getPricePerFullShare", e))
    }

    async fn vault_owner(&self, vault: Address) -> Result<Address, LifecycleError> {
        IBeefyVault::new(vault, self.provider())
            .owner()
            .call()
            .await
            .map_err(|e| call_error("owner", e))
    }

    async fn deposit_all(&self, vault: Address, from: Address) -> Result<(), LifecycleError> {
        let contract = IBeefyVault::new(vault, self.provider());
        transact("depositAll", contract.depositAll().from(from)).await
    }

    async fn withdraw_all(&self, vault: Address, from: Address) -> Result<(), LifecycleError> {
        let contract = IBeefyVault::new(vault, self.provider());
        transact("withdrawAll", contract.withdrawAll().from(from)).await
    }

    async fn strategy_vault(&self, strategy: Address) -> Result<Address, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .vault()
            .call()
            .await
            .map_err(|e| call_error("vault", e))
    }

    async fn strategy_router(&self, strategy: Address) -> Result<Address, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .unirouter()
            .call()
            .await
            .map_err(|e| call_error("unirouter", e))
    }

    async fn harvest_with_call_fee_recipient(
        &self,
        strategy: Address,
        recipient: Address,
        from: Address,
    ) -> Result<(), LifecycleError> {
        let contract = IStrategy::new(strategy, self.provider());
        transact(
            "harvestWithCallFeeRecipient",
            contract.harvestWithCallFeeRecipient(recipient).from(from),
        )
        .await
    }

    async fn panic(&self, strategy: Address, from: Address) -> Result<(), LifecycleError> {
        let contract = IStrategy::new(strategy, self.provider());
        transact("panic", contract.panic().from(from)).await
    }

    async fn paused(&self, strategy: Address) -> Result<bool, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .paused()
            .call()
            .await
            .map_err(|e| call_error("paused", e))
    }

    async fn unpause(&self, strategy: Address, from: Address) -> Result<(), LifecycleError> {
        let contract = IStrategy::new(strategy, self.provider());
        transact("unpause", contract.unpause().from(from)).await
    }

    async fn balance_of_pool(&self, strategy: Address) -> Result<U256, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .balanceOfPool()
            .call()
            .await
            .map_err(|e| call_error("balanceOfPool", e))
    }

    async fn balance_of_want(&self, strategy: Address) -> Result<U256, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .balanceOfWant()
            .call()
            .await
            .map_err(|e| call_error("balanceOfWant", e))
    }

    async fn last_harvest(&self, strategy: Address) -> Result<U256, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .lastHarvest()
            .call()
            .await
            .map_err(|e| call_error("lastHarvest", e))
    }

    async fn call_fee(&self, strategy: Address) -> Result<U256, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .callFee()
            .call()
            .await
            .map_err(|e| call_error("callFee", e))
    }

    async fn withdrawal_fee(&self, strategy: Address) -> Result<U256, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .withdrawalFee()
            .call()
            .await
            .map_err(|e| call_error("withdrawalFee", e))
    }

    async fn harvest_on_deposit(&self, strategy: Address) -> Result<bool, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .harvestOnDeposit()
            .call()
            .await
            .map_err(|e| call_error("harvestOnDeposit", e))
    }

    async fn strategy_owner(&self, strategy: Address) -> Result<Address, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .owner()
            .call()
            .await
            .map_err(|e| call_error("owner", e))
    }

    async fn strategy_keeper(&self, strategy: Address) -> Result<Address, LifecycleError> {
        IStrategy::new(strategy, self.provider())
            .keeper()
            .call()
            .await
            .map_err(|e| call_error("keeper", e))
    }

    async fn output_route(
        &self,
        strategy: Address,
        route: OutputRoute,
        index: u64,
    ) -> Result<Address, LifecycleError> {
        let contract = IStrategy::new(strategy, self.provider());
        let index = U256::from(index);
        let result = match route {
            OutputRoute::Lp0 => contract.outputToLp0Route(index).call().await,
            OutputRoute::Lp1 => contract.outputToLp1Route(index).call().await,
        };
        result.map_err(|e| call_error(route.method(), e))
    }

    async fn token_balance(
        &self,
        token: Address,
        holder: Address,
    ) -> Result<U256, LifecycleError> {
        IERC20::new(token, self.provider())
            .balanceOf(holder)
            .call()
            .await
            .map_err(|e| call_error("balanceOf", e))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        let contract = IERC20::new(token, self.provider());
        transact("approve", contract.approve(spender, amount).from(from)).await
    }

    async fn transfer(
        &self,
        token: Address,
        to: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        let contract = IERC20::new(token, self.provider());
        transact("transfer", contract.transfer(to, amount).from(from)).await
    }

    async fn pair_tokens(&self, token: Address) -> Result<(Address, Address), LifecycleError> {
        let pair = IUniswapV2Pair::new(token, self.provider());
        let token0 = pair
            .token0()
            .call()
            .await
            .map_err(|e| call_error("token0", e))?;
        let token1 = pair
            .token1()
            .call()
            .await
            .map_err(|e| call_error("token1", e))?;
        Ok((token0, token1))
    }

    async fn wrap_native(
        &self,
        wnative: Address,
        amount: U256,
        from: Address,
    ) -> Result<(), LifecycleError> {
        let contract = IWrappedNative::new(wnative, self.provider());
        transact("deposit", contract.deposit().value(amount).from(from)).await
    }

    async fn swap_native_for_tokens(&self, swap: NativeSwap) -> Result<(), LifecycleError> {
        let method = swap.kind.swap_signature();
        match swap.kind {
            RouterKind::Eth => {
                let router = IUniswapRouterETH::new(swap.router, self.provider());
                let call = router
                    .swapExactETHForTokens(swap.amount_out_min, swap.path, swap.recipient, swap.deadline)
                    .value(swap.amount_in)
                    .from(swap.from);
                transact(method, call).await
            }
            RouterKind::Avax => {
                let router = IUniswapRouterAVAX::new(swap.router, self.provider());
                let call = router
                    .swapExactAVAXForTokens(swap.amount_out_min, swap.path, swap.recipient, swap.deadline)
                    .value(swap.amount_in)
                    .from(swap.from);
                transact(method, call).await
            }
        }
    }

    async fn add_liquidity(&self, request: AddLiquidity) -> Result<(), LifecycleError> {
        // Both router dialects share the addLiquidity signature.
        let router = IUniswapRouterETH::new(request.router, self.provider());
        let call = router
            .addLiquidity(
                request.token_a,
                request.token_b,
                request.amount_a,
                request.amount_b,
                request.amount_a_min,
                request.amount_b_min,
                request.recipient,
                request.deadline,
            )
            .from(request.from);
        transact("addLiquidity", call).await
    }

    async fn advance_time(&self, secs: u64) -> Result<(), LifecycleError> {
        self.provider()
            .raw_request::<_, serde_json::Value>(
                std::borrow::Cow::Borrowed("evm_increaseTime"),
                serde_json::json!([secs]),
            )
            .await
            .map_err(|e| LifecycleError::RpcError {
                method: "evm_increaseTime".into(),
                message: e.to_string(),
            })?;
        self.provider()
            .raw_request::<_, serde_json::Value>(
                std::borrow::Cow::Borrowed("evm_mine"),
                serde_json::json!([]),
            )
            .await
            .map_err(|e| LifecycleError::RpcError {
                method: "evm_mine".into(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
