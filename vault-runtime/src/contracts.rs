//! Solidity contract bindings for the vault, strategy, token and router
//! surfaces the lifecycle scenarios touch.
//!
//! Uses alloy's `sol!` macro to generate type-safe ABI encoders/decoders
//! and RPC call builders.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IBeefyVault {
        function strategy() external view returns (address);
        function want() external view returns (address);
        function token() external view returns (address);
        function balance() external view returns (uint256);
        function getPricePerFullShare() external view returns (uint256);
        function depositAll() external;
        function withdrawAll() external;
        function owner() external view returns (address);
    }

    #[sol(rpc)]
    interface IStrategy {
        function vault() external view returns (address);
        function unirouter() external view returns (address);
        function harvestWithCallFeeRecipient(address callFeeRecipient) external;
        function panic() external;
        function paused() external view returns (bool);
        function unpause() external;
        function balanceOfPool() external view returns (uint256);
        function balanceOfWant() external view returns (uint256);
        function lastHarvest() external view returns (uint256);
        function callFee() external view returns (uint256);
        function withdrawalFee() external view returns (uint256);
        function harvestOnDeposit() external view returns (bool);
        function owner() external view returns (address);
        function keeper() external view returns (address);
        function outputToLp0Route(uint256 index) external view returns (address);
        function outputToLp1Route(uint256 index) external view returns (address);
    }

    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface IUniswapV2Pair {
        function token0() external view returns (address);
        function token1() external view returns (address);
    }

    #[sol(rpc)]
    interface IWrappedNative {
        function deposit() external payable;
    }

    #[sol(rpc)]
    interface IUniswapRouterETH {
        function swapExactETHForTokens(
            uint256 amountOutMin, address[] calldata path, address to, uint256 deadline
        ) external payable returns (uint256[] memory amounts);

        function addLiquidity(
            address tokenA, address tokenB, uint256 amountADesired, uint256 amountBDesired,
            uint256 amountAMin, uint256 amountBMin, address to, uint256 deadline
        ) external returns (uint256 amountA, uint256 amountB, uint256 liquidity);
    }

    #[sol(rpc)]
    interface IUniswapRouterAVAX {
        function swapExactAVAXForTokens(
            uint256 amountOutMin, address[] calldata path, address to, uint256 deadline
        ) external payable returns (uint256[] memory amounts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use alloy::sol_types::SolCall;

    #[test]
    fn test_router_dialects_have_distinct_swap_selectors() {
        assert_ne!(
            IUniswapRouterETH::swapExactETHForTokensCall::SELECTOR,
            IUniswapRouterAVAX::swapExactAVAXForTokensCall::SELECTOR
        );
    }

    #[test]
    fn test_route_hop_call_encodes_index() {
        let call = IStrategy::outputToLp0RouteCall {
            index: U256::from(3u64),
        };
        let data = call.abi_encode();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[4 + 31], 3);
    }

    #[test]
    fn test_harvest_with_recipient_encodes_address() {
        let recipient = Address::repeat_byte(0x11);
        let call = IStrategy::harvestWithCallFeeRecipientCall {
            callFeeRecipient: recipient,
        };
        let data = call.abi_encode();
        assert_eq!(&data[4 + 12..], recipient.as_slice());
    }
}
