//! Uniswap v4 contract bindings.

use alloy::sol;

/// Universal Router command byte for a v4 swap.
pub const V4_SWAP_COMMAND: u8 = 0x10;

/// v4-periphery action bytes.
pub mod actions {
    /// Mint a new position.
    pub const MINT_POSITION: u8 = 0x02;
    /// Exact-input swap through a single pool.
    pub const SWAP_EXACT_IN_SINGLE: u8 = 0x06;
    /// Pay the full open delta of one currency.
    pub const SETTLE_ALL: u8 = 0x0c;
    /// Pay the open deltas of both pool currencies.
    pub const SETTLE_PAIR: u8 = 0x0d;
    /// Take the full open credit of one currency.
    pub const TAKE_ALL: u8 = 0x0f;
    /// Return leftover balance of a currency to a recipient.
    pub const SWEEP: u8 = 0x14;
}

sol! {
    /// Identifies a v4 pool; hashed into the pool id.
    #[derive(Debug, PartialEq, Eq)]
    struct PoolKey {
        address currency0;
        address currency1;
        uint24 fee;
        int24 tickSpacing;
        address hooks;
    }

    /// Parameters of the `SWAP_EXACT_IN_SINGLE` action.
    #[derive(Debug)]
    struct ExactInputSingleParams {
        PoolKey poolKey;
        bool zeroForOne;
        uint128 amountIn;
        uint128 amountOutMinimum;
        bytes hookData;
    }

    #[sol(rpc)]
    interface IPoolManager {
        event Initialize(
            bytes32 indexed id,
            address indexed currency0,
            address indexed currency1,
            uint24 fee,
            int24 tickSpacing,
            address hooks,
            uint160 sqrtPriceX96,
            int24 tick
        );
    }

    #[sol(rpc)]
    interface IStateView {
        function getSlot0(bytes32 poolId)
            external
            view
            returns (uint160 sqrtPriceX96, int24 tick, uint24 protocolFee, uint24 lpFee);

        function getLiquidity(bytes32 poolId) external view returns (uint128 liquidity);
    }

    #[sol(rpc)]
    interface IV4Quoter {
        struct QuoteExactSingleParams {
            PoolKey poolKey;
            bool zeroForOne;
            uint128 exactAmount;
            bytes hookData;
        }

        function quoteExactInputSingle(QuoteExactSingleParams memory params)
            external
            returns (uint256 amountOut, uint256 gasEstimate);
    }

    #[sol(rpc)]
    interface IUniversalRouter {
        function execute(bytes calldata commands, bytes[] calldata inputs, uint256 deadline)
            external
            payable;
    }

    #[sol(rpc)]
    interface IPositionManager {
        function modifyLiquidities(bytes calldata unlockData, uint256 deadline) external payable;
    }
}
