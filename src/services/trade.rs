//! Quote and calldata construction for swaps and position mints.

use alloy::{
    primitives::{aliases::I24, Address, Bytes, U256},
    sol_types::{SolCall, SolValue},
};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::Serialize;
use std::str::FromStr;

use crate::{
    error::{AppError, Result},
    ethereum::{
        constants::SWAP_DEADLINE_SECONDS,
        contracts::uniswap_v4::{
            actions, ExactInputSingleParams, IPositionManager, IUniversalRouter, V4_SWAP_COMMAND,
        },
        PoolChain,
    },
    services::tick_math::{
        centered_ticks, full_range_ticks, get_sqrt_ratio_at_tick, max_liquidity_for_amounts,
        mint_amounts, mint_amounts_with_slippage, mul_div, TickRange, CENTERED_RANGE_SPACINGS,
    },
    types::{ActionCall, Currency, PoolContext},
};

/// Basis-point denominator.
pub const BIPS_DENOMINATOR: u32 = 10_000;

/// Slippage tolerance in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Slippage {
    bips: u32,
}

impl Slippage {
    /// Parse a percentage string: `"0.50"` is 50 bips. An empty string is
    /// zero tolerance.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let percent = Decimal::from_str(trimmed)
            .map_err(|e| AppError::InvalidSlippage(format!("{value}: {e}")))?;
        if percent.is_sign_negative() && !percent.is_zero() {
            return Err(AppError::InvalidSlippage(format!("{value} is negative")));
        }

        let bips = percent
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|b| b.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|b| b.to_u32())
            .ok_or_else(|| AppError::InvalidSlippage(format!("{value} is out of range")))?;

        Ok(Self { bips })
    }

    /// Basis points.
    pub fn bips(&self) -> u32 {
        self.bips
    }

    /// Lowest acceptable output: `amount_out * 10000 / (10000 + bips)`.
    pub fn min_output(&self, amount_out: U256) -> Result<U256> {
        mul_div(
            amount_out,
            U256::from(BIPS_DENOMINATOR),
            U256::from(BIPS_DENOMINATOR) + U256::from(self.bips),
            false,
        )
    }
}

fn to_u128(value: U256, what: &str) -> Result<u128> {
    u128::try_from(value)
        .map_err(|_| AppError::NumericOverflow(format!("{what} {value} exceeds uint128")))
}

/// Quote an exact-input swap of `amount_in` of `input` through the pool.
pub async fn quote_exact_input(
    chain: &dyn PoolChain,
    quoter: Address,
    pool: &PoolContext,
    input: &Currency,
    amount_in: U256,
) -> Result<U256> {
    let amount_in = to_u128(amount_in, "amount in")?;
    let zero_for_one = pool.zero_for_one(input);
    chain.quote_exact_input_single(quoter, &pool.config.pool_key, zero_for_one, amount_in).await
}

/// Deadline for a swap submitted at `now`.
pub fn swap_deadline(now: u64) -> u64 {
    now + SWAP_DEADLINE_SECONDS
}

/// Deadline for a liquidity action submitted at `now`.
pub fn liquidity_deadline(now: u64, minutes: u64) -> u64 {
    now.saturating_add(minutes.saturating_mul(60))
}

/// A swap transaction and the figures it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    /// Universal Router call.
    pub call: ActionCall,
    /// Exact input amount.
    pub amount_in: U256,
    /// Quoted output.
    pub amount_out: U256,
    /// Output floor after slippage.
    pub min_amount_out: U256,
    /// Swap direction.
    pub zero_for_one: bool,
    /// Pool-key address of the input leg.
    pub input_leg: Address,
}

fn encode_actions(action_bytes: &[u8], params: Vec<Bytes>) -> Bytes {
    (Bytes::copy_from_slice(action_bytes), params).abi_encode_params().into()
}

/// Universal Router `execute` call for an exact-input single-pool swap.
pub fn build_swap_call(
    router: Address,
    pool: &PoolContext,
    input: &Currency,
    amount_in: U256,
    amount_out: U256,
    slippage: Slippage,
    deadline: u64,
) -> Result<SwapPlan> {
    let key = &pool.config.pool_key;
    let zero_for_one = pool.zero_for_one(input);
    let (input_leg, output_leg) =
        if zero_for_one { (key.currency0, key.currency1) } else { (key.currency1, key.currency0) };

    let min_amount_out = slippage.min_output(amount_out)?;

    let swap = ExactInputSingleParams {
        poolKey: key.to_sol()?,
        zeroForOne: zero_for_one,
        amountIn: to_u128(amount_in, "amount in")?,
        amountOutMinimum: to_u128(min_amount_out, "minimum output")?,
        hookData: Bytes::new(),
    };

    let params = vec![
        swap.abi_encode().into(),
        (input_leg, amount_in).abi_encode_params().into(),
        (output_leg, min_amount_out).abi_encode_params().into(),
    ];
    let input = encode_actions(
        &[actions::SWAP_EXACT_IN_SINGLE, actions::SETTLE_ALL, actions::TAKE_ALL],
        params,
    );

    let data = IUniversalRouter::executeCall {
        commands: Bytes::from(vec![V4_SWAP_COMMAND]),
        inputs: vec![input],
        deadline: U256::from(deadline),
    }
    .abi_encode();

    let value = if input_leg == Address::ZERO { amount_in } else { U256::ZERO };

    Ok(SwapPlan {
        call: ActionCall { to: router, data: data.into(), value },
        amount_in,
        amount_out,
        min_amount_out,
        zero_for_one,
        input_leg,
    })
}

/// A mint transaction and the position it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintPlan {
    /// Position Manager call.
    pub call: ActionCall,
    /// Position bounds.
    pub range: TickRange,
    /// Liquidity minted.
    pub liquidity: u128,
    /// Token0 owed at the current price, rounded up.
    pub amount0: U256,
    /// Token1 owed at the current price, rounded up.
    pub amount1: U256,
    /// Token0 owed if the price falls by the slippage tolerance.
    pub amount0_max: U256,
    /// Token1 owed if the price rises by the slippage tolerance.
    pub amount1_max: U256,
}

/// Tick range for a new position.
pub fn select_range(pool: &PoolContext, full_range: bool) -> Result<TickRange> {
    let spacing = pool.config.pool_key.tick_spacing;
    if full_range {
        full_range_ticks(spacing)
    } else {
        centered_ticks(pool.state.tick, spacing, CENTERED_RANGE_SPACINGS)
    }
}

/// Position Manager `modifyLiquidities` call minting the largest position the
/// desired amounts can back.
#[allow(clippy::too_many_arguments)]
pub fn build_mint_call(
    position_manager: Address,
    pool: &PoolContext,
    amount0_desired: U256,
    amount1_desired: U256,
    full_range: bool,
    slippage: Slippage,
    recipient: Address,
    deadline: u64,
) -> Result<MintPlan> {
    let key = &pool.config.pool_key;
    let range = select_range(pool, full_range)?;

    let sqrt_price = U256::from(pool.state.sqrt_price_x96);
    let liquidity = max_liquidity_for_amounts(
        sqrt_price,
        get_sqrt_ratio_at_tick(range.tick_lower)?,
        get_sqrt_ratio_at_tick(range.tick_upper)?,
        amount0_desired,
        amount1_desired,
    )?;
    if liquidity == 0 {
        return Err(AppError::InvalidAmount(
            "Amounts are too small to mint liquidity in the selected range".to_string(),
        ));
    }

    let (amount0, amount1) = mint_amounts(sqrt_price, pool.state.tick, range, liquidity)?;
    let (amount0_max, amount1_max) =
        mint_amounts_with_slippage(sqrt_price, range, liquidity, slippage.bips())?;

    let tick = |t: i32| {
        I24::try_from(t).map_err(|_| AppError::NumericOverflow(format!("tick {t} exceeds int24")))
    };

    let mint = (
        key.to_sol()?,
        tick(range.tick_lower)?,
        tick(range.tick_upper)?,
        U256::from(liquidity),
        to_u128(amount0_max, "amount0 max")?,
        to_u128(amount1_max, "amount1 max")?,
        recipient,
        Bytes::new(),
    )
        .abi_encode_params();

    let mut action_bytes = vec![actions::MINT_POSITION, actions::SETTLE_PAIR];
    let mut params: Vec<Bytes> =
        vec![mint.into(), (key.currency0, key.currency1).abi_encode_params().into()];

    let has_native_leg = key.currency0 == Address::ZERO || key.currency1 == Address::ZERO;
    if has_native_leg {
        action_bytes.push(actions::SWEEP);
        params.push((Address::ZERO, recipient).abi_encode_params().into());
    }

    let data = IPositionManager::modifyLiquiditiesCall {
        unlockData: encode_actions(&action_bytes, params),
        deadline: U256::from(deadline),
    }
    .abi_encode();

    let value = if key.currency0 == Address::ZERO {
        amount0_max
    } else if key.currency1 == Address::ZERO {
        amount1_max
    } else {
        U256::ZERO
    };

    Ok(MintPlan {
        call: ActionCall { to: position_manager, data: data.into(), value },
        range,
        liquidity,
        amount0,
        amount1,
        amount0_max,
        amount1_max,
    })
}
