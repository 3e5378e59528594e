//! Concentrated-liquidity math: tick ↔ sqrt price, tick ranges, and the
//! liquidity/amount conversions used to size a position.
//!
//! Rounding follows the on-chain libraries: amounts owed to the pool round
//! up, liquidity derived from amounts rounds down.

use alloy::primitives::{U256, U512};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Lowest tick a pool supports.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick a pool supports.
pub const MAX_TICK: i32 = 887_272;

/// Ticks on each side of the current tick for a centered position, in
/// multiples of the tick spacing.
pub const CENTERED_RANGE_SPACINGS: i32 = 100;

/// 2^96.
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);

/// `get_sqrt_ratio_at_tick(MIN_TICK)`.
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4_295_128_739, 0, 0, 0]);

/// `get_sqrt_ratio_at_tick(MAX_TICK)`.
pub const MAX_SQRT_RATIO: U256 =
    U256::from_limbs([0x5d951d5263988d26, 0xefd1fc6a50648849, 0xfffd8963, 0]);

// (bit of |tick|, Q128.128 multiplier)
const TICK_MULTIPLIERS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

/// Inclusive-exclusive tick bounds of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickRange {
    /// Lower tick.
    pub tick_lower: i32,
    /// Upper tick.
    pub tick_upper: i32,
}

/// sqrt(1.0001^tick) as a Q64.96 fixed-point number.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(AppError::NumericOverflow(format!("tick {tick} out of range")));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::from(1u8) << 128
    };

    for (bit, multiplier) in TICK_MULTIPLIERS {
        if abs_tick & bit != 0 {
            ratio = (ratio * U256::from(multiplier)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let remainder = ratio & U256::from(u32::MAX);
    Ok((ratio >> 32) + U256::from(u8::from(!remainder.is_zero())))
}

/// Smallest tick divisible by `tick_spacing` that is still in range.
pub fn min_usable_tick(tick_spacing: i32) -> i32 {
    -(MIN_TICK.abs() / tick_spacing) * tick_spacing
}

/// Largest tick divisible by `tick_spacing` that is still in range.
pub fn max_usable_tick(tick_spacing: i32) -> i32 {
    (MAX_TICK / tick_spacing) * tick_spacing
}

/// Widest valid range for the spacing.
pub fn full_range_ticks(tick_spacing: i32) -> Result<TickRange> {
    ensure_spacing(tick_spacing)?;
    Ok(TickRange {
        tick_lower: min_usable_tick(tick_spacing),
        tick_upper: max_usable_tick(tick_spacing),
    })
}

/// `range` spacings either side of `tick_current`, rounded outward to the
/// spacing and clamped to the usable range.
pub fn centered_ticks(tick_current: i32, tick_spacing: i32, range: i32) -> Result<TickRange> {
    ensure_spacing(tick_spacing)?;
    let span = tick_spacing.saturating_mul(range);
    let raw_lower = tick_current.saturating_sub(span);
    let raw_upper = tick_current.saturating_add(span);

    let lower = raw_lower.div_euclid(tick_spacing) * tick_spacing;
    let upper = -((-raw_upper).div_euclid(tick_spacing)) * tick_spacing;

    Ok(TickRange {
        tick_lower: lower.max(min_usable_tick(tick_spacing)),
        tick_upper: upper.min(max_usable_tick(tick_spacing)),
    })
}

fn ensure_spacing(tick_spacing: i32) -> Result<()> {
    if tick_spacing <= 0 || tick_spacing > MAX_TICK {
        return Err(AppError::NumericOverflow(format!("invalid tick spacing {tick_spacing}")));
    }
    Ok(())
}

fn widen(value: U256) -> U512 {
    U512::from_limbs_slice(value.as_limbs())
}

fn narrow(value: U512) -> Result<U256> {
    let limbs = value.as_limbs();
    if limbs[4..].iter().any(|limb| *limb != 0) {
        return Err(AppError::NumericOverflow(format!("{value} does not fit in 256 bits")));
    }
    Ok(U256::from_limbs_slice(&limbs[..4]))
}

/// `a * b / denominator` with a 512-bit intermediate.
pub fn mul_div(a: U256, b: U256, denominator: U256, round_up: bool) -> Result<U256> {
    if denominator.is_zero() {
        return Err(AppError::NumericOverflow("division by zero".to_string()));
    }
    let product = widen(a) * widen(b);
    let denominator = widen(denominator);
    let mut quotient = product / denominator;
    if round_up && !(product % denominator).is_zero() {
        quotient += U512::from(1u8);
    }
    narrow(quotient)
}

fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Token0 needed to move `liquidity` across `[sqrt_a, sqrt_b]`.
pub fn amount0_delta(sqrt_a: U256, sqrt_b: U256, liquidity: u128, round_up: bool) -> Result<U256> {
    let (sqrt_a, sqrt_b) = sorted(sqrt_a, sqrt_b);
    if sqrt_a.is_zero() {
        return Err(AppError::NumericOverflow("sqrt price is zero".to_string()));
    }
    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = sqrt_b - sqrt_a;

    if round_up {
        let step = mul_div(numerator1, numerator2, sqrt_b, true)?;
        Ok(step.div_ceil(sqrt_a))
    } else {
        Ok(mul_div(numerator1, numerator2, sqrt_b, false)? / sqrt_a)
    }
}

/// Token1 needed to move `liquidity` across `[sqrt_a, sqrt_b]`.
pub fn amount1_delta(sqrt_a: U256, sqrt_b: U256, liquidity: u128, round_up: bool) -> Result<U256> {
    let (sqrt_a, sqrt_b) = sorted(sqrt_a, sqrt_b);
    mul_div(U256::from(liquidity), sqrt_b - sqrt_a, Q96, round_up)
}

fn liquidity_for_amount0(sqrt_a: U256, sqrt_b: U256, amount0: U256) -> Result<U256> {
    let (sqrt_a, sqrt_b) = sorted(sqrt_a, sqrt_b);
    let overflow = || AppError::NumericOverflow(format!("amount {amount0} too large"));
    let numerator = widen(amount0)
        .checked_mul(widen(sqrt_a))
        .and_then(|v| v.checked_mul(widen(sqrt_b)))
        .ok_or_else(overflow)?;
    let denominator = widen(Q96) * widen(sqrt_b - sqrt_a);
    if denominator.is_zero() {
        return Err(AppError::NumericOverflow("empty price range".to_string()));
    }
    narrow(numerator / denominator)
}

fn liquidity_for_amount1(sqrt_a: U256, sqrt_b: U256, amount1: U256) -> Result<U256> {
    let (sqrt_a, sqrt_b) = sorted(sqrt_a, sqrt_b);
    mul_div(amount1, Q96, sqrt_b - sqrt_a, false)
}

/// Largest liquidity the two amounts can back at the current price.
pub fn max_liquidity_for_amounts(
    sqrt_price: U256,
    sqrt_a: U256,
    sqrt_b: U256,
    amount0: U256,
    amount1: U256,
) -> Result<u128> {
    let (sqrt_a, sqrt_b) = sorted(sqrt_a, sqrt_b);

    let liquidity = if sqrt_price <= sqrt_a {
        liquidity_for_amount0(sqrt_a, sqrt_b, amount0)?
    } else if sqrt_price < sqrt_b {
        let from0 = liquidity_for_amount0(sqrt_price, sqrt_b, amount0)?;
        let from1 = liquidity_for_amount1(sqrt_a, sqrt_price, amount1)?;
        from0.min(from1)
    } else {
        liquidity_for_amount1(sqrt_a, sqrt_b, amount1)?
    };

    u128::try_from(liquidity)
        .map_err(|_| AppError::NumericOverflow(format!("liquidity {liquidity} exceeds uint128")))
}

/// Floor of the square root.
fn isqrt(value: U512) -> U512 {
    if value < U512::from(2u8) {
        return value;
    }
    let mut x = U512::from(1u8) << (value.bit_len() / 2 + 1);
    loop {
        let y = (x + value / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Sqrt price after scaling the price (not its root) by
/// `numerator / denominator`, rounded down.
fn scale_sqrt_price(sqrt_price: U256, numerator: u32, denominator: u32) -> Result<U256> {
    let squared = widen(sqrt_price) * widen(sqrt_price);
    narrow(isqrt(squared * U512::from(numerator) / U512::from(denominator)))
}

/// Lowest and highest sqrt prices reachable when the price moves by `bips`
/// in either direction, kept strictly inside the valid sqrt ratio range.
pub fn sqrt_prices_after_slippage(sqrt_price: U256, bips: u32) -> Result<(U256, U256)> {
    let denominator = 10_000u32;
    let lower = scale_sqrt_price(sqrt_price, denominator.saturating_sub(bips), denominator)?;
    let upper = scale_sqrt_price(sqrt_price, denominator.saturating_add(bips), denominator)?;

    let lower = if lower <= MIN_SQRT_RATIO { MIN_SQRT_RATIO + U256::from(1u8) } else { lower };
    let upper = if upper >= MAX_SQRT_RATIO { MAX_SQRT_RATIO - U256::from(1u8) } else { upper };
    Ok((lower, upper))
}

/// Amounts owed to mint `liquidity` over `range` with the pool at
/// `sqrt_price`, rounded up. Which side of the range the price is on follows
/// from the price itself.
fn mint_amounts_at_price(
    sqrt_price: U256,
    range: TickRange,
    liquidity: u128,
) -> Result<(U256, U256)> {
    let sqrt_lower = get_sqrt_ratio_at_tick(range.tick_lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(range.tick_upper)?;

    if sqrt_price < sqrt_lower {
        Ok((amount0_delta(sqrt_lower, sqrt_upper, liquidity, true)?, U256::ZERO))
    } else if sqrt_price < sqrt_upper {
        Ok((
            amount0_delta(sqrt_price, sqrt_upper, liquidity, true)?,
            amount1_delta(sqrt_lower, sqrt_price, liquidity, true)?,
        ))
    } else {
        Ok((U256::ZERO, amount1_delta(sqrt_lower, sqrt_upper, liquidity, true)?))
    }
}

/// Ceilings for minting `liquidity` when the price may slip by `bips`.
///
/// Token0 owed is largest when the price falls, token1 owed when it rises,
/// so each ceiling is the mint amount at the matching slipped price.
pub fn mint_amounts_with_slippage(
    sqrt_price: U256,
    range: TickRange,
    liquidity: u128,
    bips: u32,
) -> Result<(U256, U256)> {
    let (sqrt_low, sqrt_high) = sqrt_prices_after_slippage(sqrt_price, bips)?;
    let (amount0_max, _) = mint_amounts_at_price(sqrt_low, range, liquidity)?;
    let (_, amount1_max) = mint_amounts_at_price(sqrt_high, range, liquidity)?;
    Ok((amount0_max, amount1_max))
}

/// Amounts owed to mint `liquidity` over `range`, rounded up.
pub fn mint_amounts(
    sqrt_price: U256,
    tick_current: i32,
    range: TickRange,
    liquidity: u128,
) -> Result<(U256, U256)> {
    let sqrt_lower = get_sqrt_ratio_at_tick(range.tick_lower)?;
    let sqrt_upper = get_sqrt_ratio_at_tick(range.tick_upper)?;

    if tick_current < range.tick_lower {
        Ok((amount0_delta(sqrt_lower, sqrt_upper, liquidity, true)?, U256::ZERO))
    } else if tick_current < range.tick_upper {
        Ok((
            amount0_delta(sqrt_price, sqrt_upper, liquidity, true)?,
            amount1_delta(sqrt_lower, sqrt_price, liquidity, true)?,
        ))
    } else {
        Ok((U256::ZERO, amount1_delta(sqrt_lower, sqrt_upper, liquidity, true)?))
    }
}
