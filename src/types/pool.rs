//! Pool-related types.

use alloy::{
    primitives::{aliases::I24, aliases::U24, keccak256, Address, B256, U160},
    sol_types::SolValue,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    ethereum::contracts::uniswap_v4,
    types::Currency,
};

/// Key of a v4 pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolKey {
    /// Lower-sorted currency (zero address for native).
    pub currency0: Address,
    /// Higher-sorted currency.
    pub currency1: Address,
    /// LP fee in hundredths of a bip.
    pub fee: u32,
    /// Tick spacing.
    pub tick_spacing: i32,
    /// Hook contract (zero for none).
    pub hooks: Address,
}

impl PoolKey {
    /// Build a key from an unordered pair of currency addresses.
    pub fn sorted(a: Address, b: Address, fee: u32, tick_spacing: i32, hooks: Address) -> Self {
        let (currency0, currency1) = if a < b { (a, b) } else { (b, a) };
        Self { currency0, currency1, fee, tick_spacing, hooks }
    }

    /// ABI form of the key.
    pub fn to_sol(&self) -> Result<uniswap_v4::PoolKey> {
        let tick_spacing = I24::try_from(self.tick_spacing).map_err(|_| {
            AppError::NumericOverflow(format!("tick spacing {} exceeds int24", self.tick_spacing))
        })?;
        if self.fee >= 1 << 24 {
            return Err(AppError::NumericOverflow(format!("fee {} exceeds uint24", self.fee)));
        }
        Ok(uniswap_v4::PoolKey {
            currency0: self.currency0,
            currency1: self.currency1,
            fee: U24::from(self.fee),
            tickSpacing: tick_spacing,
            hooks: self.hooks,
        })
    }

    /// Pool identifier: keccak256 of the ABI-encoded key.
    pub fn pool_id(&self) -> Result<B256> {
        Ok(keccak256(self.to_sol()?.abi_encode()))
    }

    /// Whether the key pairs the native/wrapped asset with the stablecoin.
    pub fn pairs(&self, weth: Address, usdc: Address) -> bool {
        let is_native_leg = |c: Address| c == weth || c == Address::ZERO;
        (is_native_leg(self.currency0) && self.currency1 == usdc)
            || (is_native_leg(self.currency1) && self.currency0 == usdc)
    }
}

/// A located pool: its key and identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfiguration {
    /// Pool key.
    pub pool_key: PoolKey,
    /// keccak256 of the key.
    pub pool_id: B256,
}

/// Live pool state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    /// Current sqrt price, Q64.96.
    pub sqrt_price_x96: U160,
    /// Current tick.
    pub tick: i32,
    /// In-range liquidity.
    pub liquidity: u128,
}

/// Everything needed to price and build actions against the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolContext {
    /// Located pool.
    pub config: PoolConfiguration,
    /// State read right after location.
    pub state: PoolState,
    /// `config.pool_key.currency0` as a currency.
    pub currency0: Currency,
    /// `config.pool_key.currency1` as a currency.
    pub currency1: Currency,
}

impl PoolContext {
    /// Swap direction for an input currency.
    pub fn zero_for_one(&self, input: &Currency) -> bool {
        self.currency0.same_as(input)
    }
}

/// An `Initialize` event emitted by the pool manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeEvent {
    /// Pool id as emitted.
    pub id: B256,
    /// Key of the initialized pool.
    pub key: PoolKey,
}
