//! Swap and liquidity form state, plus built transactions.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::types::TokenSymbol;

/// Default slippage tolerance, percent.
pub const DEFAULT_SLIPPAGE: &str = "0.50";

/// Default liquidity deadline, minutes.
pub const DEFAULT_DEADLINE_MINUTES: u64 = 20;

/// Swap form state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapState {
    /// Token being sold.
    pub input_token: TokenSymbol,
    /// Token being bought.
    pub output_token: TokenSymbol,
    /// Typed input amount.
    pub input_amount: String,
    /// Estimated output, display-formatted. Empty when there is no estimate.
    pub output_amount: String,
    /// Slippage tolerance as a percentage string.
    pub slippage: String,
}

impl Default for SwapState {
    fn default() -> Self {
        Self {
            input_token: TokenSymbol::Eth,
            output_token: TokenSymbol::Usdc,
            input_amount: String::new(),
            output_amount: String::new(),
            slippage: DEFAULT_SLIPPAGE.to_string(),
        }
    }
}

/// Liquidity form state. Side A is ETH, side B is USDC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityState {
    /// ETH amount.
    pub amount_a: String,
    /// USDC amount.
    pub amount_b: String,
    /// Slippage tolerance as a percentage string.
    pub slippage: String,
    /// Use the full usable tick range instead of a window around the price.
    pub full_range: bool,
    /// Deadline offset in minutes.
    pub deadline_minutes: u64,
}

impl Default for LiquidityState {
    fn default() -> Self {
        Self {
            amount_a: String::new(),
            amount_b: String::new(),
            slippage: DEFAULT_SLIPPAGE.to_string(),
            full_range: true,
            deadline_minutes: DEFAULT_DEADLINE_MINUTES,
        }
    }
}

/// A transaction ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCall {
    /// Target contract.
    pub to: Address,
    /// Calldata.
    pub data: Bytes,
    /// Native value.
    pub value: U256,
}

/// Raw transaction data for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionData {
    /// Target contract address.
    pub to: String,
    /// Calldata (hex encoded).
    pub data: String,
    /// Value in wei.
    pub value: String,
}

impl From<&ActionCall> for TransactionData {
    fn from(call: &ActionCall) -> Self {
        Self {
            to: format!("{:?}", call.to),
            data: format!("0x{}", alloy::hex::encode(&call.data)),
            value: call.value.to_string(),
        }
    }
}

/// Outcome of a confirmed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReceipt {
    /// Transaction hash.
    pub hash: String,
    /// Summary shown to the user.
    pub message: String,
    /// What was sent.
    pub transaction: TransactionData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_state_defaults() {
        let state = SwapState::default();
        assert_eq!(state.input_token, TokenSymbol::Eth);
        assert_eq!(state.output_token, TokenSymbol::Usdc);
        assert!(state.input_amount.is_empty());
        assert_eq!(state.slippage, "0.50");
    }

    #[test]
    fn test_liquidity_state_defaults() {
        let state = LiquidityState::default();
        assert!(state.full_range);
        assert_eq!(state.deadline_minutes, 20);
        assert_eq!(state.slippage, "0.50");
    }

    #[test]
    fn test_transaction_data_from_call() {
        let call = ActionCall {
            to: Address::with_last_byte(1),
            data: Bytes::from(vec![0xde, 0xad]),
            value: U256::from(42u64),
        };
        let data = TransactionData::from(&call);
        assert_eq!(data.data, "0xdead");
        assert_eq!(data.value, "42");
        assert!(data.to.ends_with("01"));
    }
}
