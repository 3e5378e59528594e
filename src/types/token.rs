//! Token-related types.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Fractional digits kept when an amount is shown to the user.
pub const DISPLAY_PRECISION: usize = 6;

/// Decimals of the native asset.
pub const NATIVE_DECIMALS: u8 = 18;

/// The closed set of tradable symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenSymbol {
    /// Native ether.
    Eth,
    /// USD Coin.
    Usdc,
}

impl TokenSymbol {
    /// Both symbols, native first.
    pub const ALL: [TokenSymbol; 2] = [TokenSymbol::Eth, TokenSymbol::Usdc];

    /// Upper-case ticker.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSymbol::Eth => "ETH",
            TokenSymbol::Usdc => "USDC",
        }
    }

    /// The other member of the pair.
    pub fn counterpart(&self) -> TokenSymbol {
        match self {
            TokenSymbol::Eth => TokenSymbol::Usdc,
            TokenSymbol::Usdc => TokenSymbol::Eth,
        }
    }
}

impl std::fmt::Display for TokenSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenSymbol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "ETH" => Ok(TokenSymbol::Eth),
            "USDC" => Ok(TokenSymbol::Usdc),
            _ => Err(AppError::UnsupportedToken(s.to_string())),
        }
    }
}

/// Static information about a supported token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Ticker.
    pub symbol: TokenSymbol,
    /// Display name.
    pub name: String,
    /// Contract address (None for native ETH).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Number of decimals.
    pub decimals: u8,
    /// Icon reference.
    pub icon: String,
}

/// A currency as seen by a pool: either the chain's native asset or an ERC20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    /// Native ether, with the address of its wrapped form.
    Native { wrapped: Address },
    /// An ERC20 token.
    Token { address: Address, decimals: u8 },
}

impl Currency {
    /// Whether this is the native asset.
    pub fn is_native(&self) -> bool {
        matches!(self, Currency::Native { .. })
    }

    /// Decimal precision.
    pub fn decimals(&self) -> u8 {
        match self {
            Currency::Native { .. } => NATIVE_DECIMALS,
            Currency::Token { decimals, .. } => *decimals,
        }
    }

    /// Address of the wrapped (ERC20) form.
    pub fn wrapped(&self) -> Address {
        match self {
            Currency::Native { wrapped } => *wrapped,
            Currency::Token { address, .. } => *address,
        }
    }

    /// Address used for this currency inside a v4 pool key.
    pub fn pool_address(&self) -> Address {
        match self {
            Currency::Native { .. } => Address::ZERO,
            Currency::Token { address, .. } => *address,
        }
    }

    /// Equality across native and wrapped forms: two natives are the same
    /// currency, anything else compares wrapped addresses.
    pub fn same_as(&self, other: &Currency) -> bool {
        if self.is_native() && other.is_native() {
            return true;
        }
        self.wrapped() == other.wrapped()
    }
}

/// Format a U256 value with decimals to a human-readable string.
pub fn format_units(value: U256, decimals: u8) -> String {
    if value == U256::ZERO {
        return "0".to_string();
    }

    let value_str = value.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return value_str;
    }

    let len = value_str.len();
    if len <= decimals {
        // Value is less than 1, pad with zeros
        let zeros = decimals - len;
        let decimal_part = value_str.trim_end_matches('0');
        format!("0.{}{}", "0".repeat(zeros), decimal_part)
    } else {
        let (integer, decimal) = value_str.split_at(len - decimals);
        let decimal = decimal.trim_end_matches('0');
        if decimal.is_empty() {
            integer.to_string()
        } else {
            format!("{}.{}", integer, decimal)
        }
    }
}

/// Format an amount for display: at most six fractional digits, trailing
/// zeros stripped.
pub fn format_display_amount(value: U256, decimals: u8) -> String {
    let formatted = format_units(value, decimals);
    let Some((whole, fraction)) = formatted.split_once('.') else {
        return formatted;
    };
    let kept = &fraction[..fraction.len().min(DISPLAY_PRECISION)];
    let kept = kept.trim_end_matches('0');
    if kept.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{kept}")
    }
}

/// Parse a human-readable amount string to U256 with decimals.
///
/// Fractional digits beyond `decimals` are truncated.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();

    if amount.is_empty() {
        return Err(AppError::InvalidAmount("Amount cannot be empty".to_string()));
    }

    if amount.starts_with('-') {
        return Err(AppError::InvalidAmount("Amount cannot be negative".to_string()));
    }

    let decimals = decimals as usize;
    let multiplier = U256::from(10).pow(U256::from(decimals));

    let (integer, fraction) = match amount.split_once('.') {
        Some((_, rest)) if rest.contains('.') => {
            return Err(AppError::InvalidAmount(format!("Invalid amount format: {amount}")));
        }
        Some((integer, fraction)) => (integer, fraction),
        None => (amount, ""),
    };

    if integer.is_empty() && fraction.is_empty() {
        return Err(AppError::InvalidAmount(format!("Invalid amount format: {amount}")));
    }

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer) || !all_digits(fraction) {
        return Err(AppError::InvalidAmount(format!("Invalid amount: {amount}")));
    }

    let integer_value = if integer.is_empty() {
        U256::ZERO
    } else {
        integer
            .parse::<U256>()
            .map_err(|e| AppError::InvalidAmount(format!("Invalid integer part: {e}")))?
    };

    let mut fraction = fraction.to_string();
    if fraction.len() > decimals {
        fraction.truncate(decimals);
    } else {
        fraction.push_str(&"0".repeat(decimals - fraction.len()));
    }

    let fraction_value = if fraction.is_empty() {
        U256::ZERO
    } else {
        fraction
            .parse::<U256>()
            .map_err(|e| AppError::InvalidAmount(format!("Invalid fraction part: {e}")))?
    };

    integer_value
        .checked_mul(multiplier)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(|| AppError::NumericOverflow(format!("{amount} does not fit in 256 bits")))
}

/// Parse an amount that must be strictly positive.
pub fn parse_positive_units(amount: &str, decimals: u8) -> Result<U256> {
    let value = parse_units(amount, decimals)?;
    if value == U256::ZERO {
        return Err(AppError::InvalidAmount("Amount must be greater than zero".to_string()));
    }
    Ok(value)
}
