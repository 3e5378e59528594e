//! Token registry for the supported pair.
//!
//! The symbol set is closed (`ETH`, `USDC`); addresses come from the
//! resolved configuration rather than a remote token list.

use alloy::primitives::Address;

use crate::{
    config::ContractAddresses,
    error::{AppError, Result},
    types::{Currency, TokenMetadata, TokenSymbol, NATIVE_DECIMALS},
};

/// Decimals of the stablecoin.
pub const USDC_DECIMALS: u8 = 6;

/// Static mapping from symbol to metadata and pool currency.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    eth: TokenMetadata,
    usdc: TokenMetadata,
    weth: Address,
}

impl TokenRegistry {
    /// Build the registry from resolved contract addresses.
    pub fn new(addresses: &ContractAddresses) -> Self {
        Self {
            eth: TokenMetadata {
                symbol: TokenSymbol::Eth,
                name: "Ether".to_string(),
                address: None,
                decimals: NATIVE_DECIMALS,
                icon: "/eth.svg".to_string(),
            },
            usdc: TokenMetadata {
                symbol: TokenSymbol::Usdc,
                name: "USD Coin".to_string(),
                address: Some(addresses.usdc),
                decimals: USDC_DECIMALS,
                icon: "/usdc.svg".to_string(),
            },
            weth: addresses.weth,
        }
    }

    /// Metadata for a symbol.
    pub fn metadata(&self, symbol: TokenSymbol) -> &TokenMetadata {
        match symbol {
            TokenSymbol::Eth => &self.eth,
            TokenSymbol::Usdc => &self.usdc,
        }
    }

    /// All supported tokens, native first.
    pub fn supported(&self) -> Vec<&TokenMetadata> {
        TokenSymbol::ALL.iter().map(|s| self.metadata(*s)).collect()
    }

    /// Currency object for a symbol. `ETH` is always the native asset.
    pub fn currency(&self, symbol: TokenSymbol) -> Currency {
        match symbol {
            TokenSymbol::Eth => Currency::Native { wrapped: self.weth },
            TokenSymbol::Usdc => {
                Currency::Token { address: self.stable_address(), decimals: USDC_DECIMALS }
            }
        }
    }

    /// Reverse lookup. Both the zero address and the wrapped token map to `ETH`.
    pub fn symbol_for_address(&self, address: Address) -> Option<TokenSymbol> {
        if address == Address::ZERO || address == self.weth {
            Some(TokenSymbol::Eth)
        } else if address == self.stable_address() {
            Some(TokenSymbol::Usdc)
        } else {
            None
        }
    }

    /// Currency for an address found in a pool key.
    ///
    /// The zero address is the native asset; the wrapped token stays an ERC20
    /// because that is what the pool settles in.
    pub fn currency_for_pool_address(&self, address: Address) -> Result<Currency> {
        if address == Address::ZERO {
            return Ok(Currency::Native { wrapped: self.weth });
        }
        if address == self.weth {
            return Ok(Currency::Token { address, decimals: NATIVE_DECIMALS });
        }
        if address == self.stable_address() {
            return Ok(Currency::Token { address, decimals: USDC_DECIMALS });
        }
        Err(AppError::UnsupportedToken(format!("{address:?}")))
    }

    /// Wrapped native token address.
    pub fn weth(&self) -> Address {
        self.weth
    }

    fn stable_address(&self) -> Address {
        self.usdc.address.unwrap_or_default()
    }
}
