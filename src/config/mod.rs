//! Configuration management module.
//!
//! Handles loading configuration from environment variables and resolving
//! the contract address set for the selected chain.

use std::collections::HashMap;
use std::env;

use alloy::primitives::Address;

use crate::error::AppError;
use crate::ethereum::constants::{
    DEFAULT_CHAIN_ID, ETHEREUM_MAINNET_CHAIN_ID, MAINNET_POOL_MANAGER, MAINNET_POSITION_MANAGER,
    MAINNET_QUOTER, MAINNET_STATE_VIEW, MAINNET_UNIVERSAL_ROUTER, MAINNET_USDC, MAINNET_WETH,
    PERMIT2_ADDRESS, SEPOLIA_CHAIN_ID, SEPOLIA_POOL_MANAGER, SEPOLIA_POSITION_MANAGER,
    SEPOLIA_QUOTER, SEPOLIA_STATE_VIEW, SEPOLIA_UNIVERSAL_ROUTER, SEPOLIA_USDC, SEPOLIA_WETH,
};

/// Names of the address fields, in resolution order.
pub const ADDRESS_FIELDS: [&str; 8] = [
    "universal_router",
    "pool_manager",
    "state_view",
    "position_manager",
    "quoter",
    "permit2",
    "weth",
    "usdc",
];

/// Fully-populated set of contracts the application talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    /// Universal Router (swap entry point).
    pub universal_router: Address,
    /// v4 PoolManager (emits `Initialize`).
    pub pool_manager: Address,
    /// StateView lens for slot0 / liquidity reads.
    pub state_view: Address,
    /// PositionManager (liquidity entry point).
    pub position_manager: Address,
    /// V4Quoter.
    pub quoter: Address,
    /// Permit2 allowance registry.
    pub permit2: Address,
    /// Wrapped native token.
    pub weth: Address,
    /// Stablecoin.
    pub usdc: Address,
}

/// Built-in defaults for a supported chain.
fn chain_defaults(chain_id: u64) -> Option<ContractAddresses> {
    match chain_id {
        ETHEREUM_MAINNET_CHAIN_ID => Some(ContractAddresses {
            universal_router: MAINNET_UNIVERSAL_ROUTER,
            pool_manager: MAINNET_POOL_MANAGER,
            state_view: MAINNET_STATE_VIEW,
            position_manager: MAINNET_POSITION_MANAGER,
            quoter: MAINNET_QUOTER,
            permit2: PERMIT2_ADDRESS,
            weth: MAINNET_WETH,
            usdc: MAINNET_USDC,
        }),
        SEPOLIA_CHAIN_ID => Some(ContractAddresses {
            universal_router: SEPOLIA_UNIVERSAL_ROUTER,
            pool_manager: SEPOLIA_POOL_MANAGER,
            state_view: SEPOLIA_STATE_VIEW,
            position_manager: SEPOLIA_POSITION_MANAGER,
            quoter: SEPOLIA_QUOTER,
            permit2: PERMIT2_ADDRESS,
            weth: SEPOLIA_WETH,
            usdc: SEPOLIA_USDC,
        }),
        _ => None,
    }
}

impl ContractAddresses {
    fn field(&self, name: &str) -> Option<Address> {
        let value = match name {
            "universal_router" => self.universal_router,
            "pool_manager" => self.pool_manager,
            "state_view" => self.state_view,
            "position_manager" => self.position_manager,
            "quoter" => self.quoter,
            "permit2" => self.permit2,
            "weth" => self.weth,
            "usdc" => self.usdc,
            _ => return None,
        };
        Some(value)
    }
}

/// Resolve the contract address set for `chain_id`.
///
/// Each field is taken from `overrides` (keyed by the names in
/// [`ADDRESS_FIELDS`]) or else from the chain's built-in defaults. An override
/// holding an empty string clears the default. Resolution is pure: no
/// environment access and no network calls.
///
/// # Errors
/// Returns [`AppError::MissingAddress`] naming the first unresolved field, or
/// [`AppError::InvalidAddress`] for an override that does not parse.
pub fn resolve_addresses(
    chain_id: u64,
    overrides: &HashMap<String, String>,
) -> Result<ContractAddresses, AppError> {
    let defaults = chain_defaults(chain_id);

    let mut resolved = [Address::ZERO; ADDRESS_FIELDS.len()];
    for (slot, field) in resolved.iter_mut().zip(ADDRESS_FIELDS) {
        let value = match overrides.get(field).map(|s| s.trim()) {
            Some("") => None,
            Some(raw) => Some(
                raw.parse::<Address>()
                    .map_err(|e| AppError::InvalidAddress(format!("{field}={raw}: {e}")))?,
            ),
            None => defaults.and_then(|d| d.field(field)),
        };
        *slot = value.ok_or(AppError::MissingAddress { field, chain_id })?;
    }

    let [universal_router, pool_manager, state_view, position_manager, quoter, permit2, weth, usdc] =
        resolved;

    Ok(ContractAddresses {
        universal_router,
        pool_manager,
        state_view,
        position_manager,
        quoter,
        permit2,
        weth,
        usdc,
    })
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ethereum JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Private key for wallet (hex string with 0x prefix). `None` = read-only.
    pub private_key: Option<String>,
    /// Target chain.
    pub chain_id: u64,
    /// Resolved contract addresses for `chain_id`.
    pub addresses: ContractAddresses,
    /// Logging level (default: info).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ETHEREUM_RPC_URL`: Ethereum JSON-RPC endpoint
    ///
    /// Optional environment variables:
    /// - `ETHEREUM_PRIVATE_KEY`: signer key; without it the wallet is disconnected
    /// - `CHAIN_ID`: target chain (default: Sepolia)
    /// - `LOG_LEVEL`: Logging level (default: info)
    /// - `<FIELD>_ADDRESS`: per-contract override, e.g. `QUOTER_ADDRESS`
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        Self::from_vars(&env::vars().collect())
    }

    /// Build configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, AppError> {
        let rpc_url = vars
            .get("ETHEREUM_RPC_URL")
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| {
                AppError::Config("ETHEREUM_RPC_URL environment variable not set".into())
            })?;

        let private_key = vars.get("ETHEREUM_PRIVATE_KEY").filter(|v| !v.is_empty()).cloned();

        let chain_id = match vars.get("CHAIN_ID") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| AppError::Config(format!("Invalid CHAIN_ID '{raw}': {e}")))?,
            None => DEFAULT_CHAIN_ID,
        };

        let overrides: HashMap<String, String> = ADDRESS_FIELDS
            .iter()
            .filter_map(|field| {
                let key = format!("{}_ADDRESS", field.to_uppercase());
                vars.get(&key).map(|v| (field.to_string(), v.clone()))
            })
            .collect();

        let addresses = resolve_addresses(chain_id, &overrides)?;

        let log_level = vars.get("LOG_LEVEL").cloned().unwrap_or_else(|| "info".to_string());

        Ok(Self { rpc_url, private_key, chain_id, addresses, log_level })
    }
}
