//! Ethereum network constants.
//!
//! Contains chain IDs, per-chain Uniswap v4 deployment addresses and the
//! fixed protocol values used when building actions.

use alloy::primitives::{address, Address};

// ============================================================================
// Chain IDs
// ============================================================================

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;

/// Sepolia testnet chain ID.
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// Default chain ID (Sepolia).
pub const DEFAULT_CHAIN_ID: u64 = SEPOLIA_CHAIN_ID;

/// Chains that ship with built-in address defaults.
pub const SUPPORTED_CHAIN_IDS: [u64; 2] = [ETHEREUM_MAINNET_CHAIN_ID, SEPOLIA_CHAIN_ID];

// ============================================================================
// Shared Addresses
// ============================================================================

/// Permit2 is deployed at the same address on every chain.
pub const PERMIT2_ADDRESS: Address = address!("000000000022D473030F116dDEE9F6B43aC78BA3");

// ============================================================================
// Uniswap v4 Addresses (Ethereum Mainnet)
// ============================================================================

/// Mainnet Universal Router.
pub const MAINNET_UNIVERSAL_ROUTER: Address =
    address!("66a9893cc07d91d95644aedd05d03f95e1dba8af");

/// Mainnet PoolManager.
pub const MAINNET_POOL_MANAGER: Address = address!("000000000004444c5dc75cB358380D2e3dE08A90");

/// Mainnet StateView lens.
pub const MAINNET_STATE_VIEW: Address = address!("7ffe42c4a5deea5b0fec41c94c136cf115597227");

/// Mainnet PositionManager.
pub const MAINNET_POSITION_MANAGER: Address =
    address!("bd216513d74c8cf14cf4747e6aaa6420ff64ee9e");

/// Mainnet V4Quoter.
pub const MAINNET_QUOTER: Address = address!("52f0e24d1c21c8a0cb1e5a5dd6198556bd9e1203");

/// Wrapped Ether (WETH) on Ethereum Mainnet.
pub const MAINNET_WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

/// USDC on Ethereum Mainnet.
pub const MAINNET_USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

// ============================================================================
// Uniswap v4 Addresses (Sepolia)
// ============================================================================

/// Sepolia Universal Router.
pub const SEPOLIA_UNIVERSAL_ROUTER: Address =
    address!("3A9D48AB9751398BbFa63ad67599Bb04e4BdF98b");

/// Sepolia PoolManager.
pub const SEPOLIA_POOL_MANAGER: Address = address!("E03A1074c86CFeDd5C142C4F04F1a1536e203543");

/// Sepolia StateView lens.
pub const SEPOLIA_STATE_VIEW: Address = address!("E1Dd9c3fA50EDB962E442f60DfBc432e24537E4C");

/// Sepolia PositionManager.
pub const SEPOLIA_POSITION_MANAGER: Address =
    address!("429ba70129df741B2Ca2a85BC3A2a3328e5c09b4");

/// Sepolia V4Quoter.
pub const SEPOLIA_QUOTER: Address = address!("61B3f2011A92d183C7dbaDBdA940a7555Ccf9227");

/// Wrapped Ether (WETH) on Sepolia.
pub const SEPOLIA_WETH: Address = address!("fFf9976782d46CC05630D1f6eBAb18b2324d6B14");

/// Circle USDC on Sepolia.
pub const SEPOLIA_USDC: Address = address!("1c7D4B196Cb0C7B01d743Fbc6116a902379C7238");

// ============================================================================
// Protocol Values
// ============================================================================

/// Seconds added to "now" for a swap deadline.
pub const SWAP_DEADLINE_SECONDS: u64 = 900;

/// Permit2 allowances expiring within this window are renewed.
pub const PERMIT_EXPIRY_BUFFER_SECONDS: u64 = 600;

/// Lifetime of a fresh Permit2 approval.
pub const PERMIT_APPROVAL_LIFETIME_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Fee tiers probed during pool discovery (hundredths of a bip).
pub const FEE_CANDIDATES: [u32; 9] = [100, 300, 500, 1000, 2000, 2500, 3000, 5000, 10000];

/// Tick spacings probed during pool discovery.
pub const TICK_SPACING_CANDIDATES: [i32; 14] =
    [1, 5, 10, 15, 20, 25, 30, 45, 50, 60, 75, 100, 120, 200];

/// Hook contracts probed during pool discovery.
pub const HOOK_CANDIDATES: [Address; 1] = [Address::ZERO];
