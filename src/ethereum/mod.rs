//! Ethereum interaction module.
//!
//! Contains the chain boundary, its RPC client, wallet management, and
//! contract bindings.

pub mod chain;
pub mod client;
pub mod constants;
pub mod contracts;
pub mod wallet;

pub use chain::{Permit2Allowance, PoolChain, Slot0};
pub use client::EthereumClient;
pub use wallet::{WalletManager, WalletStatus};
