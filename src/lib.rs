//! Uniswap v4 Pool Desk
//!
//! A Model Context Protocol server for trading against, and providing
//! liquidity to, the Uniswap v4 ETH/USDC pool.
//!
//! # Features
//!
//! - **Pool Discovery**: Locate the pool from `Initialize` logs, falling back to probing known fee tiers
//! - **Swaps**: Quote through the V4 quoter and execute through the Universal Router
//! - **Liquidity**: Mint full-range or centered positions through the position manager
//! - **Permit2**: Approve the router and position manager only when an allowance is short or expiring
//!
//! # Example
//!
//! ```rust,ignore
//! use v4_pool_desk::{Config, PoolDeskServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let server = PoolDeskServer::new(config)?;
//!     // Run server...
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod ethereum;
pub mod mcp;
pub mod services;
pub mod types;

pub use config::{Config, ContractAddresses};
pub use error::{AppError, Result};
pub use ethereum::constants::*;
pub use mcp::PoolDeskServer;
