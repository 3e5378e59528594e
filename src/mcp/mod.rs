//! MCP server module.
//!
//! Contains the MCP server implementation with tool handlers.

pub mod server;

pub use server::PoolDeskServer;
pub use server::{AddLiquidityInput, DismissToastInput, SwapInput};
