//! Smart contract bindings.

pub mod permit2;
pub mod uniswap_v4;
