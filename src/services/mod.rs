//! Business logic services module.

pub mod allowance;
pub mod liquidity;
pub mod pool_locator;
pub mod pool_state;
pub mod session;
pub mod swap;
pub mod tick_math;
pub mod token_registry;
pub mod trade;

#[cfg(test)]
pub(crate) mod mock;

pub use allowance::AllowanceManager;
pub use liquidity::LiquiditySession;
pub use pool_locator::{DiscoveryCache, PoolLocator};
pub use pool_state::{fetch_pool_state, PoolService};
pub use session::SessionContext;
pub use swap::SwapSession;
pub use token_registry::TokenRegistry;
pub use trade::Slippage;
