//! Live pool state and the combined pool context.

use alloy::primitives::{Address, B256};
use std::sync::Arc;

use crate::{
    config::ContractAddresses,
    error::Result,
    ethereum::PoolChain,
    services::{PoolLocator, TokenRegistry},
    types::{PoolContext, PoolState},
};

/// Read `slot0` and liquidity for a pool id. Both reads are issued
/// concurrently; state is never cached.
pub async fn fetch_pool_state(
    chain: &dyn PoolChain,
    state_view: Address,
    pool_id: B256,
) -> Result<PoolState> {
    let (slot0, liquidity) = tokio::try_join!(
        chain.pool_slot0(state_view, pool_id),
        chain.pool_liquidity(state_view, pool_id)
    )?;

    Ok(PoolState { sqrt_price_x96: slot0.sqrt_price_x96, tick: slot0.tick, liquidity })
}

/// Locates the pool and reads its current state.
#[derive(Clone)]
pub struct PoolService {
    chain: Arc<dyn PoolChain>,
    addresses: ContractAddresses,
    registry: Arc<TokenRegistry>,
    locator: PoolLocator,
}

impl PoolService {
    /// Create a pool service with its own discovery cache.
    pub fn new(
        chain: Arc<dyn PoolChain>,
        addresses: ContractAddresses,
        registry: Arc<TokenRegistry>,
        chain_id: u64,
    ) -> Self {
        let locator = PoolLocator::new(chain.clone(), addresses, chain_id);
        Self { chain, addresses, registry, locator }
    }

    /// The discovery component.
    pub fn locator(&self) -> &PoolLocator {
        &self.locator
    }

    /// Current state of a pool.
    pub async fn fetch_state(&self, pool_id: B256) -> Result<PoolState> {
        fetch_pool_state(self.chain.as_ref(), self.addresses.state_view, pool_id).await
    }

    /// Locate the pool, read its state, and map its currencies.
    pub async fn build_pool(&self) -> Result<PoolContext> {
        let config = self.locator.locate().await?;
        let state = self.fetch_state(config.pool_id).await?;

        let currency0 = self.registry.currency_for_pool_address(config.pool_key.currency0)?;
        let currency1 = self.registry.currency_for_pool_address(config.pool_key.currency1)?;

        tracing::debug!(
            pool_id = %config.pool_id,
            tick = state.tick,
            liquidity = state.liquidity,
            "Pool state loaded"
        );

        Ok(PoolContext { config, state, currency0, currency1 })
    }

    /// Drop the cached pool configuration.
    pub async fn invalidate(&self) {
        self.locator.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::mock::{fixtures, MockChain};
    use crate::types::TokenSymbol;
    use std::sync::atomic::Ordering;

    fn service(chain: Arc<MockChain>) -> PoolService {
        PoolService::new(
            chain,
            fixtures::addresses(),
            Arc::new(fixtures::registry()),
            fixtures::CHAIN_ID,
        )
    }

    #[tokio::test]
    async fn test_fetch_pool_state_combines_reads() {
        let chain = MockChain::default();
        let key = fixtures::native_key(3000, 60);
        chain.init_pool(&key, fixtures::sqrt_price(), fixtures::TICK, 123_456);

        let state =
            fetch_pool_state(&chain, fixtures::addresses().state_view, key.pool_id().unwrap())
                .await
                .unwrap();
        assert_eq!(state.sqrt_price_x96, fixtures::sqrt_price());
        assert_eq!(state.tick, fixtures::TICK);
        assert_eq!(state.liquidity, 123_456);
        assert_eq!(chain.slot0_queries.load(Ordering::SeqCst), 1);
        assert_eq!(chain.liquidity_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_pool_state_propagates_failure() {
        let chain = MockChain::default();
        chain.transport_down.store(true, Ordering::SeqCst);
        let err = fetch_pool_state(&chain, Address::ZERO, B256::ZERO).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[tokio::test]
    async fn test_build_pool_maps_currencies() {
        let chain = Arc::new(MockChain::default());
        chain.init_pool(&fixtures::native_key(3000, 60), fixtures::sqrt_price(), fixtures::TICK, 10);

        let ctx = service(chain).build_pool().await.unwrap();
        let registry = fixtures::registry();
        assert!(ctx.currency0.is_native());
        assert_eq!(ctx.currency1, registry.currency(TokenSymbol::Usdc));
        assert!(ctx.zero_for_one(&registry.currency(TokenSymbol::Eth)));
        assert_eq!(ctx.state.liquidity, 10);
    }

    #[tokio::test]
    async fn test_state_is_read_fresh_each_time() {
        let chain = Arc::new(MockChain::default());
        let key = fixtures::native_key(3000, 60);
        chain.init_pool(&key, fixtures::sqrt_price(), fixtures::TICK, 10);
        let service = service(chain.clone());

        service.build_pool().await.unwrap();
        chain.init_pool(&key, fixtures::sqrt_price(), fixtures::TICK, 99);
        let ctx = service.build_pool().await.unwrap();
        assert_eq!(ctx.state.liquidity, 99);
    }
}
