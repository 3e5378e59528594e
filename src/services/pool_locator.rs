//! Pool discovery with an explicit single-entry cache.
//!
//! The pool is found from the pool manager's `Initialize` logs, falling back
//! to probing fee / tick-spacing candidates against the StateView lens.

use alloy::primitives::Address;
use std::{future::Future, sync::Arc};
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};

use crate::{
    config::ContractAddresses,
    error::{AppError, Result},
    ethereum::{
        constants::{FEE_CANDIDATES, HOOK_CANDIDATES, TICK_SPACING_CANDIDATES},
        PoolChain,
    },
    types::{PoolConfiguration, PoolKey},
};

/// Holds at most one discovered configuration.
///
/// Concurrent first callers are serialized so a single discovery runs; the
/// rest observe its result.
#[derive(Debug)]
pub struct DiscoveryCache {
    entry: RwLock<Option<PoolConfiguration>>,
    init_semaphore: Semaphore,
}

impl Default for DiscoveryCache {
    fn default() -> Self {
        Self { entry: RwLock::new(None), init_semaphore: Semaphore::new(1) }
    }
}

impl DiscoveryCache {
    /// Cached value, if any.
    pub async fn get(&self) -> Option<PoolConfiguration> {
        *self.entry.read().await
    }

    /// Return the cached value or run `init` to fill it. Failures are not
    /// cached.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<PoolConfiguration>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PoolConfiguration>>,
    {
        if let Some(config) = self.get().await {
            return Ok(config);
        }

        let _permit = self.init_semaphore.acquire().await.map_err(|_| {
            AppError::Transport("Failed to acquire discovery semaphore".to_string())
        })?;

        // another caller may have finished while we waited
        if let Some(config) = self.get().await {
            return Ok(config);
        }

        let config = init().await?;
        *self.entry.write().await = Some(config);
        Ok(config)
    }

    /// Drop the cached value.
    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }
}

/// Finds the ETH/USDC pool.
#[derive(Clone)]
pub struct PoolLocator {
    chain: Arc<dyn PoolChain>,
    addresses: ContractAddresses,
    chain_id: u64,
    cache: Arc<DiscoveryCache>,
}

impl PoolLocator {
    /// Create a locator with an empty cache.
    pub fn new(chain: Arc<dyn PoolChain>, addresses: ContractAddresses, chain_id: u64) -> Self {
        Self { chain, addresses, chain_id, cache: Arc::new(DiscoveryCache::default()) }
    }

    /// Locate the pool, using the cached result when present.
    pub async fn locate(&self) -> Result<PoolConfiguration> {
        self.cache.get_or_try_init(|| self.discover()).await
    }

    /// Forget the cached pool (network change or explicit refresh).
    pub async fn invalidate(&self) {
        info!(chain_id = self.chain_id, "Pool configuration cache invalidated");
        self.cache.invalidate().await;
    }

    /// Cached configuration without triggering discovery.
    pub async fn cached(&self) -> Option<PoolConfiguration> {
        self.cache.get().await
    }

    async fn discover(&self) -> Result<PoolConfiguration> {
        if let Some(config) = self.from_logs().await? {
            info!(
                pool_id = %config.pool_id,
                fee = config.pool_key.fee,
                tick_spacing = config.pool_key.tick_spacing,
                "Pool discovered from Initialize logs"
            );
            return Ok(config);
        }

        if let Some(config) = self.probe().await? {
            info!(
                pool_id = %config.pool_id,
                fee = config.pool_key.fee,
                tick_spacing = config.pool_key.tick_spacing,
                "Pool discovered by probing candidates"
            );
            return Ok(config);
        }

        warn!(chain_id = self.chain_id, "No ETH/USDC pool found");
        Err(AppError::PoolNotFound(self.chain_id))
    }

    /// Most recent `Initialize` event pairing the native leg with the stablecoin.
    async fn from_logs(&self) -> Result<Option<PoolConfiguration>> {
        let events = self.chain.initialize_events(self.addresses.pool_manager).await?;
        debug!(count = events.len(), "Scanning Initialize events");

        Ok(events
            .iter()
            .rev()
            .find(|event| event.key.pairs(self.addresses.weth, self.addresses.usdc))
            .map(|event| PoolConfiguration { pool_key: event.key, pool_id: event.id }))
    }

    /// First native/stablecoin candidate the StateView recognises as initialized.
    async fn probe(&self) -> Result<Option<PoolConfiguration>> {
        let state_view = self.addresses.state_view;

        for fee in FEE_CANDIDATES {
            for tick_spacing in TICK_SPACING_CANDIDATES {
                for hooks in HOOK_CANDIDATES {
                    let key =
                        PoolKey::sorted(Address::ZERO, self.addresses.usdc, fee, tick_spacing, hooks);
                    let pool_id = key.pool_id()?;

                    match self.chain.pool_liquidity(state_view, pool_id).await {
                        Ok(_) => {}
                        Err(AppError::Rpc(e)) => {
                            debug!(fee, tick_spacing, error = %e, "Candidate rejected");
                            continue;
                        }
                        Err(e) => return Err(e),
                    }

                    match self.chain.pool_slot0(state_view, pool_id).await {
                        Ok(slot0) if !slot0.sqrt_price_x96.is_zero() => {
                            return Ok(Some(PoolConfiguration { pool_key: key, pool_id }));
                        }
                        Ok(_) => debug!(fee, tick_spacing, "Candidate not initialized"),
                        Err(AppError::Rpc(e)) => {
                            debug!(fee, tick_spacing, error = %e, "Candidate rejected");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        Ok(None)
    }
}
