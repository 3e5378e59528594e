//! Pieces shared by the swap and liquidity sessions.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex, MutexGuard,
};

use alloy::primitives::TxHash;

use crate::{
    config::ContractAddresses,
    error::{AppError, Result},
    ethereum::PoolChain,
    services::{AllowanceManager, PoolService, TokenRegistry},
    types::{Toast, ToastSlot},
};

/// Dependencies every session needs.
#[derive(Clone)]
pub struct SessionContext {
    /// Chain access.
    pub chain: Arc<dyn PoolChain>,
    /// Resolved contracts.
    pub addresses: ContractAddresses,
    /// Supported tokens.
    pub registry: Arc<TokenRegistry>,
    /// Pool discovery and state.
    pub pools: PoolService,
    /// Permit2 approvals.
    pub allowances: AllowanceManager,
}

impl SessionContext {
    /// Wire up the services for a chain.
    pub fn new(chain: Arc<dyn PoolChain>, addresses: ContractAddresses, chain_id: u64) -> Self {
        let registry = Arc::new(TokenRegistry::new(&addresses));
        let pools = PoolService::new(chain.clone(), addresses, registry.clone(), chain_id);
        let allowances = AllowanceManager::new(chain.clone(), addresses.permit2);
        Self { chain, addresses, registry, pools, allowances }
    }

    /// Broadcast a call, surface its hash as a pending toast, and wait for
    /// the receipt.
    pub(crate) async fn send_and_confirm(
        &self,
        call: crate::types::ActionCall,
        toast: &ToastSlot,
        waiting_message: &str,
    ) -> Result<TxHash> {
        let hash = self.chain.send_transaction(call).await?;
        toast.show(Toast::pending_tx(waiting_message, format!("{hash:?}")));

        if !self.chain.transaction_succeeded(hash).await? {
            return Err(AppError::TransactionFailed(format!("{hash:?}")));
        }
        Ok(hash)
    }
}

/// Holds a busy flag for the lifetime of one submission.
pub(crate) struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    /// Set the flag, refusing if it is already set.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::ActionInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Counts concurrent estimates.
pub(crate) struct CountGuard<'a>(&'a AtomicUsize);

impl<'a> CountGuard<'a> {
    pub(crate) fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for CountGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
