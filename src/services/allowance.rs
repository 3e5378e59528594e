//! Permit2 allowance checks and approvals.

use alloy::{
    primitives::{
        aliases::{U160, U48},
        Address, TxHash, U256,
    },
    sol_types::SolCall,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, Result},
    ethereum::{
        constants::{PERMIT_APPROVAL_LIFETIME_SECONDS, PERMIT_EXPIRY_BUFFER_SECONDS},
        contracts::permit2::IPermit2,
        Permit2Allowance, PoolChain,
    },
    types::ActionCall,
};

/// Whether an existing allowance must be renewed to cover `required` at `now`.
pub fn needs_renewal(allowance: &Permit2Allowance, required: U256, now: u64) -> bool {
    U256::from(allowance.amount) < required
        || allowance.expiration <= now.saturating_add(PERMIT_EXPIRY_BUFFER_SECONDS)
}

/// Ensures Permit2 lets a spender pull the owner's tokens.
#[derive(Clone)]
pub struct AllowanceManager {
    chain: Arc<dyn PoolChain>,
    permit2: Address,
}

impl AllowanceManager {
    /// Create a manager for the given Permit2 deployment.
    pub fn new(chain: Arc<dyn PoolChain>, permit2: Address) -> Self {
        Self { chain, permit2 }
    }

    /// Approve `spender` for the maximum amount when the current allowance is
    /// short or about to expire. Returns the approval hash when one was sent.
    ///
    /// The native currency (zero address) never needs an allowance.
    pub async fn ensure_allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
        required: U256,
    ) -> Result<Option<TxHash>> {
        if token == Address::ZERO {
            return Ok(None);
        }

        let now = self.chain.now();
        let current = self.chain.permit2_allowance(self.permit2, owner, token, spender).await?;
        if !needs_renewal(&current, required, now) {
            debug!(token = %token, spender = %spender, "Permit2 allowance sufficient");
            return Ok(None);
        }

        info!(
            token = %token,
            spender = %spender,
            current = %current.amount,
            required = %required,
            "Submitting Permit2 approval"
        );

        let expiration = now.saturating_add(PERMIT_APPROVAL_LIFETIME_SECONDS);
        let data = IPermit2::approveCall {
            token,
            spender,
            amount: U160::MAX,
            expiration: U48::try_from(expiration)
                .map_err(|_| AppError::NumericOverflow(format!("expiration {expiration}")))?,
        }
        .abi_encode();

        let call = ActionCall { to: self.permit2, data: data.into(), value: U256::ZERO };
        let hash = self
            .chain
            .send_transaction(call)
            .await
            .map_err(|e| AppError::Approval(e.to_string()))?;

        let confirmed = self
            .chain
            .transaction_succeeded(hash)
            .await
            .map_err(|e| AppError::Approval(e.to_string()))?;
        if !confirmed {
            warn!(hash = %hash, "Permit2 approval reverted");
            return Err(AppError::Approval(format!("approval {hash} reverted")));
        }

        info!(hash = %hash, "Permit2 approval confirmed");
        Ok(Some(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::{fixtures, MockChain};
    use std::sync::atomic::Ordering;

    fn manager(chain: Arc<MockChain>) -> AllowanceManager {
        AllowanceManager::new(chain, fixtures::addresses().permit2)
    }

    #[test]
    fn test_needs_renewal() {
        let now = 1_000;
        let fresh = Permit2Allowance { amount: U160::from(100u64), expiration: now + 601 };
        assert!(!needs_renewal(&fresh, U256::from(100u64), now));
        assert!(needs_renewal(&fresh, U256::from(101u64), now));

        let expiring = Permit2Allowance { amount: U160::MAX, expiration: now + 600 };
        assert!(needs_renewal(&expiring, U256::from(1u8), now));
    }

    #[tokio::test]
    async fn test_insufficient_allowance_sends_exactly_one_approval() {
        let chain = Arc::new(MockChain::connected());
        let addresses = fixtures::addresses();
        chain.set_allowance(U160::from(5u64), fixtures::NOW + 10_000);

        let hash = manager(chain.clone())
            .ensure_allowance(
                fixtures::account(),
                addresses.usdc,
                addresses.universal_router,
                U256::from(1_000_000u64),
            )
            .await
            .unwrap();

        assert!(hash.is_some());
        let sent = chain.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, addresses.permit2);

        let approve = IPermit2::approveCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(approve.token, addresses.usdc);
        assert_eq!(approve.spender, addresses.universal_router);
        assert_eq!(approve.amount, U160::MAX);
        assert_eq!(
            approve.expiration.to::<u64>(),
            fixtures::NOW + PERMIT_APPROVAL_LIFETIME_SECONDS
        );
    }

    #[tokio::test]
    async fn test_sufficient_allowance_sends_nothing() {
        let chain = Arc::new(MockChain::connected());
        chain.set_allowance(U160::MAX, fixtures::NOW + 10_000);

        let hash = manager(chain.clone())
            .ensure_allowance(
                fixtures::account(),
                fixtures::addresses().usdc,
                fixtures::addresses().universal_router,
                U256::from(1_000_000u64),
            )
            .await
            .unwrap();
        assert!(hash.is_none());
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_native_never_needs_allowance() {
        let chain = Arc::new(MockChain::connected());
        let hash = manager(chain.clone())
            .ensure_allowance(fixtures::account(), Address::ZERO, Address::ZERO, U256::MAX)
            .await
            .unwrap();
        assert!(hash.is_none());
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_reverted_approval_is_an_error() {
        let chain = Arc::new(MockChain::connected());
        chain.revert_transactions.store(true, Ordering::SeqCst);
        let err = manager(chain)
            .ensure_allowance(
                fixtures::account(),
                fixtures::addresses().usdc,
                fixtures::addresses().position_manager,
                U256::from(1u8),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Approval(_)));
    }
}
