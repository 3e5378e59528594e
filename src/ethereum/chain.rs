//! The chain boundary the services run against.
//!
//! Everything the pool desk needs from a node goes through [`PoolChain`], so
//! services can be driven by an in-memory chain in tests.

use alloy::primitives::{aliases::U160, Address, TxHash, B256, U256};
use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    error::Result,
    types::{ActionCall, InitializeEvent, PoolKey},
};

/// `getSlot0` result, protocol/LP fee fields dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot0 {
    /// Current sqrt price, Q64.96.
    pub sqrt_price_x96: U160,
    /// Current tick.
    pub tick: i32,
}

/// Permit2 allowance of `(owner, token, spender)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permit2Allowance {
    /// Remaining amount.
    pub amount: U160,
    /// Unix timestamp after which the allowance is void.
    pub expiration: u64,
}

/// Read and write access to the pool's chain.
#[async_trait]
pub trait PoolChain: Send + Sync {
    /// Chain id reported by the node.
    async fn node_chain_id(&self) -> Result<u64>;

    /// All `Initialize` events of the pool manager, oldest first.
    async fn initialize_events(&self, pool_manager: Address) -> Result<Vec<InitializeEvent>>;

    /// StateView `getLiquidity`.
    async fn pool_liquidity(&self, state_view: Address, pool_id: B256) -> Result<u128>;

    /// StateView `getSlot0`.
    async fn pool_slot0(&self, state_view: Address, pool_id: B256) -> Result<Slot0>;

    /// V4Quoter `quoteExactInputSingle`, returning the output amount.
    async fn quote_exact_input_single(
        &self,
        quoter: Address,
        key: &PoolKey,
        zero_for_one: bool,
        amount_in: u128,
    ) -> Result<U256>;

    /// Permit2 `allowance(owner, token, spender)`.
    async fn permit2_allowance(
        &self,
        permit2: Address,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<Permit2Allowance>;

    /// Signing account, if a wallet is connected.
    fn account(&self) -> Option<Address>;

    /// Sign and broadcast. Returns once the node accepted the transaction.
    async fn send_transaction(&self, call: ActionCall) -> Result<TxHash>;

    /// Wait for the receipt and report whether execution succeeded.
    async fn transaction_succeeded(&self, hash: TxHash) -> Result<bool>;

    /// Current unix time in seconds, used for deadlines and permit expiry.
    fn now(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
    }
}
