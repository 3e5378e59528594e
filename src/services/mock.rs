//! In-memory chain for service tests.

use alloy::primitives::{aliases::U160, Address, TxHash, B256, U256};
use async_trait::async_trait;
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use crate::{
    error::{AppError, Result},
    ethereum::{Permit2Allowance, PoolChain, Slot0},
    types::{ActionCall, InitializeEvent, PoolKey},
};

/// Scripted quoter reply.
pub struct QuoteReply {
    pub delay: Duration,
    pub amount_out: Option<U256>,
}

#[derive(Default)]
pub struct MockChain {
    pub events: Mutex<Vec<InitializeEvent>>,
    pub pools: Mutex<HashMap<B256, (Slot0, u128)>>,
    pub quote_replies: Mutex<VecDeque<QuoteReply>>,
    pub default_quote: Mutex<Option<U256>>,
    pub quote_requests: Mutex<Vec<(bool, u128)>>,
    pub allowance: Mutex<Option<Permit2Allowance>>,
    pub account: Mutex<Option<Address>>,
    pub node_chain: Mutex<Option<u64>>,
    pub sent: Mutex<Vec<ActionCall>>,
    pub receipt_delay: Mutex<Duration>,
    pub revert_transactions: AtomicBool,
    pub transport_down: AtomicBool,
    pub event_queries: AtomicUsize,
    pub liquidity_queries: AtomicUsize,
    pub slot0_queries: AtomicUsize,
}

impl MockChain {
    pub fn connected() -> Self {
        let chain = Self::default();
        *chain.account.lock().unwrap() = Some(fixtures::account());
        chain
    }

    pub fn push_event(&self, event: InitializeEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn init_pool(&self, key: &PoolKey, sqrt_price_x96: U160, tick: i32, liquidity: u128) {
        self.pools
            .lock()
            .unwrap()
            .insert(key.pool_id().unwrap(), (Slot0 { sqrt_price_x96, tick }, liquidity));
    }

    pub fn set_quote(&self, amount_out: U256) {
        *self.default_quote.lock().unwrap() = Some(amount_out);
    }

    pub fn queue_quote(&self, delay: Duration, amount_out: Option<U256>) {
        self.quote_replies.lock().unwrap().push_back(QuoteReply { delay, amount_out });
    }

    pub fn set_allowance(&self, amount: U160, expiration: u64) {
        *self.allowance.lock().unwrap() = Some(Permit2Allowance { amount, expiration });
    }

    pub fn sent(&self) -> Vec<ActionCall> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: Address) -> usize {
        self.sent.lock().unwrap().iter().filter(|c| c.to == to).count()
    }

    fn check_transport(&self) -> Result<()> {
        if self.transport_down.load(Ordering::SeqCst) {
            return Err(AppError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PoolChain for MockChain {
    async fn node_chain_id(&self) -> Result<u64> {
        self.check_transport()?;
        Ok(self.node_chain.lock().unwrap().unwrap_or(fixtures::CHAIN_ID))
    }

    async fn initialize_events(&self, _pool_manager: Address) -> Result<Vec<InitializeEvent>> {
        self.event_queries.fetch_add(1, Ordering::SeqCst);
        self.check_transport()?;
        Ok(self.events.lock().unwrap().clone())
    }

    async fn pool_liquidity(&self, _state_view: Address, pool_id: B256) -> Result<u128> {
        self.liquidity_queries.fetch_add(1, Ordering::SeqCst);
        self.check_transport()?;
        // StateView reads zeroed storage for unknown ids
        Ok(self.pools.lock().unwrap().get(&pool_id).map(|(_, l)| *l).unwrap_or_default())
    }

    async fn pool_slot0(&self, _state_view: Address, pool_id: B256) -> Result<Slot0> {
        self.slot0_queries.fetch_add(1, Ordering::SeqCst);
        self.check_transport()?;
        Ok(self
            .pools
            .lock()
            .unwrap()
            .get(&pool_id)
            .map(|(s, _)| *s)
            .unwrap_or(Slot0 { sqrt_price_x96: U160::ZERO, tick: 0 }))
    }

    async fn quote_exact_input_single(
        &self,
        _quoter: Address,
        _key: &PoolKey,
        zero_for_one: bool,
        amount_in: u128,
    ) -> Result<U256> {
        self.check_transport()?;
        self.quote_requests.lock().unwrap().push((zero_for_one, amount_in));
        let scripted = self.quote_replies.lock().unwrap().pop_front();
        let amount_out = match scripted {
            Some(reply) => {
                tokio::time::sleep(reply.delay).await;
                reply.amount_out
            }
            None => *self.default_quote.lock().unwrap(),
        };
        amount_out.ok_or_else(|| AppError::Rpc("execution reverted".to_string()))
    }

    async fn permit2_allowance(
        &self,
        _permit2: Address,
        _owner: Address,
        _token: Address,
        _spender: Address,
    ) -> Result<Permit2Allowance> {
        self.check_transport()?;
        Ok(self
            .allowance
            .lock()
            .unwrap()
            .unwrap_or(Permit2Allowance { amount: U160::ZERO, expiration: 0 }))
    }

    fn account(&self) -> Option<Address> {
        *self.account.lock().unwrap()
    }

    async fn send_transaction(&self, call: ActionCall) -> Result<TxHash> {
        self.check_transport()?;
        let mut sent = self.sent.lock().unwrap();
        sent.push(call);
        Ok(B256::with_last_byte(sent.len() as u8))
    }

    async fn transaction_succeeded(&self, _hash: TxHash) -> Result<bool> {
        let delay = *self.receipt_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        Ok(!self.revert_transactions.load(Ordering::SeqCst))
    }

    fn now(&self) -> u64 {
        fixtures::NOW
    }
}

pub mod fixtures {
    use super::*;
    use crate::{
        config::{resolve_addresses, ContractAddresses},
        ethereum::constants::SEPOLIA_CHAIN_ID,
        services::{tick_math::get_sqrt_ratio_at_tick, TokenRegistry},
    };

    pub const CHAIN_ID: u64 = SEPOLIA_CHAIN_ID;

    /// Fixed clock.
    pub const NOW: u64 = 1_700_000_000;

    /// Roughly 3 000 USDC per ETH with ETH as currency0.
    pub const TICK: i32 = -196_260;

    pub fn addresses() -> ContractAddresses {
        resolve_addresses(CHAIN_ID, &HashMap::new()).unwrap()
    }

    pub fn registry() -> TokenRegistry {
        TokenRegistry::new(&addresses())
    }

    pub fn account() -> Address {
        Address::with_last_byte(0xaa)
    }

    pub fn native_key(fee: u32, tick_spacing: i32) -> PoolKey {
        PoolKey::sorted(Address::ZERO, addresses().usdc, fee, tick_spacing, Address::ZERO)
    }

    pub fn sqrt_price() -> U160 {
        U160::from(get_sqrt_ratio_at_tick(TICK).unwrap())
    }
}
