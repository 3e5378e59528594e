//! Swap session: form state, quote estimation, and swap submission.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};
use tracing::{debug, error, info, warn};

use crate::{
    error::{AppError, Result},
    services::{
        session::{lock, BusyGuard, CountGuard, SessionContext},
        trade::{build_swap_call, quote_exact_input, swap_deadline, Slippage},
    },
    types::{
        format_display_amount, parse_positive_units, parse_units, ActionReceipt, PoolContext, SwapState, Toast,
        ToastSlot, TokenSymbol, TransactionData,
    },
};

/// Quiet period after an edit before a quote is requested.
pub const ESTIMATE_DEBOUNCE: Duration = Duration::from_millis(350);

/// State machine behind the swap form.
///
/// Every edit bumps a generation counter; an estimate only lands if no edit
/// happened while it was in flight.
pub struct SwapSession {
    ctx: SessionContext,
    state: Mutex<SwapState>,
    pool: Mutex<Option<PoolContext>>,
    generation: AtomicU64,
    estimating: AtomicUsize,
    swapping: AtomicBool,
    toast: ToastSlot,
}

impl SwapSession {
    /// New session in the initial `ETH -> USDC` state.
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(SwapState::default()),
            pool: Mutex::new(None),
            generation: AtomicU64::new(0),
            estimating: AtomicUsize::new(0),
            swapping: AtomicBool::new(false),
            toast: ToastSlot::default(),
        }
    }

    /// Snapshot of the form.
    pub fn state(&self) -> SwapState {
        lock(&self.state).clone()
    }

    /// Last loaded pool context.
    pub fn pool(&self) -> Option<PoolContext> {
        *lock(&self.pool)
    }

    /// Toast slot of this session.
    pub fn toast(&self) -> &ToastSlot {
        &self.toast
    }

    /// Whether a quote is in flight.
    pub fn is_estimating(&self) -> bool {
        self.estimating.load(Ordering::Acquire) > 0
    }

    /// Whether a swap is being submitted.
    pub fn is_swapping(&self) -> bool {
        self.swapping.load(Ordering::Acquire)
    }

    /// Locate the pool and read its state.
    pub async fn load_pool(&self) -> Result<PoolContext> {
        let pool = self.ctx.pools.build_pool().await?;
        *lock(&self.pool) = Some(pool);
        Ok(pool)
    }

    /// Forget the loaded pool context; the next action locates it again.
    pub fn clear_pool(&self) {
        *lock(&self.pool) = None;
    }

    async fn pool_or_load(&self) -> Result<PoolContext> {
        match self.pool() {
            Some(pool) => Ok(pool),
            None => self.load_pool().await,
        }
    }

    fn edit(&self, f: impl FnOnce(&mut SwapState)) {
        let mut state = lock(&self.state);
        f(&mut state);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Swap input and output, amounts included.
    pub fn switch_tokens(&self) {
        self.edit(|s| {
            std::mem::swap(&mut s.input_token, &mut s.output_token);
            std::mem::swap(&mut s.input_amount, &mut s.output_amount);
        });
    }

    /// Select the token to sell. Picking the current output flips the pair.
    pub fn update_input_token(&self, symbol: TokenSymbol) {
        self.edit(|s| {
            s.input_token = symbol;
            if s.output_token == symbol {
                s.output_token = symbol.counterpart();
            }
        });
    }

    /// Select the token to buy. Picking the current input flips the pair.
    pub fn update_output_token(&self, symbol: TokenSymbol) {
        self.edit(|s| {
            s.output_token = symbol;
            if s.input_token == symbol {
                s.input_token = symbol.counterpart();
            }
        });
    }

    /// Set the typed input amount.
    pub fn update_input_amount(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|s| s.input_amount = value);
    }

    /// Set the slippage tolerance string.
    pub fn update_slippage(&self, value: impl Into<String>) {
        let value = value.into();
        self.edit(|s| s.slippage = value);
    }

    /// Quote the current input and store the formatted output, unless the
    /// form changed in the meantime. Returns the resulting state.
    pub async fn estimate(&self) -> SwapState {
        let generation = self.generation.load(Ordering::Acquire);
        let snapshot = self.state();

        let output = {
            let _estimating = CountGuard::enter(&self.estimating);
            self.quote_output(&snapshot).await
        };

        let mut state = lock(&self.state);
        if self.generation.load(Ordering::Acquire) == generation {
            state.output_amount = output;
        } else {
            debug!(generation, "Discarding stale estimate");
        }
        state.clone()
    }

    /// Wait out the debounce window, then estimate unless another edit
    /// arrived. Returns `None` when superseded.
    pub async fn estimate_debounced(&self) -> Option<SwapState> {
        let generation = self.generation.load(Ordering::Acquire);
        tokio::time::sleep(ESTIMATE_DEBOUNCE).await;
        if self.generation.load(Ordering::Acquire) != generation {
            return None;
        }
        Some(self.estimate().await)
    }

    async fn quote_output(&self, snapshot: &SwapState) -> String {
        if snapshot.input_amount.trim().is_empty() {
            return String::new();
        }

        let input = self.ctx.registry.currency(snapshot.input_token);
        let output = self.ctx.registry.currency(snapshot.output_token);

        let amount_in = match parse_units(&snapshot.input_amount, input.decimals()) {
            Ok(amount) if !amount.is_zero() => amount,
            _ => return String::new(),
        };

        let quoted = async {
            let pool = self.pool_or_load().await?;
            quote_exact_input(
                self.ctx.chain.as_ref(),
                self.ctx.addresses.quoter,
                &pool,
                &input,
                amount_in,
            )
            .await
        }
        .await;

        match quoted {
            Ok(amount_out) => {
                debug!(amount_in = %amount_in, amount_out = %amount_out, "Swap estimate");
                format_display_amount(amount_out, output.decimals())
            }
            Err(e) => {
                warn!(error = %e, "Swap quote failed");
                String::new()
            }
        }
    }

    /// Amount present and positive, pool loaded, wallet connected, and
    /// nothing in flight.
    pub fn can_swap(&self) -> bool {
        let state = self.state();
        let decimals = self.ctx.registry.currency(state.input_token).decimals();
        let positive = parse_positive_units(&state.input_amount, decimals).is_ok();

        positive
            && self.pool().is_some()
            && self.ctx.chain.account().is_some()
            && !self.is_swapping()
            && !self.is_estimating()
    }

    /// Submit the swap described by the current form.
    ///
    /// Progress is reported through the toast slot; the error is also
    /// returned to the caller.
    pub async fn execute_swap(&self) -> Result<ActionReceipt> {
        if self.ctx.chain.account().is_none() {
            self.toast.show(Toast::error("Connect your wallet before swapping."));
            return Err(AppError::WalletNotConnected);
        }

        let snapshot = self.state();
        if snapshot.input_amount.trim().is_empty() {
            self.toast.show(Toast::error("Enter an amount to continue."));
            return Err(AppError::InvalidAmount("Amount cannot be empty".to_string()));
        }

        let _busy = BusyGuard::acquire(&self.swapping)?;
        self.toast.show(Toast::pending("Signing transaction with the router..."));

        info!(
            input = %snapshot.input_token,
            output = %snapshot.output_token,
            amount = %snapshot.input_amount,
            slippage = %snapshot.slippage,
            "Swap started"
        );

        match self.submit(&snapshot).await {
            Ok(receipt) => {
                self.toast.show(Toast::success(receipt.message.clone(), receipt.hash.clone()));
                self.edit(|s| {
                    s.input_amount.clear();
                    s.output_amount.clear();
                });
                if let Err(e) = self.load_pool().await {
                    warn!(error = %e, "Failed to refresh pool after swap");
                }
                Ok(receipt)
            }
            Err(e) => {
                error!(error = %e, "Swap failed");
                self.toast.show(Toast::error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn submit(&self, snapshot: &SwapState) -> Result<ActionReceipt> {
        let ctx = &self.ctx;
        let owner = ctx.chain.account().ok_or(AppError::WalletNotConnected)?;
        let pool = self.pool_or_load().await?;

        let input = ctx.registry.currency(snapshot.input_token);
        let output = ctx.registry.currency(snapshot.output_token);

        let amount_in = parse_positive_units(&snapshot.input_amount, input.decimals())?;
        let slippage = Slippage::parse(&snapshot.slippage)?;

        let zero_for_one = pool.zero_for_one(&input);
        let key = &pool.config.pool_key;
        let input_leg = if zero_for_one { key.currency0 } else { key.currency1 };
        ctx.allowances
            .ensure_allowance(owner, input_leg, ctx.addresses.universal_router, amount_in)
            .await?;

        let amount_out =
            quote_exact_input(ctx.chain.as_ref(), ctx.addresses.quoter, &pool, &input, amount_in)
                .await?;

        let plan = build_swap_call(
            ctx.addresses.universal_router,
            &pool,
            &input,
            amount_in,
            amount_out,
            slippage,
            swap_deadline(ctx.chain.now()),
        )?;
        let transaction = TransactionData::from(&plan.call);

        let hash = ctx
            .send_and_confirm(plan.call, &self.toast, "Waiting for network confirmation...")
            .await?;

        let received = format_display_amount(amount_out, output.decimals());
        let message = format!("Swap completed. Received ~{received} {}", snapshot.output_token);
        info!(hash = %hash, amount_out = %amount_out, min_out = %plan.min_amount_out, "Swap confirmed");

        Ok(ActionReceipt { hash: format!("{hash:?}"), message, transaction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::contracts::uniswap_v4::IUniversalRouter;
    use crate::services::mock::{fixtures, MockChain};
    use crate::types::ToastStatus;
    use alloy::{
        primitives::{aliases::U160, U256},
        sol_types::SolCall,
    };
    use std::sync::Arc;

    fn session(chain: Arc<MockChain>) -> SwapSession {
        chain.init_pool(
            &fixtures::native_key(3000, 60),
            fixtures::sqrt_price(),
            fixtures::TICK,
            1_000_000_000_000,
        );
        SwapSession::new(SessionContext::new(chain, fixtures::addresses(), fixtures::CHAIN_ID))
    }

    async fn settle_until(mut done: impl FnMut() -> bool) {
        while !done() {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_initial_state() {
        let session = session(Arc::new(MockChain::default()));
        let state = session.state();
        assert_eq!(state.input_token, TokenSymbol::Eth);
        assert_eq!(state.output_token, TokenSymbol::Usdc);
        assert_eq!(state.slippage, "0.50");
        assert!(!session.can_swap());
    }

    #[test]
    fn test_switch_tokens_swaps_amounts() {
        let session = session(Arc::new(MockChain::default()));
        session.update_input_amount("1");
        session.switch_tokens();
        let state = session.state();
        assert_eq!(state.input_token, TokenSymbol::Usdc);
        assert_eq!(state.output_token, TokenSymbol::Eth);
        assert_eq!(state.input_amount, "");
        assert_eq!(state.output_amount, "1");
    }

    #[test]
    fn test_token_updates_keep_pair_distinct() {
        let session = session(Arc::new(MockChain::default()));
        session.update_input_token(TokenSymbol::Usdc);
        assert_eq!(session.state().output_token, TokenSymbol::Eth);
        session.update_output_token(TokenSymbol::Usdc);
        assert_eq!(session.state().input_token, TokenSymbol::Eth);
    }

    #[tokio::test]
    async fn test_estimate_formats_quote() {
        let chain = Arc::new(MockChain::default());
        chain.set_quote(U256::from(4_512_300_000u64));
        let session = session(chain.clone());

        session.update_input_amount("1.5");
        session.update_slippage("0.50");
        let state = session.estimate().await;
        assert_eq!(state.output_amount, "4512.3");

        let requests = chain.quote_requests.lock().unwrap().clone();
        assert_eq!(requests, vec![(true, 1_500_000_000_000_000_000u128)]);
    }

    #[tokio::test]
    async fn test_estimate_empty_or_zero_input() {
        let chain = Arc::new(MockChain::default());
        chain.set_quote(U256::from(1u8));
        let session = session(chain.clone());

        for input in ["", "0", "0.000", "abc"] {
            session.update_input_amount(input);
            assert_eq!(session.estimate().await.output_amount, "", "input {input:?}");
        }
        assert!(chain.quote_requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_estimate_failure_clears_output() {
        let chain = Arc::new(MockChain::default());
        chain.set_quote(U256::from(2_000_000u64));
        let session = session(chain.clone());
        session.update_input_amount("1");
        assert_eq!(session.estimate().await.output_amount, "2");

        *chain.default_quote.lock().unwrap() = None;
        session.update_input_amount("2");
        assert_eq!(session.estimate().await.output_amount, "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_estimate_is_discarded() {
        let chain = Arc::new(MockChain::default());
        chain.queue_quote(Duration::from_millis(500), Some(U256::from(1_000_000u64)));
        chain.queue_quote(Duration::ZERO, Some(U256::from(2_000_000u64)));
        let session = Arc::new(session(chain.clone()));
        session.load_pool().await.unwrap();

        session.update_input_amount("1");
        let slow = tokio::spawn({
            let session = session.clone();
            async move { session.estimate().await }
        });
        settle_until(|| chain.quote_requests.lock().unwrap().len() == 1).await;
        assert!(session.is_estimating());

        session.update_input_amount("2");
        assert_eq!(session.estimate().await.output_amount, "2");

        slow.await.unwrap();
        assert_eq!(session.state().output_amount, "2");
        assert!(!session.is_estimating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_skips_superseded_edit() {
        let chain = Arc::new(MockChain::default());
        chain.set_quote(U256::from(3_000_000u64));
        let session = Arc::new(session(chain.clone()));

        session.update_input_amount("1");
        let first = tokio::spawn({
            let session = session.clone();
            async move { session.estimate_debounced().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.update_input_amount("2");
        let second = session.estimate_debounced().await;

        assert!(first.await.unwrap().is_none());
        assert_eq!(second.unwrap().output_amount, "3");
        assert_eq!(chain.quote_requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_can_swap_requires_wallet_and_pool() {
        let chain = Arc::new(MockChain::default());
        let session = session(chain.clone());
        session.update_input_amount("1");
        assert!(!session.can_swap());

        session.load_pool().await.unwrap();
        assert!(!session.can_swap());

        *chain.account.lock().unwrap() = Some(fixtures::account());
        assert!(session.can_swap());

        session.update_input_amount("0");
        assert!(!session.can_swap());
    }

    #[tokio::test]
    async fn test_swap_without_wallet_shows_error() {
        let session = session(Arc::new(MockChain::default()));
        session.update_input_amount("1");
        let err = session.execute_swap().await.unwrap_err();
        assert!(matches!(err, AppError::WalletNotConnected));
        assert_eq!(session.toast().current().unwrap().status, ToastStatus::Error);
    }

    #[tokio::test]
    async fn test_swap_without_amount_shows_error() {
        let chain = Arc::new(MockChain::connected());
        let session = session(chain.clone());
        assert!(session.execute_swap().await.is_err());
        assert_eq!(session.toast().current().unwrap().status, ToastStatus::Error);
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_zero_or_malformed_amount_is_rejected_before_sending() {
        let chain = Arc::new(MockChain::connected());
        chain.set_quote(U256::from(1_000_000u64));
        let session = session(chain.clone());

        for bad in ["0", "0.000", "1.2.3"] {
            session.update_input_amount(bad);
            let err = session.execute_swap().await.unwrap_err();
            assert!(matches!(err, AppError::InvalidAmount(_)), "{bad:?}: {err}");
            assert!(err.is_input_error());
        }
        assert!(chain.sent().is_empty());
        assert_eq!(session.toast().current().unwrap().status, ToastStatus::Error);
        assert!(!session.is_swapping());
    }

    #[tokio::test]
    async fn test_native_swap_end_to_end() {
        let chain = Arc::new(MockChain::connected());
        chain.set_quote(U256::from(4_512_300_000u64));
        let session = session(chain.clone());
        session.update_input_amount("1.5");

        let receipt = session.execute_swap().await.unwrap();
        assert_eq!(receipt.message, "Swap completed. Received ~4512.3 USDC");

        let sent = chain.sent();
        assert_eq!(sent.len(), 1, "native input needs no approval");
        assert_eq!(sent[0].to, fixtures::addresses().universal_router);
        assert_eq!(sent[0].value, U256::from(1_500_000_000_000_000_000u128));
        let call = IUniversalRouter::executeCall::abi_decode(&sent[0].data).unwrap();
        assert_eq!(call.deadline, U256::from(fixtures::NOW + 900));

        let state = session.state();
        assert!(state.input_amount.is_empty());
        assert!(state.output_amount.is_empty());

        let toast = session.toast().current().unwrap();
        assert_eq!(toast.status, ToastStatus::Success);
        assert_eq!(toast.hash.as_deref(), Some(receipt.hash.as_str()));
        assert!(!session.is_swapping());
    }

    #[tokio::test]
    async fn test_token_swap_approves_once_then_swaps() {
        let chain = Arc::new(MockChain::connected());
        chain.set_quote(U256::from(500_000_000_000_000u64));
        chain.set_allowance(U160::ZERO, 0);
        let session = session(chain.clone());
        session.update_input_token(TokenSymbol::Usdc);
        session.update_input_amount("1.5");

        session.execute_swap().await.unwrap();
        let addresses = fixtures::addresses();
        assert_eq!(chain.sent_to(addresses.permit2), 1);
        assert_eq!(chain.sent_to(addresses.universal_router), 1);
        assert_eq!(chain.sent()[1].value, U256::ZERO);
    }

    #[tokio::test]
    async fn test_reverted_swap_reports_error() {
        let chain = Arc::new(MockChain::connected());
        chain.set_quote(U256::from(1_000_000u64));
        chain.revert_transactions.store(true, std::sync::atomic::Ordering::SeqCst);
        let session = session(chain);
        session.update_input_amount("1");

        let err = session.execute_swap().await.unwrap_err();
        assert!(matches!(err, AppError::TransactionFailed(_)));
        assert_eq!(session.toast().current().unwrap().status, ToastStatus::Error);
        assert_eq!(session.state().input_amount, "1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_concurrent_swap_is_refused() {
        let chain = Arc::new(MockChain::connected());
        chain.set_quote(U256::from(1_000_000u64));
        *chain.receipt_delay.lock().unwrap() = Duration::from_secs(5);
        let session = Arc::new(session(chain.clone()));
        session.update_input_amount("1");

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.execute_swap().await }
        });
        settle_until(|| chain.sent().len() == 1).await;
        assert!(session.is_swapping());

        let second = session.execute_swap().await;
        assert!(matches!(second, Err(AppError::ActionInProgress)));

        first.await.unwrap().unwrap();
        assert_eq!(chain.sent().len(), 1);
        assert!(!session.is_swapping());
    }
}
