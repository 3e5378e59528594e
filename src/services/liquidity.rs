//! Liquidity session: form state and position minting.

use alloy::primitives::U256;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};
use tracing::{error, info};

use crate::{
    error::{AppError, Result},
    services::{
        session::{lock, BusyGuard, SessionContext},
        trade::{build_mint_call, liquidity_deadline, MintPlan, Slippage},
    },
    types::{
        format_units, parse_units, ActionReceipt, LiquidityState, PoolContext, Toast, ToastSlot,
        TokenSymbol, TransactionData,
    },
};

/// State machine behind the add-liquidity form.
pub struct LiquiditySession {
    ctx: SessionContext,
    state: Mutex<LiquidityState>,
    submitting: AtomicBool,
    toast: ToastSlot,
}

impl LiquiditySession {
    /// New session with empty amounts, full range, and a 20 minute deadline.
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            state: Mutex::new(LiquidityState::default()),
            submitting: AtomicBool::new(false),
            toast: ToastSlot::default(),
        }
    }

    /// Snapshot of the form.
    pub fn state(&self) -> LiquidityState {
        lock(&self.state).clone()
    }

    /// Toast slot of this session.
    pub fn toast(&self) -> &ToastSlot {
        &self.toast
    }

    /// Whether a mint is being submitted.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Set the ETH amount.
    pub fn update_amount_a(&self, value: impl Into<String>) {
        lock(&self.state).amount_a = value.into();
    }

    /// Set the USDC amount.
    pub fn update_amount_b(&self, value: impl Into<String>) {
        lock(&self.state).amount_b = value.into();
    }

    /// Set the slippage tolerance string.
    pub fn update_slippage(&self, value: impl Into<String>) {
        lock(&self.state).slippage = value.into();
    }

    /// Set the deadline offset.
    pub fn update_deadline(&self, minutes: u64) {
        lock(&self.state).deadline_minutes = minutes;
    }

    /// Flip between full range and a window around the current price.
    pub fn toggle_full_range(&self) {
        let mut state = lock(&self.state);
        state.full_range = !state.full_range;
    }

    /// Wallet connected, nothing in flight, and at least one amount entered.
    pub fn can_submit(&self) -> bool {
        let state = self.state();
        self.ctx.chain.account().is_some()
            && !self.is_submitting()
            && !(state.amount_a.trim().is_empty() && state.amount_b.trim().is_empty())
    }

    /// Mint a position from the current form.
    pub async fn execute_add_liquidity(&self) -> Result<ActionReceipt> {
        if self.ctx.chain.account().is_none() {
            self.toast.show(Toast::error("Connect your wallet before adding liquidity."));
            return Err(AppError::WalletNotConnected);
        }

        let _busy = BusyGuard::acquire(&self.submitting)?;
        self.toast.show(Toast::pending("Preparing liquidity position..."));

        let snapshot = self.state();
        info!(
            amount_eth = %snapshot.amount_a,
            amount_usdc = %snapshot.amount_b,
            full_range = snapshot.full_range,
            slippage = %snapshot.slippage,
            "Add liquidity started"
        );

        match self.submit(&snapshot).await {
            Ok(receipt) => {
                self.toast.show(Toast::success(receipt.message.clone(), receipt.hash.clone()));
                self.clear_amounts();
                Ok(receipt)
            }
            Err(e) => {
                error!(error = %e, "Add liquidity failed");
                self.toast.show(Toast::error(e.to_string()));
                Err(e)
            }
        }
    }

    fn clear_amounts(&self) {
        let mut state = lock(&self.state);
        state.amount_a.clear();
        state.amount_b.clear();
    }

    fn parse_side(value: &str, decimals: u8) -> Result<U256> {
        if value.trim().is_empty() {
            return Ok(U256::ZERO);
        }
        parse_units(value, decimals).map_err(|_| AppError::InvalidAmount(value.to_string()))
    }

    /// Desired amounts ordered as the pool's currency0 / currency1.
    fn pool_amounts(&self, pool: &PoolContext, eth: U256, usdc: U256) -> (U256, U256) {
        let native = self.ctx.registry.currency(TokenSymbol::Eth);
        if pool.currency0.same_as(&native) {
            (eth, usdc)
        } else {
            (usdc, eth)
        }
    }

    async fn submit(&self, snapshot: &LiquidityState) -> Result<ActionReceipt> {
        let ctx = &self.ctx;
        let owner = ctx.chain.account().ok_or(AppError::WalletNotConnected)?;
        let pool = ctx.pools.build_pool().await?;

        let eth = ctx.registry.currency(TokenSymbol::Eth);
        let usdc = ctx.registry.currency(TokenSymbol::Usdc);
        let amount_eth = Self::parse_side(&snapshot.amount_a, eth.decimals())?;
        let amount_usdc = Self::parse_side(&snapshot.amount_b, usdc.decimals())?;
        if amount_eth.is_zero() && amount_usdc.is_zero() {
            return Err(AppError::InvalidAmount("Enter an amount for ETH or USDC".to_string()));
        }

        let slippage = Slippage::parse(&snapshot.slippage)?;
        let deadline = liquidity_deadline(ctx.chain.now(), snapshot.deadline_minutes);
        let (amount0, amount1) = self.pool_amounts(&pool, amount_eth, amount_usdc);

        let plan: MintPlan = build_mint_call(
            ctx.addresses.position_manager,
            &pool,
            amount0,
            amount1,
            snapshot.full_range,
            slippage,
            owner,
            deadline,
        )?;
        info!(
            tick_lower = plan.range.tick_lower,
            tick_upper = plan.range.tick_upper,
            liquidity = plan.liquidity,
            "Position sized"
        );

        let key = &pool.config.pool_key;
        for (leg, max) in [(key.currency0, plan.amount0_max), (key.currency1, plan.amount1_max)] {
            if !max.is_zero() {
                ctx.allowances
                    .ensure_allowance(owner, leg, ctx.addresses.position_manager, max)
                    .await?;
            }
        }

        let transaction = TransactionData::from(&plan.call);
        let hash = ctx
            .send_and_confirm(plan.call, &self.toast, "Waiting for position confirmation...")
            .await?;

        let message = format!(
            "Liquidity added with {} ETH and {} USDC",
            format_units(amount_eth, eth.decimals()),
            format_units(amount_usdc, usdc.decimals())
        );
        info!(hash = %hash, "Liquidity position confirmed");

        Ok(ActionReceipt { hash: format!("{hash:?}"), message, transaction })
    }
}
