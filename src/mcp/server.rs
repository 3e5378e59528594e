//! MCP server implementation.

use std::{
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Serialize;

use crate::{
    config::{Config, ContractAddresses},
    error::AppError,
    ethereum::{EthereumClient, PoolChain, WalletManager, WalletStatus},
    services::{LiquiditySession, SessionContext, SwapSession, TokenRegistry},
    types::{
        Currency, LiquidityState, PoolContext, PoolKey, PoolState, SwapState, Toast, TokenSymbol,
    },
};

/// Uniswap v4 ETH/USDC pool desk.
///
/// Holds one swap session and one liquidity session for the configured
/// account; every tool call edits and reads those sessions.
#[derive(Clone)]
pub struct PoolDeskServer {
    chain_id: u64,
    /// Last chain id the node reported, 0 before the first successful read.
    observed_chain_id: Arc<AtomicU64>,
    ctx: SessionContext,
    swap: Arc<SwapSession>,
    liquidity: Arc<LiquiditySession>,
    tool_router: ToolRouter<Self>,
}

impl PoolDeskServer {
    /// Create the server from configuration.
    ///
    /// No network calls are made here; the node is first contacted when a
    /// tool needs it.
    pub fn new(config: Config) -> Result<Self, AppError> {
        tracing::info!(chain_id = config.chain_id, "Initializing pool desk server");

        let wallet =
            config.private_key.as_deref().map(WalletManager::from_private_key).transpose()?;
        if wallet.is_none() {
            tracing::warn!("ETHEREUM_PRIVATE_KEY not set, running without a wallet");
        }

        let client = Arc::new(EthereumClient::new(&config.rpc_url, wallet.as_ref())?);
        Ok(Self::with_chain(client, config.addresses, config.chain_id))
    }

    /// Create the server over an arbitrary chain implementation.
    pub fn with_chain(
        chain: Arc<dyn PoolChain>,
        addresses: ContractAddresses,
        chain_id: u64,
    ) -> Self {
        let ctx = SessionContext::new(chain, addresses, chain_id);
        let swap = Arc::new(SwapSession::new(ctx.clone()));
        let liquidity = Arc::new(LiquiditySession::new(ctx.clone()));

        Self {
            chain_id,
            observed_chain_id: Arc::new(AtomicU64::new(0)),
            ctx,
            swap,
            liquidity,
            tool_router: Self::tool_router(),
        }
    }

    /// Current add-liquidity form.
    pub fn liquidity_state(&self) -> LiquidityState {
        self.liquidity.state()
    }

    /// Current swap form.
    pub fn swap_state(&self) -> SwapState {
        self.swap.state()
    }

    /// Drop the located pool when the node serves another network than the
    /// configured one, or than the one it reported last time.
    async fn track_network(&self, node_chain_id: u64) {
        let previous = self.observed_chain_id.swap(node_chain_id, Ordering::AcqRel);
        let switched = previous != 0 && previous != node_chain_id;
        if !switched && node_chain_id == self.chain_id {
            return;
        }

        tracing::warn!(
            configured = self.chain_id,
            previous,
            node = node_chain_id,
            "Network differs from the located pool's, invalidating pool cache"
        );
        self.ctx.pools.invalidate().await;
        self.swap.clear_pool();
    }

    fn apply_swap_input(&self, input: &SwapInput) -> Result<(), McpError> {
        let from = TokenSymbol::from_str(&input.from_token)?;
        if let Some(to) = input.to_token.as_deref() {
            let to = TokenSymbol::from_str(to)?;
            if to == from {
                return Err(McpError::invalid_params(
                    "from_token and to_token cannot be the same",
                    None,
                ));
            }
        }

        self.swap.update_input_token(from);
        self.swap.update_input_amount(input.amount.trim());
        if let Some(slippage) = &input.slippage_tolerance {
            self.swap.update_slippage(slippage.trim());
        }
        Ok(())
    }

    fn apply_liquidity_input(&self, input: &AddLiquidityInput) {
        let session = &self.liquidity;
        session.update_amount_a(input.amount_eth.clone().unwrap_or_default());
        session.update_amount_b(input.amount_usdc.clone().unwrap_or_default());
        if let Some(slippage) = &input.slippage_tolerance {
            session.update_slippage(slippage.trim());
        }
        if let Some(minutes) = input.deadline_minutes {
            session.update_deadline(minutes);
        }
        if let Some(full_range) = input.full_range {
            if session.state().full_range != full_range {
                session.toggle_full_range();
            }
        }
    }
}

/// Input parameters for the quote_swap and swap tools.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct SwapInput {
    /// Token to sell: "ETH" or "USDC".
    pub from_token: String,
    /// Token to buy. Defaults to the other supported token.
    #[serde(default)]
    pub to_token: Option<String>,
    /// Amount to sell (human-readable, e.g., "1.5").
    pub amount: String,
    /// Slippage tolerance percentage as string (e.g., "0.5" for 0.5%). Default: "0.50".
    #[serde(default)]
    pub slippage_tolerance: Option<String>,
}

/// Input parameters for the add_liquidity tool.
#[derive(Debug, Clone, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct AddLiquidityInput {
    /// ETH to deposit (human-readable). May be omitted for a one-sided deposit.
    #[serde(default)]
    pub amount_eth: Option<String>,
    /// USDC to deposit (human-readable). May be omitted for a one-sided deposit.
    #[serde(default)]
    pub amount_usdc: Option<String>,
    /// Slippage tolerance percentage applied to the maximum amounts. Default: "0.50".
    #[serde(default)]
    pub slippage_tolerance: Option<String>,
    /// Use the full usable tick range. Default: true.
    #[serde(default)]
    pub full_range: Option<bool>,
    /// Minutes until the mint expires. Default: 20.
    #[serde(default)]
    pub deadline_minutes: Option<u64>,
}

/// Input parameters for the dismiss_toast tool.
#[derive(Debug, Clone, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct DismissToastInput {
    /// Which notification to clear: "swap", "liquidity", or "all". Default: "all".
    #[serde(default)]
    pub target: Option<String>,
}

/// Toast slots addressable by `dismiss_toast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToastTarget {
    Swap,
    Liquidity,
    All,
}

impl FromStr for ToastTarget {
    type Err = McpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "swap" => Ok(ToastTarget::Swap),
            "liquidity" => Ok(ToastTarget::Liquidity),
            "all" | "" => Ok(ToastTarget::All),
            other => Err(McpError::invalid_params(
                format!("Unknown toast target '{other}'. Use swap, liquidity, or all."),
                None,
            )),
        }
    }
}

/// Pool summary returned by `get_pool`.
#[derive(Debug, Serialize)]
struct PoolSummary {
    pool_id: String,
    pool_key: PoolKey,
    currency0: &'static str,
    currency1: &'static str,
    state: PoolState,
}

impl PoolSummary {
    fn new(pool: &PoolContext, registry: &TokenRegistry) -> Self {
        let label = |currency: &Currency| match currency {
            Currency::Native { .. } => "ETH",
            Currency::Token { address, .. } if *address == registry.weth() => "WETH",
            Currency::Token { address, .. } => {
                registry.symbol_for_address(*address).map(|s| s.as_str()).unwrap_or("UNKNOWN")
            }
        };

        Self {
            pool_id: format!("{:?}", pool.config.pool_id),
            pool_key: pool.config.pool_key,
            currency0: label(&pool.currency0),
            currency1: label(&pool.currency1),
            state: pool.state,
        }
    }
}

/// Swap form after an estimate.
#[derive(Debug, Serialize)]
struct QuoteResponse {
    #[serde(flatten)]
    state: SwapState,
    can_swap: bool,
}

/// Latest notification of each session.
#[derive(Debug, Serialize)]
struct ToastsResponse {
    swap: Option<Toast>,
    liquidity: Option<Toast>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

#[tool_router]
impl PoolDeskServer {
    /// Report whether a wallet is connected and which chain the node serves.
    #[tool(description = "Show the connected account and the configured and node-reported chain ids")]
    pub async fn wallet_status(&self) -> Result<String, McpError> {
        tracing::info!("wallet_status called");

        let node_chain_id = match self.ctx.chain.node_chain_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "Node unreachable while reading chain id");
                None
            }
        };
        if let Some(id) = node_chain_id {
            self.track_network(id).await;
        }

        to_json(&WalletStatus::new(self.ctx.chain.account(), self.chain_id, node_chain_id))
    }

    /// Locate the ETH/USDC pool (cached after the first success) and read its
    /// live state.
    #[tool(
        description = "Locate the Uniswap v4 ETH/USDC pool and return its key, id, and live state (sqrt price, tick, liquidity)"
    )]
    pub async fn get_pool(&self) -> Result<String, McpError> {
        tracing::info!("get_pool called");

        let pool = self.swap.load_pool().await?;
        to_json(&PoolSummary::new(&pool, &self.ctx.registry))
    }

    /// Forget the located pool and discover it again.
    #[tool(description = "Drop the cached pool location, rediscover the pool, and return its live state")]
    pub async fn refresh_pool(&self) -> Result<String, McpError> {
        tracing::info!("refresh_pool called");

        self.ctx.pools.invalidate().await;
        let pool = self.swap.load_pool().await?;
        to_json(&PoolSummary::new(&pool, &self.ctx.registry))
    }

    /// Estimate the output of a swap without sending anything.
    #[tool(
        description = "Quote an exact-input swap between ETH and USDC. Returns the estimated output (empty when no quote is available)."
    )]
    pub async fn quote_swap(
        &self,
        Parameters(input): Parameters<SwapInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            from = %input.from_token,
            to = ?input.to_token,
            amount = %input.amount,
            slippage = ?input.slippage_tolerance,
            "quote_swap called"
        );

        self.apply_swap_input(&input)?;
        let state = self.swap.estimate().await;
        to_json(&QuoteResponse { state, can_swap: self.swap.can_swap() })
    }

    /// Execute an exact-input swap through the Universal Router.
    #[tool(
        description = "Swap ETH for USDC or USDC for ETH through the Universal Router. Approves Permit2 when needed and waits for confirmation."
    )]
    pub async fn swap(&self, Parameters(input): Parameters<SwapInput>) -> Result<String, McpError> {
        tracing::info!(
            from = %input.from_token,
            to = ?input.to_token,
            amount = %input.amount,
            slippage = ?input.slippage_tolerance,
            "swap called"
        );

        // A refused call must not overwrite the form of the swap in flight.
        if self.swap.is_swapping() {
            return Err(AppError::ActionInProgress.into());
        }
        self.apply_swap_input(&input)?;
        let receipt = self.swap.execute_swap().await?;
        to_json(&receipt)
    }

    /// Mint a new liquidity position.
    #[tool(
        description = "Add liquidity to the ETH/USDC pool by minting a position, full range or centered on the current price"
    )]
    pub async fn add_liquidity(
        &self,
        Parameters(input): Parameters<AddLiquidityInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            amount_eth = ?input.amount_eth,
            amount_usdc = ?input.amount_usdc,
            full_range = ?input.full_range,
            deadline_minutes = ?input.deadline_minutes,
            "add_liquidity called"
        );

        if self.liquidity.is_submitting() {
            return Err(AppError::ActionInProgress.into());
        }
        self.apply_liquidity_input(&input);
        let receipt = self.liquidity.execute_add_liquidity().await?;
        to_json(&receipt)
    }

    /// Current notifications of both sessions.
    #[tool(description = "Show the latest swap and liquidity notifications")]
    pub async fn get_toasts(&self) -> Result<String, McpError> {
        tracing::debug!("get_toasts called");

        to_json(&ToastsResponse {
            swap: self.swap.toast().current(),
            liquidity: self.liquidity.toast().current(),
        })
    }

    /// Clear notifications.
    #[tool(description = "Dismiss the swap notification, the liquidity notification, or both")]
    pub async fn dismiss_toast(
        &self,
        Parameters(input): Parameters<DismissToastInput>,
    ) -> Result<String, McpError> {
        tracing::debug!(target_slot = ?input.target, "dismiss_toast called");

        let target = match input.target.as_deref() {
            Some(raw) => ToastTarget::from_str(raw)?,
            None => ToastTarget::All,
        };
        if matches!(target, ToastTarget::Swap | ToastTarget::All) {
            self.swap.toast().dismiss();
        }
        if matches!(target, ToastTarget::Liquidity | ToastTarget::All) {
            self.liquidity.toast().dismiss();
        }
        self.get_toasts().await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for PoolDeskServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "v4-pool-desk".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Uniswap v4 ETH/USDC pool desk. Locate the pool, quote and execute swaps, \
                 and add liquidity. Transaction progress is reported through get_toasts."
                    .to_string(),
            ),
        }
    }
}
