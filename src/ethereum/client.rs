//! Ethereum RPC client.

use alloy::{
    eips::BlockNumberOrTag,
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, B256, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::{Filter, TransactionRequest},
    sol_types::SolEvent,
};
use async_trait::async_trait;
use std::time::Duration;

use crate::{
    error::{AppError, Result},
    ethereum::{
        chain::{Permit2Allowance, PoolChain, Slot0},
        contracts::{
            permit2::IPermit2,
            uniswap_v4::{IPoolManager, IStateView, IV4Quoter},
        },
        wallet::WalletManager,
    },
    types::{ActionCall, InitializeEvent, PoolKey},
};

/// How long to wait for a receipt before a transaction is reported as unconfirmed.
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Ethereum RPC client with an optional signer.
#[derive(Clone)]
pub struct EthereumClient {
    provider: DynProvider,
    account: Option<Address>,
    rpc_url: String,
}

impl EthereumClient {
    /// Create a new client. Without a wallet the client is read-only.
    ///
    /// No network calls are made here; the node is first contacted by the
    /// first operation.
    pub fn new(rpc_url: &str, wallet: Option<&WalletManager>) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid RPC URL: {}", rpc_url)))?;

        let provider = match wallet {
            Some(wallet) => {
                ProviderBuilder::new().wallet(wallet.network_wallet()).connect_http(url).erased()
            }
            None => ProviderBuilder::new().connect_http(url).erased(),
        };
        let account = wallet.map(WalletManager::address);

        tracing::info!(rpc_url = %rpc_url, signer = ?account, "Ethereum client created (lazy initialization)");

        Ok(Self { provider, account, rpc_url: rpc_url.to_string() })
    }

    /// Chain id reported by the node.
    ///
    /// Read on every call so a node that switched networks is noticed.
    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id = self.provider.get_chain_id().await?;
        tracing::debug!(chain_id = chain_id, rpc_url = %self.rpc_url, "Read node chain id");
        Ok(chain_id)
    }
}

impl std::fmt::Debug for EthereumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumClient")
            .field("rpc_url", &self.rpc_url)
            .field("account", &self.account)
            .finish()
    }
}

#[async_trait]
impl PoolChain for EthereumClient {
    async fn node_chain_id(&self) -> Result<u64> {
        self.chain_id().await
    }

    async fn initialize_events(&self, pool_manager: Address) -> Result<Vec<InitializeEvent>> {
        let filter = Filter::new()
            .address(pool_manager)
            .event_signature(IPoolManager::Initialize::SIGNATURE_HASH)
            .from_block(BlockNumberOrTag::Earliest)
            .to_block(BlockNumberOrTag::Latest);

        let logs = self.provider.get_logs(&filter).await?;
        tracing::debug!(count = logs.len(), pool_manager = %pool_manager, "Fetched Initialize logs");

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            let decoded = match log.log_decode::<IPoolManager::Initialize>() {
                Ok(decoded) => decoded.inner.data,
                Err(e) => {
                    tracing::warn!(error = %e, tx = ?log.transaction_hash, "Skipping undecodable Initialize log");
                    continue;
                }
            };
            events.push(InitializeEvent {
                id: decoded.id,
                key: PoolKey {
                    currency0: decoded.currency0,
                    currency1: decoded.currency1,
                    fee: decoded.fee.to::<u32>(),
                    tick_spacing: decoded.tickSpacing.as_i32(),
                    hooks: decoded.hooks,
                },
            });
        }
        Ok(events)
    }

    async fn pool_liquidity(&self, state_view: Address, pool_id: B256) -> Result<u128> {
        let contract = IStateView::new(state_view, &self.provider);
        Ok(contract.getLiquidity(pool_id).call().await?)
    }

    async fn pool_slot0(&self, state_view: Address, pool_id: B256) -> Result<Slot0> {
        let contract = IStateView::new(state_view, &self.provider);
        let slot0 = contract.getSlot0(pool_id).call().await?;
        Ok(Slot0 { sqrt_price_x96: slot0.sqrtPriceX96, tick: slot0.tick.as_i32() })
    }

    async fn quote_exact_input_single(
        &self,
        quoter: Address,
        key: &PoolKey,
        zero_for_one: bool,
        amount_in: u128,
    ) -> Result<U256> {
        let contract = IV4Quoter::new(quoter, &self.provider);
        let params = IV4Quoter::QuoteExactSingleParams {
            poolKey: key.to_sol()?,
            zeroForOne: zero_for_one,
            exactAmount: amount_in,
            hookData: Bytes::new(),
        };
        let quote = contract.quoteExactInputSingle(params).call().await?;
        tracing::debug!(amount_in = amount_in, amount_out = %quote.amountOut, zero_for_one, "Quoted exact input");
        Ok(quote.amountOut)
    }

    async fn permit2_allowance(
        &self,
        permit2: Address,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<Permit2Allowance> {
        let contract = IPermit2::new(permit2, &self.provider);
        let allowance = contract.allowance(owner, token, spender).call().await?;
        Ok(Permit2Allowance {
            amount: allowance.amount,
            expiration: allowance.expiration.to::<u64>(),
        })
    }

    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn send_transaction(&self, call: ActionCall) -> Result<TxHash> {
        let from = self.account.ok_or(AppError::WalletNotConnected)?;
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(call.to)
            .with_input(call.data)
            .with_value(call.value);

        let pending = self.provider.send_transaction(tx).await?;
        let hash = *pending.tx_hash();
        tracing::info!(hash = %hash, to = %call.to, "Transaction broadcast");
        Ok(hash)
    }

    async fn transaction_succeeded(&self, hash: TxHash) -> Result<bool> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), hash)
            .with_timeout(Some(RECEIPT_TIMEOUT))
            .get_receipt()
            .await?;

        let status = receipt.status();
        tracing::info!(hash = %hash, success = status, block = ?receipt.block_number(), "Receipt received");
        Ok(status)
    }
}
