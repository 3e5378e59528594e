//! Wallet management.

use alloy::{network::EthereumWallet, primitives::Address, signers::local::PrivateKeySigner};
use serde::Serialize;

use crate::error::{AppError, Result};

/// Local signer for the pool desk's transactions.
#[derive(Clone)]
pub struct WalletManager {
    signer: PrivateKeySigner,
    address: Address,
}

impl WalletManager {
    /// Create a wallet manager from a private key string, with or without `0x`.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);

        let signer: PrivateKeySigner =
            key.parse().map_err(|e: alloy::signers::local::LocalSignerError| {
                AppError::Wallet(e.to_string())
            })?;
        let address = signer.address();

        tracing::info!(address = %address, "Wallet connected");

        Ok(Self { signer, address })
    }

    /// Wallet address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Network wallet for a signing provider.
    pub fn network_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager").field("address", &self.address).finish()
    }
}

/// Connection summary returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletStatus {
    /// Whether transactions can be signed.
    pub connected: bool,
    /// Account address when connected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Chain the configuration targets.
    pub chain_id: u64,
    /// Chain reported by the node, when it could be reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_chain_id: Option<u64>,
}

impl WalletStatus {
    /// Build from an optional account.
    pub fn new(account: Option<Address>, chain_id: u64, node_chain_id: Option<u64>) -> Self {
        Self {
            connected: account.is_some(),
            address: account.map(|a| format!("{a:?}")),
            chain_id,
            node_chain_id,
        }
    }
}
