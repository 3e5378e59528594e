//! Error types and handling module.
//!
//! Defines all application-specific error types and conversions.

use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required contract address has no default and no override.
    #[error("Missing address for {field} on chain {chain_id}")]
    MissingAddress { field: &'static str, chain_id: u64 },

    /// Invalid Ethereum address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Symbol outside the supported token set.
    #[error("Unsupported token: {0}")]
    UnsupportedToken(String),

    /// Neither event scan nor candidate probing located the pool.
    #[error("Unable to discover ETH/USDC pool configuration on chain {0}")]
    PoolNotFound(u64),

    /// Unparseable or non-positive amount.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Unparseable or negative slippage tolerance.
    #[error("Invalid slippage tolerance: {0}")]
    InvalidSlippage(String),

    /// Contract-level failure (revert, bad call data).
    #[error("Ethereum RPC error: {0}")]
    Rpc(String),

    /// Transport errors.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Permit2 approval could not be submitted or confirmed.
    #[error("Approval failed: {0}")]
    Approval(String),

    /// A broadcast transaction was mined but did not succeed.
    #[error("Transaction {0} was not confirmed successfully")]
    TransactionFailed(String),

    /// Wallet-related errors.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// An action needs a signer but none is configured.
    #[error("Connect a wallet before submitting transactions")]
    WalletNotConnected,

    /// Another submission from the same session is still running.
    #[error("Another transaction is already in progress")]
    ActionInProgress,

    /// Numeric overflow during conversion.
    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    /// Pending transaction error.
    #[error("Pending transaction error: {0}")]
    PendingTransaction(String),
}

impl AppError {
    /// Whether the error came from user input rather than the chain or the node.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidAddress(_)
                | AppError::UnsupportedToken(_)
                | AppError::InvalidAmount(_)
                | AppError::InvalidSlippage(_)
                | AppError::NumericOverflow(_)
        )
    }
}

impl From<alloy::transports::TransportError> for AppError {
    fn from(err: alloy::transports::TransportError) -> Self {
        // JSON-RPC error responses carry reverts; everything else is the wire.
        if err.is_error_resp() {
            AppError::Rpc(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<alloy::contract::Error> for AppError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(e) => e.into(),
            other => AppError::Rpc(other.to_string()),
        }
    }
}

impl From<alloy::providers::PendingTransactionError> for AppError {
    fn from(err: alloy::providers::PendingTransactionError) -> Self {
        AppError::PendingTransaction(err.to_string())
    }
}

impl From<alloy::signers::local::LocalSignerError> for AppError {
    fn from(err: alloy::signers::local::LocalSignerError) -> Self {
        AppError::Wallet(err.to_string())
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        if err.is_input_error() {
            return McpError::invalid_params(err.to_string(), None);
        }
        match err {
            AppError::Config(_)
            | AppError::MissingAddress { .. }
            | AppError::WalletNotConnected
            | AppError::ActionInProgress => McpError::invalid_request(err.to_string(), None),
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::ErrorCode;

    #[test]
    fn test_app_error_config_display() {
        let err = AppError::Config("Missing RPC URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: Missing RPC URL");
    }

    #[test]
    fn test_missing_address_names_field() {
        let err = AppError::MissingAddress { field: "quoter", chain_id: 11155111 };
        assert_eq!(err.to_string(), "Missing address for quoter on chain 11155111");
    }

    #[test]
    fn test_pool_not_found_display() {
        let err = AppError::PoolNotFound(1);
        assert_eq!(err.to_string(), "Unable to discover ETH/USDC pool configuration on chain 1");
    }

    #[test]
    fn test_transaction_failed_display() {
        let err = AppError::TransactionFailed("0xabc".to_string());
        assert!(err.to_string().contains("0xabc"));
    }

    #[test]
    fn test_input_error_classification() {
        assert!(AppError::InvalidAmount("x".into()).is_input_error());
        assert!(AppError::InvalidSlippage("x".into()).is_input_error());
        assert!(AppError::UnsupportedToken("DAI".into()).is_input_error());
        assert!(AppError::NumericOverflow("x".into()).is_input_error());
        assert!(!AppError::WalletNotConnected.is_input_error());
        assert!(!AppError::PoolNotFound(1).is_input_error());
        assert!(!AppError::Approval("x".into()).is_input_error());
    }

    #[test]
    fn test_app_error_to_mcp_error_invalid_params() {
        let err = AppError::InvalidAmount("abc".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code, ErrorCode::INVALID_PARAMS);

        let err = AppError::UnsupportedToken("DAI".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code, ErrorCode::INVALID_PARAMS);
    }

    #[test]
    fn test_app_error_to_mcp_error_invalid_request() {
        let err = AppError::MissingAddress { field: "permit2", chain_id: 1 };
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code, ErrorCode::INVALID_REQUEST);

        let mcp_err: McpError = AppError::WalletNotConnected.into();
        assert_eq!(mcp_err.code, ErrorCode::INVALID_REQUEST);
    }

    #[test]
    fn test_app_error_to_mcp_error_internal_error() {
        let mcp_err: McpError = AppError::Rpc("execution reverted".to_string()).into();
        assert_eq!(mcp_err.code, ErrorCode::INTERNAL_ERROR);

        let mcp_err: McpError = AppError::PoolNotFound(11155111).into();
        assert_eq!(mcp_err.code, ErrorCode::INTERNAL_ERROR);
        assert!(mcp_err.message.contains("11155111"));
        assert!(mcp_err.data.is_none());
    }

    #[test]
    fn test_input_errors_map_to_invalid_params() {
        let errors = [
            AppError::InvalidAddress("0x12".to_string()),
            AppError::InvalidSlippage("-1".to_string()),
            AppError::NumericOverflow("1e80".to_string()),
        ];
        for err in errors {
            assert!(err.is_input_error());
            let mcp_err: McpError = err.into();
            assert_eq!(mcp_err.code, ErrorCode::INVALID_PARAMS);
        }
    }

    #[test]
    fn test_pending_transaction_error_is_internal() {
        let err: AppError = alloy::providers::PendingTransactionError::TxWatcher(
            alloy::providers::WatchTxError::Timeout,
        )
        .into();
        assert!(matches!(err, AppError::PendingTransaction(_)));
        assert!(!err.is_input_error());

        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code, ErrorCode::INTERNAL_ERROR);
    }
}
