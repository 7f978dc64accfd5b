//! EVM-specific error classification. Spec §4.F's taxonomy
//! (`WALLET_LOCKED`, `INSUFFICIENT_FUNDS`, `NONCE_ERROR`, `GAS_ERROR`,
//! `EXECUTION_REVERTED`, `USER_REJECTED`, `TIMEOUT`, `TRANSACTION_FAILED`)
//! is already represented directly by `cordon_chain::CoreError` variants;
//! this module only adds the substring classifier that turns an RPC node's
//! free-text error message into one of them.

use cordon_chain::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvmError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("nonce error: {0}")]
    Nonce(String),

    #[error("gas estimation failed: {0}")]
    Gas(String),

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("user rejected the request")]
    UserRejected,

    #[error("request timed out")]
    Timeout,

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),
}

impl From<EvmError> for CoreError {
    fn from(err: EvmError) -> Self {
        match err {
            EvmError::InvalidAddress(details) => CoreError::Unknown { details },
            EvmError::InsufficientFunds(details) => CoreError::InsufficientFunds { details },
            EvmError::Nonce(details) => CoreError::NonceError { details },
            EvmError::Gas(details) => CoreError::GasError { details },
            EvmError::Reverted(details) => CoreError::ExecutionReverted { details },
            EvmError::UserRejected => CoreError::UserRejected,
            EvmError::Timeout => CoreError::Timeout,
            EvmError::Rpc(details) => CoreError::TransactionFailed { details },
            EvmError::TransactionFailed(details) => CoreError::TransactionFailed { details },
        }
    }
}

/// Classify a raw RPC/node failure message into a stable category, per spec
/// §4.F's `sendRawTransaction` note: "classify failure reasons into stable
/// error codes."
pub fn classify_send_failure(message: &str) -> EvmError {
    let lower = message.to_lowercase();
    if lower.contains("insufficient funds") || lower.contains("insufficient balance") {
        EvmError::InsufficientFunds(message.to_string())
    } else if lower.contains("nonce too low")
        || lower.contains("nonce too high")
        || lower.contains("nonce")
    {
        EvmError::Nonce(message.to_string())
    } else if lower.contains("execution reverted") || lower.contains("revert") {
        EvmError::Reverted(message.to_string())
    } else if lower.contains("gas required exceeds") || lower.contains("out of gas") {
        EvmError::Gas(message.to_string())
    } else if lower.contains("timeout") || lower.contains("timed out") {
        EvmError::Timeout
    } else if lower.contains("user rejected") || lower.contains("user denied") {
        EvmError::UserRejected
    } else {
        EvmError::TransactionFailed(message.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classifies_insufficient_funds() {
        assert!(matches!(
            classify_send_failure("insufficient funds for gas * price + value"),
            EvmError::InsufficientFunds(_)
        ));
    }

    #[test]
    fn classifies_nonce_too_low() {
        assert!(matches!(
            classify_send_failure("nonce too low"),
            EvmError::Nonce(_)
        ));
    }

    #[test]
    fn classifies_execution_reverted() {
        assert!(matches!(
            classify_send_failure("execution reverted: ERC20: transfer amount exceeds balance"),
            EvmError::Reverted(_)
        ));
    }

    #[test]
    fn unrecognized_message_falls_back_to_transaction_failed() {
        assert!(matches!(
            classify_send_failure("some unexpected node error"),
            EvmError::TransactionFailed(_)
        ));
    }
}
