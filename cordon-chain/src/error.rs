//! The stable error taxonomy every public operation surfaces at its API
//! boundary, plus the two distinguished error types the design notes call
//! out as carrying remediation payloads rather than just a message.
//!
//! Each chain-specific crate (`cordon-evm`, `cordon-solana`, `cordon-swap`)
//! defines its own narrower error enum for internal use and converts it into
//! `CoreError` via `From` at its public boundary, the same layering the
//! teacher uses between its node-internal errors and `ApiError`.

use num_bigint::BigUint;
use thiserror::Error;

/// Stable error code surfaced to the UI; the taxonomy from spec §6/§7. Kept
/// as a separate enum (rather than deriving it from `CoreError`'s variant
/// names) so the wire-visible string is decoupled from internal refactors.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorCode {
    WalletLocked,
    InvalidMnemonic,
    UnsupportedChain,
    ApprovalBlocked,
    InsufficientFunds,
    ExecutionReverted,
    NonceError,
    GasError,
    UserRejected,
    Timeout,
    TransactionFailed,
    DrainerBlocked,
    Slippage,
    BlockhashExpired,
    RpcTimeout,
    PumpUnavailable,
    TokenGraduated,
    AuthInProgress,
    Unknown,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WalletLocked => "WALLET_LOCKED",
            Self::InvalidMnemonic => "INVALID_MNEMONIC",
            Self::UnsupportedChain => "UNSUPPORTED_CHAIN",
            Self::ApprovalBlocked => "APPROVAL_BLOCKED",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::ExecutionReverted => "EXECUTION_REVERTED",
            Self::NonceError => "NONCE_ERROR",
            Self::GasError => "GAS_ERROR",
            Self::UserRejected => "USER_REJECTED",
            Self::Timeout => "TIMEOUT",
            Self::TransactionFailed => "TRANSACTION_FAILED",
            Self::DrainerBlocked => "DRAINER_BLOCKED",
            Self::Slippage => "SLIPPAGE",
            Self::BlockhashExpired => "BLOCKHASH_EXPIRED",
            Self::RpcTimeout => "RPC_TIMEOUT",
            Self::PumpUnavailable => "PUMP_UNAVAILABLE",
            Self::TokenGraduated => "TOKEN_GRADUATED",
            Self::AuthInProgress => "AUTH_IN_PROGRESS",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attack pattern identified by the Solana drainer decoder.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DrainerAttackType {
    SetAuthority,
    Assign,
}

impl DrainerAttackType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SetAuthority => "SetAuthority",
            Self::Assign => "Assign",
        }
    }
}

/// A blocked `approve()` with a remediation the UI can act on, per spec
/// §4.E/§7 — "a distinguished error carrying a remediation payload intended
/// to be interpreted, not merely displayed".
#[derive(Clone, Debug, Error)]
#[error("approval blocked: {reason}")]
pub struct ApprovalPolicyError {
    pub reason: String,
    pub suggested_cap: Option<BigUint>,
    pub suggested_cap_formatted: Option<String>,
}

/// A transaction blocked by the drainer decoder before signing.
#[derive(Clone, Debug, Error)]
#[error("transaction blocked: wallet drainer detected ({})", attack_type.as_str())]
pub struct DrainerError {
    pub attack_type: DrainerAttackType,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("wallet is locked")]
    WalletLocked,

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error(transparent)]
    ApprovalBlocked(#[from] ApprovalPolicyError),

    #[error("insufficient funds: {details}")]
    InsufficientFunds { details: String },

    #[error("execution reverted: {details}")]
    ExecutionReverted { details: String },

    #[error("nonce error: {details}")]
    NonceError { details: String },

    #[error("gas estimation error: {details}")]
    GasError { details: String },

    #[error("user rejected the request")]
    UserRejected,

    #[error("operation timed out")]
    Timeout,

    #[error("transaction failed: {details}")]
    TransactionFailed { details: String },

    #[error(transparent)]
    DrainerBlocked(#[from] DrainerError),

    #[error("slippage tolerance exceeded")]
    Slippage,

    #[error("blockhash expired")]
    BlockhashExpired,

    #[error("rpc request timed out")]
    RpcTimeout,

    #[error("pump.fun route unavailable: {details}")]
    PumpUnavailable { details: String },

    #[error("token has graduated off the bonding curve")]
    TokenGraduated,

    #[error("another authorization is already in progress")]
    AuthInProgress,

    #[error("{details}")]
    Unknown { details: String },
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::WalletLocked => ErrorCode::WalletLocked,
            Self::InvalidMnemonic(_) => ErrorCode::InvalidMnemonic,
            Self::UnsupportedChain(_) => ErrorCode::UnsupportedChain,
            Self::ApprovalBlocked(_) => ErrorCode::ApprovalBlocked,
            Self::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            Self::ExecutionReverted { .. } => ErrorCode::ExecutionReverted,
            Self::NonceError { .. } => ErrorCode::NonceError,
            Self::GasError { .. } => ErrorCode::GasError,
            Self::UserRejected => ErrorCode::UserRejected,
            Self::Timeout => ErrorCode::Timeout,
            Self::TransactionFailed { .. } => ErrorCode::TransactionFailed,
            Self::DrainerBlocked(_) => ErrorCode::DrainerBlocked,
            Self::Slippage => ErrorCode::Slippage,
            Self::BlockhashExpired => ErrorCode::BlockhashExpired,
            Self::RpcTimeout => ErrorCode::RpcTimeout,
            Self::PumpUnavailable { .. } => ErrorCode::PumpUnavailable,
            Self::TokenGraduated => ErrorCode::TokenGraduated,
            Self::AuthInProgress => ErrorCode::AuthInProgress,
            Self::Unknown { .. } => ErrorCode::Unknown,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wallet_locked_code_is_stable() {
        assert_eq!(CoreError::WalletLocked.code().as_str(), "WALLET_LOCKED");
    }

    #[test]
    fn approval_blocked_carries_suggested_cap() {
        let err = ApprovalPolicyError {
            reason: "unlimited approval blocked by policy".to_string(),
            suggested_cap: Some(BigUint::from(10_000_000_000u64)),
            suggested_cap_formatted: Some("10000".to_string()),
        };
        let core: CoreError = err.clone().into();
        assert_eq!(core.code(), ErrorCode::ApprovalBlocked);
        match core {
            CoreError::ApprovalBlocked(inner) => {
                assert_eq!(inner.suggested_cap, err.suggested_cap)
            }
            _ => panic!("expected ApprovalBlocked"),
        }
    }

    #[test]
    fn drainer_blocked_reports_attack_type() {
        let err = DrainerError {
            attack_type: DrainerAttackType::SetAuthority,
        };
        let message = CoreError::from(err).to_string();
        assert!(message.contains("SetAuthority"));
    }
}
