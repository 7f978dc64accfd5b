//! On-chain error classification (spec §4.H): maps substrings/codes the
//! network reports into stable categories the UI can key off, plus a
//! retry hint.

use cordon_chain::{CoreError, ErrorCode};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RetryAdvice {
    RetryWithRebuild,
    RetryWithoutRebuild,
    NoRetry,
}

#[derive(Clone, Debug)]
pub struct ClassifiedError {
    pub code: ErrorCode,
    pub retry: RetryAdvice,
    pub hint: Option<String>,
    pub details: String,
}

/// Classifies a raw on-chain/RPC error message. Order matters: specific
/// hex/program-error codes are checked before generic substrings so e.g. a
/// `0x1788` message isn't caught by the broader "blockhash"/"expired" check.
pub fn classify(message: &str) -> ClassifiedError {
    let details = message.to_string();
    let lower = message.to_lowercase();

    if message.contains("SlippageToleranceExceeded") || message.contains("0x1771") {
        return ClassifiedError {
            code: ErrorCode::Slippage,
            retry: RetryAdvice::RetryWithRebuild,
            hint: None,
            details,
        };
    }
    if message.contains("0x1788") || message.contains("InvalidAccountData") {
        return ClassifiedError {
            code: ErrorCode::BlockhashExpired,
            retry: RetryAdvice::RetryWithRebuild,
            hint: Some("add ~0.005 SOL".to_string()),
            details,
        };
    }
    if message.contains("0x177e") || message.contains("IncorrectTokenProgramId") {
        return ClassifiedError {
            code: ErrorCode::ExecutionReverted,
            retry: RetryAdvice::NoRetry,
            hint: Some("token uses Token-2022, which this route doesn't support".to_string()),
            details,
        };
    }
    if lower.contains("insufficient lamports") {
        return ClassifiedError {
            code: ErrorCode::InsufficientFunds,
            retry: RetryAdvice::NoRetry,
            hint: None,
            details,
        };
    }
    if lower.contains("blockhash") && lower.contains("expired") {
        return ClassifiedError {
            code: ErrorCode::BlockhashExpired,
            retry: RetryAdvice::RetryWithRebuild,
            hint: None,
            details,
        };
    }
    if lower.contains("timeout") || lower.contains("connection") {
        return ClassifiedError {
            code: ErrorCode::RpcTimeout,
            retry: RetryAdvice::RetryWithoutRebuild,
            hint: None,
            details,
        };
    }
    ClassifiedError {
        code: ErrorCode::Unknown,
        retry: RetryAdvice::NoRetry,
        hint: None,
        details,
    }
}

impl From<ClassifiedError> for CoreError {
    fn from(err: ClassifiedError) -> Self {
        match err.code {
            ErrorCode::Slippage => CoreError::Slippage,
            ErrorCode::BlockhashExpired => CoreError::BlockhashExpired,
            ErrorCode::InsufficientFunds => CoreError::InsufficientFunds { details: err.details },
            ErrorCode::RpcTimeout => CoreError::RpcTimeout,
            ErrorCode::ExecutionReverted => CoreError::ExecutionReverted { details: err.details },
            _ => CoreError::Unknown { details: err.details },
        }
    }
}
