//! Internal error enum for the Solana signer, converted into `CoreError` at
//! the crate boundary the same way `cordon-evm::EvmError` does.

use cordon_chain::{CoreError, DrainerAttackType, DrainerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolanaError {
    #[error("message is neither valid base64 nor valid UTF-8")]
    UndecodableMessage,

    #[error("transaction bytes are neither a versioned nor a legacy transaction: {0}")]
    UndecodableTransaction(String),

    #[error("transaction exceeds the maximum accepted size")]
    TransactionTooLarge,

    #[error("wallet address is not a required signer of this transaction")]
    NotASigner,

    #[error("{0}")]
    Rpc(String),

    #[error(transparent)]
    Blocked(#[from] DrainerError),
}

impl From<SolanaError> for CoreError {
    fn from(err: SolanaError) -> Self {
        match err {
            SolanaError::Blocked(inner) => CoreError::DrainerBlocked(inner),
            other => CoreError::Unknown {
                details: other.to_string(),
            },
        }
    }
}

pub(crate) fn block(attack_type: DrainerAttackType) -> SolanaError {
    SolanaError::Blocked(DrainerError { attack_type })
}
