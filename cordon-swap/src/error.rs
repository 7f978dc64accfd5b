//! Internal error enum for the swap core, converted into `CoreError` at the
//! crate boundary the same way `cordon-evm`/`cordon-solana` do.

use cordon_chain::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("jupiter: {0}")]
    Jupiter(String),

    #[error("pump.fun: {0}")]
    Pump(String),

    /// Jupiter's "token not routable" response, distinguished from a
    /// generic route failure so the router can recognize the
    /// Pump-suffixed-mint fallback case as expected rather than surprising.
    #[error("route not available for this mint")]
    NotRoutable,

    /// A 400 from Pumpportal, interpreted as "token graduated off the
    /// bonding curve"; the caller is instructed to retry on Jupiter.
    #[error("token has graduated off the bonding curve")]
    TokenGraduated,

    #[error("rpc: {0}")]
    Rpc(String),

    #[error("{0}")]
    Unknown(String),
}

impl From<SwapError> for CoreError {
    fn from(err: SwapError) -> Self {
        match err {
            SwapError::TokenGraduated => CoreError::TokenGraduated,
            SwapError::Pump(details) => CoreError::PumpUnavailable { details },
            SwapError::Rpc(details) => CoreError::Unknown { details },
            other => CoreError::Unknown {
                details: other.to_string(),
            },
        }
    }
}
