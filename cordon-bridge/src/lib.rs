//! # `cordon-bridge`
//!
//! The dApp bridge (spec §4.I) and WalletConnect glue (spec §4.J): a
//! request/response protocol with a per-method human-authorization gate,
//! shared between a content-window message channel and a WalletConnect
//! session.

pub mod bridge;
pub mod confirm;
pub mod error;
pub mod protocol;
pub mod walletconnect;

pub use bridge::Bridge;
pub use confirm::{AuthGuard, ConfirmationPrompt, ConfirmationUi};
pub use error::BridgeError;
pub use protocol::BridgeResponse;
pub use walletconnect::{
    build_namespaces, handle_request as handle_walletconnect_request, handle_request_for_session,
    SessionNamespaces, SessionProposal, SessionStore,
};
