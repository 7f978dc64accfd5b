//! # `cordon-swap`
//!
//! The swap core (spec §4.H): Jupiter/Pump.fun routing, quote
//! normalization, SOL-output safety, fee reservation, the Jito-bundle
//! broadcast engine, and on-chain error classification.

pub mod broadcast;
pub mod error;
pub mod error_class;
pub mod quote;
pub mod router;
pub mod rpc;

pub use broadcast::{BroadcastEndpoints, BroadcastEngine, BroadcastProgress, BroadcastStatus};
pub use error::SwapError;
pub use error_class::{classify, ClassifiedError, RetryAdvice};
pub use quote::{build_swap_request, fee_reserve_lamports, spendable_lamports, NormalizedQuote, SpeedMode, SwapExtraParams};
pub use router::{choose_route, route_and_quote, Route};
pub use rpc::{BroadcastTransport, ConfirmationLevel, JupiterClient, PumpClient, RawQuote, SignatureStatus};
