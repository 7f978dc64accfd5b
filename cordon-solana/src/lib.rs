//! # `cordon-solana`
//!
//! The Solana signer (spec §4.G): message and transaction signing, the
//! drainer decoder, and server-assisted SOL/SPL transfer preparation.
//! Transaction wire decoding goes through `solana-sdk`'s own types (a
//! directly-observed dependency elsewhere in the pack); signing itself
//! never touches `solana_sdk::signer::Signer`, since the wallet's key
//! material lives behind `cordon-crypto`'s raw Ed25519 wrapper.

pub mod drainer;
pub mod error;
pub mod rpc;
pub mod signer;
pub mod tx;

pub use error::SolanaError;
pub use rpc::{SolanaRpcClient, SolanaTransferBuilder, UnsignedTransfer};
pub use signer::SolanaSigner;
pub use tx::DecodedTransaction;
