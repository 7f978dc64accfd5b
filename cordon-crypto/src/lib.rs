//! # `cordon-crypto`
//!
//! Cryptographic primitives for the wallet core: mnemonic handling, vault
//! encryption, and per-chain key derivation/signing. Business logic
//! (transaction construction, policy evaluation) lives in the higher-level
//! `cordon-chain`/`cordon-evm`/`cordon-solana`/`cordon-vault` crates; this
//! crate only ever sees bytes and keys, never wallet or chain state.

pub mod evm_keys;
pub mod evm_sign;
pub mod hexutil;
pub mod keccak;
pub mod mnemonic;
pub mod rng;
pub mod sha256;
pub mod slip10;
pub mod solana_keys;
pub mod vault_cipher;

pub use rng::{Crng, RngExt};
