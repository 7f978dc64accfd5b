//! # `cordon-chain`
//!
//! The chain registry, the `Chain` capability enum, the stable error
//! taxonomy every other crate propagates through, and the flat key-value
//! storage abstraction the vault/policy/token-registry layers persist
//! through. This is the one crate every other `cordon-*` crate depends on.

pub mod chain;
pub mod config;
pub mod error;
pub mod kv_store;
pub mod token_registry;

pub use chain::{Chain, EvmAddress, SolanaAddress};
pub use config::{ChainConfig, ChainRegistry, EvmChainId, EvmRpcUrls};
pub use error::{ApprovalPolicyError, CoreError, CoreResult, DrainerAttackType, DrainerError, ErrorCode};
pub use kv_store::KvStore;
