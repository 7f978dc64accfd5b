//! # `cordon-core`
//!
//! The facade: wires the vault, policy engine, approval ledger, EVM/Solana
//! signers, swap core, and dApp bridge into the single [`CordonCore`] entry
//! point a mobile UI holds for the lifetime of the app.

pub mod app_state;
pub mod bridge_ops;
pub mod collaborators;
pub mod config;
pub mod core;
pub mod evm_ops;
pub mod logger;
pub mod solana_ops;
pub mod swap_ops;

pub use collaborators::Collaborators;
pub use config::{BroadcastConfig, CoreConfig};
pub use core::CordonCore;
