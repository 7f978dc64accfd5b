//! # `cordon-vault`
//!
//! Encrypted multi-wallet vault: lifecycle operations (`createVault`,
//! `unlock`, `lock`, `addWallet`, `getMnemonic`, `deleteVault`), ephemeral
//! unlock state, and the OS-keyring-backed secret store.

pub mod secret_store;
pub mod state;
pub mod vault;

pub use secret_store::SecretStore;
pub use state::VaultState;
pub use vault::{Vault, WalletRecord};
