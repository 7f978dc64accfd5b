//! The `CordonCore` facade: owns every leaf crate's state behind one type a
//! mobile UI can hold for the process lifetime.
//!
//! # Self-referential wiring
//!
//! `Vault<'a>`, `KvApprovalLedger<'a>`, and `TokenRegistry<'a>` all borrow a
//! `SecretStore`/`KvStore` for their whole lifetime, but `CordonCore` needs
//! to own both the store and the types that borrow it. Rather than model
//! this with `Pin`/self-referential structs, the store and secret store are
//! each leaked once into `'static` references (the two `Box::leak` calls
//! below); `CordonCore` then stores `Vault<'static>` etc. as ordinary owned
//! fields. This is sound because `Vault`, `KvApprovalLedger`, and
//! `TokenRegistry` are all covariant in their lifetime parameter (every
//! lifetime-bearing field is a shared reference, never a `&mut` or
//! invariant wrapper), so `&'x self.vault: &'x Vault<'static>` coerces to
//! `&'x Vault<'x>` at every call site. The leak is bounded: one `SecretStore`
//! and one `KvStore` per `CordonCore`, for the process's lifetime, which is
//! the same lifetime a UI would keep them alive for anyway.

use std::collections::HashMap;

use cordon_bridge::{AuthGuard, ConfirmationUi, SessionStore};
use cordon_chain::config::{ChainConfig, ChainRegistry, EvmChainId};
use cordon_chain::{Chain, CoreResult, KvStore};
use cordon_evm::EvmRpcClient;
use cordon_policy::ledger::{ApprovalLedger as _, KvApprovalLedger};
use cordon_policy::types::ApprovalRecord;
use cordon_policy::PolicySettings;
use cordon_solana::{SolanaRpcClient, SolanaTransferBuilder};
use cordon_swap::{BroadcastEngine, JupiterClient, PumpClient};
use cordon_vault::{SecretStore, Vault, WalletRecord};
use serde_json::Value;

use crate::app_state;
use crate::collaborators::Collaborators;
use crate::config::CoreConfig;

pub struct CordonCore {
    pub(crate) app_store: &'static dyn KvStore,
    pub(crate) vault: Vault<'static>,
    pub(crate) ledger: KvApprovalLedger<'static>,
    pub(crate) tokens: cordon_chain::token_registry::TokenRegistry<'static>,
    pub(crate) chains: ChainRegistry,
    pub(crate) evm_rpc: HashMap<EvmChainId, Box<dyn EvmRpcClient>>,
    pub(crate) solana_rpc: Box<dyn SolanaRpcClient>,
    pub(crate) solana_transfers: Box<dyn SolanaTransferBuilder>,
    pub(crate) jupiter: Box<dyn JupiterClient>,
    pub(crate) pump: Box<dyn PumpClient>,
    pub(crate) broadcast: BroadcastEngine,
    pub(crate) confirmation_ui: Box<dyn ConfirmationUi>,
    pub(crate) auth_guard: AuthGuard,
    pub(crate) sessions: SessionStore,
    pub(crate) config: CoreConfig,
}

impl CordonCore {
    /// `secret_store`/`app_store` are consumed and leaked for `'static`
    /// (see module docs); everything else is taken by value from
    /// `collaborators` so the caller doesn't keep a second handle to state
    /// this now owns.
    pub fn new(
        secret_store: SecretStore,
        app_store: Box<dyn KvStore>,
        config: CoreConfig,
        collaborators: Collaborators,
    ) -> anyhow::Result<Self> {
        let secret_store: &'static SecretStore = Box::leak(Box::new(secret_store));
        let app_store: &'static dyn KvStore = Box::leak(app_store);

        let vault = Vault::new(secret_store, app_store);
        let ledger = KvApprovalLedger::new(app_store);
        let tokens = cordon_chain::token_registry::TokenRegistry::new(app_store);
        let chains = ChainRegistry::new(&config.evm_rpc);

        let Collaborators {
            evm_rpc,
            solana_rpc,
            solana_transfers,
            jupiter,
            pump,
            broadcast_transport,
            confirmation_ui,
        } = collaborators;

        let broadcast = BroadcastEngine::new(broadcast_transport, config.broadcast.endpoints());

        Ok(Self {
            app_store,
            vault,
            ledger,
            tokens,
            chains,
            evm_rpc,
            solana_rpc,
            solana_transfers,
            jupiter,
            pump,
            broadcast,
            confirmation_ui,
            auth_guard: AuthGuard::new(),
            sessions: SessionStore::new(),
            config,
        })
    }

    // --- chain registry --- //

    pub fn supported_evm_chains(&self) -> &[ChainConfig] {
        self.chains.all()
    }

    pub fn chain_registry(&self) -> &ChainRegistry {
        &self.chains
    }

    // --- wallet lifecycle (spec §4.B), delegated straight to cordon-vault --- //

    pub async fn is_unlocked(&self) -> bool {
        self.vault.is_unlocked().await
    }

    pub fn list_wallets(&self) -> CoreResult<Vec<WalletRecord>> {
        self.vault.list_wallets()
    }

    pub fn active_wallet_id(&self) -> CoreResult<Option<String>> {
        self.vault.active_wallet_id()
    }

    pub async fn create_vault(
        &self,
        mnemonic: &cordon_crypto::mnemonic::MnemonicPhrase,
        name: &str,
        pin: &str,
        rng: &mut impl rand_core::RngCore,
    ) -> CoreResult<WalletRecord> {
        self.vault.create_vault(mnemonic, name, pin, rng).await
    }

    pub async fn unlock(&self, pin: &str) -> CoreResult<bool> {
        self.vault.unlock(pin).await
    }

    pub async fn lock(&self) {
        self.vault.lock().await
    }

    pub async fn add_wallet(
        &self,
        mnemonic: &cordon_crypto::mnemonic::MnemonicPhrase,
        name: &str,
        pin: &str,
        rng: &mut impl rand_core::RngCore,
    ) -> CoreResult<WalletRecord> {
        self.vault.add_wallet(mnemonic, name, pin, rng).await
    }

    pub async fn get_mnemonic(&self, wallet_id: &str) -> CoreResult<String> {
        self.vault.get_mnemonic(wallet_id).await
    }

    pub async fn delete_vault(&self) -> CoreResult<()> {
        self.vault.delete_vault().await
    }

    pub fn check_pin_hash(&self, pin: &str) -> CoreResult<bool> {
        self.vault.check_pin_hash(pin)
    }

    // --- approval ledger (spec §4.E), delegated to cordon-policy --- //

    pub fn save_approval(&self, record: ApprovalRecord) -> std::io::Result<()> {
        self.ledger.save_approval(record)
    }

    pub fn get_approval(&self, approval_id: &str) -> std::io::Result<Option<ApprovalRecord>> {
        self.ledger.get(approval_id)
    }

    pub fn update_approval_by_id(
        &self,
        approval_id: &str,
        mutate: &mut dyn FnMut(&mut ApprovalRecord),
    ) -> std::io::Result<Option<ApprovalRecord>> {
        self.ledger.update_approval_by_id(approval_id, mutate)
    }

    pub fn list_approvals_for_owner(
        &self,
        owner: &str,
        chain_id: EvmChainId,
    ) -> std::io::Result<Vec<ApprovalRecord>> {
        self.ledger.list_for_owner(owner, chain_id)
    }

    // --- hidden/custom token bookkeeping, delegated to cordon-chain --- //

    pub fn hide_token(&self, chain_id: EvmChainId, address: &cordon_chain::EvmAddress) -> std::io::Result<()> {
        self.tokens.hide_token(chain_id, address)
    }

    pub fn unhide_token(&self, chain_id: EvmChainId, address: &cordon_chain::EvmAddress) -> std::io::Result<()> {
        self.tokens.unhide_token(chain_id, address)
    }

    pub fn is_token_hidden(&self, chain_id: EvmChainId, address: &cordon_chain::EvmAddress) -> std::io::Result<bool> {
        self.tokens.is_hidden(chain_id, address)
    }

    pub fn add_custom_token(&self, token: cordon_chain::token_registry::CustomToken) -> std::io::Result<()> {
        self.tokens.add_custom_token(token)
    }

    pub fn remove_custom_token(&self, chain_id: EvmChainId, address: &cordon_chain::EvmAddress) -> std::io::Result<()> {
        self.tokens.remove_custom_token(chain_id, address)
    }

    pub fn list_custom_tokens(&self) -> std::io::Result<Vec<cordon_chain::token_registry::CustomToken>> {
        self.tokens.list_custom_tokens()
    }

    /// On-chain refresh for one owner's approvals on one chain (spec
    /// §4.E); `fetch_allowance`/`fetch_metadata` are thin closures over the
    /// embedding UI's RPC/metadata collaborators, since this crate has no
    /// generic "read an ERC-20 allowance" primitive of its own beyond what
    /// `cordon-evm`'s per-chain signer already wraps.
    pub fn refresh_approvals(
        &self,
        owner: &str,
        chain_id: EvmChainId,
        now_ms: u64,
        fetch_allowance: impl FnMut(&str, &str) -> Option<num_bigint::BigUint>,
        fetch_metadata: impl FnMut(&str) -> Option<cordon_policy::types::TokenMetadata>,
    ) -> std::io::Result<Vec<(ApprovalRecord, cordon_policy::types::RiskLevel)>> {
        self.ledger.refresh_owner_chain(owner, chain_id, now_ms, fetch_allowance, fetch_metadata)
    }

    // --- app-level persisted state (spec §6) --- //

    pub fn get_bundles(&self) -> CoreResult<Value> {
        app_state::get_bundles(self.app_store)
    }

    pub fn set_bundles(&self, bundles: &Value) -> CoreResult<()> {
        app_state::set_bundles(self.app_store, bundles)
    }

    pub fn get_policy_settings(&self) -> CoreResult<PolicySettings> {
        app_state::get_policy_settings(self.app_store)
    }

    pub fn set_policy_settings(&self, settings: &PolicySettings) -> CoreResult<()> {
        app_state::set_policy_settings(self.app_store, settings)
    }

    pub fn get_selected_network(&self) -> CoreResult<Option<Chain>> {
        app_state::get_selected_network(self.app_store)
    }

    pub fn set_selected_network(&self, chain: Chain) -> CoreResult<()> {
        app_state::set_selected_network(self.app_store, chain)
    }

    pub fn get_security_scan(&self, mint: &str) -> CoreResult<Option<Value>> {
        app_state::get_security_scan(self.app_store, mint)
    }

    pub fn set_security_scan(&self, mint: &str, data: Value) -> CoreResult<()> {
        app_state::set_security_scan(self.app_store, mint, data)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }
}
