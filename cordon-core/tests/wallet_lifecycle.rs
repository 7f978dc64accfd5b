//! End-to-end coverage over a fully wired `CordonCore`: wallet creation,
//! an EVM native send, and the dApp-bridge/WalletConnect gate paths that
//! `cordon-bridge`'s own test module defers here (its
//! `handle_request_for_session` chain/namespace validation needs a real
//! signer behind the bridge to exercise end-to-end).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cordon_bridge::{ConfirmationPrompt, ConfirmationUi, SessionProposal};
use cordon_chain::config::{EvmChainId, EvmRpcUrls, ETHEREUM_MAINNET, POLYGON_MAINNET};
use cordon_chain::kv_store::MemoryKvStore;
use cordon_core::config::{BroadcastConfig, CoreConfig};
use cordon_core::{Collaborators, CordonCore};
use cordon_crypto::mnemonic::MnemonicPhrase;
use cordon_evm::rpc::{EvmCallRequest, EvmRpcClient, FeeSample};
use cordon_evm::error::EvmError;
use cordon_solana::rpc::{SolanaRpcClient, SolanaTransferBuilder, UnsignedTransfer};
use cordon_solana::error::SolanaError;
use cordon_swap::{BroadcastTransport, JupiterClient, PumpClient, RawQuote, SignatureStatus, SwapError};
use cordon_vault::SecretStore;
use num_bigint::BigUint;
use serde_json::Value;

struct AutoApproveUi;

#[async_trait]
impl ConfirmationUi for AutoApproveUi {
    async fn confirm(&self, _prompt: ConfirmationPrompt) -> bool {
        true
    }
}

struct RejectUi;

#[async_trait]
impl ConfirmationUi for RejectUi {
    async fn confirm(&self, _prompt: ConfirmationPrompt) -> bool {
        false
    }
}

struct MockEvmRpc {
    sent: AtomicBool,
}

#[async_trait]
impl EvmRpcClient for MockEvmRpc {
    async fn chain_id(&self) -> Result<u64, EvmError> {
        Ok(1)
    }
    async fn get_transaction_count(&self, _address: &[u8; 20]) -> Result<u64, EvmError> {
        Ok(0)
    }
    async fn get_balance(&self, _address: &[u8; 20]) -> Result<BigUint, EvmError> {
        Ok(BigUint::from(10_000_000_000_000_000u64))
    }
    async fn estimate_gas(&self, _call: &EvmCallRequest) -> Result<u64, EvmError> {
        Ok(21_000)
    }
    async fn sample_fees(&self) -> Result<FeeSample, EvmError> {
        Ok(FeeSample {
            max_fee_per_gas: BigUint::from(30_000_000_000u64),
            max_priority_fee_per_gas: Some(BigUint::from(1_000_000_000u64)),
            gas_price: BigUint::from(30_000_000_000u64),
        })
    }
    async fn send_raw_transaction(&self, _raw: &[u8]) -> Result<[u8; 32], EvmError> {
        self.sent.store(true, Ordering::SeqCst);
        Ok([9u8; 32])
    }
    async fn call(&self, _call: &EvmCallRequest) -> Result<Vec<u8>, EvmError> {
        Ok(vec![])
    }
    async fn get_transaction_receipt(&self, _tx_hash: [u8; 32]) -> Result<Option<bool>, EvmError> {
        Ok(Some(true))
    }
}

struct MockSolanaRpc;

#[async_trait]
impl SolanaRpcClient for MockSolanaRpc {
    async fn send_raw_transaction(&self, _raw: &[u8]) -> Result<String, SolanaError> {
        Ok("sig".to_string())
    }
}

struct MockSolanaTransfers;

#[async_trait]
impl SolanaTransferBuilder for MockSolanaTransfers {
    async fn build_sol_transfer(&self, _from: &str, _to: &str, _lamports: u64) -> Result<UnsignedTransfer, SolanaError> {
        Ok(UnsignedTransfer { unsigned_tx: vec![1, 0, 0], signable_message: vec![0, 0] })
    }
    async fn build_spl_transfer(&self, _from: &str, _to: &str, _mint: &str, _amount: u64) -> Result<UnsignedTransfer, SolanaError> {
        Ok(UnsignedTransfer { unsigned_tx: vec![1, 0, 0], signable_message: vec![0, 0] })
    }
    async fn submit(&self, _signed_tx: &[u8]) -> Result<String, SolanaError> {
        Ok("sig".to_string())
    }
}

struct MockJupiter;

#[async_trait]
impl JupiterClient for MockJupiter {
    async fn quote(&self, _i: &str, _o: &str, amount: &BigUint, _s: u32) -> Result<RawQuote, SwapError> {
        Ok(RawQuote {
            out_amount: amount.clone(),
            price_impact_pct: "0.1".to_string(),
            route_plan: serde_json::json!([]),
            quote_response: serde_json::json!({}),
        })
    }
    async fn build_swap_transaction(&self, _swap_request: &Value) -> Result<Vec<u8>, SwapError> {
        Ok(vec![])
    }
}

struct MockPump;

#[async_trait]
impl PumpClient for MockPump {
    async fn is_on_bonding_curve(&self, _mint: &str) -> Result<bool, SwapError> {
        Ok(false)
    }
    async fn quote(&self, _i: &str, _o: &str, amount: &BigUint, _s: u32) -> Result<RawQuote, SwapError> {
        Ok(RawQuote {
            out_amount: amount.clone(),
            price_impact_pct: "0.1".to_string(),
            route_plan: serde_json::json!([]),
            quote_response: serde_json::json!({}),
        })
    }
    async fn build_swap_transaction(&self, _quote: &RawQuote) -> Result<Vec<u8>, SwapError> {
        Ok(vec![])
    }
}

struct MockBroadcastTransport;

#[async_trait]
impl BroadcastTransport for MockBroadcastTransport {
    async fn send_bundle(&self, _endpoint: &str, _signed_tx: &[u8], _tip_tx: Option<&[u8]>) -> Result<(), SwapError> {
        Ok(())
    }
    async fn send_transaction(&self, _endpoint: &str, _signed_tx: &[u8]) -> Result<(), SwapError> {
        Ok(())
    }
    async fn get_signature_status(&self, _endpoint: &str, _signature: &str) -> Result<SignatureStatus, SwapError> {
        Ok(SignatureStatus { level: None, err: None })
    }
}

fn test_config() -> CoreConfig {
    CoreConfig {
        evm_rpc: EvmRpcUrls {
            ethereum: "https://eth.example".to_string(),
            polygon: "https://polygon.example".to_string(),
            bnb: "https://bnb.example".to_string(),
            arbitrum: "https://arbitrum.example".to_string(),
        },
        broadcast: BroadcastConfig {
            jito_bundle_urls: vec![],
            jito_send_transaction_url: "https://jito-send.example".to_string(),
            primary_rpc: "https://rpc1.example".to_string(),
            secondary_rpc: "https://rpc2.example".to_string(),
            broadcast_timeout_secs: 60,
        },
        keyring_service_name: "cordon-test".to_string(),
    }
}

fn build_core(ui: Box<dyn ConfirmationUi>) -> CordonCore {
    // `into_path()` hands ownership of the directory to `SecretStore`
    // rather than deleting it when this function returns; `CordonCore`
    // leaks its `SecretStore` for the process lifetime anyway (see
    // `core.rs`), so the directory would otherwise outlive anything that
    // could clean it up.
    let secret_store = SecretStore::file(tempfile::tempdir().unwrap().into_path());
    let app_store: Box<dyn cordon_chain::KvStore> = Box::new(MemoryKvStore::new());

    let mut evm_rpc: HashMap<EvmChainId, Box<dyn EvmRpcClient>> = HashMap::new();
    evm_rpc.insert(ETHEREUM_MAINNET, Box::new(MockEvmRpc { sent: AtomicBool::new(false) }));
    evm_rpc.insert(POLYGON_MAINNET, Box::new(MockEvmRpc { sent: AtomicBool::new(false) }));

    let collaborators = Collaborators {
        evm_rpc,
        solana_rpc: Box::new(MockSolanaRpc),
        solana_transfers: Box::new(MockSolanaTransfers),
        jupiter: Box::new(MockJupiter),
        pump: Box::new(MockPump),
        broadcast_transport: Arc::new(MockBroadcastTransport),
        confirmation_ui: ui,
    };

    CordonCore::new(secret_store, app_store, test_config(), collaborators).unwrap()
}

async fn create_default_wallet(core: &CordonCore) -> String {
    let mut rng = rand::thread_rng();
    let mnemonic = MnemonicPhrase::generate(&mut rng);
    let record = core
        .create_vault(&mnemonic, "Main wallet", "000000", &mut rng)
        .await
        .unwrap();
    record.id
}

#[tokio::test]
async fn create_vault_unlocks_immediately_and_lists_the_wallet() {
    let core = build_core(Box::new(AutoApproveUi));
    assert!(!core.is_unlocked().await);
    let wallet_id = create_default_wallet(&core).await;
    assert!(core.is_unlocked().await);
    let wallets = core.list_wallets().unwrap();
    assert_eq!(wallets.len(), 1);
    assert_eq!(wallets[0].id, wallet_id);
    assert_eq!(core.active_wallet_id().unwrap(), Some(wallet_id));
}

#[tokio::test]
async fn lock_then_get_mnemonic_fails() {
    let core = build_core(Box::new(AutoApproveUi));
    let wallet_id = create_default_wallet(&core).await;
    core.lock().await;
    assert!(!core.is_unlocked().await);
    let err = core.get_mnemonic(&wallet_id).await.unwrap_err();
    assert!(matches!(err, cordon_chain::CoreError::WalletLocked));
}

#[tokio::test]
async fn evm_send_native_goes_through_the_right_chains_signer() {
    let core = build_core(Box::new(AutoApproveUi));
    let wallet_id = create_default_wallet(&core).await;
    let result = core
        .evm_send_native(&wallet_id, ETHEREUM_MAINNET, "0x1111111111111111111111111111111111111111", BigUint::from(1u64))
        .await
        .unwrap();
    assert_eq!(result.chain_id, ETHEREUM_MAINNET);
    assert!(result.explorer_url.contains("etherscan.io"));
}

#[tokio::test]
async fn evm_send_native_blocked_by_denylist() {
    let core = build_core(Box::new(AutoApproveUi));
    let wallet_id = create_default_wallet(&core).await;
    let denylisted = "0x2222222222222222222222222222222222222222".to_string();
    let mut settings = core.get_policy_settings().unwrap();
    settings.denylisted_addresses.push(denylisted.clone());
    core.set_policy_settings(&settings).unwrap();

    let err = core
        .evm_send_native(&wallet_id, ETHEREUM_MAINNET, &denylisted, BigUint::from(1u64))
        .await
        .unwrap_err();
    assert!(matches!(err, cordon_chain::CoreError::ApprovalBlocked(_)));
}

#[tokio::test]
async fn bridge_get_wallet_address_round_trips() {
    let core = build_core(Box::new(AutoApproveUi));
    let wallet_id = create_default_wallet(&core).await;
    let raw = format!(
        r#"{{"type":"getWalletAddress","requestId":"r1","walletId":"{wallet_id}","chain":"evm"}}"#
    );
    let response = core.handle_bridge_request(&raw).await.unwrap();
    assert_eq!(response.request_id, "r1");
    assert!(response.result.unwrap()["address"].as_str().unwrap().starts_with("0x"));
}

#[tokio::test]
async fn bridge_connect_request_is_rejected_when_ui_declines() {
    let core = build_core(Box::new(RejectUi));
    let wallet_id = create_default_wallet(&core).await;
    let raw = format!(
        r#"{{"type":"solana_connect","requestId":"r2","walletId":"{wallet_id}","origin":"https://dapp.example"}}"#
    );
    let response = core.handle_bridge_request(&raw).await.unwrap();
    assert!(response.result.is_none());
    assert_eq!(response.error.unwrap().code, "USER_REJECTED");
}

#[tokio::test]
async fn walletconnect_session_chain_validation_end_to_end() {
    let core = build_core(Box::new(AutoApproveUi));
    let wallet_id = create_default_wallet(&core).await;

    let proposal = SessionProposal { requested_evm_chain_ids: vec![ETHEREUM_MAINNET], solana_requested: false };
    core.wc_propose_session("topic-1", &wallet_id, proposal).await.unwrap();

    // Granted chain succeeds.
    let result = core
        .handle_walletconnect_request(
            "topic-1",
            Some(ETHEREUM_MAINNET),
            "https://dapp.example",
            "personal_sign",
            &serde_json::json!(["hello"]),
        )
        .await;
    assert!(result.is_ok());

    // A chain the session was never granted is rejected before it reaches
    // the signer.
    let result = core
        .handle_walletconnect_request(
            "topic-1",
            Some(POLYGON_MAINNET),
            "https://dapp.example",
            "personal_sign",
            &serde_json::json!(["hello"]),
        )
        .await;
    assert!(result.is_err());

    core.wc_disconnect("topic-1");
    let result = core
        .handle_walletconnect_request(
            "topic-1",
            Some(ETHEREUM_MAINNET),
            "https://dapp.example",
            "personal_sign",
            &serde_json::json!(["hello"]),
        )
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn solana_send_raw_transaction_round_trips_through_mock_rpc() {
    let core = build_core(Box::new(AutoApproveUi));
    let signature = core.solana_send_raw_transaction(&[0u8; 4]).await.unwrap();
    assert_eq!(signature, "sig");
}

