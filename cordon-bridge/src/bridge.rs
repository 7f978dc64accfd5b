//! The dApp bridge (spec §4.I): parses `{type, requestId, …}`, runs the
//! per-method authorization gate, and always answers with either a result
//! or an error referencing the same `requestId` — modeled on the way the
//! teacher's `handle_nwc_request` routes a tagged request to its handler
//! and always produces a `Result` keyed by the caller's envelope.

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cordon_chain::config::{ChainRegistry, EvmChainId};
use cordon_chain::{ApprovalPolicyError, CoreError};
use cordon_evm::signer::EvmSigner;
use cordon_policy::policy::check_approval_policy;
use cordon_policy::types::{DetectedApproval, PolicySettings};
use cordon_solana::signer::SolanaSigner;
use num_bigint::BigUint;
use serde_json::{json, Value};

use crate::confirm::{AuthGuard, ConfirmationPrompt, ConfirmationUi};
use crate::error::BridgeError;
use crate::protocol::{
    self, BridgeResponse, ChainKind, EvmConnectPayload, EvmSendTransactionPayload, EvmSignMessagePayload,
    EvmSignTypedDataPayload, EvmSwitchChainPayload, GetWalletAddressPayload, OriginPayload,
    SolanaSignMessagePayload, SolanaSignTransactionPayload,
};

const DRAINER_BLOCKED_MESSAGE: &str = "Transaction blocked: Wallet drainer detected";

pub struct Bridge<'a> {
    evm: &'a EvmSigner<'a>,
    solana: &'a SolanaSigner<'a>,
    chains: &'a ChainRegistry,
    policy: &'a PolicySettings,
    ui: &'a dyn ConfirmationUi,
    auth: &'a AuthGuard,
}

impl<'a> Bridge<'a> {
    /// `auth` is owned by the caller rather than by `Bridge` itself, since a
    /// long-lived embedder constructs a fresh `Bridge` facade per request
    /// (to pick the right chain-specific collaborators) while the "only one
    /// active confirmation UI" rule (spec §5) must hold across every such
    /// facade, not reset with each one.
    pub fn new(
        evm: &'a EvmSigner<'a>,
        solana: &'a SolanaSigner<'a>,
        chains: &'a ChainRegistry,
        policy: &'a PolicySettings,
        ui: &'a dyn ConfirmationUi,
        auth: &'a AuthGuard,
    ) -> Self {
        Self { evm, solana, chains, policy, ui, auth }
    }

    /// Entry point: always returns a response, never propagates an error,
    /// since every path back to the content window must reference a
    /// `requestId` (spec §4.I: "The core MUST answer every request with
    /// either a result or an error").
    pub async fn handle(&self, raw: &str) -> BridgeResponse {
        let envelope = match protocol::parse_envelope(raw) {
            Ok(e) => e,
            Err(e) => return BridgeResponse::err(String::new(), &e),
        };
        let request_id = envelope.request_id.clone();
        match self.dispatch(&envelope.request_type, &envelope.rest).await {
            Ok(result) => BridgeResponse::ok(request_id, result),
            Err(e) => {
                tracing::warn!(request_type = %envelope.request_type, error = %e, "bridge request rejected");
                BridgeResponse::err(request_id, &e)
            }
        }
    }

    /// Shared with the WalletConnect glue (spec §4.J), which parses a
    /// different wire shape into the same `(type, rest)` pair and routes
    /// through here so both front doors run the identical gate logic.
    pub(crate) async fn dispatch(&self, request_type: &str, rest: &Value) -> Result<Value, BridgeError> {
        match request_type {
            "getWalletAddress" => self.get_wallet_address(rest).await,
            "solana_connect" => self.solana_connect(rest).await,
            "solana_signMessage" => self.solana_sign_message(rest).await,
            "solana_signTransaction" | "solana_signAndSend" => self.solana_sign_transaction(rest).await,
            "evm_connect" => self.evm_connect(rest).await,
            "evm_signMessage" => self.evm_sign_message(rest).await,
            "evm_sendTransaction" => self.evm_send_transaction(rest).await,
            "evm_signTypedData" => self.evm_sign_typed_data(rest).await,
            "evm_switchChain" => self.evm_switch_chain(rest).await,
            other => Err(BridgeError::UnknownType(format!("Method not supported: {other}"))),
        }
    }

    async fn confirm(&self, title: &str, detail: &str, origin: &str) -> Result<(), BridgeError> {
        let _handle = self.auth.try_acquire()?;
        let approved = self
            .ui
            .confirm(ConfirmationPrompt {
                title: title.to_string(),
                detail: detail.to_string(),
                origin: origin.to_string(),
            })
            .await;
        if approved {
            Ok(())
        } else {
            Err(BridgeError::Core(CoreError::UserRejected))
        }
    }

    async fn get_wallet_address(&self, rest: &Value) -> Result<Value, BridgeError> {
        let payload: GetWalletAddressPayload = protocol::parse_payload(rest)?;
        let address = match payload.chain {
            ChainKind::Evm => self.evm.address(&payload.wallet_id).await?,
            ChainKind::Solana => self.solana.address(&payload.wallet_id).await?,
        };
        Ok(json!({ "address": address }))
    }

    async fn solana_connect(&self, rest: &Value) -> Result<Value, BridgeError> {
        let payload: OriginPayload = protocol::parse_payload(rest)?;
        self.confirm(
            "Connect wallet",
            &format!("Connect wallet from {}?", payload.origin),
            &payload.origin,
        )
        .await?;
        let public_key = self.solana.address(&payload.wallet_id).await?;
        Ok(json!({ "publicKey": public_key }))
    }

    async fn solana_sign_message(&self, rest: &Value) -> Result<Value, BridgeError> {
        let payload: SolanaSignMessagePayload = protocol::parse_payload(rest)?;
        let preview: String = payload.message.chars().take(100).collect();
        self.confirm("Sign message", &preview, &payload.origin).await?;
        let signature = self.solana.sign_message(&payload.wallet_id, &payload.message).await?;
        let public_key = self.solana.address(&payload.wallet_id).await?;
        Ok(json!({ "signature": signature, "publicKey": public_key }))
    }

    async fn solana_sign_transaction(&self, rest: &Value) -> Result<Value, BridgeError> {
        let payload: SolanaSignTransactionPayload = protocol::parse_payload(rest)?;
        // The drainer decoder runs before the confirmation UI is ever
        // shown; a blocked transaction never reaches the user (spec §4.I).
        if let Err(e) = self.solana.scan_transaction(&payload.wallet_id, &payload.transaction).await {
            if matches!(&e, CoreError::DrainerBlocked(_)) {
                return Err(BridgeError::MalformedRequest(DRAINER_BLOCKED_MESSAGE.to_string()));
            }
            return Err(BridgeError::Core(e));
        }
        self.confirm("Approve transaction", "Review and approve this transaction", &payload.origin).await?;
        let signed = self.solana.sign_transaction(&payload.wallet_id, &payload.transaction).await?;
        if payload.send {
            let raw = BASE64
                .decode(&signed)
                .map_err(|e| BridgeError::MalformedRequest(format!("signed transaction is not valid base64: {e}")))?;
            let signature = self.solana.send_raw_transaction(&raw).await?;
            Ok(json!({ "signature": signature }))
        } else {
            Ok(json!({ "signedTransaction": signed }))
        }
    }

    /// `solana_signAllTransactions`, only reachable through WalletConnect
    /// (spec §4.J lists it in the Solana method set; the dApp bridge's own
    /// table in §4.I doesn't). Every transaction is scanned before any of
    /// them is shown to the user, so one malicious transaction in the batch
    /// blocks the whole batch rather than signing the others first.
    pub(crate) async fn solana_sign_all_transactions(
        &self,
        wallet_id: &str,
        transactions: &[String],
        origin: &str,
    ) -> Result<Vec<String>, BridgeError> {
        for tx in transactions {
            if let Err(e) = self.solana.scan_transaction(wallet_id, tx).await {
                if matches!(&e, CoreError::DrainerBlocked(_)) {
                    return Err(BridgeError::MalformedRequest(DRAINER_BLOCKED_MESSAGE.to_string()));
                }
                return Err(BridgeError::Core(e));
            }
        }
        self.confirm(
            "Approve transactions",
            &format!("Review and approve {} transactions", transactions.len()),
            origin,
        )
        .await?;
        let mut signed = Vec::with_capacity(transactions.len());
        for tx in transactions {
            signed.push(self.solana.sign_transaction(wallet_id, tx).await?);
        }
        Ok(signed)
    }

    async fn evm_connect(&self, rest: &Value) -> Result<Value, BridgeError> {
        let payload: EvmConnectPayload = protocol::parse_payload(rest)?;
        self.confirm(
            "Connect wallet",
            &format!("Connect wallet from {}?", payload.origin),
            &payload.origin,
        )
        .await?;
        let address = self.evm.address(&payload.wallet_id).await?;
        Ok(json!({ "accounts": [address], "chainId": payload.chain_id }))
    }

    async fn evm_sign_message(&self, rest: &Value) -> Result<Value, BridgeError> {
        let payload: EvmSignMessagePayload = protocol::parse_payload(rest)?;
        let detail = match payload.message.strip_prefix("0x") {
            Some(hex_body) => match hex::decode(hex_body) {
                Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| payload.message.clone()),
                Err(_) => payload.message.clone(),
            },
            None => payload.message.clone(),
        };
        self.confirm("Sign message", &detail, &payload.origin).await?;
        let signed = self.evm.sign_personal_message(&payload.wallet_id, &payload.message).await?;
        Ok(json!(signed.signature))
    }

    async fn evm_send_transaction(&self, rest: &Value) -> Result<Value, BridgeError> {
        let payload: EvmSendTransactionPayload = protocol::parse_payload(rest)?;
        let data = hex::decode(payload.data.strip_prefix("0x").unwrap_or(&payload.data))
            .map_err(|e| BridgeError::MalformedRequest(format!("invalid calldata hex: {e}")))?;

        if let Some(detected) = cordon_policy::intent::detect_approve_intent(&data) {
            let token_address = payload.to.clone().unwrap_or_default();
            let detected = DetectedApproval { token_address, ..detected };
            let decimals = payload.token_decimals.unwrap_or(18);
            let check = check_approval_policy(&detected, self.policy, decimals);
            if !check.allowed {
                return Err(BridgeError::Core(CoreError::ApprovalBlocked(ApprovalPolicyError {
                    reason: check.reason.unwrap_or_else(|| "approval blocked by policy".to_string()),
                    suggested_cap: check.suggested_cap,
                    suggested_cap_formatted: check.suggested_cap_formatted,
                })));
            }
        }

        self.confirm("Approve transaction", "Review and approve this transaction", &payload.origin).await?;

        let to = match &payload.to {
            Some(addr) => Some(parse_evm_address(addr)?),
            None => None,
        };
        let value = BigUint::from_str(&payload.value)
            .map_err(|e| BridgeError::MalformedRequest(format!("invalid value: {e}")))?;
        let chain_id: EvmChainId = payload.chain_id;

        let result = self
            .evm
            .send_raw_transaction(&payload.wallet_id, chain_id, to, value, data, payload.gas_limit)
            .await?;
        Ok(json!({ "hash": result.hash }))
    }

    async fn evm_sign_typed_data(&self, rest: &Value) -> Result<Value, BridgeError> {
        let payload: EvmSignTypedDataPayload = protocol::parse_payload(rest)?;
        let domain_name = payload.typed_data.get("domain").and_then(|d| d.get("name")).and_then(|n| n.as_str());
        let detail = match domain_name {
            Some(name) => format!("Sign typed data for {name}"),
            None => "Sign typed data".to_string(),
        };
        self.confirm("Sign typed data", &detail, &payload.origin).await?;
        let (signed, _summary) = self.evm.sign_typed_data(&payload.wallet_id, &payload.typed_data).await?;
        Ok(json!(signed.signature))
    }

    async fn evm_switch_chain(&self, rest: &Value) -> Result<Value, BridgeError> {
        let payload: EvmSwitchChainPayload = protocol::parse_payload(rest)?;
        if !self.chains.is_supported(payload.chain_id) {
            return Err(BridgeError::Core(CoreError::UnsupportedChain(payload.chain_id.to_string())));
        }
        Ok(json!({ "chainId": payload.chain_id }))
    }
}

pub(crate) fn parse_evm_address(s: &str) -> Result<[u8; 20], BridgeError> {
    cordon_chain::EvmAddress::parse(s).map(|a| a.0).map_err(BridgeError::Core)
}
