//! WalletConnect glue (spec §4.J): builds the response namespace for a
//! session proposal, and parses incoming WalletConnect requests into the
//! same `(type, rest)` shape the dApp bridge dispatches on, so both front
//! doors share one gate implementation.

use cordon_chain::config::{ChainRegistry, EvmChainId};
use dashmap::DashMap;
use serde_json::{json, Value};

use crate::bridge::Bridge;
use crate::error::BridgeError;

const EVM_METHODS: &[&str] = &["eth_sendTransaction", "personal_sign", "eth_sign", "eth_signTypedData", "eth_signTypedData_v4"];
const SOLANA_METHODS: &[&str] = &["solana_signMessage", "solana_signTransaction", "solana_signAllTransactions"];
const EVM_EVENTS: &[&str] = &["chainChanged", "accountsChanged"];

/// CAIP-2-shaped Solana mainnet identifier, the form WalletConnect
/// namespaces key chains by.
const SOLANA_MAINNET_CAIP2: &str = "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp";

pub struct SessionProposal {
    pub requested_evm_chain_ids: Vec<EvmChainId>,
    pub solana_requested: bool,
}

/// Synthesizes the response namespace (spec §4.J): every supported EVM
/// chain the wallet holds the same address on, plus Solana mainnet only if
/// both requested and available. A Solana request with no Solana wallet
/// configured is rejected outright rather than silently dropped.
pub fn build_namespaces(
    proposal: &SessionProposal,
    chains: &ChainRegistry,
    evm_address: &str,
    solana_address: Option<&str>,
) -> Result<Value, BridgeError> {
    if proposal.solana_requested && solana_address.is_none() {
        return Err(BridgeError::MalformedRequest(
            "session requires Solana but no Solana wallet is configured".to_string(),
        ));
    }

    let evm_chain_ids: Vec<EvmChainId> = proposal
        .requested_evm_chain_ids
        .iter()
        .copied()
        .filter(|id| chains.is_supported(*id))
        .collect();

    let eip155_chains: Vec<String> = evm_chain_ids.iter().map(|id| format!("eip155:{id}")).collect();
    let eip155_accounts: Vec<String> = evm_chain_ids.iter().map(|id| format!("eip155:{id}:{evm_address}")).collect();

    let mut namespaces = json!({
        "eip155": {
            "chains": eip155_chains,
            "methods": EVM_METHODS,
            "events": EVM_EVENTS,
            "accounts": eip155_accounts,
        }
    });

    if proposal.solana_requested {
        let solana_address = solana_address.expect("checked above");
        namespaces["solana"] = json!({
            "chains": [SOLANA_MAINNET_CAIP2],
            "methods": SOLANA_METHODS,
            "events": [],
            "accounts": [format!("{SOLANA_MAINNET_CAIP2}:{solana_address}")],
        });
    }

    Ok(namespaces)
}

/// What a session proposal was approved for, recorded once
/// [`build_namespaces`] has run so later requests on the same pairing can be
/// checked against what the dApp actually asked for and was granted rather
/// than trusting whatever `chainId` a request claims.
#[derive(Clone, Debug)]
pub struct SessionNamespaces {
    pub wallet_id: String,
    pub evm_chain_ids: Vec<EvmChainId>,
    pub solana_granted: bool,
}

/// Active WalletConnect pairings, keyed by session topic. In-memory only —
/// a pairing doesn't survive a process restart, matching the teacher's
/// treatment of its own in-memory NWC/LSP connection tables as
/// process-lifetime state rather than persisted storage.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionNamespaces>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self { sessions: DashMap::new() }
    }

    pub fn insert(&self, topic: impl Into<String>, namespaces: SessionNamespaces) {
        self.sessions.insert(topic.into(), namespaces);
    }

    pub fn remove(&self, topic: &str) {
        self.sessions.remove(topic);
    }

    pub fn get(&self, topic: &str) -> Option<SessionNamespaces> {
        self.sessions.get(topic).map(|entry| entry.value().clone())
    }
}

/// A parsed WalletConnect request, routed through [`Bridge::dispatch`] the
/// same way a dApp bridge request is, once translated into its `rest` JSON
/// shape. `wallet_id`/`chain_id`/`origin` come from the WalletConnect
/// session, not the request payload itself — unlike the dApp bridge, a
/// WalletConnect request carries no `walletId` of its own.
pub async fn handle_request(
    bridge: &Bridge<'_>,
    wallet_id: &str,
    chain_id: EvmChainId,
    origin: &str,
    method: &str,
    params: &Value,
) -> Result<Value, BridgeError> {
    match method {
        "eth_sendTransaction" => {
            let tx = params.get(0).cloned().unwrap_or(Value::Null);
            let rest = json!({
                "walletId": wallet_id,
                "chainId": chain_id,
                "to": tx.get("to"),
                "value": tx.get("value").and_then(Value::as_str).unwrap_or("0"),
                "data": tx.get("data").and_then(Value::as_str).unwrap_or("0x"),
                "gasLimit": tx.get("gas").and_then(Value::as_str).and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok()),
                "origin": origin,
            });
            bridge.dispatch("evm_sendTransaction", &rest).await
        }
        "personal_sign" => {
            let message = params.get(0).and_then(Value::as_str).unwrap_or_default();
            let rest = json!({ "walletId": wallet_id, "message": message, "origin": origin });
            bridge.dispatch("evm_signMessage", &rest).await
        }
        "eth_sign" => {
            let message = params.get(1).and_then(Value::as_str).unwrap_or_default();
            let rest = json!({ "walletId": wallet_id, "message": message, "origin": origin });
            bridge.dispatch("evm_signMessage", &rest).await
        }
        "eth_signTypedData" | "eth_signTypedData_v4" => {
            let typed_data = params
                .get(1)
                .and_then(|v| {
                    v.as_str()
                        .and_then(|s| serde_json::from_str::<Value>(s).ok())
                        .or_else(|| Some(v.clone()))
                })
                .unwrap_or(Value::Null);
            let rest = json!({ "walletId": wallet_id, "typedData": typed_data, "origin": origin });
            bridge.dispatch("evm_signTypedData", &rest).await
        }
        "solana_signMessage" => {
            let message = params.get("message").and_then(Value::as_str).unwrap_or_default();
            let rest = json!({ "walletId": wallet_id, "message": message, "origin": origin });
            bridge.dispatch("solana_signMessage", &rest).await
        }
        "solana_signTransaction" => {
            let transaction = params.get("transaction").and_then(Value::as_str).unwrap_or_default();
            let rest = json!({ "walletId": wallet_id, "transaction": transaction, "origin": origin, "send": false });
            bridge.dispatch("solana_signTransaction", &rest).await
        }
        "solana_signAllTransactions" => {
            let transactions: Vec<String> = params
                .get("transactions")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default();
            let signed = bridge.solana_sign_all_transactions(wallet_id, &transactions, origin).await?;
            Ok(json!({ "transactions": signed }))
        }
        other => Err(BridgeError::UnknownType(format!("Method not supported: {other}"))),
    }
}

/// Checks a request's declared chain against what the session was actually
/// granted before dispatching, since nothing upstream of this call
/// otherwise stops a dApp from asking for a chain it never requested (and
/// was never shown to the user) during pairing.
pub async fn handle_request_for_session(
    bridge: &Bridge<'_>,
    sessions: &SessionStore,
    topic: &str,
    chain_id: Option<EvmChainId>,
    origin: &str,
    method: &str,
    params: &Value,
) -> Result<Value, BridgeError> {
    let session = sessions
        .get(topic)
        .ok_or_else(|| BridgeError::MalformedRequest(format!("no active session for topic {topic}")))?;

    let is_solana_method = matches!(
        method,
        "solana_signMessage" | "solana_signTransaction" | "solana_signAllTransactions"
    );
    if is_solana_method {
        if !session.solana_granted {
            return Err(BridgeError::MalformedRequest(
                "session was not granted a Solana namespace".to_string(),
            ));
        }
        return handle_request(bridge, &session.wallet_id, 0, origin, method, params).await;
    }

    let chain_id = chain_id.ok_or_else(|| {
        BridgeError::MalformedRequest("EVM request is missing a chainId".to_string())
    })?;
    if !session.evm_chain_ids.contains(&chain_id) {
        return Err(BridgeError::MalformedRequest(format!(
            "session was not granted chain {chain_id}"
        )));
    }
    handle_request(bridge, &session.wallet_id, chain_id, origin, method, params).await
}
