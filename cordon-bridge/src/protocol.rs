//! The dApp bridge wire protocol (spec §4.I): a single JSON string channel
//! carrying `{type, requestId, …}` in, and `{requestId, result}` or
//! `{requestId, error}` out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BridgeError;

/// First-pass parse: every request carries these two fields regardless of
/// `type`; the rest is parsed per-type once the type is known.
#[derive(Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub request_type: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(flatten)]
    pub rest: Value,
}

pub fn parse_envelope(raw: &str) -> Result<Envelope, BridgeError> {
    serde_json::from_str(raw).map_err(|e| BridgeError::MalformedRequest(e.to_string()))
}

pub fn parse_payload<T: for<'de> Deserialize<'de>>(rest: &Value) -> Result<T, BridgeError> {
    serde_json::from_value(rest.clone()).map_err(|e| BridgeError::MalformedRequest(e.to_string()))
}

#[derive(Deserialize)]
pub struct GetWalletAddressPayload {
    #[serde(rename = "walletId")]
    pub wallet_id: String,
    pub chain: ChainKind,
}

#[derive(Copy, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    Evm,
    Solana,
}

#[derive(Deserialize)]
pub struct OriginPayload {
    #[serde(rename = "walletId")]
    pub wallet_id: String,
    pub origin: String,
}

#[derive(Deserialize)]
pub struct SolanaSignMessagePayload {
    #[serde(rename = "walletId")]
    pub wallet_id: String,
    pub message: String,
    pub origin: String,
}

#[derive(Deserialize)]
pub struct SolanaSignTransactionPayload {
    #[serde(rename = "walletId")]
    pub wallet_id: String,
    pub transaction: String,
    pub origin: String,
    /// `true` for `solana_signAndSend`, `false` for `solana_signTransaction`
    /// — the two share one gate per spec §4.I's combined table row.
    #[serde(default)]
    pub send: bool,
}

#[derive(Deserialize)]
pub struct EvmConnectPayload {
    #[serde(rename = "walletId")]
    pub wallet_id: String,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    pub origin: String,
}

#[derive(Deserialize)]
pub struct EvmSignMessagePayload {
    #[serde(rename = "walletId")]
    pub wallet_id: String,
    pub message: String,
    pub origin: String,
}

#[derive(Deserialize)]
pub struct EvmSendTransactionPayload {
    #[serde(rename = "walletId")]
    pub wallet_id: String,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
    pub to: Option<String>,
    #[serde(default = "default_value")]
    pub value: String,
    #[serde(default = "default_data")]
    pub data: String,
    #[serde(rename = "gasLimit")]
    pub gas_limit: Option<u64>,
    /// Decimals of the token this call moves, when known to the caller
    /// (e.g. read from the token list the UI already has loaded). Falls
    /// back to 18 — the ERC-20 convention — when absent, since the bridge
    /// has no token registry lookup of its own.
    #[serde(rename = "tokenDecimals")]
    pub token_decimals: Option<u8>,
    pub origin: String,
}

fn default_value() -> String {
    "0".to_string()
}

fn default_data() -> String {
    "0x".to_string()
}

#[derive(Deserialize)]
pub struct EvmSignTypedDataPayload {
    #[serde(rename = "walletId")]
    pub wallet_id: String,
    #[serde(rename = "typedData")]
    pub typed_data: Value,
    pub origin: String,
}

#[derive(Deserialize)]
pub struct EvmSwitchChainPayload {
    #[serde(rename = "chainId")]
    pub chain_id: u64,
}

#[derive(Serialize)]
pub struct WireError {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct BridgeResponse {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl BridgeResponse {
    pub fn ok(request_id: String, result: Value) -> Self {
        Self { request_id, result: Some(result), error: None }
    }

    pub fn err(request_id: String, err: &BridgeError) -> Self {
        Self {
            request_id,
            result: None,
            error: Some(WireError { code: err.code().as_str().to_string(), message: err.to_string() }),
        }
    }
}
