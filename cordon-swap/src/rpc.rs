//! Jupiter, Pump.fun/Pumpportal, Jito, and the Solana RPC nodes are all
//! external collaborators (spec §1). These traits name only the primitives
//! the router/broadcast engine need, grounded on `cordon_evm::rpc`'s and
//! `cordon_solana::rpc`'s narrow-trait seams.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SwapError;

/// A raw quote as returned by either route, before normalization.
#[derive(Clone, Debug)]
pub struct RawQuote {
    pub out_amount: num_bigint::BigUint,
    pub price_impact_pct: String,
    pub route_plan: Value,
    /// The provider's quote object, passed downstream byte-identical when
    /// building the swap transaction (spec §4.H SOL-output safety note).
    pub quote_response: Value,
}

#[async_trait]
pub trait JupiterClient: Send + Sync {
    async fn quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: &num_bigint::BigUint,
        slippage_bps: u32,
    ) -> Result<RawQuote, SwapError>;

    /// Builds the unsigned swap transaction from a (possibly mutated)
    /// quote response plus extra swap parameters; returns base64 tx bytes.
    async fn build_swap_transaction(&self, swap_request: &Value) -> Result<Vec<u8>, SwapError>;
}

#[async_trait]
pub trait PumpClient: Send + Sync {
    /// Whether the mint is still trading on the bonding curve (as opposed
    /// to having graduated to a regular DEX pool).
    async fn is_on_bonding_curve(&self, mint: &str) -> Result<bool, SwapError>;

    async fn quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: &num_bigint::BigUint,
        slippage_bps: u32,
    ) -> Result<RawQuote, SwapError>;

    async fn build_swap_transaction(&self, quote: &RawQuote) -> Result<Vec<u8>, SwapError>;
}

/// Confirmation level the network reports for a submitted signature,
/// ordered per spec §5's partial order `submitted ≤ processed ≤ confirmed
/// ≤ finalized`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum ConfirmationLevel {
    Processed,
    Confirmed,
    Finalized,
}

#[derive(Clone, Debug)]
pub struct SignatureStatus {
    pub level: Option<ConfirmationLevel>,
    pub err: Option<String>,
}

#[async_trait]
pub trait BroadcastTransport: Send + Sync {
    async fn send_bundle(
        &self,
        endpoint: &str,
        signed_tx: &[u8],
        tip_tx: Option<&[u8]>,
    ) -> Result<(), SwapError>;

    async fn send_transaction(&self, endpoint: &str, signed_tx: &[u8]) -> Result<(), SwapError>;

    async fn get_signature_status(
        &self,
        endpoint: &str,
        signature: &str,
    ) -> Result<SignatureStatus, SwapError>;
}
