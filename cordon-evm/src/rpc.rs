//! The EVM JSON-RPC node is an external collaborator (spec §1: "RPC client
//! libraries are treated as given primitives"). This trait is the seam: it
//! names only the primitives §4.F's operations actually need
//! (`getTransactionCount`, `estimateGas`, `sendRawTransaction`, fee
//! sampling, `eth_call`), so the signer can be driven by a real client or a
//! test double without depending on any concrete RPC crate. Grounded on the
//! teacher's `BroadcasterInterface` seam in `lexe-ln/src/esplora.rs`, which
//! wraps an external client behind a narrow trait the rest of the wallet
//! depends on.

use async_trait::async_trait;
use num_bigint::BigUint;

use crate::error::EvmError;

/// An unsigned call, for `eth_estimateGas`/`eth_call`.
#[derive(Clone, Debug)]
pub struct EvmCallRequest {
    pub from: [u8; 20],
    pub to: Option<[u8; 20]>,
    pub value: BigUint,
    pub data: Vec<u8>,
}

/// Fee data sampled from the node. `max_priority_fee_per_gas.is_none()`
/// signals EIP-1559 sampling failed and the caller must fall back to a
/// legacy-typed transaction with `gas_price` (spec §4.F).
#[derive(Clone, Debug)]
pub struct FeeSample {
    pub max_fee_per_gas: BigUint,
    pub max_priority_fee_per_gas: Option<BigUint>,
    pub gas_price: BigUint,
}

#[async_trait]
pub trait EvmRpcClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, EvmError>;

    async fn get_transaction_count(&self, address: &[u8; 20]) -> Result<u64, EvmError>;

    async fn get_balance(&self, address: &[u8; 20]) -> Result<BigUint, EvmError>;

    async fn estimate_gas(&self, call: &EvmCallRequest) -> Result<u64, EvmError>;

    /// Samples `eth_feeHistory`/`eth_maxPriorityFeePerGas` for EIP-1559, and
    /// `eth_gasPrice` for the legacy fallback, in one round since callers
    /// always want both to decide which tx type to build.
    async fn sample_fees(&self) -> Result<FeeSample, EvmError>;

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<[u8; 32], EvmError>;

    /// `eth_call`, used to read ERC-20 `balanceOf`/`allowance` and for
    /// dry-running arbitrary bridge calldata before estimating its gas.
    async fn call(&self, call: &EvmCallRequest) -> Result<Vec<u8>, EvmError>;

    /// `eth_getTransactionReceipt`, polled by the revocation flow (spec
    /// §4.E). `None` means not yet mined; `Some(true)`/`Some(false)` is the
    /// receipt's success status once it lands.
    async fn get_transaction_receipt(&self, tx_hash: [u8; 32]) -> Result<Option<bool>, EvmError>;
}
