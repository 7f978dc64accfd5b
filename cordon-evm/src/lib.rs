//! # `cordon-evm`
//!
//! The EVM signer (spec §4.F): gas/fee estimation, native/ERC-20/approval
//! send, `personal_sign`, EIP-712 typed data signing, and arbitrary raw
//! transaction send for the dApp bridge. Transaction encoding (RLP, legacy
//! and EIP-1559 signing digests) is hand-rolled since no crate in the
//! surrounding stack covers raw Ethereum transaction construction; signing
//! itself goes through `cordon-crypto`'s `secp256k1` wrapper.

pub mod calldata;
pub mod eip712;
pub mod error;
pub mod gas;
pub mod rlp;
pub mod rpc;
pub mod signer;
pub mod tx;

pub use error::{classify_send_failure, EvmError};
pub use gas::{estimate_approval_gas, estimate_erc20_gas, estimate_native_gas, GasEstimate};
pub use rpc::{EvmCallRequest, EvmRpcClient, FeeSample};
pub use signer::{EvmSigner, SendResult, SignedMessage};
pub use tx::{Eip1559Tx, LegacyTx};
