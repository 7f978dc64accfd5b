//! The Solana RPC node, and the server that assembles unsigned SOL/SPL
//! transfers, are external collaborators (spec §1). These traits are the
//! seam: they name only the primitives §4.G's operations actually need, so
//! the signer can be driven by a real client or a test double. Grounded on
//! `cordon-evm::rpc::EvmRpcClient`, itself grounded on the teacher's
//! `BroadcasterInterface` seam in `lexe-ln/src/esplora.rs`.

use async_trait::async_trait;

use crate::error::SolanaError;

#[async_trait]
pub trait SolanaRpcClient: Send + Sync {
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, SolanaError>;
}

/// An unsigned transfer assembled server-side: the raw transaction bytes
/// (with a zeroed placeholder signature) plus the exact message bytes the
/// wallet must sign. Keeping both lets the signer splice the produced
/// signature into the transaction without re-deriving the message itself,
/// since re-serializing a `VersionedMessage` it didn't build risks a
/// byte-for-byte mismatch with what the server will submit.
#[derive(Clone, Debug)]
pub struct UnsignedTransfer {
    pub unsigned_tx: Vec<u8>,
    pub signable_message: Vec<u8>,
}

/// Server-assisted transfer builder (spec §4.G: "external collaborator
/// returns an unsigned serialized tx plus the signable message; client
/// signs the message only; the same collaborator submits the signed
/// bytes").
#[async_trait]
pub trait SolanaTransferBuilder: Send + Sync {
    async fn build_sol_transfer(
        &self,
        from: &str,
        to: &str,
        lamports: u64,
    ) -> Result<UnsignedTransfer, SolanaError>;

    async fn build_spl_transfer(
        &self,
        from: &str,
        to: &str,
        mint: &str,
        amount: u64,
    ) -> Result<UnsignedTransfer, SolanaError>;

    /// Submits the signed transaction bytes (produced by splicing the
    /// wallet's signature into `unsigned_tx`) and returns the transaction
    /// signature.
    async fn submit(&self, signed_tx: &[u8]) -> Result<String, SolanaError>;
}
