//! The external collaborators `CordonCore` is wired against: RPC clients,
//! the swap aggregators, the broadcast transport, and the confirmation UI.
//! Spec §1 calls these out as given primitives the core consumes rather
//! than implements; bundling them here keeps `CordonCore::new`'s signature
//! from growing a dozen positional parameters.

use std::collections::HashMap;
use std::sync::Arc;

use cordon_bridge::ConfirmationUi;
use cordon_chain::config::EvmChainId;
use cordon_evm::EvmRpcClient;
use cordon_solana::{SolanaRpcClient, SolanaTransferBuilder};
use cordon_swap::{BroadcastTransport, JupiterClient, PumpClient};

/// One entry per EVM chain the wallet is configured to support. A chain
/// with no entry here is one `CordonCore` knows about (via `ChainRegistry`)
/// but can't actually talk to.
pub struct Collaborators {
    pub evm_rpc: HashMap<EvmChainId, Box<dyn EvmRpcClient>>,
    pub solana_rpc: Box<dyn SolanaRpcClient>,
    pub solana_transfers: Box<dyn SolanaTransferBuilder>,
    pub jupiter: Box<dyn JupiterClient>,
    pub pump: Box<dyn PumpClient>,
    pub broadcast_transport: Arc<dyn BroadcastTransport>,
    pub confirmation_ui: Box<dyn ConfirmationUi>,
}
