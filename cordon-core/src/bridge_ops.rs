//! dApp-bridge and WalletConnect orchestration (spec §4.I/§4.J): builds a
//! fresh `EvmSigner`/`SolanaSigner`/`Bridge` facade per call so a call binds
//! against whichever RPC client matches the request's declared chain, and
//! reads `PolicySettings` fresh from persisted app state each time rather
//! than caching a copy that could drift from what the UI just saved.
//! `self.auth_guard` is the one piece that outlives any single facade, so
//! the "only one active confirmation UI" rule (spec §5) holds across calls.

use cordon_bridge::{
    build_namespaces as bridge_build_namespaces, handle_request_for_session, Bridge, BridgeResponse,
    SessionNamespaces, SessionProposal,
};
use cordon_chain::config::EvmChainId;
use cordon_chain::{CoreError, CoreResult};
use cordon_evm::EvmSigner;
use cordon_solana::SolanaSigner;
use serde_json::Value;

use crate::core::CordonCore;

fn bridge_error_to_core(e: cordon_bridge::BridgeError) -> CoreError {
    match e {
        cordon_bridge::BridgeError::Core(inner) => inner,
        other => CoreError::Unknown { details: other.to_string() },
    }
}

impl CordonCore {
    fn requested_chain_id(raw: &str) -> Option<EvmChainId> {
        serde_json::from_str::<Value>(raw)
            .ok()
            .and_then(|v| v.get("chainId").and_then(Value::as_u64))
    }

    fn evm_signer_and_solana_signer(&self, chain_id: EvmChainId) -> CoreResult<(EvmSigner<'_>, SolanaSigner<'_>)> {
        let rpc = self
            .evm_rpc
            .get(&chain_id)
            .or_else(|| self.evm_rpc.values().next())
            .ok_or_else(|| CoreError::UnsupportedChain(chain_id.to_string()))?;
        let evm = EvmSigner::new(&self.vault, rpc.as_ref(), &self.ledger, &self.chains);
        let solana = SolanaSigner::new(&self.vault, self.solana_rpc.as_ref(), self.solana_transfers.as_ref());
        Ok((evm, solana))
    }

    /// Pre-parses an optional `chainId` out of the envelope before
    /// `Bridge::handle` parses the whole thing itself, just to pick which
    /// EVM RPC client the call's `EvmSigner` should bind to. Falls back to
    /// the first configured chain (Ethereum) when the request doesn't name
    /// one, since several request types (e.g. `solana_connect`) carry none.
    pub async fn handle_bridge_request(&self, raw: &str) -> CoreResult<BridgeResponse> {
        let chain_id = Self::requested_chain_id(raw).unwrap_or(self.any_evm_chain()?);
        let (evm, solana) = self.evm_signer_and_solana_signer(chain_id)?;
        let policy = self.get_policy_settings()?;
        let bridge = Bridge::new(&evm, &solana, &self.chains, &policy, self.confirmation_ui.as_ref(), &self.auth_guard);
        Ok(bridge.handle(raw).await)
    }

    /// Builds the response namespace for a WalletConnect session proposal
    /// (spec §4.J) from the wallet's own EVM/Solana addresses, then records
    /// what was granted in `self.sessions` under `topic` so later requests
    /// on the same pairing can be checked against it.
    pub async fn wc_propose_session(
        &self,
        topic: &str,
        wallet_id: &str,
        proposal: SessionProposal,
    ) -> CoreResult<Value> {
        let evm_address = self.evm_address(wallet_id).await?;
        let solana_address = if proposal.solana_requested {
            Some(self.solana_address(wallet_id).await?)
        } else {
            None
        };
        let namespaces = bridge_build_namespaces(&proposal, &self.chains, &evm_address, solana_address.as_deref())
            .map_err(bridge_error_to_core)?;

        self.sessions.insert(
            topic.to_string(),
            SessionNamespaces {
                wallet_id: wallet_id.to_string(),
                evm_chain_ids: proposal.requested_evm_chain_ids,
                solana_granted: proposal.solana_requested,
            },
        );
        Ok(namespaces)
    }

    /// Dispatches a WalletConnect request for an already-established
    /// session, validating its declared chain against what the session was
    /// granted before it reaches the same gate a dApp-bridge request uses
    /// (spec §4.J).
    pub async fn handle_walletconnect_request(
        &self,
        topic: &str,
        chain_id: Option<EvmChainId>,
        origin: &str,
        method: &str,
        params: &Value,
    ) -> CoreResult<Value> {
        let (evm, solana) = self.evm_signer_and_solana_signer(chain_id.unwrap_or(self.any_evm_chain()?))?;
        let policy = self.get_policy_settings()?;
        let bridge = Bridge::new(&evm, &solana, &self.chains, &policy, self.confirmation_ui.as_ref(), &self.auth_guard);
        handle_request_for_session(&bridge, &self.sessions, topic, chain_id, origin, method, params)
            .await
            .map_err(bridge_error_to_core)
    }

    /// Ends a WalletConnect pairing (spec §4.J); idempotent on an unknown
    /// topic.
    pub fn wc_disconnect(&self, topic: &str) {
        self.sessions.remove(topic);
    }
}
