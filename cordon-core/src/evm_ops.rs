//! EVM operations (spec §4.F), delegated to a per-call [`EvmSigner`] built
//! over whichever RPC client in `self.evm_rpc` matches the requested chain.
//! No `EvmSigner` is kept as a field: it borrows `self.vault`/`self.ledger`/
//! `self.chains` for the call's duration only, which is cheap enough (no
//! network I/O happens in the constructor) that keeping one alive longer
//! would just be bookkeeping for no benefit.

use cordon_chain::config::EvmChainId;
use cordon_chain::{CoreError, CoreResult};
use cordon_evm::{EvmSigner, GasEstimate, SendResult, SignedMessage};
use num_bigint::BigUint;
use serde_json::Value;

use crate::core::CordonCore;

impl CordonCore {
    /// Picks the RPC client registered for `chain_id`, falling back to
    /// whichever client was registered first if the exact chain has none
    /// (mirrors how `ChainRegistry` itself tolerates a caller naming a chain
    /// it doesn't recognize — better to attempt the call against something
    /// than refuse outright before the signer even gets a chance to report
    /// `UnsupportedChain`).
    fn evm_signer_for(&self, chain_id: EvmChainId) -> CoreResult<EvmSigner<'_>> {
        let rpc = self
            .evm_rpc
            .get(&chain_id)
            .or_else(|| self.evm_rpc.values().next())
            .ok_or_else(|| CoreError::UnsupportedChain(chain_id.to_string()))?;
        Ok(EvmSigner::new(&self.vault, rpc.as_ref(), &self.ledger, &self.chains))
    }

    pub async fn evm_estimate_native_gas(
        &self,
        chain_id: EvmChainId,
        from: [u8; 20],
        to: [u8; 20],
        value: BigUint,
    ) -> CoreResult<GasEstimate> {
        self.evm_signer_for(chain_id)?
            .estimate_native_gas(from, to, value)
            .await
            .map_err(CoreError::from)
    }

    pub async fn evm_estimate_erc20_gas(
        &self,
        chain_id: EvmChainId,
        from: [u8; 20],
        token: [u8; 20],
        to: [u8; 20],
        amount: &BigUint,
    ) -> CoreResult<GasEstimate> {
        self.evm_signer_for(chain_id)?
            .estimate_erc20_gas(from, token, to, amount)
            .await
            .map_err(CoreError::from)
    }

    pub async fn evm_estimate_approval_gas(
        &self,
        chain_id: EvmChainId,
        from: [u8; 20],
        token: [u8; 20],
        spender: [u8; 20],
        amount: &BigUint,
    ) -> CoreResult<GasEstimate> {
        self.evm_signer_for(chain_id)?
            .estimate_approval_gas(from, token, spender, amount)
            .await
            .map_err(CoreError::from)
    }

    pub async fn evm_send_native(
        &self,
        wallet_id: &str,
        chain_id: EvmChainId,
        to: &str,
        value: BigUint,
    ) -> CoreResult<SendResult> {
        let policy = self.get_policy_settings()?;
        self.evm_signer_for(chain_id)?
            .send_native(wallet_id, chain_id, to, value, &policy)
            .await
    }

    pub async fn evm_send_erc20(
        &self,
        wallet_id: &str,
        chain_id: EvmChainId,
        token: &str,
        to: &str,
        amount: BigUint,
    ) -> CoreResult<SendResult> {
        let policy = self.get_policy_settings()?;
        self.evm_signer_for(chain_id)?
            .send_erc20(wallet_id, chain_id, token, to, amount, &policy)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn evm_send_approval(
        &self,
        wallet_id: &str,
        chain_id: EvmChainId,
        token: &str,
        spender: &str,
        amount: BigUint,
        token_decimals: u8,
        now_ms: u64,
    ) -> CoreResult<SendResult> {
        let policy = self.get_policy_settings()?;
        self.evm_signer_for(chain_id)?
            .send_approval(wallet_id, chain_id, token, spender, amount, token_decimals, &policy, now_ms)
            .await
    }

    pub async fn evm_sign_personal_message(&self, wallet_id: &str, message: &str) -> CoreResult<SignedMessage> {
        // Personal-sign doesn't touch chain-specific RPC state; any
        // registered chain's signer produces the same signature since it
        // only depends on the wallet's EVM key.
        let chain_id = self.any_evm_chain()?;
        self.evm_signer_for(chain_id)?
            .sign_personal_message(wallet_id, message)
            .await
    }

    pub async fn evm_sign_typed_data(&self, wallet_id: &str, document: &Value) -> CoreResult<(SignedMessage, String)> {
        let chain_id = self.any_evm_chain()?;
        self.evm_signer_for(chain_id)?
            .sign_typed_data(wallet_id, document)
            .await
    }

    pub async fn evm_send_raw_transaction(
        &self,
        wallet_id: &str,
        chain_id: EvmChainId,
        to: Option<[u8; 20]>,
        value: BigUint,
        data: Vec<u8>,
        gas_limit: Option<u64>,
    ) -> CoreResult<SendResult> {
        self.evm_signer_for(chain_id)?
            .send_raw_transaction(wallet_id, chain_id, to, value, data, gas_limit)
            .await
    }

    pub async fn evm_call(
        &self,
        chain_id: EvmChainId,
        from: [u8; 20],
        to: [u8; 20],
        value: BigUint,
        data: Vec<u8>,
    ) -> CoreResult<Vec<u8>> {
        self.evm_signer_for(chain_id)?
            .call(from, to, value, data)
            .await
            .map_err(CoreError::from)
    }

    pub async fn evm_address(&self, wallet_id: &str) -> CoreResult<String> {
        let chain_id = self.any_evm_chain()?;
        self.evm_signer_for(chain_id)?.address(wallet_id).await
    }

    pub async fn evm_revoke_approval(
        &self,
        wallet_id: &str,
        approval_id: &str,
        chain_id: EvmChainId,
        token: &str,
        spender: &str,
    ) -> CoreResult<SendResult> {
        self.evm_signer_for(chain_id)?
            .revoke_approval(wallet_id, approval_id, chain_id, token, spender)
            .await
    }

    pub(crate) fn any_evm_chain(&self) -> CoreResult<EvmChainId> {
        self.chains
            .all()
            .first()
            .map(|config| config.chain_id)
            .ok_or_else(|| CoreError::UnsupportedChain("no EVM chain configured".to_string()))
    }
}
