//! Solana operations (spec §4.G), delegated to a per-call [`SolanaSigner`]
//! built over `self.vault`/`self.solana_rpc`/`self.solana_transfers`.

use cordon_chain::CoreResult;
use cordon_solana::SolanaSigner;

use crate::core::CordonCore;

impl CordonCore {
    fn solana_signer(&self) -> SolanaSigner<'_> {
        SolanaSigner::new(&self.vault, self.solana_rpc.as_ref(), self.solana_transfers.as_ref())
    }

    pub async fn solana_sign_message(&self, wallet_id: &str, message: &str) -> CoreResult<String> {
        self.solana_signer().sign_message(wallet_id, message).await
    }

    /// Runs the drainer decoder only; callers that also want to sign should
    /// follow a clean scan with [`Self::solana_sign_transaction`] themselves
    /// so a blocked transaction is never silently signed anyway.
    pub async fn solana_scan_transaction(&self, wallet_id: &str, base64_tx: &str) -> CoreResult<()> {
        self.solana_signer().scan_transaction(wallet_id, base64_tx).await
    }

    pub async fn solana_sign_transaction(&self, wallet_id: &str, base64_tx: &str) -> CoreResult<String> {
        self.solana_signer().sign_transaction(wallet_id, base64_tx).await
    }

    pub async fn solana_prepare_sol_transfer(&self, wallet_id: &str, to: &str, lamports: u64) -> CoreResult<String> {
        self.solana_signer().prepare_sol_transfer(wallet_id, to, lamports).await
    }

    pub async fn solana_prepare_spl_transfer(
        &self,
        wallet_id: &str,
        to: &str,
        mint: &str,
        amount: u64,
    ) -> CoreResult<String> {
        self.solana_signer()
            .prepare_spl_transfer(wallet_id, to, mint, amount)
            .await
    }

    pub async fn solana_address(&self, wallet_id: &str) -> CoreResult<String> {
        self.solana_signer().address(wallet_id).await
    }

    pub async fn solana_send_raw_transaction(&self, raw: &[u8]) -> CoreResult<String> {
        self.solana_signer().send_raw_transaction(raw).await
    }
}
