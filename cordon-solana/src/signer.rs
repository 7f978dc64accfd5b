//! The Solana signer facade (spec §4.G), wiring `&'a Vault<'a>` and the two
//! external-collaborator seams together the same way `cordon_evm::EvmSigner`
//! wires `Vault`/`EvmRpcClient`/`ApprovalLedger`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cordon_chain::{CoreError, CoreResult};
use cordon_crypto::mnemonic::MnemonicPhrase;
use cordon_crypto::solana_keys::SolanaAccountKey;
use cordon_vault::vault::Vault;
use solana_sdk::pubkey::Pubkey;

use crate::error::SolanaError;
use crate::rpc::{SolanaRpcClient, SolanaTransferBuilder};
use crate::tx::DecodedTransaction;

pub struct SolanaSigner<'a> {
    vault: &'a Vault<'a>,
    rpc: &'a dyn SolanaRpcClient,
    transfers: &'a dyn SolanaTransferBuilder,
}

impl<'a> SolanaSigner<'a> {
    pub fn new(
        vault: &'a Vault<'a>,
        rpc: &'a dyn SolanaRpcClient,
        transfers: &'a dyn SolanaTransferBuilder,
    ) -> Self {
        Self {
            vault,
            rpc,
            transfers,
        }
    }

    async fn account_key(&self, wallet_id: &str) -> CoreResult<SolanaAccountKey> {
        if !self.vault.is_unlocked().await {
            return Err(CoreError::WalletLocked);
        }
        let phrase = self.vault.get_mnemonic(wallet_id).await?;
        let mnemonic = MnemonicPhrase::parse(&phrase).map_err(|e| CoreError::InvalidMnemonic(e.to_string()))?;
        let seed = mnemonic.to_seed("");
        SolanaAccountKey::derive(&seed, 0).map_err(|e| CoreError::InvalidMnemonic(e.to_string()))
    }

    fn pubkey_of(key: &SolanaAccountKey) -> Pubkey {
        Pubkey::new_from_array(key.pubkey_bytes())
    }

    /// Auto-detects UTF-8 text vs. base64 bytes, per spec §4.G.
    fn decode_message(message: &str) -> Result<Vec<u8>, SolanaError> {
        if let Ok(decoded) = BASE64.decode(message) {
            return Ok(decoded);
        }
        Ok(message.as_bytes().to_vec())
    }

    pub async fn sign_message(&self, wallet_id: &str, message: &str) -> CoreResult<String> {
        let key = self.account_key(wallet_id).await?;
        let bytes = Self::decode_message(message).map_err(CoreError::from)?;
        let signature = key.sign(&bytes);
        Ok(bs58::encode(signature.to_bytes()).into_string())
    }

    /// Runs the drainer decoder without signing, so the dApp bridge can
    /// hard-block a malicious transaction before it ever reaches the
    /// confirmation UI (spec §4.I), then separately call
    /// [`Self::sign_transaction`] once the user has approved.
    pub async fn scan_transaction(&self, wallet_id: &str, base64_tx: &str) -> CoreResult<()> {
        let key = self.account_key(wallet_id).await?;
        let pubkey = Self::pubkey_of(&key);
        let raw = BASE64
            .decode(base64_tx)
            .map_err(|e| CoreError::Unknown {
                details: format!("transaction is not valid base64: {e}"),
            })?;
        let decoded = DecodedTransaction::decode(&raw).map_err(CoreError::from)?;
        crate::drainer::scan(&pubkey, decoded.static_keys(), decoded.instructions()).map_err(CoreError::from)
    }

    pub async fn sign_transaction(&self, wallet_id: &str, base64_tx: &str) -> CoreResult<String> {
        let key = self.account_key(wallet_id).await?;
        let pubkey = Self::pubkey_of(&key);
        let raw = BASE64
            .decode(base64_tx)
            .map_err(|e| CoreError::Unknown {
                details: format!("transaction is not valid base64: {e}"),
            })?;
        let decoded = DecodedTransaction::decode(&raw).map_err(CoreError::from)?;
        let signed = decoded
            .scan_sign_and_reencode(&pubkey, |msg| key.sign(msg).to_bytes())
            .map_err(CoreError::from)?;
        Ok(BASE64.encode(signed))
    }

    async fn sign_and_submit(
        &self,
        key: &SolanaAccountKey,
        pubkey: &Pubkey,
        unsigned_tx: Vec<u8>,
        signable_message: Vec<u8>,
    ) -> CoreResult<String> {
        let signature = key.sign(&signable_message).to_bytes();
        let decoded = DecodedTransaction::decode(&unsigned_tx).map_err(CoreError::from)?;
        let signed = decoded
            .splice_external_signature(pubkey, signature)
            .map_err(CoreError::from)?;
        self.transfers
            .submit(&signed)
            .await
            .map_err(CoreError::from)
    }

    pub async fn prepare_sol_transfer(&self, wallet_id: &str, to: &str, lamports: u64) -> CoreResult<String> {
        let key = self.account_key(wallet_id).await?;
        let pubkey = Self::pubkey_of(&key);
        let from = key.address();
        let unsigned = self
            .transfers
            .build_sol_transfer(&from, to, lamports)
            .await
            .map_err(CoreError::from)?;
        self.sign_and_submit(&key, &pubkey, unsigned.unsigned_tx, unsigned.signable_message)
            .await
    }

    pub async fn prepare_spl_transfer(
        &self,
        wallet_id: &str,
        to: &str,
        mint: &str,
        amount: u64,
    ) -> CoreResult<String> {
        let key = self.account_key(wallet_id).await?;
        let pubkey = Self::pubkey_of(&key);
        let from = key.address();
        let unsigned = self
            .transfers
            .build_spl_transfer(&from, to, mint, amount)
            .await
            .map_err(CoreError::from)?;
        self.sign_and_submit(&key, &pubkey, unsigned.unsigned_tx, unsigned.signable_message)
            .await
    }

    /// Exposes the wallet's Solana address without requiring a signing
    /// operation, for bridge/WalletConnect `getWalletAddress`-style calls.
    pub async fn address(&self, wallet_id: &str) -> CoreResult<String> {
        let key = self.account_key(wallet_id).await?;
        Ok(key.address())
    }

    /// RPC broadcast of an already-fully-signed transaction, used by the
    /// swap broadcast engine, which builds and signs its own transactions
    /// but still submits through this crate's collaborator seam.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> CoreResult<String> {
        self.rpc.send_raw_transaction(raw).await.map_err(CoreError::from)
    }
}
