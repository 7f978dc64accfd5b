//! Solana account derivation: SLIP-0010 Ed25519 over `m/44'/501'/0'/0'`, with
//! base58 addresses (the Solana pubkey display format).

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use secrecy::{ExposeSecret, Secret};
use thiserror::Error;

use crate::slip10::{self, Slip10Error};

#[derive(Clone, Debug, Error)]
pub enum SolanaKeyError {
    #[error("key derivation failed: {0}")]
    Derivation(#[from] Slip10Error),
}

/// A derived Solana signing key, zeroized on drop via `secrecy`.
pub struct SolanaAccountKey {
    signing_key: Secret<[u8; 32]>,
    verifying_key: VerifyingKey,
}

impl SolanaAccountKey {
    pub fn derive(seed: &[u8], account_index: u32) -> Result<Self, SolanaKeyError> {
        let path = slip10::solana_account_path(account_index);
        let node = slip10::ExtendedKey::derive_path(seed, &path)?;
        let signing_key = SigningKey::from_bytes(&node.key);
        let verifying_key = signing_key.verifying_key();
        Ok(Self {
            signing_key: Secret::new(node.key),
            verifying_key,
        })
    }

    fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(self.signing_key.expose_secret())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key().sign(message)
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.verifying_key.verify(message, signature).is_ok()
    }

    /// The raw 32-byte Ed25519 public key, i.e. the Solana account address
    /// before base58 encoding.
    pub fn pubkey_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Base58-encoded Solana address.
    pub fn address(&self) -> String {
        bs58::encode(self.pubkey_bytes()).into_string()
    }
}

impl std::fmt::Debug for SolanaAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaAccountKey")
            .field("address", &self.address())
            .field("signing_key", &"REDACTED")
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let seed = [3u8; 64];
        let a = SolanaAccountKey::derive(&seed, 0).unwrap();
        let b = SolanaAccountKey::derive(&seed, 0).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn distinct_account_indices_yield_distinct_addresses() {
        let seed = [3u8; 64];
        let a0 = SolanaAccountKey::derive(&seed, 0).unwrap();
        let a1 = SolanaAccountKey::derive(&seed, 1).unwrap();
        assert_ne!(a0.address(), a1.address());
    }

    #[test]
    fn signature_roundtrip() {
        let seed = [9u8; 64];
        let account = SolanaAccountKey::derive(&seed, 0).unwrap();
        let message = b"transfer 1 SOL";
        let signature = account.sign(message);
        assert!(account.verify(message, &signature));
        assert!(!account.verify(b"transfer 2 SOL", &signature));
    }

    #[test]
    fn address_is_valid_base58() {
        let seed = [5u8; 64];
        let account = SolanaAccountKey::derive(&seed, 0).unwrap();
        let decoded = bs58::decode(account.address()).into_vec().unwrap();
        assert_eq!(decoded.len(), 32);
    }
}
