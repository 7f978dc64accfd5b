//! SLIP-0010 Ed25519 hierarchical key derivation.
//!
//! Ed25519 has no public-key tweaking operation that Hmac-SHA512-based BIP32
//! derivation relies on, so SLIP-0010 restricts the Ed25519 tree to
//! hardened-only derivation. No crate in this codebase's dependency stack
//! implements this (the `bitcoin`/`secp256k1`-oriented BIP32 support only
//! covers secp256k1), so it's hand-rolled here directly from the SLIP-0010
//! reference algorithm.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

const ED25519_SEED_KEY: &[u8] = b"ed25519 seed";

/// Hardened-derivation bit, per BIP32/SLIP-0010 (`index | 0x8000_0000`).
pub const HARDENED_BIT: u32 = 0x8000_0000;

#[derive(Clone, Debug, Error)]
pub enum Slip10Error {
    #[error("SLIP-0010 Ed25519 only supports hardened derivation")]
    NonHardenedIndex,
}

#[derive(Clone)]
pub struct ExtendedKey {
    pub key: [u8; 32],
    pub chain_code: [u8; 32],
}

impl ExtendedKey {
    /// Derive the master extended key from a BIP39 seed.
    pub fn master(seed: &[u8]) -> Self {
        let mut mac = <HmacSha512 as Mac>::new_from_slice(ED25519_SEED_KEY)
            .expect("HMAC accepts a key of any length");
        mac.update(seed);
        let i = mac.finalize().into_bytes();
        let mut key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        key.copy_from_slice(&i[0..32]);
        chain_code.copy_from_slice(&i[32..64]);
        Self { key, chain_code }
    }

    /// Derive a single hardened child. `index` must already have the
    /// hardened bit set (pass e.g. `44 | HARDENED_BIT`).
    pub fn derive_child(&self, index: u32) -> Result<Self, Slip10Error> {
        if index < HARDENED_BIT {
            return Err(Slip10Error::NonHardenedIndex);
        }
        let mut mac = <HmacSha512 as Mac>::new_from_slice(&self.chain_code)
            .expect("HMAC accepts a key of any length");
        mac.update(&[0u8]);
        mac.update(&self.key);
        mac.update(&index.to_be_bytes());
        let i = mac.finalize().into_bytes();
        let mut key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        key.copy_from_slice(&i[0..32]);
        chain_code.copy_from_slice(&i[32..64]);
        Ok(Self { key, chain_code })
    }

    /// Walk a full path of hardened indices from the master key.
    pub fn derive_path(seed: &[u8], path: &[u32]) -> Result<Self, Slip10Error> {
        let mut node = Self::master(seed);
        for &index in path {
            node = node.derive_child(index)?;
        }
        Ok(node)
    }
}

/// `m/44'/501'/0'/0'`, the standard Solana account path (Phantom, Solflare,
/// etc. all derive the default account this way).
pub fn solana_account_path(account_index: u32) -> [u32; 4] {
    [
        44 | HARDENED_BIT,
        501 | HARDENED_BIT,
        account_index | HARDENED_BIT,
        0 | HARDENED_BIT,
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn master_key_is_deterministic_function_of_seed() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let a = ExtendedKey::master(&seed);
        let b = ExtendedKey::master(&seed);
        assert_eq!(a.key, b.key);
        assert_eq!(a.chain_code, b.chain_code);
        // HMAC-SHA512 output halves should not trivially collide.
        assert_ne!(a.key, a.chain_code);
    }

    #[test]
    fn different_seeds_yield_different_master_keys() {
        let a = ExtendedKey::master(&[0u8; 32]);
        let b = ExtendedKey::master(&[1u8; 32]);
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn derivation_is_deterministic() {
        let seed = [7u8; 64];
        let path = solana_account_path(0);
        let a = ExtendedKey::derive_path(&seed, &path).unwrap();
        let b = ExtendedKey::derive_path(&seed, &path).unwrap();
        assert_eq!(a.key, b.key);
        assert_eq!(a.chain_code, b.chain_code);
    }

    #[test]
    fn distinct_account_indices_yield_distinct_keys() {
        let seed = [7u8; 64];
        let a = ExtendedKey::derive_path(&seed, &solana_account_path(0)).unwrap();
        let b = ExtendedKey::derive_path(&seed, &solana_account_path(1)).unwrap();
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn rejects_non_hardened_index() {
        let master = ExtendedKey::master(&[1u8; 64]);
        assert!(master.derive_child(44).is_err());
    }
}
