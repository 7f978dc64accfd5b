//! EVM account derivation: BIP32 over secp256k1 along `m/44'/60'/0'/0/{index}`,
//! with the Keccak-256-based Ethereum address format.
//!
//! Reuses `bitcoin::bip32` for the BIP32 tree walk (the teacher codebase
//! already depends on `bitcoin` for this) rather than pulling in a
//! second, narrower HD-wallet crate.

use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv};
use bitcoin::NetworkKind;
use secp256k1::{PublicKey, Secp256k1, SecretKey, SigningOnly};
use secrecy::{ExposeSecret, Secret};
use thiserror::Error;

use crate::keccak;

#[derive(Clone, Debug, Error)]
pub enum EvmKeyError {
    #[error("seed produced an invalid master extended key")]
    InvalidMasterKey,
    #[error("derivation path is malformed")]
    InvalidPath,
}

/// `m/44'/60'/0'/0/{index}`, the standard EVM account path (MetaMask,
/// Trust Wallet, etc. all derive accounts this way).
pub fn derivation_path(account_index: u32) -> Result<DerivationPath, EvmKeyError> {
    let path = [
        ChildNumber::from_hardened_idx(44).map_err(|_| EvmKeyError::InvalidPath)?,
        ChildNumber::from_hardened_idx(60).map_err(|_| EvmKeyError::InvalidPath)?,
        ChildNumber::from_hardened_idx(0).map_err(|_| EvmKeyError::InvalidPath)?,
        ChildNumber::from_normal_idx(0).map_err(|_| EvmKeyError::InvalidPath)?,
        ChildNumber::from_normal_idx(account_index).map_err(|_| EvmKeyError::InvalidPath)?,
    ];
    Ok(DerivationPath::from(path.to_vec()))
}

/// A derived EVM signing key, zeroized on drop via `secrecy`.
pub struct EvmAccountKey {
    secret_key: Secret<[u8; 32]>,
    address: [u8; 20],
}

impl EvmAccountKey {
    pub fn derive(seed: &[u8], account_index: u32) -> Result<Self, EvmKeyError> {
        let master = Xpriv::new_master(NetworkKind::Main, seed)
            .map_err(|_| EvmKeyError::InvalidMasterKey)?;
        let secp = Secp256k1::signing_only();
        let path = derivation_path(account_index)?;
        let child = master
            .derive_priv(&secp, &path)
            .map_err(|_| EvmKeyError::InvalidPath)?;
        let secret_key = child.private_key;
        let address = Self::address_from_secret(&secp, &secret_key);
        Ok(Self {
            secret_key: Secret::new(secret_key.secret_bytes()),
            address,
        })
    }

    fn address_from_secret(secp: &Secp256k1<SigningOnly>, secret_key: &SecretKey) -> [u8; 20] {
        let public_key = PublicKey::from_secret_key(secp, secret_key);
        // Ethereum addresses are the last 20 bytes of keccak256(uncompressed
        // public key, minus the 0x04 prefix).
        let uncompressed = public_key.serialize_uncompressed();
        let hash = keccak::digest(&uncompressed[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        address
    }

    pub fn secret_key(&self) -> SecretKey {
        SecretKey::from_slice(self.secret_key.expose_secret())
            .expect("stored secret bytes were already a valid secp256k1 scalar")
    }

    pub fn address(&self) -> [u8; 20] {
        self.address
    }

    /// `0x`-prefixed, lowercase, non-checksummed hex address. Checksum
    /// casing (EIP-55) is a display concern left to the caller/UI layer.
    pub fn address_hex(&self) -> String {
        format!("0x{}", hex::encode(self.address))
    }
}

impl std::fmt::Debug for EvmAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmAccountKey")
            .field("address", &self.address_hex())
            .field("secret_key", &"REDACTED")
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mnemonic::MnemonicPhrase;

    #[test]
    fn derivation_is_deterministic() {
        let phrase = "abandon abandon abandon abandon abandon abandon \
                       abandon abandon abandon abandon abandon about";
        let mnemonic = MnemonicPhrase::parse(phrase).unwrap();
        let seed = mnemonic.to_seed("");
        let a = EvmAccountKey::derive(&seed, 0).unwrap();
        let b = EvmAccountKey::derive(&seed, 0).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn distinct_account_indices_yield_distinct_addresses() {
        let phrase = "abandon abandon abandon abandon abandon abandon \
                       abandon abandon abandon abandon abandon about";
        let mnemonic = MnemonicPhrase::parse(phrase).unwrap();
        let seed = mnemonic.to_seed("");
        let a0 = EvmAccountKey::derive(&seed, 0).unwrap();
        let a1 = EvmAccountKey::derive(&seed, 1).unwrap();
        assert_ne!(a0.address(), a1.address());
    }

    #[test]
    fn address_is_lowercase_hex_with_prefix() {
        let phrase = "abandon abandon abandon abandon abandon abandon \
                       abandon abandon abandon abandon abandon about";
        let mnemonic = MnemonicPhrase::parse(phrase).unwrap();
        let seed = mnemonic.to_seed("");
        let account = EvmAccountKey::derive(&seed, 0).unwrap();
        let hex_addr = account.address_hex();
        assert!(hex_addr.starts_with("0x"));
        assert_eq!(hex_addr.len(), 42);
        assert!(hex_addr[2..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
