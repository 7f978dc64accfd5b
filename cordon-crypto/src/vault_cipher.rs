//! AES-256-GCM encryption of the vault blob, keyed by PBKDF2-stretching the
//! user's PIN.
//!
//! Wire format (spec §3/§6): `{ version: 1, salt: 16B, iv: 12B, ciphertext }`.
//! The GCM authentication tag is appended to the ciphertext by the AEAD
//! primitive; there is no separate tag field.
//!
//! This mirrors the `ring::aead` `BoundKey`/`NonceSequence` idiom the rest of
//! this codebase's AEAD wrapper uses, but (per spec) derives a single
//! long-term key per encryption from `(pin, salt)` via PBKDF2 rather than a
//! synthetic per-message key scheme — each write samples a fresh `(salt,
//! iv)` pair, so the `(key, nonce)` pair is still single-use.

use std::num::NonZeroU32;

use ring::{
    aead::{self, BoundKey},
    pbkdf2,
};
use thiserror::Error;
use zeroize::Zeroize;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

/// PBKDF2-HMAC-SHA256 iteration count. Fixed by spec §3/§4.B; preserved
/// verbatim across re-encryptions of the vault (`addWallet` must not change
/// the work factor).
pub const PBKDF2_ITERATIONS: u32 = 150_000;

static PBKDF2_ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

#[derive(Clone, Debug, Error)]
#[error("vault decrypt failed: wrong pin or corrupted ciphertext")]
pub struct DecryptError;

/// A fresh `(salt, iv)` pair, sampled once per vault write.
pub struct Nonces {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; IV_LEN],
}

impl Nonces {
    pub fn generate(rng: &mut impl rand_core::RngCore) -> Self {
        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; IV_LEN];
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut iv);
        Self { salt, iv }
    }
}

/// Derive the AES-256 key from `(pin, salt)` via PBKDF2-HMAC-SHA256.
pub fn derive_key(pin: &str, salt: &[u8; SALT_LEN]) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS)
        .expect("PBKDF2_ITERATIONS is a nonzero constant");
    pbkdf2::derive(PBKDF2_ALGORITHM, iterations, salt, pin.as_bytes(), &mut out);
    out
}

/// A nonce sequence that yields exactly one nonce, then refuses to yield
/// another. This makes key reuse across multiple seal/open calls a hard
/// error instead of a silent (catastrophic, for AES-GCM) nonce collision.
struct SingleUseNonce(Option<aead::Nonce>);

impl aead::NonceSequence for SingleUseNonce {
    fn advance(&mut self) -> Result<aead::Nonce, ring::error::Unspecified> {
        self.0.take().ok_or(ring::error::Unspecified)
    }
}

/// Encrypt `plaintext` under `pin`, sampling a fresh `(salt, iv)`.
///
/// Returns `(salt, iv, ciphertext)`, i.e. the three fields that make up an
/// `EncryptedVault` once `version` is prepended by the caller.
pub fn encrypt(
    rng: &mut impl rand_core::RngCore,
    pin: &str,
    plaintext: &[u8],
) -> ([u8; SALT_LEN], [u8; IV_LEN], Vec<u8>) {
    let Nonces { salt, iv } = Nonces::generate(rng);
    let mut key_bytes = derive_key(pin, &salt);

    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, &key_bytes)
        .expect("AES_256_GCM key is always the right length");
    key_bytes.zeroize();

    let nonce = aead::Nonce::assume_unique_for_key(iv);
    let mut sealing_key =
        aead::SealingKey::new(unbound, SingleUseNonce(Some(nonce)));

    let mut in_out = plaintext.to_vec();
    // AAD binds the salt, so swapping ciphertexts between two vault writes
    // (each with their own salt) is detected at decrypt time.
    let aad = aead::Aad::from(salt.as_slice());
    sealing_key
        .seal_in_place_append_tag(aad, &mut in_out)
        .expect("encrypting a blob of sane size should never fail");

    (salt, iv, in_out)
}

/// Decrypt a ciphertext produced by [`encrypt`] under the same `(pin, salt,
/// iv)`. Fails (does not panic) on a wrong pin or corrupted ciphertext, since
/// the AEAD tag check will simply reject it.
pub fn decrypt(
    pin: &str,
    salt: &[u8; SALT_LEN],
    iv: &[u8; IV_LEN],
    mut ciphertext: Vec<u8>,
) -> Result<Vec<u8>, DecryptError> {
    let mut key_bytes = derive_key(pin, salt);

    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, &key_bytes)
        .expect("AES_256_GCM key is always the right length");
    key_bytes.zeroize();

    let nonce = aead::Nonce::assume_unique_for_key(*iv);
    let mut opening_key =
        aead::OpeningKey::new(unbound, SingleUseNonce(Some(nonce)));

    let aad = aead::Aad::from(salt.as_slice());
    let plaintext_len = opening_key
        .open_in_place(aad, &mut ciphertext)
        .map_err(|_| DecryptError)?
        .len();
    ciphertext.truncate(plaintext_len);
    Ok(ciphertext)
}
