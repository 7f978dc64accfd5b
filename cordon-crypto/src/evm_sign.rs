//! secp256k1 ECDSA signing for EVM payloads: `personal_sign` message hashing
//! and recoverable signatures over arbitrary 32-byte digests (transaction
//! hashes, EIP-712 typed-data hashes).

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1, SecretKey};

use crate::keccak;

/// `"\x19Ethereum Signed Message:\n" || len(message) || message`, per
/// `personal_sign` (EIP-191). Prevents a signed message from also being a
/// valid raw transaction or typed-data hash.
pub fn personal_sign_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    keccak::digest(&[prefix.as_bytes(), message].concat())
}

/// An EVM-format recoverable signature: `(r, s, v)` with `v` already
/// adjusted to Ethereum's `{27, 28}` convention (not the raw `{0, 1}`
/// recovery id).
pub struct EvmSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl EvmSignature {
    /// 65-byte `r || s || v` wire encoding used by `eth_sign`/`personal_sign`
    /// RPC responses and raw transaction encoding.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

/// Sign a 32-byte digest, returning a recoverable `(r, s, v)` signature.
/// `chain_id` is `None` for `personal_sign` (plain `{27,28}` v), or
/// `Some(id)` for EIP-155 transaction signing (`v = recovery_id + 35 +
/// 2*chain_id`).
pub fn sign_digest(
    secret_key: &SecretKey,
    digest: &[u8; 32],
    chain_id: Option<u64>,
) -> EvmSignature {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(*digest);
    let recoverable: RecoverableSignature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = recoverable.serialize_compact();
    let recovery_id_u8 = recovery_id.to_i32() as u8;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[0..32]);
    s.copy_from_slice(&compact[32..64]);

    let v = match chain_id {
        None => 27 + recovery_id_u8,
        Some(id) => (recovery_id_u8 as u64 + 35 + 2 * id) as u8,
    };

    EvmSignature { r, s, v }
}

/// Recover the signer's address from a signature, for verifying our own
/// output before broadcast (and for recognizing approvals granted by a
/// counterparty in a WalletConnect session).
pub fn recover_address(
    digest: &[u8; 32],
    signature: &EvmSignature,
    chain_id: Option<u64>,
) -> Option<[u8; 20]> {
    let recovery_id_u8 = match chain_id {
        None => signature.v.checked_sub(27)?,
        Some(id) => {
            let expected_offset = 35 + 2 * id;
            (signature.v as u64).checked_sub(expected_offset)? as u8
        }
    };
    let recovery_id = RecoveryId::from_i32(recovery_id_u8 as i32).ok()?;

    let mut compact = [0u8; 64];
    compact[0..32].copy_from_slice(&signature.r);
    compact[32..64].copy_from_slice(&signature.s);

    let secp = Secp256k1::verification_only();
    let message = Message::from_digest(*digest);
    let recoverable = RecoverableSignature::from_compact(&compact, recovery_id).ok()?;
    let public_key = secp.recover_ecdsa(&message, &recoverable).ok()?;

    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak::digest(&uncompressed[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Some(address)
}
