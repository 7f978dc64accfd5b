//! Detect and rewrite ERC-20 `approve()` intent from raw calldata (spec
//! §4.E).

use num_bigint::BigUint;

use crate::types::{is_unlimited, DetectedApproval};

/// 4-byte selector for `approve(address,uint256)`.
pub const APPROVE_SELECTOR: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
/// 4-byte selector for `transfer(address,uint256)`, for completeness
/// against spec §6's wire-format note; not itself gated by this engine.
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

const WORD_LEN: usize = 32;
const CALLDATA_LEN: usize = 4 + WORD_LEN * 2;

/// `calldata` of the form `selector(4) || pad32(spender) || pad32(amount)`.
/// Any selector other than `approve(address,uint256)` yields `None`.
pub fn detect_approve_intent(calldata: &[u8]) -> Option<DetectedApproval> {
    if calldata.len() < 4 || calldata[0..4] != APPROVE_SELECTOR {
        return None;
    }
    if calldata.len() < CALLDATA_LEN {
        return None;
    }
    let spender_word = &calldata[4..4 + WORD_LEN];
    let amount_word = &calldata[4 + WORD_LEN..4 + 2 * WORD_LEN];

    // An address occupies the low 20 bytes of its 32-byte word; the high 12
    // bytes must be zero for well-formed ABI encoding, but we don't reject
    // malformed padding here — the wallet firewall's job is to see what the
    // chain will actually execute, and the EVM itself only reads the low 20
    // bytes of the word as the address argument.
    let mut spender = [0u8; 20];
    spender.copy_from_slice(&spender_word[12..32]);
    let spender_hex = format!("0x{}", hex::encode(spender));

    let amount_raw = BigUint::from_bytes_be(amount_word);
    let unlimited = is_unlimited(&amount_raw);

    Some(DetectedApproval {
        token_address: String::new(),
        spender: spender_hex,
        amount_raw,
        is_unlimited: unlimited,
    })
}

/// Replace the last 32-byte word (the amount) of an `approve` calldata with
/// `cap`, preserving the selector and spender bytes exactly (spec §4.E /
/// §8 "Cap calldata preservation").
pub fn modify_approve_calldata(calldata: &[u8], cap: &BigUint) -> Option<Vec<u8>> {
    if calldata.len() < CALLDATA_LEN || calldata[0..4] != APPROVE_SELECTOR {
        return None;
    }
    let mut out = calldata[..4 + WORD_LEN].to_vec();
    let cap_bytes = cap.to_bytes_be();
    if cap_bytes.len() > WORD_LEN {
        return None;
    }
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - cap_bytes.len()..].copy_from_slice(&cap_bytes);
    out.extend_from_slice(&word);
    Some(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn build_approve_calldata(spender: [u8; 20], amount: &BigUint) -> Vec<u8> {
        let mut out = APPROVE_SELECTOR.to_vec();
        let mut spender_word = [0u8; 32];
        spender_word[12..].copy_from_slice(&spender);
        out.extend_from_slice(&spender_word);
        let amount_bytes = amount.to_bytes_be();
        let mut amount_word = [0u8; 32];
        amount_word[32 - amount_bytes.len()..].copy_from_slice(&amount_bytes);
        out.extend_from_slice(&amount_word);
        out
    }

    #[test]
    fn detects_approve_intent() {
        let spender = [0xAB; 20];
        let amount = BigUint::from(500_000_000u64);
        let calldata = build_approve_calldata(spender, &amount);
        let detected = detect_approve_intent(&calldata).unwrap();
        assert_eq!(detected.spender, format!("0x{}", hex::encode(spender)));
        assert_eq!(detected.amount_raw, amount);
        assert!(!detected.is_unlimited);
    }

    #[test]
    fn detects_unlimited_approval() {
        let spender = [0x11; 20];
        let amount = (BigUint::from(1u8) << 255u32) + 1u8;
        let calldata = build_approve_calldata(spender, &amount);
        let detected = detect_approve_intent(&calldata).unwrap();
        assert!(detected.is_unlimited);
    }

    #[test]
    fn other_selectors_are_not_approvals() {
        let mut calldata = TRANSFER_SELECTOR.to_vec();
        calldata.extend_from_slice(&[0u8; 64]);
        assert!(detect_approve_intent(&calldata).is_none());
    }

    #[test]
    fn modify_preserves_selector_and_spender() {
        let spender = [0x42; 20];
        let original_amount = BigUint::from(u64::MAX);
        let calldata = build_approve_calldata(spender, &original_amount);
        let cap = BigUint::from(10_000_000_000u64);
        let modified = modify_approve_calldata(&calldata, &cap).unwrap();

        assert_eq!(&modified[0..36], &calldata[0..36]);
        let redetected = detect_approve_intent(&modified).unwrap();
        assert_eq!(redetected.spender, format!("0x{}", hex::encode(spender)));
        assert_eq!(redetected.amount_raw, cap);
    }
}
