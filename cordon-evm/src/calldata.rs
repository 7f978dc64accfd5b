//! ERC-20 `transfer`/`approve` calldata encoding, the send-side counterpart
//! to `cordon_policy::intent`'s decoder.

use num_bigint::BigUint;

const WORD_LEN: usize = 32;

fn pad_address(address: &[u8; 20]) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[12..].copy_from_slice(address);
    word
}

fn pad_uint(value: &BigUint) -> [u8; WORD_LEN] {
    let bytes = value.to_bytes_be();
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - bytes.len()..].copy_from_slice(&bytes);
    word
}

pub fn encode_transfer(to: &[u8; 20], amount: &BigUint) -> Vec<u8> {
    let mut out = cordon_policy::intent::TRANSFER_SELECTOR.to_vec();
    out.extend_from_slice(&pad_address(to));
    out.extend_from_slice(&pad_uint(amount));
    out
}

pub fn encode_approve(spender: &[u8; 20], amount: &BigUint) -> Vec<u8> {
    let mut out = cordon_policy::intent::APPROVE_SELECTOR.to_vec();
    out.extend_from_slice(&pad_address(spender));
    out.extend_from_slice(&pad_uint(amount));
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encode_transfer_round_trips_through_detection() {
        let to = [0x11; 20];
        let amount = BigUint::from(42_000_000u64);
        let calldata = encode_transfer(&to, &amount);
        assert_eq!(&calldata[0..4], &cordon_policy::intent::TRANSFER_SELECTOR);
        assert_eq!(calldata.len(), 4 + 64);
    }

    #[test]
    fn encode_approve_round_trips_through_detection() {
        let spender = [0x22; 20];
        let amount = BigUint::from(1_000u64);
        let calldata = encode_approve(&spender, &amount);
        let detected = cordon_policy::intent::detect_approve_intent(&calldata).unwrap();
        assert_eq!(detected.amount_raw, amount);
        assert_eq!(detected.spender, format!("0x{}", hex::encode(spender)));
    }
}
