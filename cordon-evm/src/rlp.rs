//! Minimal RLP encoder, just enough to build legacy and EIP-1559 transaction
//! bodies for `sendRawTransaction`. No crate in the corpus provides Ethereum
//! RLP encoding, so this is hand-rolled directly from the RLP spec, the same
//! way `cordon_crypto::slip10` hand-rolls SLIP-0010 where no crate exists.

use num_bigint::BigUint;

/// A value that RLP-encodes to either a single string item or a list item.
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn uint(value: &BigUint) -> Self {
        RlpItem::Bytes(strip_leading_zeros(&value.to_bytes_be()))
    }

    pub fn u64(value: u64) -> Self {
        RlpItem::uint(&BigUint::from(value))
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        RlpItem::Bytes(value.into())
    }

    pub fn empty() -> Self {
        RlpItem::Bytes(Vec::new())
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let first_nonzero = bytes.iter().position(|&b| b != 0);
    match first_nonzero {
        Some(idx) => bytes[idx..].to_vec(),
        None => Vec::new(),
    }
}

fn encode_length(len: usize, offset: u8) -> Vec<u8> {
    if len < 56 {
        vec![offset + len as u8]
    } else {
        let len_bytes = strip_leading_zeros(&len.to_be_bytes());
        let mut out = vec![offset + 55 + len_bytes.len() as u8];
        out.extend_from_slice(&len_bytes);
        out
    }
}

pub fn encode(item: &RlpItem) -> Vec<u8> {
    match item {
        RlpItem::Bytes(bytes) => {
            if bytes.len() == 1 && bytes[0] < 0x80 {
                vec![bytes[0]]
            } else {
                let mut out = encode_length(bytes.len(), 0x80);
                out.extend_from_slice(bytes);
                out
            }
        }
        RlpItem::List(items) => {
            let mut payload = Vec::new();
            for item in items {
                payload.extend_from_slice(&encode(item));
            }
            let mut out = encode_length(payload.len(), 0xc0);
            out.extend_from_slice(&payload);
            out
        }
    }
}

pub fn encode_list(items: Vec<RlpItem>) -> Vec<u8> {
    encode(&RlpItem::List(items))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn encodes_empty_string_as_0x80() {
        assert_eq!(encode(&RlpItem::empty()), vec![0x80]);
    }

    #[test]
    fn encodes_single_small_byte_as_itself() {
        assert_eq!(encode(&RlpItem::bytes(vec![0x01])), vec![0x01]);
    }

    #[test]
    fn encodes_short_string() {
        let encoded = encode(&RlpItem::bytes(b"dog".to_vec()));
        assert_eq!(encoded, vec![0x83, b'd', b'o', b'g']);
    }

    #[test]
    fn encodes_empty_list_as_0xc0() {
        assert_eq!(encode_list(vec![]), vec![0xc0]);
    }

    #[test]
    fn encodes_list_of_strings() {
        let encoded = encode_list(vec![
            RlpItem::bytes(b"cat".to_vec()),
            RlpItem::bytes(b"dog".to_vec()),
        ]);
        assert_eq!(
            encoded,
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
    }

    #[test]
    fn uint_strips_leading_zeros() {
        assert_eq!(encode(&RlpItem::u64(0)), vec![0x80]);
        assert_eq!(encode(&RlpItem::u64(1)), vec![0x01]);
        assert_eq!(encode(&RlpItem::u64(1024)), vec![0x82, 0x04, 0x00]);
    }

    #[test]
    fn long_string_uses_length_prefix() {
        let payload = vec![b'a'; 56];
        let encoded = encode(&RlpItem::bytes(payload.clone()));
        assert_eq!(encoded[0], 0xb8);
        assert_eq!(encoded[1], 56);
        assert_eq!(&encoded[2..], payload.as_slice());
    }
}
