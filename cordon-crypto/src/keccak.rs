//! Keccak-256, used for EVM address derivation (not the NIST SHA3-256
//! variant — Ethereum's `keccak256` predates the final SHA-3 padding change).

use sha3::{Digest, Keccak256};

pub fn digest(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deterministic_and_distinct() {
        assert_eq!(digest(b"abc"), digest(b"abc"));
        assert_ne!(digest(b"abc"), digest(b"abd"));
        assert_eq!(digest(b"").len(), 32);
    }
}
