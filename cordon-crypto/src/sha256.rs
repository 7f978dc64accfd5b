//! Thin wrapper around [`ring::digest`] SHA-256.

use ring::digest;

#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Hash(digest::Digest);

impl Hash {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// SHA-256 of a single buffer.
pub fn digest(data: &[u8]) -> Hash {
    Hash(digest::digest(&digest::SHA256, data))
}

/// SHA-256 of several buffers concatenated, without needing to allocate a
/// combined buffer first.
pub fn digest_many(parts: &[&[u8]]) -> Hash {
    let mut ctx = digest::Context::new(&digest::SHA256);
    for part in parts {
        ctx.update(part);
    }
    Hash(ctx.finish())
}

/// Hex-encoded SHA-256, used for the non-cryptographic PIN-hash lockscreen
/// equality check (`cordon_pin_hash`).
pub fn hex_digest(data: &[u8]) -> String {
    hex::encode(digest(data).as_bytes())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_answer() {
        let got = hex::encode(digest(b"abc").as_bytes());
        assert_eq!(
            got,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_many_matches_concatenation() {
        let combined = digest(b"hello world");
        let split = digest_many(&[b"hello ", b"world"]);
        assert_eq!(combined.as_bytes(), split.as_bytes());
    }
}
