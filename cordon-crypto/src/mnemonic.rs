//! BIP39 mnemonic generation and validation.
//!
//! Wallets in this codebase always use 12-word (128-bit entropy) mnemonics;
//! longer mnemonics are accepted on import (anything `bip39` parses) but
//! never generated.

use bip39::{Language, Mnemonic};
use secrecy::{ExposeSecret, Secret};
use thiserror::Error;

/// Entropy size for newly generated mnemonics: 128 bits -> 12 words.
const ENTROPY_BYTES: usize = 16;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MnemonicError {
    #[error("mnemonic does not have a valid word count")]
    BadWordCount,
    #[error("mnemonic contains a word not in the BIP39 wordlist")]
    UnknownWord,
    #[error("mnemonic checksum does not match")]
    BadChecksum,
}

impl From<bip39::Error> for MnemonicError {
    fn from(e: bip39::Error) -> Self {
        match e {
            bip39::Error::BadWordCount(_) => Self::BadWordCount,
            bip39::Error::UnknownWord(_) => Self::UnknownWord,
            bip39::Error::BadChecksum => Self::BadChecksum,
            // InvalidEntropyLength / AmbiguousLanguages / InvalidWord and
            // any future variants: fold into the closest user-facing bucket
            // instead of depending on bip39's exact (non-exhaustive-ish) enum
            // shape.
            _ => Self::BadWordCount,
        }
    }
}

/// A validated BIP39 mnemonic phrase. The phrase text itself is sensitive
/// (it's the sole backup of every key derived from it), so it's wrapped in
/// `Secret` to get redacted `Debug` and zeroize-on-drop.
pub struct MnemonicPhrase(Secret<String>);

impl MnemonicPhrase {
    /// Generate a fresh 12-word mnemonic from 128 bits of caller-supplied
    /// entropy.
    pub fn generate(rng: &mut impl rand_core::RngCore) -> Self {
        let mut entropy = [0u8; ENTROPY_BYTES];
        rng.fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
            .expect("16 bytes is a valid BIP39 entropy length");
        Self(Secret::new(mnemonic.to_string()))
    }

    /// Parse and validate an existing mnemonic phrase (whitespace-normalized,
    /// checksum-verified).
    pub fn parse(phrase: &str) -> Result<Self, MnemonicError> {
        let mnemonic = Mnemonic::parse_in(Language::English, phrase)?;
        Ok(Self(Secret::new(mnemonic.to_string())))
    }

    /// Derive the 64-byte BIP39 seed, optionally with a passphrase (the
    /// 25th-word / "hidden wallet" feature; empty string if unused).
    pub fn to_seed(&self, passphrase: &str) -> [u8; 64] {
        let mnemonic = Mnemonic::parse_in(Language::English, self.0.expose_secret())
            .expect("phrase was already validated at construction");
        mnemonic.to_seed(passphrase)
    }

    pub fn phrase(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn word_count(&self) -> usize {
        self.0.expose_secret().split_whitespace().count()
    }
}

impl std::fmt::Debug for MnemonicPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MnemonicPhrase({} words, REDACTED)", self.word_count())
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand_core::SeedableRng;

    use super::*;

    #[test]
    fn generated_mnemonic_is_twelve_words_and_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        let mnemonic = MnemonicPhrase::generate(&mut rng);
        assert_eq!(mnemonic.word_count(), 12);
        MnemonicPhrase::parse(mnemonic.phrase()).expect("self-generated mnemonic must validate");
    }

    #[test]
    fn generate_is_deterministic_given_rng_state() {
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = MnemonicPhrase::generate(&mut rng_a);
        let b = MnemonicPhrase::generate(&mut rng_b);
        assert_eq!(a.phrase(), b.phrase());
    }

    #[test]
    fn rejects_bad_checksum() {
        let bad = "abandon abandon abandon abandon abandon abandon \
                    abandon abandon abandon abandon abandon abandon";
        let err = MnemonicPhrase::parse(bad).unwrap_err();
        assert_eq!(err, MnemonicError::BadChecksum);
    }

    #[test]
    fn rejects_unknown_word() {
        let bad = "abandon abandon abandon abandon abandon abandon \
                    abandon abandon abandon abandon abandon notaword";
        assert!(MnemonicPhrase::parse(bad).is_err());
    }

    #[test]
    fn known_vector_seed() {
        // Standard all-"abandon" + "about" test vector from the BIP39 spec.
        let phrase = "abandon abandon abandon abandon abandon abandon \
                       abandon abandon abandon abandon abandon about";
        let mnemonic = MnemonicPhrase::parse(phrase).unwrap();
        let seed = mnemonic.to_seed("");
        assert_eq!(
            hex::encode(seed),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc\
             19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e"
        );
    }
}
