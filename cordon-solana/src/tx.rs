//! Transaction decode, drainer-scan, sign, and re-encode (spec §4.G:
//! `signTransaction` tries a versioned transaction first, then falls back
//! to a legacy one). Decoding is delegated to `solana-sdk`'s own types —
//! this crate treats the wire format as a trusted, directly-observed
//! dependency the same way the Jupiter/Pump.fun integrations do in the
//! broader pack — but signing bypasses `solana_sdk::signer::Signer`
//! entirely: the wallet's only Ed25519 key material lives behind
//! `cordon_crypto::solana_keys::SolanaAccountKey`, so the message bytes are
//! signed there and the signature is spliced into the transaction by hand.

use solana_sdk::instruction::CompiledInstruction;
use solana_sdk::message::VersionedMessage;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, VersionedTransaction};

use crate::drainer;
use crate::error::SolanaError;

/// Remote transaction bytes are untrusted input; cap the size bincode will
/// allocate for, mirroring the pack's own `MAX_REMOTE_TX_BYTES` guard.
const MAX_TX_BYTES: u64 = 2 * 1024 * 1024;

pub enum DecodedTransaction {
    Versioned(VersionedTransaction),
    Legacy(Transaction),
}

impl DecodedTransaction {
    /// Tries `VersionedTransaction` first, then legacy `Transaction`, per
    /// spec §4.G.
    pub fn decode(bytes: &[u8]) -> Result<Self, SolanaError> {
        use bincode::Options;
        fn opts() -> impl Options {
            bincode::DefaultOptions::new().with_limit(MAX_TX_BYTES)
        }
        if let Ok(vt) = opts().deserialize::<VersionedTransaction>(bytes) {
            return Ok(Self::Versioned(vt));
        }
        match opts().deserialize::<Transaction>(bytes) {
            Ok(tx) => Ok(Self::Legacy(tx)),
            Err(e) => Err(SolanaError::UndecodableTransaction(e.to_string())),
        }
    }

    pub(crate) fn static_keys(&self) -> &[Pubkey] {
        match self {
            Self::Versioned(vt) => match &vt.message {
                VersionedMessage::Legacy(m) => &m.account_keys,
                VersionedMessage::V0(m) => &m.account_keys,
            },
            Self::Legacy(tx) => &tx.message.account_keys,
        }
    }

    pub(crate) fn instructions(&self) -> &[CompiledInstruction] {
        match self {
            Self::Versioned(vt) => match &vt.message {
                VersionedMessage::Legacy(m) => &m.instructions,
                VersionedMessage::V0(m) => &m.instructions,
            },
            Self::Legacy(tx) => &tx.message.instructions,
        }
    }

    fn num_required_signatures(&self) -> u8 {
        match self {
            Self::Versioned(vt) => match &vt.message {
                VersionedMessage::Legacy(m) => m.header.num_required_signatures,
                VersionedMessage::V0(m) => m.header.num_required_signatures,
            },
            Self::Legacy(tx) => tx.message.header.num_required_signatures,
        }
    }

    /// The exact bytes the signature covers.
    fn message_bytes(&self) -> Vec<u8> {
        match self {
            Self::Versioned(vt) => vt.message.serialize(),
            Self::Legacy(tx) => tx.message.serialize(),
        }
    }

    fn signer_index(&self, signer: &Pubkey) -> Result<usize, SolanaError> {
        let keys = self.static_keys();
        let required = self.num_required_signatures() as usize;
        let index = keys
            .iter()
            .position(|k| k == signer)
            .ok_or(SolanaError::NotASigner)?;
        if index >= required {
            return Err(SolanaError::NotASigner);
        }
        Ok(index)
    }

    fn set_signature(&mut self, index: usize, signature: Signature) {
        let slot = match self {
            Self::Versioned(vt) => &mut vt.signatures,
            Self::Legacy(tx) => &mut tx.signatures,
        };
        if index < slot.len() {
            slot[index] = signature;
        }
    }

    fn reencode(&self) -> Vec<u8> {
        match self {
            Self::Versioned(vt) => bincode::serialize(vt).expect("serializing a signed tx cannot fail"),
            Self::Legacy(tx) => bincode::serialize(tx).expect("serializing a signed tx cannot fail"),
        }
    }

    /// Runs the drainer decoder, then signs the message with the given
    /// keypair function and re-serializes. `sign` takes the raw message
    /// bytes and returns a raw 64-byte Ed25519 signature.
    pub fn scan_sign_and_reencode(
        mut self,
        signer: &Pubkey,
        sign: impl FnOnce(&[u8]) -> [u8; 64],
    ) -> Result<Vec<u8>, SolanaError> {
        drainer::scan(signer, self.static_keys(), self.instructions())?;
        let index = self.signer_index(signer)?;
        let message_bytes = self.message_bytes();
        let signature = Signature::from(sign(&message_bytes));
        self.set_signature(index, signature);
        Ok(self.reencode())
    }

    /// Used by the server-assisted transfer flow: the signable message was
    /// already produced (and signed) externally to this decode, so this
    /// only runs the drainer scan and splices the given signature in.
    pub fn splice_external_signature(
        mut self,
        signer: &Pubkey,
        signature: [u8; 64],
    ) -> Result<Vec<u8>, SolanaError> {
        drainer::scan(signer, self.static_keys(), self.instructions())?;
        let index = self.signer_index(signer)?;
        self.set_signature(index, Signature::from(signature));
        Ok(self.reencode())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use solana_sdk::message::{Message, MessageHeader};

    fn legacy_system_transfer(signer: Pubkey, to: Pubkey) -> Transaction {
        let ix = CompiledInstruction {
            program_id_index: 2,
            accounts: vec![0, 1],
            data: {
                let mut d = 2u32.to_le_bytes().to_vec(); // Transfer tag
                d.extend_from_slice(&1_000_000u64.to_le_bytes());
                d
            },
        };
        let message = Message {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![signer, to, Pubkey::new_from_array([0u8; 32])],
            recent_blockhash: solana_sdk::hash::Hash::new_from_array([7u8; 32]),
            instructions: vec![ix],
        };
        Transaction {
            signatures: vec![Signature::from([0u8; 64])],
            message,
        }
    }

    #[test]
    fn decodes_legacy_shaped_bytes_without_error() {
        // `VersionedTransaction`'s (de)serializer is wire-compatible with
        // bare legacy `Transaction` bytes, so legacy-shaped input may
        // legitimately land in either enum arm; only decodability and
        // round-trip signing are asserted here.
        let signer = Pubkey::new_from_array([1u8; 32]);
        let to = Pubkey::new_from_array([2u8; 32]);
        let tx = legacy_system_transfer(signer, to);
        let bytes = bincode::serialize(&tx).unwrap();
        assert!(DecodedTransaction::decode(&bytes).is_ok());
    }

    #[test]
    fn signs_and_fills_correct_signature_slot() {
        let signer = Pubkey::new_from_array([1u8; 32]);
        let to = Pubkey::new_from_array([2u8; 32]);
        let tx = legacy_system_transfer(signer, to);
        let bytes = bincode::serialize(&tx).unwrap();
        let decoded = DecodedTransaction::decode(&bytes).unwrap();
        let out = decoded
            .scan_sign_and_reencode(&signer, |_msg| [9u8; 64])
            .unwrap();
        // Re-decode through the same lenient path rather than assuming the
        // legacy-specific wire shape survived the round trip verbatim.
        let resigned = DecodedTransaction::decode(&out).unwrap();
        let sig = match &resigned {
            DecodedTransaction::Versioned(vt) => vt.signatures[0],
            DecodedTransaction::Legacy(tx) => tx.signatures[0],
        };
        assert_eq!(sig, Signature::from([9u8; 64]));
    }

    #[test]
    fn rejects_non_signer_address() {
        let signer = Pubkey::new_from_array([1u8; 32]);
        let to = Pubkey::new_from_array([2u8; 32]);
        let tx = legacy_system_transfer(signer, to);
        let bytes = bincode::serialize(&tx).unwrap();
        let decoded = DecodedTransaction::decode(&bytes).unwrap();
        let stranger = Pubkey::new_from_array([99u8; 32]);
        let err = decoded
            .scan_sign_and_reencode(&stranger, |_msg| [9u8; 64])
            .unwrap_err();
        assert!(matches!(err, SolanaError::NotASigner));
    }
}
