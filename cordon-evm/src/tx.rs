//! Legacy and EIP-1559 transaction encoding/signing.

use cordon_crypto::evm_sign::{self, EvmSignature};
use cordon_crypto::keccak;
use num_bigint::BigUint;
use secp256k1::SecretKey;

use crate::rlp::{encode_list, RlpItem};

fn to_item(to: Option<[u8; 20]>) -> RlpItem {
    match to {
        Some(address) => RlpItem::bytes(address.to_vec()),
        None => RlpItem::empty(),
    }
}

/// A pre-EIP-1559 legacy transaction, EIP-155 signed (chain id folded into
/// `v`).
#[derive(Clone, Debug)]
pub struct LegacyTx {
    pub nonce: u64,
    pub gas_price: BigUint,
    pub gas_limit: u64,
    pub to: Option<[u8; 20]>,
    pub value: BigUint,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTx {
    fn unsigned_items(&self) -> Vec<RlpItem> {
        vec![
            RlpItem::u64(self.nonce),
            RlpItem::uint(&self.gas_price),
            RlpItem::u64(self.gas_limit),
            to_item(self.to),
            RlpItem::uint(&self.value),
            RlpItem::bytes(self.data.clone()),
        ]
    }

    /// EIP-155 signing hash: the unsigned body plus `(chainId, 0, 0)`.
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut items = self.unsigned_items();
        items.push(RlpItem::u64(self.chain_id));
        items.push(RlpItem::empty());
        items.push(RlpItem::empty());
        keccak::digest(&encode_list(items))
    }

    pub fn sign(&self, secret_key: &SecretKey) -> EvmSignature {
        let digest = self.signing_hash();
        evm_sign::sign_digest(secret_key, &digest, Some(self.chain_id))
    }

    pub fn encode_signed(&self, signature: &EvmSignature) -> Vec<u8> {
        let mut items = self.unsigned_items();
        items.push(RlpItem::u64(signature.v as u64));
        items.push(RlpItem::Bytes(strip_zeros(&signature.r)));
        items.push(RlpItem::Bytes(strip_zeros(&signature.s)));
        encode_list(items)
    }
}

/// An EIP-1559 (type-2) transaction.
#[derive(Clone, Debug)]
pub struct Eip1559Tx {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: BigUint,
    pub max_fee_per_gas: BigUint,
    pub gas_limit: u64,
    pub to: Option<[u8; 20]>,
    pub value: BigUint,
    pub data: Vec<u8>,
}

impl Eip1559Tx {
    fn unsigned_items(&self) -> Vec<RlpItem> {
        vec![
            RlpItem::u64(self.chain_id),
            RlpItem::u64(self.nonce),
            RlpItem::uint(&self.max_priority_fee_per_gas),
            RlpItem::uint(&self.max_fee_per_gas),
            RlpItem::u64(self.gas_limit),
            to_item(self.to),
            RlpItem::uint(&self.value),
            RlpItem::bytes(self.data.clone()),
            RlpItem::List(vec![]), // empty access list
        ]
    }

    /// Signing hash is over `0x02 || rlp(unsigned fields)`, per EIP-1559.
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut payload = vec![0x02u8];
        payload.extend_from_slice(&encode_list(self.unsigned_items()));
        keccak::digest(&payload)
    }

    /// EIP-1559 signatures are plain `yParity` (0/1), not EIP-155 `v`, so
    /// signing goes through the chain-id-less path.
    pub fn sign(&self, secret_key: &SecretKey) -> EvmSignature {
        let digest = self.signing_hash();
        evm_sign::sign_digest(secret_key, &digest, None)
    }

    pub fn encode_signed(&self, signature: &EvmSignature) -> Vec<u8> {
        let y_parity = if signature.v == 27 { 0u64 } else { 1u64 };
        let mut items = self.unsigned_items();
        items.push(RlpItem::u64(y_parity));
        items.push(RlpItem::Bytes(strip_zeros(&signature.r)));
        items.push(RlpItem::Bytes(strip_zeros(&signature.s)));
        let mut out = vec![0x02u8];
        out.extend_from_slice(&encode_list(items));
        out
    }
}

fn strip_zeros(word: &[u8; 32]) -> Vec<u8> {
    let first_nonzero = word.iter().position(|&b| b != 0);
    match first_nonzero {
        Some(idx) => word[idx..].to_vec(),
        None => Vec::new(),
    }
}
