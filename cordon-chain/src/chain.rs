//! The `Chain` capability enum (spec §9 redesign note): replaces a runtime
//! chain-switching `if family == "evm" else ...` idiom with a variant type
//! plus distinct address/account newtypes per family, so an EVM-only
//! function simply cannot accept a Solana address — the compiler rejects it
//! rather than a runtime branch.

use serde::{Deserialize, Serialize};

use crate::config::EvmChainId;
use crate::error::{CoreError, ErrorCode};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Chain {
    Evm(EvmChainId),
    Solana,
}

impl Chain {
    pub fn as_evm_chain_id(&self) -> Option<EvmChainId> {
        match self {
            Self::Evm(id) => Some(*id),
            Self::Solana => None,
        }
    }

    pub fn is_solana(&self) -> bool {
        matches!(self, Self::Solana)
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Evm(id) => write!(f, "evm:{id}"),
            Self::Solana => write!(f, "solana"),
        }
    }
}

/// A 20-byte EVM address. Never confusable with a [`SolanaAddress`] at the
/// type level, unlike a bare `Vec<u8>` or `String`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct EvmAddress(#[serde(with = "evm_address_hex")] pub [u8; 20]);

impl EvmAddress {
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses `0x`-prefixed, 40-hex-digit addresses. Case is not checked
    /// against EIP-55 (spec §4.C: "comparisons ALWAYS use lowercased
    /// forms"); checksum casing is a display-only concern for the UI layer.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let stripped = s.strip_prefix("0x").ok_or_else(|| CoreError::Unknown {
            details: format!("address missing 0x prefix: {s}"),
        })?;
        if stripped.len() != 40 {
            return Err(CoreError::Unknown {
                details: format!("address has wrong length: {s}"),
            });
        }
        let mut out = [0u8; 20];
        hex::decode_to_slice(stripped, &mut out).map_err(|_| CoreError::Unknown {
            details: format!("address is not valid hex: {s}"),
        })?;
        Ok(Self(out))
    }

    pub fn eq_case_insensitive(&self, other: &str) -> bool {
        other
            .strip_prefix("0x")
            .map(|rest| rest.eq_ignore_ascii_case(&hex::encode(self.0)))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for EvmAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EvmAddress({})", self.to_hex())
    }
}

mod evm_address_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 20], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 20], D::Error> {
        let text = String::deserialize(d)?;
        let stripped = text.strip_prefix("0x").unwrap_or(&text);
        let mut out = [0u8; 20];
        hex::decode_to_slice(stripped, &mut out).map_err(serde::de::Error::custom)?;
        Ok(out)
    }
}

/// A 32-byte Solana Ed25519 public key, displayed/parsed as base58.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SolanaAddress(#[serde(with = "solana_address_base58")] pub [u8; 32]);

impl SolanaAddress {
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let decoded = bs58::decode(s).into_vec().map_err(|_| CoreError::Unknown {
            details: format!("address is not valid base58: {s}"),
        })?;
        let array: [u8; 32] = decoded.try_into().map_err(|_| CoreError::Unknown {
            details: format!("address has wrong length: {s}"),
        })?;
        Ok(Self(array))
    }
}

impl std::fmt::Debug for SolanaAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SolanaAddress({})", self.to_base58())
    }
}

mod solana_address_base58 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&bs58::encode(bytes).into_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(d)?;
        let decoded = bs58::decode(&text)
            .into_vec()
            .map_err(serde::de::Error::custom)?;
        decoded
            .try_into()
            .map_err(|_| serde::de::Error::custom("wrong length for a Solana address"))
    }
}

/// Raised when a caller asks to perform a family-specific operation against
/// a `Chain` of the wrong family. The `Chain` redesign mostly prevents this
/// at the type level (callers hold an `EvmAddress`/`SolanaAddress`
/// directly), but dynamic entry points like the dApp bridge dispatch on a
/// request's declared chain string first and need a runtime check too.
pub fn require_evm(chain: Chain) -> Result<EvmChainId, CoreError> {
    chain
        .as_evm_chain_id()
        .ok_or_else(|| CoreError::UnsupportedChain("expected an EVM chain, got Solana".into()))
}

pub fn require_solana(chain: Chain) -> Result<(), CoreError> {
    if chain.is_solana() {
        Ok(())
    } else {
        Err(CoreError::UnsupportedChain(
            "expected Solana, got an EVM chain".into(),
        ))
    }
}
