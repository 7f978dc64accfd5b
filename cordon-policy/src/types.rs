//! Data model for the approval engine (spec §3).

use cordon_chain::config::EvmChainId;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PolicySettings {
    pub block_unlimited_approvals: bool,
    /// USD decimal string, e.g. `"1000.00"`.
    pub max_spend_per_transaction: String,
    pub daily_spend_limit: String,
    pub allowlisted_addresses: Vec<String>,
    pub denylisted_addresses: Vec<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Pending,
    Confirmed,
    Failed,
    Revoking,
    Revoked,
    /// Distinguished terminal state per spec §9's first open question: the
    /// source conflated "revoke attempt failed" with "confirmed", losing
    /// the distinction between "still live, we tried" and "healthy".
    RevokeFailed,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub id: String,
    pub chain_id: EvmChainId,
    pub owner: String,
    pub token_address: String,
    pub spender: String,
    pub token_metadata: Option<TokenMetadata>,
    #[serde(with = "biguint_decimal")]
    pub allowance_raw: BigUint,
    pub is_unlimited: bool,
    pub created_at: u64,
    pub tx_hash: Option<String>,
    pub status: ApprovalStatus,
    pub last_checked_at: Option<u64>,
    pub revoke_hash: Option<String>,
}

impl ApprovalRecord {
    /// `lower(owner)-chainId-lower(token)-lower(spender)`, per spec §3.
    pub fn generate_id(chain_id: EvmChainId, owner: &str, token: &str, spender: &str) -> String {
        format!(
            "{}-{}-{}-{}",
            owner.to_lowercase(),
            chain_id,
            token.to_lowercase(),
            spender.to_lowercase()
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DetectedApproval {
    pub token_address: String,
    pub spender: String,
    pub amount_raw: BigUint,
    pub is_unlimited: bool,
}

/// Threshold from spec §4.E: any allowance at or above `2^255` is
/// conventionally "unlimited".
pub fn unlimited_threshold() -> BigUint {
    BigUint::from(1u8) << 255u32
}

pub fn is_unlimited(amount: &BigUint) -> bool {
    *amount >= unlimited_threshold()
}

mod biguint_decimal {
    use num_bigint::BigUint;
    use num_traits::Num;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigUint, D::Error> {
        let text = String::deserialize(d)?;
        BigUint::from_str_radix(&text, 10).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unlimited_threshold_is_2_pow_255() {
        let threshold = unlimited_threshold();
        assert!(is_unlimited(&threshold));
        assert!(!is_unlimited(&(threshold - 1u8)));
    }

    #[test]
    fn approval_id_is_lowercased_and_stable() {
        let id = ApprovalRecord::generate_id(1, "0xABC", "0xDEF", "0x123");
        assert_eq!(id, "0xabc-1-0xdef-0x123");
    }
}
