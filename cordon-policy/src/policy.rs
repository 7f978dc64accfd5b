//! The pure policy evaluator (spec §4.E `checkApprovalPolicy`). Kept as a
//! pure function of `(approval, policy, metadata)` with no ledger access, to
//! break the cyclic relationship called out in spec §9: the signer calls
//! this function, then upserts the result into the ledger — the ledger
//! never calls back into the policy engine.

use num_bigint::BigUint;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::types::{DetectedApproval, PolicySettings};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolicyCheckResult {
    pub allowed: bool,
    pub reason: Option<String>,
    pub suggested_cap: Option<BigUint>,
    pub suggested_cap_formatted: Option<String>,
}

impl PolicyCheckResult {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
            suggested_cap: None,
            suggested_cap_formatted: None,
        }
    }

    fn blocked(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            suggested_cap: None,
            suggested_cap_formatted: None,
        }
    }
}

fn contains_case_insensitive(list: &[String], address: &str) -> bool {
    list.iter().any(|a| a.eq_ignore_ascii_case(address))
}

/// `cap = maxSpendUsd * 10 * 10^tokenDecimals` — "enough tokens for ~10x the
/// per-tx USD ceiling, as a convenience default" (spec §4.E). Spec §9 notes
/// implementers should prefer `ceil(maxSpendUsd / tokenPriceUsd) *
/// 10^decimals` when a price is available; this function only implements
/// the price-less fallback, since price lookup is an external collaborator
/// this crate doesn't depend on. A price-aware caller should compute its own
/// cap and skip this helper.
pub fn suggested_cap_without_price(max_spend_usd: &str, token_decimals: u8) -> Option<(BigUint, String)> {
    let max_spend = Decimal::from_str(max_spend_usd).ok()?;
    let cap_decimal = max_spend.checked_mul(Decimal::from(10u64))?;
    if cap_decimal.is_sign_negative() {
        return None;
    }

    // `Decimal` stores `value = mantissa / 10^scale`; rescale the mantissa
    // by `token_decimals - scale` to get the token's base-unit integer
    // without going through a lossy powi/float path.
    let mantissa = BigUint::from(cap_decimal.mantissa().unsigned_abs());
    let scale = cap_decimal.scale() as i64;
    let exponent = token_decimals as i64 - scale;
    let cap_raw = if exponent >= 0 {
        mantissa * BigUint::from(10u64).pow(exponent as u32)
    } else {
        mantissa / BigUint::from(10u64).pow((-exponent) as u32)
    };

    Some((cap_raw, cap_decimal.normalize().to_string()))
}

/// Precedence (stop at first match), per spec §4.E:
/// 1. denylisted spender -> blocked
/// 2. allowlisted spender -> allowed
/// 3. unlimited && policy blocks unlimited approvals -> blocked with a
///    suggested cap
/// 4. otherwise allowed
pub fn check_approval_policy(
    detected: &DetectedApproval,
    policy: &PolicySettings,
    token_decimals: u8,
) -> PolicyCheckResult {
    if contains_case_insensitive(&policy.denylisted_addresses, &detected.spender) {
        return PolicyCheckResult::blocked("Spender denylisted");
    }

    if contains_case_insensitive(&policy.allowlisted_addresses, &detected.spender) {
        return PolicyCheckResult::allowed();
    }

    if detected.is_unlimited && policy.block_unlimited_approvals {
        let mut result = PolicyCheckResult::blocked(
            "Unlimited approvals are blocked by policy; choose a spending cap instead",
        );
        if let Some((cap, formatted)) =
            suggested_cap_without_price(&policy.max_spend_per_transaction, token_decimals)
        {
            result.suggested_cap = Some(cap);
            result.suggested_cap_formatted = Some(formatted);
        }
        return result;
    }

    PolicyCheckResult::allowed()
}

#[cfg(test)]
mod test {
    use super::*;

    fn detected(spender: &str, is_unlimited: bool) -> DetectedApproval {
        DetectedApproval {
            token_address: "0xtoken".to_string(),
            spender: spender.to_string(),
            amount_raw: if is_unlimited {
                BigUint::from(1u8) << 255u32
            } else {
                BigUint::from(100u64)
            },
            is_unlimited,
        }
    }

    fn base_policy() -> PolicySettings {
        PolicySettings {
            block_unlimited_approvals: true,
            max_spend_per_transaction: "1000".to_string(),
            daily_spend_limit: "5000".to_string(),
            allowlisted_addresses: vec![],
            denylisted_addresses: vec![],
        }
    }

    #[test]
    fn denylist_wins_over_allowlist() {
        let mut policy = base_policy();
        policy.allowlisted_addresses.push("0xSpender".to_string());
        policy.denylisted_addresses.push("0xspender".to_string());
        let result = check_approval_policy(&detected("0xSPENDER", false), &policy, 6);
        assert!(!result.allowed);
        assert_eq!(result.reason.as_deref(), Some("Spender denylisted"));
    }

    #[test]
    fn unlimited_to_allowlisted_spender_is_allowed() {
        let mut policy = base_policy();
        policy.allowlisted_addresses.push("0xspender".to_string());
        let result = check_approval_policy(&detected("0xSpender", true), &policy, 6);
        assert!(result.allowed);
    }

    #[test]
    fn unlimited_blocked_with_suggested_cap() {
        let policy = base_policy();
        let result = check_approval_policy(&detected("0xunknown", true), &policy, 6);
        assert!(!result.allowed);
        // cap = 1000 * 10 * 10^6 = 10_000_000_000
        assert_eq!(result.suggested_cap, Some(BigUint::from(10_000_000_000u64)));
    }

    #[test]
    fn non_unlimited_unknown_spender_is_allowed() {
        let policy = base_policy();
        let result = check_approval_policy(&detected("0xunknown", false), &policy, 6);
        assert!(result.allowed);
    }
}
