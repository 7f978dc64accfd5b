//! Risk scoring for enriched approval records (spec §4.E).

use crate::types::{ApprovalRecord, RiskLevel};

/// Symbols of the explicit high-value token set (spec §4.E).
const HIGH_VALUE_SYMBOLS: &[&str] = &[
    "USDC", "USDT", "DAI", "WETH", "WBTC", "WBNB", "WMATIC", "BUSD",
];

const STALE_THRESHOLD_MS: u64 = 90 * 24 * 60 * 60 * 1000;

/// Static known/trusted spender registry, keyed by chain id then lowercase
/// address. A real deployment would load this from a bundled list shipped
/// with the app; a small hardcoded seed (well-known router/permit2
/// contracts) stands in for it here.
pub fn is_known_spender(chain_id: u64, spender: &str) -> bool {
    let spender = spender.to_lowercase();
    match chain_id {
        // Ethereum mainnet: Uniswap Universal Router, Permit2.
        1 => matches!(
            spender.as_str(),
            "0x000000000022d473030f116ddee9f6b43ac78ba" // Permit2
                | "0x3fc91a3afd70395cd496c647d5a6cc9d4b2b7fad" // Universal Router
        ),
        _ => false,
    }
}

pub fn is_high_value_token(symbol: &str) -> bool {
    HIGH_VALUE_SYMBOLS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(symbol))
}

fn is_stale(record: &ApprovalRecord, now_ms: u64) -> bool {
    now_ms.saturating_sub(record.created_at) > STALE_THRESHOLD_MS
}

/// Score a single enriched record. `now_ms` is caller-supplied (no wall-clock
/// access inside this pure scorer) so the function stays a deterministic,
/// easily-tested function of its inputs.
pub fn score(record: &ApprovalRecord, now_ms: u64, unverified_protocol: bool) -> RiskLevel {
    let known_spender = is_known_spender(record.chain_id, &record.spender);
    let high_value = record
        .token_metadata
        .as_ref()
        .map(|m| is_high_value_token(&m.symbol))
        .unwrap_or(false);

    if record.is_unlimited && (high_value || !known_spender) {
        return RiskLevel::High;
    }

    if (record.is_unlimited && (is_stale(record, now_ms) || unverified_protocol)) || !known_spender {
        return RiskLevel::Medium;
    }

    RiskLevel::Low
}

/// Sort by risk level for display: high < medium < low (spec §4.E).
pub fn sort_by_risk(records: &mut [(ApprovalRecord, RiskLevel)]) {
    records.sort_by_key(|(_, risk)| match risk {
        RiskLevel::High => 0,
        RiskLevel::Medium => 1,
        RiskLevel::Low => 2,
    });
}
