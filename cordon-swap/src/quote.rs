//! Quote normalization and fee reservation (spec §4.H).

use num_bigint::BigUint;
use serde_json::Value;

use crate::rpc::RawQuote;

/// `{outAmount, minOut, priceImpactPct, routePlan}`, normalized the same
/// way regardless of which route produced the raw quote.
#[derive(Clone, Debug)]
pub struct NormalizedQuote {
    pub out_amount: BigUint,
    pub min_out: BigUint,
    pub price_impact_pct: String,
    pub route_plan: Value,
    pub quote_response: Value,
}

impl NormalizedQuote {
    /// `minOut = outAmount * (1 - slippageBps/10_000)`, truncated — base
    /// units are already integral, so truncation is exact `BigUint`
    /// division, not a decimal rounding step.
    pub fn from_raw(raw: RawQuote, slippage_bps: u32, _output_decimals: u32) -> Self {
        let bps_retained = 10_000u32.saturating_sub(slippage_bps);
        let min_out = (&raw.out_amount * bps_retained) / 10_000u32;
        Self {
            out_amount: raw.out_amount,
            min_out,
            price_impact_pct: raw.price_impact_pct,
            route_plan: raw.route_plan,
            quote_response: raw.quote_response,
        }
    }
}

/// The wrapped-SOL mint address; swaps whose output is this mint get the
/// SOL-output safety treatment (spec §4.H).
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Extra swap-request parameters beyond the quote response itself.
#[derive(Clone, Debug, Default)]
pub struct SwapExtraParams {
    pub destination_token_account: Option<String>,
    pub fee_account: Option<String>,
    pub platform_fee_bps: Option<u32>,
    pub wrap_and_unwrap_sol: bool,
}

/// Builds the swap-request payload. When the output mint is wrapped SOL,
/// strips destination/fee-account parameters and forces
/// `wrapAndUnwrapSol=true`; `quote_response` itself is carried through
/// untouched either way, since spec §4.H requires it stay byte-identical
/// to what the route returned (mutating it produces on-chain error
/// `0x1788`).
pub fn build_swap_request(quote_response: Value, output_mint: &str, mut params: SwapExtraParams) -> Value {
    if output_mint == WRAPPED_SOL_MINT {
        params.destination_token_account = None;
        params.fee_account = None;
        params.platform_fee_bps = None;
        params.wrap_and_unwrap_sol = true;
    }
    serde_json::json!({
        "quoteResponse": quote_response,
        "destinationTokenAccount": params.destination_token_account,
        "feeAccount": params.fee_account,
        "platformFeeBps": params.platform_fee_bps,
        "wrapAndUnwrapSol": params.wrap_and_unwrap_sol,
    })
}

/// Speed mode governing priority-fee cap and rebroadcast cadence (spec
/// §4.H/§5; exact rebroadcast intervals aren't specified, chosen here to
/// scale with urgency — see DESIGN.md).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SpeedMode {
    Standard,
    Fast,
    Turbo,
}

impl SpeedMode {
    pub const fn priority_fee_cap_lamports(self) -> u64 {
        match self {
            Self::Standard => 500_000,
            Self::Fast => 2_000_000,
            Self::Turbo => 5_000_000,
        }
    }

    pub const fn rebroadcast_interval(self) -> std::time::Duration {
        match self {
            Self::Standard => std::time::Duration::from_secs(4),
            Self::Fast => std::time::Duration::from_secs(2),
            Self::Turbo => std::time::Duration::from_millis(1000),
        }
    }
}

const BASE_FEE_LAMPORTS: u64 = 5_000;
const BASE_FEE_BUFFER_LAMPORTS: u64 = 5_000;
const ATA_RENT_LAMPORTS: u64 = 2_039_280;
const SAFETY_BUFFER_LAMPORTS: u64 = 200_000;

/// `reserve = priorityFeeCap + (baseFee + baseFeeBuffer) + (atasRentIfNeeded)
/// + safetyBuffer`.
pub fn fee_reserve_lamports(speed: SpeedMode, needs_ata: bool) -> u64 {
    speed.priority_fee_cap_lamports()
        + BASE_FEE_LAMPORTS
        + BASE_FEE_BUFFER_LAMPORTS
        + if needs_ata { ATA_RENT_LAMPORTS } else { 0 }
        + SAFETY_BUFFER_LAMPORTS
}

/// `spendable = max(0, balanceLamports - reserve)`.
pub fn spendable_lamports(balance_lamports: u64, reserve_lamports: u64) -> u64 {
    balance_lamports.saturating_sub(reserve_lamports)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn min_out_applies_slippage_bps() {
        let raw = RawQuote {
            out_amount: BigUint::from(1_000_000u64),
            price_impact_pct: "0.1".to_string(),
            route_plan: serde_json::json!([]),
            quote_response: serde_json::json!({"a": 1}),
        };
        let normalized = NormalizedQuote::from_raw(raw, 100, 6); // 1% slippage
        assert_eq!(normalized.min_out, BigUint::from(990_000u64));
    }

    #[test]
    fn zero_slippage_preserves_out_amount() {
        let raw = RawQuote {
            out_amount: BigUint::from(500u64),
            price_impact_pct: "0".to_string(),
            route_plan: serde_json::json!([]),
            quote_response: serde_json::json!({}),
        };
        let normalized = NormalizedQuote::from_raw(raw, 0, 9);
        assert_eq!(normalized.min_out, BigUint::from(500u64));
    }

    #[test]
    fn sol_output_strips_destination_and_fee_params() {
        let quote_response = serde_json::json!({"outAmount": "123", "other": true});
        let params = SwapExtraParams {
            destination_token_account: Some("dest".to_string()),
            fee_account: Some("fee".to_string()),
            platform_fee_bps: Some(50),
            wrap_and_unwrap_sol: false,
        };
        let request = build_swap_request(quote_response.clone(), WRAPPED_SOL_MINT, params);
        assert_eq!(request["destinationTokenAccount"], serde_json::Value::Null);
        assert_eq!(request["feeAccount"], serde_json::Value::Null);
        assert_eq!(request["platformFeeBps"], serde_json::Value::Null);
        assert_eq!(request["wrapAndUnwrapSol"], serde_json::json!(true));
        assert_eq!(request["quoteResponse"], quote_response);
    }

    #[test]
    fn non_sol_output_keeps_destination_account() {
        let quote_response = serde_json::json!({"outAmount": "123"});
        let params = SwapExtraParams {
            destination_token_account: Some("dest".to_string()),
            fee_account: None,
            platform_fee_bps: None,
            wrap_and_unwrap_sol: false,
        };
        let request = build_swap_request(quote_response, "SomeOtherMint111111111111111111111111111111", params);
        assert_eq!(request["destinationTokenAccount"], serde_json::json!("dest"));
        assert_eq!(request["wrapAndUnwrapSol"], serde_json::json!(false));
    }

    #[test]
    fn fee_reserve_scales_with_speed_mode() {
        let standard = fee_reserve_lamports(SpeedMode::Standard, false);
        let turbo = fee_reserve_lamports(SpeedMode::Turbo, false);
        assert_eq!(standard, 500_000 + 5_000 + 5_000 + 200_000);
        assert_eq!(turbo, 5_000_000 + 5_000 + 5_000 + 200_000);
    }

    #[test]
    fn fee_reserve_includes_ata_rent_when_needed() {
        let without = fee_reserve_lamports(SpeedMode::Standard, false);
        let with = fee_reserve_lamports(SpeedMode::Standard, true);
        assert_eq!(with - without, ATA_RENT_LAMPORTS);
    }

    #[test]
    fn spendable_is_zero_below_reserve() {
        assert_eq!(spendable_lamports(1_000, 5_000), 0);
    }

    #[test]
    fn spendable_is_balance_minus_reserve_above_reserve() {
        assert_eq!(spendable_lamports(10_000, 5_000), 5_000);
    }
}
