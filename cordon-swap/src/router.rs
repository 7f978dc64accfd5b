//! Jupiter/Pump.fun routing decision (spec §4.H).

use num_bigint::BigUint;
use tracing::debug;

use crate::error::SwapError;
use crate::quote::NormalizedQuote;
use crate::rpc::{JupiterClient, PumpClient};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Route {
    Jupiter,
    Pump,
}

fn is_pump_suffixed(mint: &str) -> bool {
    mint.to_lowercase().ends_with("pump")
}

/// Picks the initial route: Pump.fun only when the mint looks like a pump
/// token AND the bonding-curve probe confirms it hasn't graduated yet.
/// A probe failure is treated as "not confirmed on the curve" rather than
/// propagated, since the probe is advisory for route selection only — the
/// chosen route's own quote call is what actually validates the mint.
pub async fn choose_route(output_mint: &str, pump: &dyn PumpClient) -> Route {
    if !is_pump_suffixed(output_mint) {
        return Route::Jupiter;
    }
    match pump.is_on_bonding_curve(output_mint).await {
        Ok(true) => Route::Pump,
        _ => Route::Jupiter,
    }
}

/// Routes and normalizes a quote, applying the fallback rules spec §4.H
/// names: any route error falls back to the other, except that a Jupiter
/// "not routable" response for a Pump-suffixed mint is an expected
/// fallback (logged at `debug`, not `warn`), and a Pump 400 ("token
/// graduated") sends the caller back to Jupiter rather than erroring.
pub async fn route_and_quote(
    input_mint: &str,
    output_mint: &str,
    amount: &BigUint,
    slippage_bps: u32,
    output_decimals: u32,
    jupiter: &dyn JupiterClient,
    pump: &dyn PumpClient,
) -> Result<(Route, NormalizedQuote), SwapError> {
    let primary = choose_route(output_mint, pump).await;
    match primary {
        Route::Pump => {
            match pump.quote(input_mint, output_mint, amount, slippage_bps).await {
                Ok(raw) => Ok((Route::Pump, NormalizedQuote::from_raw(raw, slippage_bps, output_decimals))),
                Err(SwapError::TokenGraduated) => {
                    debug!(output_mint, "pump.fun reports token graduated, retrying on jupiter");
                    let raw = jupiter
                        .quote(input_mint, output_mint, amount, slippage_bps)
                        .await?;
                    Ok((Route::Jupiter, NormalizedQuote::from_raw(raw, slippage_bps, output_decimals)))
                }
                Err(e) => {
                    tracing::warn!(output_mint, error = %e, "pump.fun route failed, falling back to jupiter");
                    let raw = jupiter
                        .quote(input_mint, output_mint, amount, slippage_bps)
                        .await?;
                    Ok((Route::Jupiter, NormalizedQuote::from_raw(raw, slippage_bps, output_decimals)))
                }
            }
        }
        Route::Jupiter => {
            match jupiter.quote(input_mint, output_mint, amount, slippage_bps).await {
                Ok(raw) => Ok((Route::Jupiter, NormalizedQuote::from_raw(raw, slippage_bps, output_decimals))),
                Err(SwapError::NotRoutable) if is_pump_suffixed(output_mint) => {
                    debug!(output_mint, "jupiter reports not routable for a pump-suffixed mint, falling back as expected");
                    let raw = pump.quote(input_mint, output_mint, amount, slippage_bps).await?;
                    Ok((Route::Pump, NormalizedQuote::from_raw(raw, slippage_bps, output_decimals)))
                }
                Err(e) => {
                    tracing::warn!(output_mint, error = %e, "jupiter route failed, falling back to pump.fun");
                    let raw = pump.quote(input_mint, output_mint, amount, slippage_bps).await?;
                    Ok((Route::Pump, NormalizedQuote::from_raw(raw, slippage_bps, output_decimals)))
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct MockPump {
        on_curve: bool,
    }

    #[async_trait]
    impl PumpClient for MockPump {
        async fn is_on_bonding_curve(&self, _mint: &str) -> Result<bool, SwapError> {
            Ok(self.on_curve)
        }
        async fn quote(
            &self,
            _input_mint: &str,
            _output_mint: &str,
            amount: &BigUint,
            _slippage_bps: u32,
        ) -> Result<crate::rpc::RawQuote, SwapError> {
            Ok(crate::rpc::RawQuote {
                out_amount: amount.clone(),
                price_impact_pct: "0.1".to_string(),
                route_plan: json!([]),
                quote_response: json!({}),
            })
        }
        async fn build_swap_transaction(
            &self,
            _quote: &crate::rpc::RawQuote,
        ) -> Result<Vec<u8>, SwapError> {
            Ok(vec![])
        }
    }

    struct MockJupiter;

    #[async_trait]
    impl JupiterClient for MockJupiter {
        async fn quote(
            &self,
            _input_mint: &str,
            _output_mint: &str,
            amount: &BigUint,
            _slippage_bps: u32,
        ) -> Result<crate::rpc::RawQuote, SwapError> {
            Ok(crate::rpc::RawQuote {
                out_amount: amount.clone(),
                price_impact_pct: "0.2".to_string(),
                route_plan: json!([]),
                quote_response: json!({}),
            })
        }
        async fn build_swap_transaction(&self, _swap_request: &serde_json::Value) -> Result<Vec<u8>, SwapError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn pump_suffixed_mint_on_curve_routes_to_pump() {
        let pump = MockPump { on_curve: true };
        let route = choose_route("abc123pump", &pump).await;
        assert_eq!(route, Route::Pump);
    }

    #[tokio::test]
    async fn pump_suffixed_mint_off_curve_routes_to_jupiter() {
        let pump = MockPump { on_curve: false };
        let route = choose_route("abc123pump", &pump).await;
        assert_eq!(route, Route::Jupiter);
    }

    #[tokio::test]
    async fn non_pump_mint_always_routes_to_jupiter() {
        let pump = MockPump { on_curve: true };
        let route = choose_route("So11111111111111111111111111111111111111112", &pump).await;
        assert_eq!(route, Route::Jupiter);
    }

    #[tokio::test]
    async fn pump_quote_failure_falls_back_to_jupiter() {
        struct FailingPump;
        #[async_trait]
        impl PumpClient for FailingPump {
            async fn is_on_bonding_curve(&self, _mint: &str) -> Result<bool, SwapError> {
                Ok(true)
            }
            async fn quote(
                &self,
                _i: &str,
                _o: &str,
                _a: &BigUint,
                _s: u32,
            ) -> Result<crate::rpc::RawQuote, SwapError> {
                Err(SwapError::Pump("curve account not found".to_string()))
            }
            async fn build_swap_transaction(&self, _q: &crate::rpc::RawQuote) -> Result<Vec<u8>, SwapError> {
                Ok(vec![])
            }
        }
        let (route, _quote) = route_and_quote(
            "So11111111111111111111111111111111111111112",
            "abc123pump",
            &BigUint::from(1_000_000u64),
            100,
            6,
            &MockJupiter,
            &FailingPump,
        )
        .await
        .unwrap();
        assert_eq!(route, Route::Jupiter);
    }
}
