//! Swap orchestration (spec §4.H): routes and normalizes a quote through
//! `cordon_swap::router`, builds the provider's unsigned swap transaction,
//! signs it with the caller's Solana key, and hands the signed bytes to the
//! broadcast engine. `balance_lamports` is always a caller-supplied
//! parameter rather than read from `self.solana_rpc`, since no
//! `SolanaRpcClient` method here exposes a balance query — the embedding
//! UI already polls balances for its own display and is the natural owner
//! of that number.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cordon_chain::{CoreError, CoreResult};
use cordon_swap::{
    build_swap_request, fee_reserve_lamports, route_and_quote, spendable_lamports, BroadcastProgress,
    NormalizedQuote, RawQuote, Route, SpeedMode, SwapExtraParams,
};
use num_bigint::BigUint;
use tokio_util::sync::CancellationToken;

use crate::core::CordonCore;

pub struct SwapQuote {
    pub route: Route,
    pub quote: NormalizedQuote,
}

impl CordonCore {
    pub async fn swap_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: &BigUint,
        slippage_bps: u32,
        output_decimals: u32,
    ) -> CoreResult<SwapQuote> {
        let (route, quote) = route_and_quote(
            input_mint,
            output_mint,
            amount,
            slippage_bps,
            output_decimals,
            self.jupiter.as_ref(),
            self.pump.as_ref(),
        )
        .await
        .map_err(CoreError::from)?;
        Ok(SwapQuote { route, quote })
    }

    /// `spendable = max(0, balance - feeReserve)` for the given speed mode,
    /// so a caller can clamp an input amount before requesting a quote.
    pub fn swap_spendable_lamports(&self, balance_lamports: u64, speed: SpeedMode, needs_ata: bool) -> u64 {
        spendable_lamports(balance_lamports, fee_reserve_lamports(speed, needs_ata))
    }

    /// Quotes, builds, signs and broadcasts a swap in one call.
    /// `on_progress` mirrors `BroadcastEngine::broadcast`'s callback; `cancel`
    /// stops local polling/rebroadcasting only, never retracts an
    /// already-submitted transaction (spec §5).
    #[allow(clippy::too_many_arguments)]
    pub async fn swap_execute(
        &self,
        wallet_id: &str,
        input_mint: &str,
        output_mint: &str,
        amount: &BigUint,
        slippage_bps: u32,
        output_decimals: u32,
        speed: SpeedMode,
        extra: SwapExtraParams,
        max_duration: std::time::Duration,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(BroadcastProgress),
    ) -> CoreResult<BroadcastProgress> {
        let SwapQuote { route, quote } = self
            .swap_quote(input_mint, output_mint, amount, slippage_bps, output_decimals)
            .await?;

        let unsigned = match route {
            Route::Jupiter => {
                let swap_request = build_swap_request(quote.quote_response.clone(), output_mint, extra);
                self.jupiter
                    .build_swap_transaction(&swap_request)
                    .await
                    .map_err(CoreError::from)?
            }
            Route::Pump => {
                // `NormalizedQuote` carries the same provider fields a
                // `RawQuote` does (plus the derived `min_out`), so building
                // one back from the other round-trips what Pump's own quote
                // call returned without needing `route_and_quote` to expose
                // the pre-normalization value separately.
                let raw = RawQuote {
                    out_amount: quote.out_amount.clone(),
                    price_impact_pct: quote.price_impact_pct.clone(),
                    route_plan: quote.route_plan.clone(),
                    quote_response: quote.quote_response.clone(),
                };
                self.pump.build_swap_transaction(&raw).await.map_err(CoreError::from)?
            }
        };

        let unsigned_b64 = String::from_utf8(unsigned).map_err(|e| CoreError::Unknown {
            details: format!("swap transaction builder returned non-utf8 bytes: {e}"),
        })?;
        let signed_b64 = self.solana_sign_transaction(wallet_id, &unsigned_b64).await?;
        let signed_bytes = BASE64.decode(&signed_b64).map_err(|e| CoreError::Unknown {
            details: format!("signed swap transaction is not valid base64: {e}"),
        })?;

        self.broadcast
            .broadcast(signed_bytes, None, speed, max_duration, cancel, &mut on_progress)
            .await
            .map_err(CoreError::from)
    }
}
