//! The Jito-bundle broadcast engine (spec §4.H/§5): fans out signed bytes
//! to every configured endpoint without waiting, then drives a sequential
//! confirmation poller with periodic rebroadcast and a hard expiry.
//! Grounded on `cordon_evm::signer`'s `wait_for_receipt` poll loop, scaled
//! up to multiple endpoints and a rebroadcast timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SwapError;
use crate::quote::SpeedMode;
use crate::rpc::{BroadcastTransport, ConfirmationLevel};

const POLL_INTERVAL: Duration = Duration::from_millis(400);

#[derive(Clone, Debug)]
pub struct BroadcastEndpoints {
    pub jito_bundle_urls: Vec<String>,
    pub jito_send_transaction_url: String,
    pub primary_rpc: String,
    pub secondary_rpc: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BroadcastStatus {
    Submitted,
    Processed,
    Confirmed,
    Finalized,
    Failed { message: String },
    Expired,
}

impl BroadcastStatus {
    fn rank(&self) -> u8 {
        match self {
            Self::Submitted => 0,
            Self::Processed => 1,
            Self::Confirmed => 2,
            Self::Finalized => 3,
            Self::Failed { .. } | Self::Expired => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Failed { .. } | Self::Expired)
    }
}

#[derive(Clone, Debug)]
pub struct BroadcastProgress {
    pub status: BroadcastStatus,
    pub signature: String,
    pub rebroadcast_count: u32,
}

/// `base58(signedBytes[1..65])`, skipping the 1-byte signature-count
/// prefix, per spec §4.H/§8 ("broadcast signature extraction").
pub fn local_signature(signed_tx: &[u8]) -> Result<String, SwapError> {
    if signed_tx.len() < 65 {
        return Err(SwapError::Unknown(
            "signed transaction too short to contain a signature".to_string(),
        ));
    }
    Ok(bs58::encode(&signed_tx[1..65]).into_string())
}

pub struct BroadcastEngine {
    transport: Arc<dyn BroadcastTransport>,
    endpoints: BroadcastEndpoints,
}

impl BroadcastEngine {
    pub fn new(transport: Arc<dyn BroadcastTransport>, endpoints: BroadcastEndpoints) -> Self {
        Self { transport, endpoints }
    }

    /// Fires the signed bytes in parallel to every endpoint without
    /// waiting for any of them; failures are logged, never propagated,
    /// since the send phase's whole point is "try everything, the poller
    /// decides what actually landed".
    fn fire_all(&self, signed_tx: &[u8], tip_tx: Option<&[u8]>) {
        for endpoint in &self.endpoints.jito_bundle_urls {
            let transport = self.transport.clone();
            let endpoint = endpoint.clone();
            let signed = signed_tx.to_vec();
            let tip = tip_tx.map(|t| t.to_vec());
            tokio::spawn(async move {
                if let Err(e) = transport.send_bundle(&endpoint, &signed, tip.as_deref()).await {
                    tracing::warn!(endpoint, error = %e, "jito bundle submission failed");
                }
            });
        }
        for endpoint in [
            self.endpoints.jito_send_transaction_url.clone(),
            self.endpoints.primary_rpc.clone(),
            self.endpoints.secondary_rpc.clone(),
        ] {
            let transport = self.transport.clone();
            let signed = signed_tx.to_vec();
            tokio::spawn(async move {
                if let Err(e) = transport.send_transaction(&endpoint, &signed).await {
                    tracing::warn!(endpoint, error = %e, "sendTransaction failed");
                }
            });
        }
    }

    async fn poll_status(&self, signature: &str) -> Option<crate::rpc::SignatureStatus> {
        match self
            .transport
            .get_signature_status(&self.endpoints.primary_rpc, signature)
            .await
        {
            Ok(status) => Some(status),
            Err(primary_err) => {
                match self
                    .transport
                    .get_signature_status(&self.endpoints.secondary_rpc, signature)
                    .await
                {
                    Ok(status) => Some(status),
                    Err(secondary_err) => {
                        tracing::warn!(
                            primary_error = %primary_err,
                            secondary_error = %secondary_err,
                            "signature status poll failed on both endpoints"
                        );
                        None
                    }
                }
            }
        }
    }

    /// Sends, then polls to a terminal status or `max_duration` expiry.
    /// `on_progress` is invoked on every status advance and every
    /// rebroadcast tick. Cancellation stops local polling/rebroadcasting
    /// only; already-submitted bytes are not retracted (spec §5).
    pub async fn broadcast(
        &self,
        signed_tx: Vec<u8>,
        tip_tx: Option<Vec<u8>>,
        speed: SpeedMode,
        max_duration: Duration,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(BroadcastProgress),
    ) -> Result<BroadcastProgress, SwapError> {
        let signature = local_signature(&signed_tx)?;
        self.fire_all(&signed_tx, tip_tx.as_deref());
        on_progress(BroadcastProgress {
            status: BroadcastStatus::Submitted,
            signature: signature.clone(),
            rebroadcast_count: 0,
        });

        let started = Instant::now();
        let rebroadcast_interval = speed.rebroadcast_interval();
        let mut last_rebroadcast = Instant::now();
        let mut rebroadcast_count = 0u32;
        let mut best = BroadcastStatus::Submitted;

        loop {
            if cancel.is_cancelled() {
                return Ok(BroadcastProgress {
                    status: best,
                    signature,
                    rebroadcast_count,
                });
            }
            if started.elapsed() >= max_duration {
                let progress = BroadcastProgress {
                    status: BroadcastStatus::Expired,
                    signature: signature.clone(),
                    rebroadcast_count,
                };
                on_progress(progress.clone());
                return Ok(progress);
            }

            if let Some(status) = self.poll_status(&signature).await {
                if let Some(message) = status.err {
                    let progress = BroadcastProgress {
                        status: BroadcastStatus::Failed { message },
                        signature: signature.clone(),
                        rebroadcast_count,
                    };
                    on_progress(progress.clone());
                    return Ok(progress);
                }
                if let Some(level) = status.level {
                    let candidate = match level {
                        ConfirmationLevel::Processed => BroadcastStatus::Processed,
                        ConfirmationLevel::Confirmed => BroadcastStatus::Confirmed,
                        ConfirmationLevel::Finalized => BroadcastStatus::Finalized,
                    };
                    if candidate.rank() > best.rank() {
                        best = candidate;
                        on_progress(BroadcastProgress {
                            status: best.clone(),
                            signature: signature.clone(),
                            rebroadcast_count,
                        });
                        if best == BroadcastStatus::Finalized {
                            return Ok(BroadcastProgress {
                                status: best,
                                signature,
                                rebroadcast_count,
                            });
                        }
                    }
                }
            }

            if last_rebroadcast.elapsed() >= rebroadcast_interval {
                rebroadcast_count += 1;
                self.fire_all(&signed_tx, tip_tx.as_deref());
                last_rebroadcast = Instant::now();
                on_progress(BroadcastProgress {
                    status: best.clone(),
                    signature: signature.clone(),
                    rebroadcast_count,
                });
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn local_signature_skips_count_prefix() {
        let mut bytes = vec![1u8]; // one signature
        bytes.extend_from_slice(&[7u8; 64]);
        bytes.extend_from_slice(b"rest of the message");
        let sig = local_signature(&bytes).unwrap();
        assert_eq!(sig, bs58::encode([7u8; 64]).into_string());
    }

    #[test]
    fn local_signature_rejects_short_input() {
        assert!(local_signature(&[1, 2, 3]).is_err());
    }

    #[test]
    fn status_rank_is_monotonic() {
        assert!(BroadcastStatus::Processed.rank() < BroadcastStatus::Confirmed.rank());
        assert!(BroadcastStatus::Confirmed.rank() < BroadcastStatus::Finalized.rank());
        assert!(BroadcastStatus::Submitted.rank() < BroadcastStatus::Processed.rank());
    }

    #[test]
    fn failed_and_expired_are_terminal() {
        assert!(BroadcastStatus::Expired.is_terminal());
        assert!(BroadcastStatus::Failed { message: "x".to_string() }.is_terminal());
        assert!(!BroadcastStatus::Confirmed.is_terminal());
    }
}
