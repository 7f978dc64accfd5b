//! Gas/fee estimation (spec §4.F): `estimateNativeGas`, `estimateERC20Gas`,
//! `estimateApprovalGas`. Fee sampling tries EIP-1559 first; a missing
//! priority fee sample signals a legacy chain.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::calldata::{encode_approve, encode_transfer};
use crate::error::EvmError;
use crate::rpc::{EvmCallRequest, EvmRpcClient};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GasEstimate {
    pub gas_limit: u64,
    pub max_fee_per_gas: String,
    /// `"0"` signals EIP-1559 sampling failed; callers MUST send a
    /// legacy-typed transaction instead (spec §4.F).
    pub max_priority_fee_per_gas: String,
    pub estimated_fee_native: String,
    pub is_legacy: bool,
}

fn to_estimate(gas_limit: u64, max_fee_per_gas: BigUint, priority: Option<BigUint>) -> GasEstimate {
    let is_legacy = priority.is_none();
    let priority = priority.unwrap_or_else(|| BigUint::from(0u8));
    let estimated_fee_native = &max_fee_per_gas * gas_limit;
    GasEstimate {
        gas_limit,
        max_fee_per_gas: max_fee_per_gas.to_string(),
        max_priority_fee_per_gas: priority.to_string(),
        estimated_fee_native: estimated_fee_native.to_string(),
        is_legacy,
    }
}

async fn estimate(rpc: &dyn EvmRpcClient, call: EvmCallRequest) -> Result<GasEstimate, EvmError> {
    let gas_limit = rpc.estimate_gas(&call).await?;
    let sample = rpc.sample_fees().await?;
    match sample.max_priority_fee_per_gas {
        Some(priority) => Ok(to_estimate(gas_limit, sample.max_fee_per_gas, Some(priority))),
        None => Ok(to_estimate(gas_limit, sample.gas_price, None)),
    }
}

pub async fn estimate_native_gas(
    rpc: &dyn EvmRpcClient,
    from: [u8; 20],
    to: [u8; 20],
    value: BigUint,
) -> Result<GasEstimate, EvmError> {
    estimate(
        rpc,
        EvmCallRequest {
            from,
            to: Some(to),
            value,
            data: vec![],
        },
    )
    .await
}

pub async fn estimate_erc20_gas(
    rpc: &dyn EvmRpcClient,
    from: [u8; 20],
    token: [u8; 20],
    to: [u8; 20],
    amount: &BigUint,
) -> Result<GasEstimate, EvmError> {
    estimate(
        rpc,
        EvmCallRequest {
            from,
            to: Some(token),
            value: BigUint::from(0u8),
            data: encode_transfer(&to, amount),
        },
    )
    .await
}

pub async fn estimate_approval_gas(
    rpc: &dyn EvmRpcClient,
    from: [u8; 20],
    token: [u8; 20],
    spender: [u8; 20],
    amount: &BigUint,
) -> Result<GasEstimate, EvmError> {
    estimate(
        rpc,
        EvmCallRequest {
            from,
            to: Some(token),
            value: BigUint::from(0u8),
            data: encode_approve(&spender, amount),
        },
    )
    .await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rpc::FeeSample;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockRpc {
        eip1559: bool,
        calls: Mutex<Vec<EvmCallRequest>>,
    }

    #[async_trait]
    impl EvmRpcClient for MockRpc {
        async fn chain_id(&self) -> Result<u64, EvmError> {
            Ok(1)
        }
        async fn get_transaction_count(&self, _address: &[u8; 20]) -> Result<u64, EvmError> {
            Ok(0)
        }
        async fn get_balance(&self, _address: &[u8; 20]) -> Result<BigUint, EvmError> {
            Ok(BigUint::from(0u8))
        }
        async fn estimate_gas(&self, call: &EvmCallRequest) -> Result<u64, EvmError> {
            self.calls.lock().unwrap().push(call.clone());
            Ok(21_000)
        }
        async fn sample_fees(&self) -> Result<FeeSample, EvmError> {
            if self.eip1559 {
                Ok(FeeSample {
                    max_fee_per_gas: BigUint::from(50_000_000_000u64),
                    max_priority_fee_per_gas: Some(BigUint::from(1_500_000_000u64)),
                    gas_price: BigUint::from(50_000_000_000u64),
                })
            } else {
                Ok(FeeSample {
                    max_fee_per_gas: BigUint::from(0u8),
                    max_priority_fee_per_gas: None,
                    gas_price: BigUint::from(5_000_000_000u64),
                })
            }
        }
        async fn send_raw_transaction(&self, _raw: &[u8]) -> Result<[u8; 32], EvmError> {
            Ok([0u8; 32])
        }
        async fn call(&self, _call: &EvmCallRequest) -> Result<Vec<u8>, EvmError> {
            Ok(vec![])
        }
        async fn get_transaction_receipt(&self, _tx_hash: [u8; 32]) -> Result<Option<bool>, EvmError> {
            Ok(Some(true))
        }
    }

    #[tokio::test]
    async fn eip1559_chain_yields_nonzero_priority_fee() {
        let rpc = MockRpc {
            eip1559: true,
            calls: Mutex::new(vec![]),
        };
        let estimate = estimate_native_gas(&rpc, [0u8; 20], [1u8; 20], BigUint::from(1u8))
            .await
            .unwrap();
        assert!(!estimate.is_legacy);
        assert_eq!(estimate.max_priority_fee_per_gas, "1500000000");
    }

    #[tokio::test]
    async fn legacy_chain_yields_zero_priority_fee() {
        let rpc = MockRpc {
            eip1559: false,
            calls: Mutex::new(vec![]),
        };
        let estimate = estimate_native_gas(&rpc, [0u8; 20], [1u8; 20], BigUint::from(1u8))
            .await
            .unwrap();
        assert!(estimate.is_legacy);
        assert_eq!(estimate.max_priority_fee_per_gas, "0");
    }

    #[tokio::test]
    async fn erc20_gas_estimate_builds_transfer_calldata() {
        let rpc = MockRpc {
            eip1559: true,
            calls: Mutex::new(vec![]),
        };
        estimate_erc20_gas(&rpc, [0u8; 20], [2u8; 20], [3u8; 20], &BigUint::from(100u64))
            .await
            .unwrap();
        let calls = rpc.calls.lock().unwrap();
        assert_eq!(&calls[0].data[0..4], &cordon_policy::intent::TRANSFER_SELECTOR);
    }
}
