//! The EVM signer facade (spec §4.F): wires a vault, an RPC client, the
//! approval ledger and the chain registry together into the public
//! operations a wallet UI actually calls. Every operation requires the
//! vault to be unlocked and a `walletId` identifying which key to use,
//! mirroring the teacher's `LexeClient`-style facade over lower-level
//! collaborators.

use std::str::FromStr;

use cordon_chain::config::{ChainConfig, ChainRegistry, EvmChainId};
use cordon_chain::{ApprovalPolicyError, CoreError, CoreResult, EvmAddress};
use cordon_crypto::evm_keys::EvmAccountKey;
use cordon_crypto::evm_sign;
use cordon_crypto::mnemonic::MnemonicPhrase;
use cordon_policy::ledger::ApprovalLedger;
use cordon_policy::types::{ApprovalRecord, ApprovalStatus, DetectedApproval, PolicySettings};
use cordon_vault::vault::Vault;
use num_bigint::BigUint;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::calldata::{encode_approve, encode_transfer};
use crate::eip712;
use crate::error::{classify_send_failure, EvmError};
use crate::gas::{estimate_approval_gas, estimate_erc20_gas, estimate_native_gas, GasEstimate};
use crate::rpc::{EvmCallRequest, EvmRpcClient};
use crate::tx::{Eip1559Tx, LegacyTx};

#[derive(Clone, Debug, Serialize)]
pub struct SendResult {
    pub hash: String,
    pub chain_id: EvmChainId,
    pub explorer_url: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SignedMessage {
    pub signature: String,
}

fn contains_denylisted(policy: &PolicySettings, address: &str) -> bool {
    let address = address.to_lowercase();
    policy
        .denylisted_addresses
        .iter()
        .any(|d| d.to_lowercase() == address)
}

fn denylist_block(address: &str) -> CoreError {
    CoreError::ApprovalBlocked(ApprovalPolicyError {
        reason: format!("{address} is denylisted by policy"),
        suggested_cap: None,
        suggested_cap_formatted: None,
    })
}

/// `estimateNativeGas`/`estimateERC20Gas`/`estimateApprovalGas`,
/// `sendNative`/`sendERC20`/`sendApproval`, `signPersonalMessage`,
/// `signTypedData` and `sendRawTransaction` (spec §4.F).
pub struct EvmSigner<'a> {
    vault: &'a Vault<'a>,
    rpc: &'a dyn EvmRpcClient,
    ledger: &'a dyn ApprovalLedger,
    chains: &'a ChainRegistry,
}

impl<'a> EvmSigner<'a> {
    pub fn new(
        vault: &'a Vault<'a>,
        rpc: &'a dyn EvmRpcClient,
        ledger: &'a dyn ApprovalLedger,
        chains: &'a ChainRegistry,
    ) -> Self {
        Self {
            vault,
            rpc,
            ledger,
            chains,
        }
    }

    async fn account_key(&self, wallet_id: &str) -> CoreResult<EvmAccountKey> {
        if !self.vault.is_unlocked().await {
            return Err(CoreError::WalletLocked);
        }
        let phrase = self.vault.get_mnemonic(wallet_id).await?;
        let mnemonic = MnemonicPhrase::parse(&phrase).map_err(|e| CoreError::InvalidMnemonic(e.to_string()))?;
        let seed = mnemonic.to_seed("");
        EvmAccountKey::derive(&seed, 0).map_err(|e| CoreError::InvalidMnemonic(e.to_string()))
    }

    fn chain_config(&self, chain_id: EvmChainId) -> CoreResult<&ChainConfig> {
        self.chains
            .get(chain_id)
            .ok_or_else(|| CoreError::UnsupportedChain(chain_id.to_string()))
    }

    pub async fn estimate_native_gas(
        &self,
        from: [u8; 20],
        to: [u8; 20],
        value: BigUint,
    ) -> Result<GasEstimate, EvmError> {
        estimate_native_gas(self.rpc, from, to, value).await
    }

    pub async fn estimate_erc20_gas(
        &self,
        from: [u8; 20],
        token: [u8; 20],
        to: [u8; 20],
        amount: &BigUint,
    ) -> Result<GasEstimate, EvmError> {
        estimate_erc20_gas(self.rpc, from, token, to, amount).await
    }

    pub async fn estimate_approval_gas(
        &self,
        from: [u8; 20],
        token: [u8; 20],
        spender: [u8; 20],
        amount: &BigUint,
    ) -> Result<GasEstimate, EvmError> {
        estimate_approval_gas(self.rpc, from, token, spender, amount).await
    }

    async fn next_nonce(&self, address: &[u8; 20]) -> Result<u64, EvmError> {
        self.rpc.get_transaction_count(address).await
    }

    /// Builds, signs and submits either a legacy or EIP-1559 transaction
    /// depending on `estimate.is_legacy`, returning the raw signed bytes.
    fn sign_transaction(
        &self,
        key: &EvmAccountKey,
        chain_id: EvmChainId,
        nonce: u64,
        to: [u8; 20],
        value: BigUint,
        data: Vec<u8>,
        estimate: &GasEstimate,
    ) -> Result<Vec<u8>, EvmError> {
        let secret_key = key.secret_key();
        if estimate.is_legacy {
            let gas_price = BigUint::from_str(&estimate.max_fee_per_gas)
                .map_err(|_| EvmError::Gas("malformed gas price estimate".to_string()))?;
            let tx = LegacyTx {
                nonce,
                gas_price,
                gas_limit: estimate.gas_limit,
                to: Some(to),
                value,
                data,
                chain_id,
            };
            let signature = tx.sign(&secret_key);
            Ok(tx.encode_signed(&signature))
        } else {
            let max_fee_per_gas = BigUint::from_str(&estimate.max_fee_per_gas)
                .map_err(|_| EvmError::Gas("malformed max fee estimate".to_string()))?;
            let max_priority_fee_per_gas = BigUint::from_str(&estimate.max_priority_fee_per_gas)
                .map_err(|_| EvmError::Gas("malformed priority fee estimate".to_string()))?;
            let tx = Eip1559Tx {
                chain_id,
                nonce,
                max_priority_fee_per_gas,
                max_fee_per_gas,
                gas_limit: estimate.gas_limit,
                to: Some(to),
                value,
                data,
            };
            let signature = tx.sign(&secret_key);
            Ok(tx.encode_signed(&signature))
        }
    }

    fn send_result(&self, chain_id: EvmChainId, hash: [u8; 32]) -> CoreResult<SendResult> {
        let config = self.chain_config(chain_id)?;
        let hash_hex = format!("0x{}", hex::encode(hash));
        Ok(SendResult {
            explorer_url: config.explorer_tx_url(&hash_hex),
            hash: hash_hex,
            chain_id,
        })
    }

    pub async fn send_native(
        &self,
        wallet_id: &str,
        chain_id: EvmChainId,
        to: &str,
        value: BigUint,
        policy: &PolicySettings,
    ) -> CoreResult<SendResult> {
        if contains_denylisted(policy, to) {
            return Err(denylist_block(to));
        }
        let key = self.account_key(wallet_id).await?;
        let to_address = EvmAddress::parse(to)?;
        let nonce = self.next_nonce(&key.address()).await?;
        let estimate = self
            .estimate_native_gas(key.address(), to_address.0, value.clone())
            .await?;
        let raw = self.sign_transaction(
            &key,
            chain_id,
            nonce,
            to_address.0,
            value,
            vec![],
            &estimate,
        )?;
        let hash = self.rpc.send_raw_transaction(&raw).await?;
        info!(wallet_id, chain_id, hash = %hex::encode(hash), "native transfer sent");
        self.send_result(chain_id, hash)
    }

    pub async fn send_erc20(
        &self,
        wallet_id: &str,
        chain_id: EvmChainId,
        token: &str,
        to: &str,
        amount: BigUint,
        policy: &PolicySettings,
    ) -> CoreResult<SendResult> {
        if contains_denylisted(policy, to) {
            return Err(denylist_block(to));
        }
        let key = self.account_key(wallet_id).await?;
        let token_address = EvmAddress::parse(token)?;
        let to_address = EvmAddress::parse(to)?;
        let nonce = self.next_nonce(&key.address()).await?;
        let estimate = self
            .estimate_erc20_gas(key.address(), token_address.0, to_address.0, &amount)
            .await?;
        let calldata = encode_transfer(&to_address.0, &amount);
        let raw = self.sign_transaction(
            &key,
            chain_id,
            nonce,
            token_address.0,
            BigUint::from(0u8),
            calldata,
            &estimate,
        )?;
        let hash = self.rpc.send_raw_transaction(&raw).await?;
        info!(wallet_id, chain_id, hash = %hex::encode(hash), "erc20 transfer sent");
        self.send_result(chain_id, hash)
    }

    /// Gates through the approval engine before signing (spec §4.F): a
    /// policy block is surfaced as `CoreError::ApprovalBlocked` carrying the
    /// suggested cap, never silently downgraded.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_approval(
        &self,
        wallet_id: &str,
        chain_id: EvmChainId,
        token: &str,
        spender: &str,
        amount: BigUint,
        token_decimals: u8,
        policy: &PolicySettings,
        now_ms: u64,
    ) -> CoreResult<SendResult> {
        let is_unlimited = cordon_policy::types::is_unlimited(&amount);
        let detected = DetectedApproval {
            token_address: token.to_string(),
            spender: spender.to_string(),
            amount_raw: amount.clone(),
            is_unlimited,
        };
        let check = cordon_policy::policy::check_approval_policy(&detected, policy, token_decimals);
        if !check.allowed {
            return Err(CoreError::ApprovalBlocked(ApprovalPolicyError {
                reason: check.reason.unwrap_or_else(|| "approval blocked by policy".to_string()),
                suggested_cap: check.suggested_cap,
                suggested_cap_formatted: check.suggested_cap_formatted,
            }));
        }

        let key = self.account_key(wallet_id).await?;
        let token_address = EvmAddress::parse(token)?;
        let spender_address = EvmAddress::parse(spender)?;
        let nonce = self.next_nonce(&key.address()).await?;
        let estimate = self
            .estimate_approval_gas(key.address(), token_address.0, spender_address.0, &amount)
            .await?;
        let calldata = encode_approve(&spender_address.0, &amount);
        let raw = self.sign_transaction(
            &key,
            chain_id,
            nonce,
            token_address.0,
            BigUint::from(0u8),
            calldata,
            &estimate,
        )?;
        let hash = self.rpc.send_raw_transaction(&raw).await?;
        let hash_hex = format!("0x{}", hex::encode(hash));

        let record = ApprovalRecord {
            id: ApprovalRecord::generate_id(chain_id, &key.address_hex(), token, spender),
            chain_id,
            owner: key.address_hex(),
            token_address: token.to_lowercase(),
            spender: spender.to_lowercase(),
            token_metadata: None,
            allowance_raw: amount,
            is_unlimited,
            created_at: now_ms,
            tx_hash: Some(hash_hex),
            status: ApprovalStatus::Pending,
            last_checked_at: None,
            revoke_hash: None,
        };
        self.ledger
            .save_approval(record)
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to persist approval record: {e}"),
            })?;

        info!(wallet_id, chain_id, hash = %hex::encode(hash), "approval sent");
        self.send_result(chain_id, hash)
    }

    /// EIP-191 `personal_sign`. Input starting with `0x` is treated as raw
    /// hex bytes, otherwise as UTF-8 (spec §4.F).
    pub async fn sign_personal_message(&self, wallet_id: &str, message: &str) -> CoreResult<SignedMessage> {
        let key = self.account_key(wallet_id).await?;
        let bytes = match message.strip_prefix("0x") {
            Some(hex_body) => hex::decode(hex_body).map_err(|_| CoreError::Unknown {
                details: "message starts with 0x but is not valid hex".to_string(),
            })?,
            None => message.as_bytes().to_vec(),
        };
        let digest = evm_sign::personal_sign_hash(&bytes);
        let signature = evm_sign::sign_digest(&key.secret_key(), &digest, None);
        Ok(SignedMessage {
            signature: format!("0x{}", hex::encode(signature.to_bytes())),
        })
    }

    pub async fn sign_typed_data(&self, wallet_id: &str, document: &Value) -> CoreResult<(SignedMessage, String)> {
        let key = self.account_key(wallet_id).await?;
        let summary = eip712::display_summary(document);
        let signature = eip712::sign_typed_data(&key.secret_key(), document).map_err(|e| CoreError::Unknown {
            details: format!("invalid typed data: {e}"),
        })?;
        Ok((
            SignedMessage {
                signature: format!("0x{}", hex::encode(signature.to_bytes())),
            },
            summary,
        ))
    }

    /// `(to, value, data, gas?)`, used by the dApp bridge (spec §4.F).
    /// Estimates gas when `gas` is absent and classifies node failures into
    /// stable error codes via [`classify_send_failure`].
    pub async fn send_raw_transaction(
        &self,
        wallet_id: &str,
        chain_id: EvmChainId,
        to: Option<[u8; 20]>,
        value: BigUint,
        data: Vec<u8>,
        gas_limit: Option<u64>,
    ) -> CoreResult<SendResult> {
        let key = self.account_key(wallet_id).await?;
        let nonce = self.next_nonce(&key.address()).await?;

        let estimate = match gas_limit {
            Some(gas_limit) => {
                let sample = self.rpc.sample_fees().await?;
                match sample.max_priority_fee_per_gas {
                    Some(priority) => GasEstimate {
                        gas_limit,
                        max_fee_per_gas: sample.max_fee_per_gas.to_string(),
                        max_priority_fee_per_gas: priority.to_string(),
                        estimated_fee_native: (&sample.max_fee_per_gas * gas_limit).to_string(),
                        is_legacy: false,
                    },
                    None => GasEstimate {
                        gas_limit,
                        max_fee_per_gas: sample.gas_price.to_string(),
                        max_priority_fee_per_gas: "0".to_string(),
                        estimated_fee_native: (&sample.gas_price * gas_limit).to_string(),
                        is_legacy: true,
                    },
                }
            }
            None => {
                crate::gas::estimate_native_gas(
                    self.rpc,
                    key.address(),
                    to.unwrap_or([0u8; 20]),
                    value.clone(),
                )
                .await?
            }
        };

        let raw = self.sign_transaction(&key, chain_id, nonce, to.unwrap_or([0u8; 20]), value, data, &estimate)?;

        let hash = self.rpc.send_raw_transaction(&raw).await.map_err(|e| match e {
            EvmError::TransactionFailed(message) => classify_send_failure(&message),
            other => other,
        })?;
        info!(wallet_id, chain_id, hash = %hex::encode(hash), "raw transaction sent");
        self.send_result(chain_id, hash)
    }

    /// `eth_call`, dry-running arbitrary calldata without sending a
    /// transaction (used by the bridge to simulate before prompting).
    pub async fn call(&self, from: [u8; 20], to: [u8; 20], value: BigUint, data: Vec<u8>) -> Result<Vec<u8>, EvmError> {
        self.rpc
            .call(&EvmCallRequest { from, to: Some(to), value, data })
            .await
    }

    /// Exposes the wallet's EVM address without requiring a signing
    /// operation, for bridge/WalletConnect `getWalletAddress`-style calls.
    pub async fn address(&self, wallet_id: &str) -> CoreResult<String> {
        let key = self.account_key(wallet_id).await?;
        Ok(key.address_hex())
    }

    /// Revokes an approval (spec §4.E): builds `approve(spender, 0)`, submits
    /// it through the same path as a normal approval, then polls the receipt
    /// for up to 120s. Success marks the record `Revoked` with a zero
    /// allowance; a timeout leaves it `Confirmed` (revoke attempted, not
    /// known-failed), per the ledger's terminal-state distinction.
    pub async fn revoke_approval(
        &self,
        wallet_id: &str,
        approval_id: &str,
        chain_id: EvmChainId,
        token: &str,
        spender: &str,
    ) -> CoreResult<SendResult> {
        let key = self.account_key(wallet_id).await?;
        let token_address = EvmAddress::parse(token)?;
        let spender_address = EvmAddress::parse(spender)?;
        let zero = BigUint::from(0u8);
        let nonce = self.next_nonce(&key.address()).await?;
        let estimate = self
            .estimate_approval_gas(key.address(), token_address.0, spender_address.0, &zero)
            .await?;
        let calldata = encode_approve(&spender_address.0, &zero);
        let raw = self.sign_transaction(
            &key,
            chain_id,
            nonce,
            token_address.0,
            BigUint::from(0u8),
            calldata,
            &estimate,
        )?;
        let hash = self.rpc.send_raw_transaction(&raw).await?;
        let hash_hex = format!("0x{}", hex::encode(hash));

        let approval_id = approval_id.to_string();
        let revoke_hash = hash_hex.clone();
        self.ledger
            .update_approval_by_id(
                &approval_id,
                &mut |record| {
                    record.status = ApprovalStatus::Revoking;
                    record.revoke_hash = Some(revoke_hash.clone());
                },
            )
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to persist revoke state: {e}"),
            })?;

        // Three-way outcome: a receipt that actually landed (success or
        // failure) is known; a bare timeout is not. Only the former two are
        // "known" states — a timeout leaves the prior Revoking attempt as
        // Confirmed (still live, we tried) rather than claiming either
        // outcome.
        let receipt = self.wait_for_receipt(hash, std::time::Duration::from_secs(120)).await?;

        let final_status = match receipt {
            Some(true) => ApprovalStatus::Revoked,
            Some(false) => ApprovalStatus::RevokeFailed,
            None => ApprovalStatus::Confirmed,
        };
        self.ledger
            .update_approval_by_id(&approval_id, &mut |record| {
                record.status = final_status;
                if receipt == Some(true) {
                    record.allowance_raw = BigUint::from(0u8);
                    record.is_unlimited = false;
                }
            })
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to persist revoke outcome: {e}"),
            })?;

        info!(wallet_id, chain_id, ?receipt, "approval revoke settled");
        self.send_result(chain_id, hash)
    }

    async fn wait_for_receipt(&self, tx_hash: [u8; 32], timeout: std::time::Duration) -> Result<Option<bool>, EvmError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(success) = self.rpc.get_transaction_receipt(tx_hash).await? {
                return Ok(Some(success));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        }
    }
}
