//! The persisted approval ledger (spec §3, §4.E). Records are only ever
//! upserted, never deleted, so a revoked or failed approval stays visible in
//! history.
//!
//! Per the concurrency model: writes to a single record are serialized by a
//! sharded lock keyed on `approval_id` (a `dashmap`-shaped map of
//! per-key mutexes), while a refresh run holds an exclusive guard over its
//! whole `(owner, chain_id)` partition so a concurrent single-record update
//! can't race a bulk refresh of the same owner.

use std::io;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use cordon_chain::config::EvmChainId;
use cordon_chain::KvStore;
use dashmap::DashMap;

use crate::risk::{score, sort_by_risk};
use crate::types::{ApprovalRecord, ApprovalStatus, RiskLevel};

const KEY_PREFIX: &str = "cordon_approval:";

fn storage_key(approval_id: &str) -> String {
    format!("{KEY_PREFIX}{approval_id}")
}

fn owner_partition_prefix(owner: &str, chain_id: EvmChainId) -> String {
    format!("{KEY_PREFIX}{}-{}-", owner.to_lowercase(), chain_id)
}

pub trait ApprovalLedger: Send + Sync {
    fn save_approval(&self, record: ApprovalRecord) -> io::Result<()>;

    /// Load, mutate, and persist a record under its shard lock. Returns
    /// `Ok(None)` if no record with that id exists yet.
    fn update_approval_by_id(
        &self,
        approval_id: &str,
        mutate: &mut dyn FnMut(&mut ApprovalRecord),
    ) -> io::Result<Option<ApprovalRecord>>;

    fn get(&self, approval_id: &str) -> io::Result<Option<ApprovalRecord>>;

    fn list_for_owner(&self, owner: &str, chain_id: EvmChainId) -> io::Result<Vec<ApprovalRecord>>;
}

/// `ApprovalLedger` backed by a `KvStore`, with per-`approval_id` shard
/// locks and a coarser per-`(owner, chain_id)` partition lock for refresh
/// runs.
pub struct KvApprovalLedger<'a> {
    store: &'a dyn KvStore,
    shard_locks: DashMap<String, Arc<StdMutex<()>>>,
    partition_locks: DashMap<String, Arc<StdMutex<()>>>,
}

impl<'a> KvApprovalLedger<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self {
            store,
            shard_locks: DashMap::new(),
            partition_locks: DashMap::new(),
        }
    }

    fn shard_lock(&self, approval_id: &str) -> Arc<StdMutex<()>> {
        self.shard_locks
            .entry(approval_id.to_string())
            .or_insert_with(|| Arc::new(StdMutex::new(())))
            .clone()
    }

    fn partition_lock(&self, owner: &str, chain_id: EvmChainId) -> Arc<StdMutex<()>> {
        let key = format!("{}-{}", owner.to_lowercase(), chain_id);
        self.partition_locks
            .entry(key)
            .or_insert_with(|| Arc::new(StdMutex::new(())))
            .clone()
    }

    fn read_record(&self, approval_id: &str) -> io::Result<Option<ApprovalRecord>> {
        match self.store.get(&storage_key(approval_id))? {
            Some(bytes) => {
                let record = serde_json::from_slice(&bytes)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn write_record(&self, record: &ApprovalRecord) -> io::Result<()> {
        let bytes = serde_json::to_vec(record).expect("ApprovalRecord is always serializable");
        self.store.set(&storage_key(&record.id), &bytes)
    }

    /// Exclusive refresh pass over a single owner's approvals on one chain
    /// (spec §4.E "on-chain refresh"):
    ///
    /// - `fetch_allowance(token, spender) -> Option<u256>` re-checks the
    ///   current on-chain allowance for each known record; `None` means the
    ///   call failed and the record is left untouched.
    /// - `fetch_metadata(token) -> Option<TokenMetadata>` backfills missing
    ///   token metadata.
    ///
    /// A zero on-chain allowance marks the record `Revoked`. Returns the
    /// refreshed set, sorted high risk first.
    pub fn refresh_owner_chain(
        &self,
        owner: &str,
        chain_id: EvmChainId,
        now_ms: u64,
        mut fetch_allowance: impl FnMut(&str, &str) -> Option<num_bigint::BigUint>,
        mut fetch_metadata: impl FnMut(&str) -> Option<crate::types::TokenMetadata>,
    ) -> io::Result<Vec<(ApprovalRecord, RiskLevel)>> {
        let partition_lock = self.partition_lock(owner, chain_id);
        let _partition_guard = partition_lock.lock().unwrap();

        let mut records = self.list_for_owner(owner, chain_id)?;
        for record in records.iter_mut() {
            if record.token_metadata.is_none() {
                record.token_metadata = fetch_metadata(&record.token_address);
            }
            if let Some(allowance) = fetch_allowance(&record.token_address, &record.spender) {
                record.is_unlimited = crate::types::is_unlimited(&allowance);
                record.allowance_raw = allowance;
                record.last_checked_at = Some(now_ms);
                if record.allowance_raw == num_bigint::BigUint::from(0u8) {
                    record.status = ApprovalStatus::Revoked;
                }
            }
        }

        for record in &records {
            // Hold the per-record shard lock only for the write itself; the
            // partition lock above already keeps this refresh exclusive
            // against other refreshes of the same owner/chain.
            let shard_lock = self.shard_lock(&record.id);
            let _shard_guard = shard_lock.lock().unwrap();
            self.write_record(record)?;
        }

        let mut scored: Vec<(ApprovalRecord, RiskLevel)> = records
            .into_iter()
            .map(|r| {
                let risk = score(&r, now_ms, false);
                (r, risk)
            })
            .collect();
        sort_by_risk(&mut scored);
        Ok(scored)
    }
}

impl<'a> ApprovalLedger for KvApprovalLedger<'a> {
    fn save_approval(&self, record: ApprovalRecord) -> io::Result<()> {
        let lock = self.shard_lock(&record.id);
        let _guard = lock.lock().unwrap();
        self.write_record(&record)
    }

    fn update_approval_by_id(
        &self,
        approval_id: &str,
        mutate: &mut dyn FnMut(&mut ApprovalRecord),
    ) -> io::Result<Option<ApprovalRecord>> {
        let lock = self.shard_lock(approval_id);
        let _guard = lock.lock().unwrap();
        let mut record = match self.read_record(approval_id)? {
            Some(r) => r,
            None => return Ok(None),
        };
        mutate(&mut record);
        self.write_record(&record)?;
        Ok(Some(record))
    }

    fn get(&self, approval_id: &str) -> io::Result<Option<ApprovalRecord>> {
        self.read_record(approval_id)
    }

    fn list_for_owner(&self, owner: &str, chain_id: EvmChainId) -> io::Result<Vec<ApprovalRecord>> {
        let prefix = owner_partition_prefix(owner, chain_id);
        let keys = self.store.keys_with_prefix(&prefix)?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(bytes) = self.store.get(&key)? {
                let record = serde_json::from_slice(&bytes)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                out.push(record);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cordon_chain::kv_store::MemoryKvStore;
    use num_bigint::BigUint;

    fn record(owner: &str, chain_id: EvmChainId, token: &str, spender: &str) -> ApprovalRecord {
        let id = ApprovalRecord::generate_id(chain_id, owner, token, spender);
        ApprovalRecord {
            id,
            chain_id,
            owner: owner.to_string(),
            token_address: token.to_string(),
            spender: spender.to_string(),
            token_metadata: None,
            allowance_raw: BigUint::from(1_000u64),
            is_unlimited: false,
            created_at: 0,
            tx_hash: None,
            status: ApprovalStatus::Confirmed,
            last_checked_at: None,
            revoke_hash: None,
        }
    }

    #[test]
    fn save_then_get_roundtrips() {
        let store = MemoryKvStore::new();
        let ledger = KvApprovalLedger::new(&store);
        let r = record("0xOwner", 1, "0xtoken", "0xspender");
        ledger.save_approval(r.clone()).unwrap();
        let fetched = ledger.get(&r.id).unwrap().unwrap();
        assert_eq!(fetched.id, r.id);
        assert_eq!(fetched.allowance_raw, r.allowance_raw);
    }

    #[test]
    fn update_by_id_mutates_existing_record() {
        let store = MemoryKvStore::new();
        let ledger = KvApprovalLedger::new(&store);
        let r = record("0xowner", 1, "0xtoken", "0xspender");
        ledger.save_approval(r.clone()).unwrap();

        let updated = ledger
            .update_approval_by_id(&r.id, &mut |rec| rec.status = ApprovalStatus::Revoking)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ApprovalStatus::Revoking);

        let fetched = ledger.get(&r.id).unwrap().unwrap();
        assert_eq!(fetched.status, ApprovalStatus::Revoking);
    }

    #[test]
    fn update_by_id_missing_record_returns_none() {
        let store = MemoryKvStore::new();
        let ledger = KvApprovalLedger::new(&store);
        let result = ledger
            .update_approval_by_id("nonexistent", &mut |_| {})
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn list_for_owner_scopes_by_owner_and_chain() {
        let store = MemoryKvStore::new();
        let ledger = KvApprovalLedger::new(&store);
        ledger
            .save_approval(record("0xowner", 1, "0xtoken1", "0xspenderA"))
            .unwrap();
        ledger
            .save_approval(record("0xowner", 1, "0xtoken2", "0xspenderB"))
            .unwrap();
        ledger
            .save_approval(record("0xowner", 137, "0xtoken3", "0xspenderC"))
            .unwrap();
        ledger
            .save_approval(record("0xother", 1, "0xtoken4", "0xspenderD"))
            .unwrap();

        let owned = ledger.list_for_owner("0xowner", 1).unwrap();
        assert_eq!(owned.len(), 2);
    }

    #[test]
    fn refresh_marks_zero_allowance_as_revoked_and_sorts_by_risk() {
        let store = MemoryKvStore::new();
        let ledger = KvApprovalLedger::new(&store);
        let mut r1 = record("0xowner", 1, "0xtoken1", "0xspenderA");
        r1.is_unlimited = true;
        ledger.save_approval(r1.clone()).unwrap();
        let r2 = record("0xowner", 1, "0xtoken2", "0xspenderB");
        ledger.save_approval(r2.clone()).unwrap();

        let refreshed = ledger
            .refresh_owner_chain(
                "0xowner",
                1,
                1_000,
                |token, _spender| {
                    if token == "0xtoken2" {
                        Some(BigUint::from(0u8))
                    } else {
                        Some(BigUint::from(1u8) << 255u32)
                    }
                },
                |_token| None,
            )
            .unwrap();

        assert_eq!(refreshed.len(), 2);
        let revoked = refreshed
            .iter()
            .find(|(r, _)| r.token_address == "0xtoken2")
            .unwrap();
        assert_eq!(revoked.0.status, ApprovalStatus::Revoked);

        // High risk (unlimited, unknown spender) sorts before the revoked
        // low-allowance one.
        assert_eq!(refreshed[0].0.token_address, "0xtoken1");
    }
}
