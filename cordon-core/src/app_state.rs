//! Small pieces of app-level persisted state that don't warrant their own
//! crate: the dApp-bundle cache, policy settings, the selected network, and
//! the token security-scan cache (spec §6's `@cordon/bundles`,
//! `@cordon/policy_settings`, `@cordon/selected_network`,
//! `cordon_security_scan_<mint>`). All live in the same `KvStore` the vault
//! metadata and approval ledger use, following the same read-JSON/write-JSON
//! pattern as `cordon_vault::vault`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use cordon_chain::{Chain, CoreError, CoreResult, KvStore};
use cordon_policy::PolicySettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const BUNDLES_KEY: &str = "@cordon/bundles";
const POLICY_SETTINGS_KEY: &str = "@cordon/policy_settings";
const SELECTED_NETWORK_KEY: &str = "@cordon/selected_network";

/// 1 hour, per spec §6.
const SECURITY_SCAN_TTL: Duration = Duration::from_secs(3600);

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the epoch")
        .as_millis() as u64
}

fn read_json<T: for<'de> Deserialize<'de>>(store: &dyn KvStore, key: &str) -> CoreResult<Option<T>> {
    let bytes = store.get(key).map_err(|e| CoreError::Unknown {
        details: format!("failed to read {key}: {e}"),
    })?;
    match bytes {
        Some(bytes) => {
            let value = serde_json::from_slice(&bytes).map_err(|e| CoreError::Unknown {
                details: format!("{key} is corrupted: {e}"),
            })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

fn write_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) -> CoreResult<()> {
    let bytes = serde_json::to_vec(value).expect("app-state values are always serializable");
    store.set(key, &bytes).map_err(|e| CoreError::Unknown {
        details: format!("failed to write {key}: {e}"),
    })
}

/// Arbitrary cached dApp-bundle metadata (icons, manifest fields); the UI
/// treats its shape as opaque JSON, so it's stored and returned untyped.
pub fn get_bundles(store: &dyn KvStore) -> CoreResult<Value> {
    Ok(read_json(store, BUNDLES_KEY)?.unwrap_or(Value::Null))
}

pub fn set_bundles(store: &dyn KvStore, bundles: &Value) -> CoreResult<()> {
    write_json(store, BUNDLES_KEY, bundles)
}

pub fn get_policy_settings(store: &dyn KvStore) -> CoreResult<PolicySettings> {
    Ok(read_json(store, POLICY_SETTINGS_KEY)?.unwrap_or_default())
}

pub fn set_policy_settings(store: &dyn KvStore, settings: &PolicySettings) -> CoreResult<()> {
    write_json(store, POLICY_SETTINGS_KEY, settings)
}

pub fn get_selected_network(store: &dyn KvStore) -> CoreResult<Option<Chain>> {
    read_json(store, SELECTED_NETWORK_KEY)
}

pub fn set_selected_network(store: &dyn KvStore, chain: Chain) -> CoreResult<()> {
    write_json(store, SELECTED_NETWORK_KEY, &chain)
}

fn security_scan_key(mint: &str) -> String {
    format!("cordon_security_scan_{mint}")
}

#[derive(Serialize, Deserialize)]
struct ScanEntry {
    scanned_at: u64,
    data: Value,
}

/// Reads a cached security scan for `mint`, returning `None` if absent or
/// older than the 1h TTL (a stale entry is left in place rather than
/// evicted; the next `set_security_scan` overwrites it).
pub fn get_security_scan(store: &dyn KvStore, mint: &str) -> CoreResult<Option<Value>> {
    let entry: Option<ScanEntry> = read_json(store, &security_scan_key(mint))?;
    Ok(entry.and_then(|entry| {
        let age = Duration::from_millis(now_millis().saturating_sub(entry.scanned_at));
        if age < SECURITY_SCAN_TTL {
            Some(entry.data)
        } else {
            None
        }
    }))
}

pub fn set_security_scan(store: &dyn KvStore, mint: &str, data: Value) -> CoreResult<()> {
    let entry = ScanEntry {
        scanned_at: now_millis(),
        data,
    };
    write_json(store, &security_scan_key(mint), &entry)
}
