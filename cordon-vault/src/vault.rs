//! Vault lifecycle operations (spec §4.B): `createVault`, `unlock`, `lock`,
//! `addWallet`, `getMnemonic`, `deleteVault`.
//!
//! Vault mutation is serialized by a single `tokio::sync::Mutex`
//! (`write_lock`); `VaultState` itself lives behind an `RwLock` since
//! unlocked reads (`getMnemonic`) may run concurrently with each other.
//! Matches the concurrency model in the expanded spec's restatement of §5.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use cordon_chain::{CoreError, CoreResult, EvmAddress, KvStore, SolanaAddress};
use cordon_crypto::evm_keys::EvmAccountKey;
use cordon_crypto::mnemonic::MnemonicPhrase;
use cordon_crypto::solana_keys::SolanaAccountKey;
use cordon_crypto::{sha256, vault_cipher};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::secret_store::{SecretStore, PIN_HASH_KEY, VAULT_BLOB_KEY};
use crate::state::VaultState;

const VAULT_META_KEY: &str = "@cordon/vault_meta";

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct WalletRecord {
    pub id: String,
    pub name: String,
    pub evm_address: EvmAddress,
    pub solana_address: SolanaAddress,
    pub created_at: u64,
}

#[derive(Default, Serialize, Deserialize)]
struct VaultMeta {
    wallets: Vec<WalletRecord>,
    active_wallet_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct SecretsFile {
    mnemonics: HashMap<String, String>,
}

/// The wire-format `EncryptedVault` (spec §3/§6): `{version, salt: 32-hex,
/// iv: 24-hex, ciphertext: hex}`.
#[derive(Serialize, Deserialize)]
struct EncryptedVaultWire {
    version: u8,
    salt: String,
    iv: String,
    ciphertext: String,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the epoch")
        .as_millis() as u64
}

fn generate_wallet_id(rng: &mut impl RngCore) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct Vault<'a> {
    secret_store: &'a SecretStore,
    app_store: &'a dyn KvStore,
    state: RwLock<VaultState>,
    write_lock: Mutex<()>,
}

impl<'a> Vault<'a> {
    pub fn new(secret_store: &'a SecretStore, app_store: &'a dyn KvStore) -> Self {
        Self {
            secret_store,
            app_store,
            state: RwLock::new(VaultState::default()),
            write_lock: Mutex::new(()),
        }
    }

    pub async fn is_unlocked(&self) -> bool {
        self.state.read().await.is_unlocked()
    }

    /// Wallet metadata is stored outside the encrypted blob, so the list
    /// remains visible while locked.
    pub fn list_wallets(&self) -> CoreResult<Vec<WalletRecord>> {
        Ok(self.read_meta()?.wallets)
    }

    pub fn active_wallet_id(&self) -> CoreResult<Option<String>> {
        Ok(self.read_meta()?.active_wallet_id)
    }

    pub async fn create_vault(
        &self,
        mnemonic: &MnemonicPhrase,
        name: &str,
        pin: &str,
        rng: &mut impl RngCore,
    ) -> CoreResult<WalletRecord> {
        let _write_guard = self.write_lock.lock().await;

        let record = self.derive_wallet_record(mnemonic, name, rng)?;

        let mut secrets = HashMap::new();
        secrets.insert(record.id.clone(), mnemonic.phrase().to_string());
        self.persist_secrets(&secrets, pin, rng)?;
        self.persist_pin_hash(pin)?;

        let meta = VaultMeta {
            wallets: vec![record.clone()],
            active_wallet_id: Some(record.id.clone()),
        };
        self.write_meta(&meta)?;

        let mut state = self.state.write().await;
        state.populate(secrets);
        info!(wallet_id = %record.id, "vault created");
        Ok(record)
    }

    pub async fn unlock(&self, pin: &str) -> CoreResult<bool> {
        let wire = match self.read_encrypted_vault()? {
            Some(wire) => wire,
            None => return Err(CoreError::Unknown {
                details: "no vault has been created yet".to_string(),
            }),
        };
        let salt: [u8; vault_cipher::SALT_LEN] = decode_fixed(&wire.salt)?;
        let iv: [u8; vault_cipher::IV_LEN] = decode_fixed(&wire.iv)?;
        let ciphertext = hex::decode(&wire.ciphertext).map_err(|_| CoreError::Unknown {
            details: "stored vault ciphertext is not valid hex".to_string(),
        })?;

        match vault_cipher::decrypt(pin, &salt, &iv, ciphertext) {
            Ok(plaintext) => {
                let secrets_file: SecretsFile =
                    serde_json::from_slice(&plaintext).map_err(|e| CoreError::Unknown {
                        details: format!("vault plaintext was not valid JSON: {e}"),
                    })?;
                let mut state = self.state.write().await;
                state.populate(secrets_file.mnemonics);
                info!("vault unlocked");
                Ok(true)
            }
            // GCM auth failure: wrong pin or corrupted ciphertext. Not a
            // constant-time check (spec §4.B: rate-limiting lives at the
            // UI/OS biometrics layer, not here).
            Err(_) => {
                warn!("vault unlock failed: wrong pin or corrupted vault");
                Ok(false)
            }
        }
    }

    /// Zero the in-memory secrets. MUST NOT touch persistent storage.
    pub async fn lock(&self) {
        self.state.write().await.clear();
        info!("vault locked");
    }

    pub async fn add_wallet(
        &self,
        mnemonic: &MnemonicPhrase,
        name: &str,
        pin: &str,
        rng: &mut impl RngCore,
    ) -> CoreResult<WalletRecord> {
        let _write_guard = self.write_lock.lock().await;

        let record = self.derive_wallet_record(mnemonic, name, rng)?;

        let mut state = self.state.write().await;
        if !state.is_unlocked() {
            return Err(CoreError::WalletLocked);
        }
        let secrets = state
            .secrets_mut()
            .expect("is_unlocked() implies secrets are populated");
        secrets.insert(record.id.clone(), mnemonic.phrase().to_string());
        // Re-encrypt with a fresh (salt, iv) but the same PBKDF2 work factor
        // (vault_cipher::PBKDF2_ITERATIONS is a fixed constant).
        self.persist_secrets(secrets, pin, rng)?;

        let mut meta = self.read_meta()?;
        meta.wallets.push(record.clone());
        meta.active_wallet_id = Some(record.id.clone());
        self.write_meta(&meta)?;

        info!(wallet_id = %record.id, "wallet added");
        Ok(record)
    }

    pub async fn get_mnemonic(&self, wallet_id: &str) -> CoreResult<String> {
        let state = self.state.read().await;
        if !state.is_unlocked() {
            return Err(CoreError::WalletLocked);
        }
        state
            .get_mnemonic(wallet_id)
            .map(str::to_string)
            .ok_or(CoreError::WalletLocked)
    }

    pub async fn delete_vault(&self) -> CoreResult<()> {
        let _write_guard = self.write_lock.lock().await;
        self.secret_store
            .delete_all()
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to delete secret store: {e}"),
            })?;
        self.app_store
            .delete(VAULT_META_KEY)
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to delete vault metadata: {e}"),
            })?;
        self.state.write().await.clear();
        info!("vault deleted");
        Ok(())
    }

    /// Non-cryptographic lockscreen equality check: compares SHA-256(pin)
    /// against the cached hash without touching the vault blob.
    pub fn check_pin_hash(&self, pin: &str) -> CoreResult<bool> {
        let stored = self
            .secret_store
            .read(PIN_HASH_KEY)
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to read pin hash: {e}"),
            })?;
        Ok(stored.as_deref() == Some(sha256::hex_digest(pin.as_bytes()).as_str()))
    }

    fn derive_wallet_record(
        &self,
        mnemonic: &MnemonicPhrase,
        name: &str,
        rng: &mut impl RngCore,
    ) -> CoreResult<WalletRecord> {
        let seed = mnemonic.to_seed("");
        let evm = EvmAccountKey::derive(&seed, 0).map_err(|e| CoreError::InvalidMnemonic(e.to_string()))?;
        let solana =
            SolanaAccountKey::derive(&seed, 0).map_err(|e| CoreError::InvalidMnemonic(e.to_string()))?;
        Ok(WalletRecord {
            id: generate_wallet_id(rng),
            name: name.to_string(),
            evm_address: EvmAddress(evm.address()),
            solana_address: SolanaAddress(solana.pubkey_bytes()),
            created_at: now_millis(),
        })
    }

    fn persist_secrets(
        &self,
        secrets: &HashMap<String, String>,
        pin: &str,
        rng: &mut impl RngCore,
    ) -> CoreResult<()> {
        let plaintext = serde_json::to_vec(&SecretsFile {
            mnemonics: secrets.clone(),
        })
        .expect("SecretsFile is always serializable");
        let (salt, iv, ciphertext) = vault_cipher::encrypt(rng, pin, &plaintext);
        let wire = EncryptedVaultWire {
            version: 1,
            salt: hex::encode(salt),
            iv: hex::encode(iv),
            ciphertext: hex::encode(ciphertext),
        };
        let json = serde_json::to_string(&wire).expect("EncryptedVaultWire is always serializable");
        self.secret_store
            .write(VAULT_BLOB_KEY, &json)
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to persist vault: {e}"),
            })
    }

    fn persist_pin_hash(&self, pin: &str) -> CoreResult<()> {
        self.secret_store
            .write(PIN_HASH_KEY, &sha256::hex_digest(pin.as_bytes()))
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to persist pin hash: {e}"),
            })
    }

    fn read_encrypted_vault(&self) -> CoreResult<Option<EncryptedVaultWire>> {
        let json = self
            .secret_store
            .read(VAULT_BLOB_KEY)
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to read vault: {e}"),
            })?;
        match json {
            Some(json) => {
                let wire = serde_json::from_str(&json).map_err(|e| CoreError::Unknown {
                    details: format!("stored vault is not valid JSON: {e}"),
                })?;
                Ok(Some(wire))
            }
            None => Ok(None),
        }
    }

    fn read_meta(&self) -> CoreResult<VaultMeta> {
        match self.app_store.get(VAULT_META_KEY).map_err(|e| CoreError::Unknown {
            details: format!("failed to read vault metadata: {e}"),
        })? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| CoreError::Unknown {
                details: format!("vault metadata is corrupted: {e}"),
            }),
            None => Ok(VaultMeta::default()),
        }
    }

    fn write_meta(&self, meta: &VaultMeta) -> CoreResult<()> {
        let bytes = serde_json::to_vec(meta).expect("VaultMeta is always serializable");
        self.app_store
            .set(VAULT_META_KEY, &bytes)
            .map_err(|e| CoreError::Unknown {
                details: format!("failed to write vault metadata: {e}"),
            })
    }
}

fn decode_fixed<const N: usize>(hex_str: &str) -> CoreResult<[u8; N]> {
    let mut out = [0u8; N];
    cordon_crypto::hexutil::decode_to_slice_ct(hex_str, &mut out).map_err(|_| CoreError::Unknown {
        details: "stored vault field has the wrong length".to_string(),
    })?;
    Ok(out)
}

#[cfg(test)]
mod test {
    use cordon_chain::kv_store::MemoryKvStore;
    use rand::rngs::StdRng;
    use rand_core::SeedableRng;

    use super::*;
    use crate::secret_store::SecretStore;

    fn sample_mnemonic() -> MnemonicPhrase {
        let phrase = "abandon abandon abandon abandon abandon abandon \
                       abandon abandon abandon abandon abandon about";
        MnemonicPhrase::parse(phrase).unwrap()
    }

    #[tokio::test]
    async fn create_then_unlock_roundtrip() {
        let tempdir = tempfile::tempdir().unwrap();
        let secret_store = SecretStore::file(tempdir.path());
        let app_store = MemoryKvStore::new();
        let vault = Vault::new(&secret_store, &app_store);
        let mut rng = StdRng::seed_from_u64(1);

        let mnemonic = sample_mnemonic();
        let record = vault
            .create_vault(&mnemonic, "Main Wallet", "correct-pin", &mut rng)
            .await
            .unwrap();
        assert!(vault.is_unlocked().await);

        vault.lock().await;
        assert!(!vault.is_unlocked().await);
        assert!(matches!(
            vault.get_mnemonic(&record.id).await,
            Err(CoreError::WalletLocked)
        ));

        let unlocked = vault.unlock("correct-pin").await.unwrap();
        assert!(unlocked);
        let recovered = vault.get_mnemonic(&record.id).await.unwrap();
        assert_eq!(recovered, mnemonic.phrase());
    }

    #[tokio::test]
    async fn wrong_pin_does_not_unlock() {
        let tempdir = tempfile::tempdir().unwrap();
        let secret_store = SecretStore::file(tempdir.path());
        let app_store = MemoryKvStore::new();
        let vault = Vault::new(&secret_store, &app_store);
        let mut rng = StdRng::seed_from_u64(2);

        vault
            .create_vault(&sample_mnemonic(), "Main", "correct-pin", &mut rng)
            .await
            .unwrap();
        vault.lock().await;

        let unlocked = vault.unlock("wrong-pin-123").await.unwrap();
        assert!(!unlocked);
        assert!(!vault.is_unlocked().await);
    }

    #[tokio::test]
    async fn add_wallet_requires_unlocked() {
        let tempdir = tempfile::tempdir().unwrap();
        let secret_store = SecretStore::file(tempdir.path());
        let app_store = MemoryKvStore::new();
        let vault = Vault::new(&secret_store, &app_store);
        let mut rng = StdRng::seed_from_u64(3);

        vault
            .create_vault(&sample_mnemonic(), "Main", "correct-pin", &mut rng)
            .await
            .unwrap();
        vault.lock().await;

        let second_mnemonic = {
            let mut rng2 = StdRng::seed_from_u64(4);
            MnemonicPhrase::generate(&mut rng2)
        };
        let err = vault
            .add_wallet(&second_mnemonic, "Second", "correct-pin", &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::WalletLocked));
    }

    #[tokio::test]
    async fn add_wallet_preserves_first_after_relock() {
        let tempdir = tempfile::tempdir().unwrap();
        let secret_store = SecretStore::file(tempdir.path());
        let app_store = MemoryKvStore::new();
        let vault = Vault::new(&secret_store, &app_store);
        let mut rng = StdRng::seed_from_u64(5);

        let first = vault
            .create_vault(&sample_mnemonic(), "Main", "correct-pin", &mut rng)
            .await
            .unwrap();
        let second_mnemonic = MnemonicPhrase::generate(&mut rng);
        let second = vault
            .add_wallet(&second_mnemonic, "Second", "correct-pin", &mut rng)
            .await
            .unwrap();

        vault.lock().await;
        vault.unlock("correct-pin").await.unwrap();

        assert_eq!(
            vault.get_mnemonic(&first.id).await.unwrap(),
            sample_mnemonic().phrase()
        );
        assert_eq!(
            vault.get_mnemonic(&second.id).await.unwrap(),
            second_mnemonic.phrase()
        );
        assert_eq!(vault.list_wallets().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_vault_wipes_everything() {
        let tempdir = tempfile::tempdir().unwrap();
        let secret_store = SecretStore::file(tempdir.path());
        let app_store = MemoryKvStore::new();
        let vault = Vault::new(&secret_store, &app_store);
        let mut rng = StdRng::seed_from_u64(6);

        vault
            .create_vault(&sample_mnemonic(), "Main", "correct-pin", &mut rng)
            .await
            .unwrap();
        vault.delete_vault().await.unwrap();

        assert!(!vault.is_unlocked().await);
        assert!(vault.list_wallets().unwrap().is_empty());
        assert!(matches!(
            vault.unlock("correct-pin").await,
            Err(CoreError::Unknown { .. })
        ));
    }

    #[tokio::test]
    async fn pin_hash_check_matches_creation_pin() {
        let tempdir = tempfile::tempdir().unwrap();
        let secret_store = SecretStore::file(tempdir.path());
        let app_store = MemoryKvStore::new();
        let vault = Vault::new(&secret_store, &app_store);
        let mut rng = StdRng::seed_from_u64(7);

        vault
            .create_vault(&sample_mnemonic(), "Main", "correct-pin", &mut rng)
            .await
            .unwrap();
        assert!(vault.check_pin_hash("correct-pin").unwrap());
        assert!(!vault.check_pin_hash("wrong-pin").unwrap());
    }
}
