//! Persists the encrypted vault blob and the PIN-hash lockscreen check into
//! the OS's secure credential store (spec §6 "Secure store").
//!
//! Grounded directly on the teacher's `SecretStore`/`FileCredential`
//! (`app-rs/src/secret_store.rs`): a `keyring::Entry` per secret name, with a
//! file-backed `CredentialApi` shim available for platforms (or tests) where
//! no system keyring exists. The teacher stores a single secret
//! (`root_seed.hex`); this version is generalized to the handful of named
//! secrets this vault needs (`cordon_vault`, `cordon_pin_hash`).

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use keyring::credential::CredentialApi;
use thiserror::Error;

pub const VAULT_BLOB_KEY: &str = "cordon_vault";
pub const PIN_HASH_KEY: &str = "cordon_pin_hash";

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("keyring operation failed: {0}")]
    Keyring(#[from] keyring::Error),
}

enum Backend {
    Keyring { service: String },
    File { dir: PathBuf },
}

/// Stores named secrets (here, the vault ciphertext and the PIN-hash
/// equality check) in the platform credential store, or in a flat file
/// directory when no OS keyring is available (tests, Android-shaped
/// deployments).
pub struct SecretStore {
    backend: Backend,
    // keyring::Entry isn't reused across calls in the teacher either; the
    // mutex here just documents that secret access is intentionally
    // serialized, matching vault mutation's single-writer discipline.
    _serialize: Mutex<()>,
}

impl SecretStore {
    pub fn keyring(service_name: impl Into<String>) -> Self {
        Self {
            backend: Backend::Keyring {
                service: service_name.into(),
            },
            _serialize: Mutex::new(()),
        }
    }

    pub fn file(app_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::File {
                dir: app_data_dir.into(),
            },
            _serialize: Mutex::new(()),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, SecretStoreError> {
        match &self.backend {
            Backend::Keyring { service } => {
                Ok(keyring::Entry::new(service, key)?)
            }
            Backend::File { dir } => {
                let credential = Box::new(FileCredential::new(dir.join(key)));
                Ok(keyring::Entry::new_with_credential(credential))
            }
        }
    }

    pub fn read(&self, key: &str) -> Result<Option<String>, SecretStoreError> {
        let _guard = self._serialize.lock().unwrap();
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write(&self, key: &str, value: &str) -> Result<(), SecretStoreError> {
        let _guard = self._serialize.lock().unwrap();
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Result<(), SecretStoreError> {
        let _guard = self._serialize.lock().unwrap();
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Wipe every secret this vault stores, for `deleteVault`.
    pub fn delete_all(&self) -> Result<(), SecretStoreError> {
        self.delete(VAULT_BLOB_KEY)?;
        self.delete(PIN_HASH_KEY)?;
        Ok(())
    }
}

struct FileCredential {
    path: PathBuf,
}

impl FileCredential {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn io_err_to_keyring_err(err: io::Error) -> keyring::Error {
    match err.kind() {
        io::ErrorKind::NotFound => keyring::Error::NoEntry,
        io::ErrorKind::PermissionDenied => keyring::Error::NoStorageAccess(err.into()),
        _ => keyring::Error::PlatformFailure(err.into()),
    }
}

impl CredentialApi for FileCredential {
    fn set_password(&self, password: &str) -> keyring::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err_to_keyring_err)?;
        }
        std::fs::write(&self.path, password.as_bytes()).map_err(io_err_to_keyring_err)
    }

    fn get_password(&self) -> keyring::Result<String> {
        let bytes = std::fs::read(&self.path).map_err(io_err_to_keyring_err)?;
        String::from_utf8(bytes).map_err(|err| keyring::Error::BadEncoding(err.into_bytes()))
    }

    fn delete_password(&self) -> keyring::Result<()> {
        std::fs::remove_file(&self.path).map_err(io_err_to_keyring_err)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn exercise(store: &SecretStore) {
        assert_eq!(store.read(VAULT_BLOB_KEY).unwrap(), None);
        store.write(VAULT_BLOB_KEY, "ciphertext-hex").unwrap();
        assert_eq!(
            store.read(VAULT_BLOB_KEY).unwrap(),
            Some("ciphertext-hex".to_string())
        );
        store.delete(VAULT_BLOB_KEY).unwrap();
        assert_eq!(store.read(VAULT_BLOB_KEY).unwrap(), None);
    }

    #[test]
    fn file_backend_roundtrips() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = SecretStore::file(tempdir.path());
        exercise(&store);
    }

    #[test]
    fn delete_all_clears_both_keys() {
        let tempdir = tempfile::tempdir().unwrap();
        let store = SecretStore::file(tempdir.path());
        store.write(VAULT_BLOB_KEY, "blob").unwrap();
        store.write(PIN_HASH_KEY, "hash").unwrap();
        store.delete_all().unwrap();
        assert_eq!(store.read(VAULT_BLOB_KEY).unwrap(), None);
        assert_eq!(store.read(PIN_HASH_KEY).unwrap(), None);
    }
}
