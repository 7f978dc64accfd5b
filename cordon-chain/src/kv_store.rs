//! Flat key-value storage abstraction backing vault metadata, policy
//! settings, the token registry, and the security-scan cache (spec §6
//! "App store"). Grounded directly on the teacher's `Ffs` flat-file-system
//! trait: a small read/write/delete interface over string keys that's easy
//! to mock, with atomic (write-to-temp, then rename) writes on the real
//! filesystem backend.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub trait KvStore: Send + Sync {
    /// Returns `Ok(None)` if the key doesn't exist, distinguishing "empty"
    /// from "absent" so callers don't need to special-case `NotFound` I/O
    /// errors themselves.
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()>;

    fn delete(&self, key: &str) -> io::Result<()>;

    fn keys_with_prefix(&self, prefix: &str) -> io::Result<Vec<String>>;
}

/// Real on-disk backend: one file per key in a flat directory, atomic writes
/// via a sibling `.write` staging directory.
pub struct FileKvStore {
    base_dir: PathBuf,
    write_dir: PathBuf,
    write_counter: AtomicU64,
}

impl FileKvStore {
    pub fn create_dir_all(base_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&base_dir)?;
        let write_dir = base_dir.join(".write");
        fs::create_dir_all(&write_dir)?;
        Ok(Self {
            base_dir,
            write_dir,
            write_counter: AtomicU64::new(0),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(Self::sanitize(key))
    }

    /// Keys may contain `/` (e.g. `cordon_security_scan_<mint>`); flatten
    /// them so every key maps to exactly one file in a flat directory.
    fn sanitize(key: &str) -> String {
        key.replace('/', "_")
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        let counter = self.write_counter.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self
            .write_dir
            .join(format!("{}-{}", std::process::id(), counter));
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, self.path_for(key))
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> io::Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(prefix) {
                    keys.push(name.to_string());
                }
            }
        }
        Ok(keys)
    }
}

/// In-memory backend for tests.
pub struct MemoryKvStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.files.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> io::Result<Vec<String>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
