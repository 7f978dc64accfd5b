//! `VaultState`: the process-local, ephemeral view of the unlocked vault
//! (spec §3). Invariant: `decrypted_secrets` is `Some` iff `unlocked`.

use std::collections::HashMap;

use zeroize::Zeroize;

#[derive(Default)]
pub struct VaultState {
    unlocked: bool,
    /// `walletId -> mnemonic phrase`. Only populated while unlocked.
    decrypted_secrets: Option<HashMap<String, String>>,
}

impl VaultState {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn populate(&mut self, secrets: HashMap<String, String>) {
        self.unlocked = true;
        self.decrypted_secrets = Some(secrets);
    }

    pub fn secrets_mut(&mut self) -> Option<&mut HashMap<String, String>> {
        self.decrypted_secrets.as_mut()
    }

    pub fn get_mnemonic(&self, wallet_id: &str) -> Option<&str> {
        self.decrypted_secrets
            .as_ref()
            .and_then(|m| m.get(wallet_id))
            .map(String::as_str)
    }

    /// Zero every decrypted mnemonic and drop the map. MUST NOT touch
    /// persistent storage (spec §4.B `lock()`).
    pub fn clear(&mut self) {
        if let Some(mut secrets) = self.decrypted_secrets.take() {
            for value in secrets.values_mut() {
                value.zeroize();
            }
        }
        self.unlocked = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_locked_with_no_secrets() {
        let state = VaultState::default();
        assert!(!state.is_unlocked());
        assert_eq!(state.get_mnemonic("w1"), None);
    }

    #[test]
    fn populate_then_clear_invariant() {
        let mut state = VaultState::default();
        let mut secrets = HashMap::new();
        secrets.insert("w1".to_string(), "mnemonic words".to_string());
        state.populate(secrets);
        assert!(state.is_unlocked());
        assert_eq!(state.get_mnemonic("w1"), Some("mnemonic words"));

        state.clear();
        assert!(!state.is_unlocked());
        assert_eq!(state.get_mnemonic("w1"), None);
    }
}
