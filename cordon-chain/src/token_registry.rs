//! Hidden/custom token bookkeeping (supplemented feature, backed by
//! `cordon_hidden_tokens` / `cordon_custom_tokens` store keys from spec §6's
//! external-interfaces list).

use std::io;

use serde::{Deserialize, Serialize};

use crate::chain::EvmAddress;
use crate::kv_store::KvStore;

const HIDDEN_TOKENS_KEY: &str = "cordon_hidden_tokens";
const CUSTOM_TOKENS_KEY: &str = "cordon_custom_tokens";

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct CustomToken {
    pub chain_id: u64,
    pub address: EvmAddress,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

#[derive(Default, Serialize, Deserialize)]
struct HiddenTokensFile(Vec<String>);

#[derive(Default, Serialize, Deserialize)]
struct CustomTokensFile(Vec<CustomToken>);

/// User-maintained overlay on top of the chain-wide token list: tokens the
/// user has explicitly hidden from their balance view, and tokens they've
/// manually added that aren't in any bundled list.
pub struct TokenRegistry<'a> {
    store: &'a dyn KvStore,
}

impl<'a> TokenRegistry<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    fn token_key(chain_id: u64, address: &EvmAddress) -> String {
        format!("{chain_id}:{}", address.to_hex().to_lowercase())
    }

    pub fn hide_token(&self, chain_id: u64, address: &EvmAddress) -> io::Result<()> {
        let mut file = self.read_hidden()?;
        let key = Self::token_key(chain_id, address);
        if !file.0.contains(&key) {
            file.0.push(key);
        }
        self.write_hidden(&file)
    }

    pub fn unhide_token(&self, chain_id: u64, address: &EvmAddress) -> io::Result<()> {
        let mut file = self.read_hidden()?;
        let key = Self::token_key(chain_id, address);
        file.0.retain(|k| k != &key);
        self.write_hidden(&file)
    }

    pub fn is_hidden(&self, chain_id: u64, address: &EvmAddress) -> io::Result<bool> {
        let file = self.read_hidden()?;
        Ok(file.0.contains(&Self::token_key(chain_id, address)))
    }

    pub fn add_custom_token(&self, token: CustomToken) -> io::Result<()> {
        let mut file = self.read_custom()?;
        file.0.retain(|t| !(t.chain_id == token.chain_id && t.address == token.address));
        file.0.push(token);
        self.write_custom(&file)
    }

    pub fn remove_custom_token(&self, chain_id: u64, address: &EvmAddress) -> io::Result<()> {
        let mut file = self.read_custom()?;
        file.0.retain(|t| !(t.chain_id == chain_id && &t.address == address));
        self.write_custom(&file)
    }

    pub fn list_custom_tokens(&self) -> io::Result<Vec<CustomToken>> {
        Ok(self.read_custom()?.0)
    }

    fn read_hidden(&self) -> io::Result<HiddenTokensFile> {
        match self.store.get(HIDDEN_TOKENS_KEY)? {
            Some(bytes) => {
                Ok(serde_json::from_slice(&bytes).unwrap_or_default())
            }
            None => Ok(HiddenTokensFile::default()),
        }
    }

    fn write_hidden(&self, file: &HiddenTokensFile) -> io::Result<()> {
        let bytes = serde_json::to_vec(file).expect("HiddenTokensFile is always serializable");
        self.store.set(HIDDEN_TOKENS_KEY, &bytes)
    }

    fn read_custom(&self) -> io::Result<CustomTokensFile> {
        match self.store.get(CUSTOM_TOKENS_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_default()),
            None => Ok(CustomTokensFile::default()),
        }
    }

    fn write_custom(&self, file: &CustomTokensFile) -> io::Result<()> {
        let bytes = serde_json::to_vec(file).expect("CustomTokensFile is always serializable");
        self.store.set(CUSTOM_TOKENS_KEY, &bytes)
    }
}
