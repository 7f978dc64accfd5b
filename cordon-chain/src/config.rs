//! Fixed per-chain configuration registry (spec §3 `ChainConfig`).

use serde::{Deserialize, Serialize};

/// EVM numeric chain id. Solana has no numeric chain id in this scheme; it's
/// represented separately by [`crate::chain::Chain::Solana`].
pub type EvmChainId = u64;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: EvmChainId,
    pub name: &'static str,
    pub native_symbol: &'static str,
    pub native_decimals: u8,
    pub rpc_url: String,
    pub explorer_base_url: &'static str,
    pub is_testnet: bool,
}

impl ChainConfig {
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base_url, tx_hash)
    }
}

pub const ETHEREUM_MAINNET: EvmChainId = 1;
pub const POLYGON_MAINNET: EvmChainId = 137;
pub const BNB_MAINNET: EvmChainId = 56;
pub const ARBITRUM_ONE: EvmChainId = 42161;

/// The fixed set of EVM chains this wallet supports (spec §1: "Ethereum,
/// Polygon, BNB, Arbitrum"). RPC URLs are filled in from [`crate::CoreConfig`]
/// at runtime; this only fixes the chain identity and display metadata.
pub fn builtin_evm_chains(rpc_urls: &EvmRpcUrls) -> Vec<ChainConfig> {
    vec![
        ChainConfig {
            chain_id: ETHEREUM_MAINNET,
            name: "Ethereum",
            native_symbol: "ETH",
            native_decimals: 18,
            rpc_url: rpc_urls.ethereum.clone(),
            explorer_base_url: "https://etherscan.io",
            is_testnet: false,
        },
        ChainConfig {
            chain_id: POLYGON_MAINNET,
            name: "Polygon",
            native_symbol: "MATIC",
            native_decimals: 18,
            rpc_url: rpc_urls.polygon.clone(),
            explorer_base_url: "https://polygonscan.com",
            is_testnet: false,
        },
        ChainConfig {
            chain_id: BNB_MAINNET,
            name: "BNB Chain",
            native_symbol: "BNB",
            native_decimals: 18,
            rpc_url: rpc_urls.bnb.clone(),
            explorer_base_url: "https://bscscan.com",
            is_testnet: false,
        },
        ChainConfig {
            chain_id: ARBITRUM_ONE,
            name: "Arbitrum One",
            native_symbol: "ETH",
            native_decimals: 18,
            rpc_url: rpc_urls.arbitrum.clone(),
            explorer_base_url: "https://arbiscan.io",
            is_testnet: false,
        },
    ]
}

/// Per-chain RPC endpoints, supplied by the embedding application
/// (`CoreConfig` in `cordon-core`) rather than hard-coded, since every
/// deployment points at its own provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvmRpcUrls {
    pub ethereum: String,
    pub polygon: String,
    pub bnb: String,
    pub arbitrum: String,
}

pub const SOLANA_EXPLORER_BASE_URL: &str = "https://solscan.io";

pub fn solana_explorer_tx_url(signature: &str) -> String {
    format!("{}/tx/{}", SOLANA_EXPLORER_BASE_URL, signature)
}

/// A registry view over the fixed EVM chain set, for `chain_id -> ChainConfig`
/// lookups used throughout the signer crates.
pub struct ChainRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainRegistry {
    pub fn new(rpc_urls: &EvmRpcUrls) -> Self {
        Self {
            chains: builtin_evm_chains(rpc_urls),
        }
    }

    pub fn get(&self, chain_id: EvmChainId) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    pub fn is_supported(&self, chain_id: EvmChainId) -> bool {
        self.get(chain_id).is_some()
    }

    pub fn all(&self) -> &[ChainConfig] {
        &self.chains
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_rpc_urls() -> EvmRpcUrls {
        EvmRpcUrls {
            ethereum: "https://eth.example".to_string(),
            polygon: "https://polygon.example".to_string(),
            bnb: "https://bnb.example".to_string(),
            arbitrum: "https://arbitrum.example".to_string(),
        }
    }

    #[test]
    fn registry_resolves_all_builtin_chains() {
        let registry = ChainRegistry::new(&test_rpc_urls());
        assert!(registry.is_supported(ETHEREUM_MAINNET));
        assert!(registry.is_supported(POLYGON_MAINNET));
        assert!(registry.is_supported(BNB_MAINNET));
        assert!(registry.is_supported(ARBITRUM_ONE));
        assert!(!registry.is_supported(9_999_999));
    }

    #[test]
    fn explorer_url_formats_correctly() {
        let registry = ChainRegistry::new(&test_rpc_urls());
        let eth = registry.get(ETHEREUM_MAINNET).unwrap();
        assert_eq!(
            eth.explorer_tx_url("0xabc"),
            "https://etherscan.io/tx/0xabc"
        );
        assert_eq!(
            solana_explorer_tx_url("5abc"),
            "https://solscan.io/tx/5abc"
        );
    }
}
