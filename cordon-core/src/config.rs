//! Static configuration (expanded spec's "Configuration" section): per-chain
//! RPC URLs, broadcast endpoints, speed-mode fee caps, and the keyring
//! service name, loadable from a TOML file or supplied programmatically by
//! the embedding UI — in the spirit of the teacher's `AppConfig`.

use std::time::Duration;

use cordon_chain::config::EvmRpcUrls;
use cordon_swap::BroadcastEndpoints;
use serde::{Deserialize, Serialize};

/// TOML-deserializable mirror of [`cordon_swap::BroadcastEndpoints`], which
/// carries no `Deserialize` impl of its own since the swap core has no
/// reason to depend on a config-file format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BroadcastConfig {
    pub jito_bundle_urls: Vec<String>,
    pub jito_send_transaction_url: String,
    pub primary_rpc: String,
    pub secondary_rpc: String,
    /// Seconds to poll `getSignatureStatus` before giving up and reporting
    /// `expired` (spec §4.H's `maxDuration`).
    #[serde(default = "default_broadcast_timeout_secs")]
    pub broadcast_timeout_secs: u64,
}

fn default_broadcast_timeout_secs() -> u64 {
    60
}

impl BroadcastConfig {
    pub fn endpoints(&self) -> BroadcastEndpoints {
        BroadcastEndpoints {
            jito_bundle_urls: self.jito_bundle_urls.clone(),
            jito_send_transaction_url: self.jito_send_transaction_url.clone(),
            primary_rpc: self.primary_rpc.clone(),
            secondary_rpc: self.secondary_rpc.clone(),
        }
    }

    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_secs(self.broadcast_timeout_secs)
    }
}

fn default_keyring_service_name() -> String {
    "cordon-wallet".to_string()
}

/// Everything `CordonCore` needs to know about its deployment that isn't a
/// runtime collaborator (those live in [`crate::collaborators::Collaborators`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoreConfig {
    pub evm_rpc: EvmRpcUrls,
    pub broadcast: BroadcastConfig,
    #[serde(default = "default_keyring_service_name")]
    pub keyring_service_name: String,
}

impl CoreConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let raw = r#"
            keyring_service_name = "cordon-test"

            [evm_rpc]
            ethereum = "https://eth.example"
            polygon = "https://polygon.example"
            bnb = "https://bnb.example"
            arbitrum = "https://arbitrum.example"

            [broadcast]
            jito_bundle_urls = ["https://jito1.example"]
            jito_send_transaction_url = "https://jito-send.example"
            primary_rpc = "https://rpc1.example"
            secondary_rpc = "https://rpc2.example"
        "#;
        let config = CoreConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.keyring_service_name, "cordon-test");
        assert_eq!(config.broadcast.broadcast_timeout_secs, 60);
        assert_eq!(config.evm_rpc.ethereum, "https://eth.example");
    }

    #[test]
    fn keyring_service_name_defaults_when_absent() {
        let raw = r#"
            [evm_rpc]
            ethereum = "https://eth.example"
            polygon = "https://polygon.example"
            bnb = "https://bnb.example"
            arbitrum = "https://arbitrum.example"

            [broadcast]
            jito_bundle_urls = []
            jito_send_transaction_url = "https://jito-send.example"
            primary_rpc = "https://rpc1.example"
            secondary_rpc = "https://rpc2.example"
            broadcast_timeout_secs = 90
        "#;
        let config = CoreConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.keyring_service_name, "cordon-wallet");
        assert_eq!(config.broadcast.broadcast_timeout_secs, 90);
    }
}
