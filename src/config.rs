//! Client configuration: per-chain RPC endpoints and name-service registries.
//!
//! Configuration is read-only once the client is constructed. It maps chain
//! IDs to their RPC endpoint and the name services reachable on that chain
//! (keyed by domain suffix, e.g. `eth` or `w3q`), and maps EIP-3770 chain
//! short names (e.g. `gno`) back to chain IDs.
//!
//! Loading follows the usual TOML conventions: a missing file yields the
//! defaults, a malformed file is an error.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::Path;
use url::Url;

/// Which kind of name service a registry implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameServiceKind {
    /// ENS-style hierarchical service; cross-chain pointers live in the
    /// `text(node, "contentcontract")` record.
    #[serde(rename = "ens")]
    Ens,
    /// Web3Q hierarchical service; cross-chain pointers live in the
    /// `webHandler(node)` record.
    #[serde(rename = "w3ns")]
    W3ns,
    /// Flat registry exposing `pointers(bytes32)`; no hierarchical hashing.
    #[serde(rename = "simple")]
    Simple,
}

impl Display for NameServiceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NameServiceKind::Ens => write!(f, "ens"),
            NameServiceKind::W3ns => write!(f, "w3ns"),
            NameServiceKind::Simple => write!(f, "simple"),
        }
    }
}

/// A name service reachable on some chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameServiceInfo {
    /// Service kind, which decides the resolution protocol.
    pub kind: NameServiceKind,
    /// Registry contract address.
    pub registry: Address,
}

/// Per-chain settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint for `eth_call`s against this chain.
    pub rpc: Url,
    /// Name services by domain suffix (`eth`, `w3q`, ...).
    #[serde(default)]
    pub ns: HashMap<String, NameServiceInfo>,
}

/// Complete client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Supported chains by numeric chain ID.
    #[serde(with = "chain_map_serde")]
    pub chains: HashMap<u64, ChainConfig>,
    /// EIP-3770 chain short names (lowercase) to chain IDs.
    pub name_to_chain: HashMap<String, u64>,
    /// TTL of name→address cache entries. `0` disables the cache.
    pub name_cache_ttl_minutes: u32,
    /// Per-request timeout applied to each RPC call.
    pub rpc_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chains: HashMap::new(),
            name_to_chain: HashMap::new(),
            name_cache_ttl_minutes: 60,
            rpc_timeout_seconds: 30,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// If the file doesn't exist, returns the default configuration.
    /// If the file exists but is malformed, returns an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()
    }

    /// Load configuration from the path in `CONFIG_FILE`, or `config.toml`.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::from_file(config_path)
    }

    /// Settings for a chain, if it is supported.
    pub fn chain(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }

    /// Chain ID for an EIP-3770 short name. Lookup is case-insensitive.
    pub fn chain_by_short_name(&self, short_name: &str) -> Option<u64> {
        self.name_to_chain.get(&short_name.to_lowercase()).copied()
    }
}

/// TOML table keys are strings; bridge them to numeric chain IDs.
mod chain_map_serde {
    use super::ChainConfig;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S>(
        chains: &HashMap<u64, ChainConfig>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let by_name: HashMap<String, &ChainConfig> =
            chains.iter().map(|(id, c)| (id.to_string(), c)).collect();
        by_name.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<u64, ChainConfig>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let by_name: HashMap<String, ChainConfig> = HashMap::deserialize(deserializer)?;
        by_name
            .into_iter()
            .map(|(id, c)| {
                id.parse::<u64>()
                    .map(|id| (id, c))
                    .map_err(|_| serde::de::Error::custom(format!("invalid chain id: {id}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.chains.is_empty());
        assert_eq!(config.name_cache_ttl_minutes, 60);
        assert_eq!(config.rpc_timeout_seconds, 30);
    }

    #[test]
    fn test_parse_chains_and_name_services() {
        let config_str = r#"
name_cache_ttl_minutes = 15

[chains.1]
rpc = "https://ethereum.example/rpc"

[chains.1.ns.eth]
kind = "ens"
registry = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e"

[chains.3334]
rpc = "https://galileo.example/rpc"

[chains.3334.ns.w3q]
kind = "w3ns"
registry = "0x0000000000000000000000000000000000001001"

[name_to_chain]
eth = 1
w3q-g = 3334
"#;

        let config: Config = toml::from_str(config_str).unwrap();
        assert_eq!(config.name_cache_ttl_minutes, 15);
        assert_eq!(config.chains.len(), 2);

        let mainnet = config.chain(1).unwrap();
        assert_eq!(mainnet.rpc.as_str(), "https://ethereum.example/rpc");
        let ens = mainnet.ns.get("eth").unwrap();
        assert_eq!(ens.kind, NameServiceKind::Ens);

        let galileo = config.chain(3334).unwrap();
        assert_eq!(galileo.ns.get("w3q").unwrap().kind, NameServiceKind::W3ns);

        assert_eq!(config.chain_by_short_name("eth"), Some(1));
        assert_eq!(config.chain_by_short_name("W3Q-G"), Some(3334));
        assert_eq!(config.chain_by_short_name("gno"), None);
    }

    #[test]
    fn test_unknown_name_service_kind_rejected() {
        let config_str = r#"
[chains.1]
rpc = "https://ethereum.example/rpc"

[chains.1.ns.eth]
kind = "dns"
registry = "0x00000000000C2E074eC69A0dFb2997BA6C7d2e1e"
"#;
        assert!(toml::from_str::<Config>(config_str).is_err());
    }
}
