//! `RegistryConfig`: a JSON file plus CLI overrides, with every optional
//! tunable behind a named `#[serde(default = "...")]` helper so older config
//! files keep loading as new tunables are added.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use pohw_core::constants::{DEFAULT_BATCH_SIZE, DEFAULT_SNAPSHOT_INTERVAL_MS, DEFAULT_SYNC_INTERVAL_MS};
use serde::{Deserialize, Serialize};

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_sync_interval_ms() -> u64 {
    DEFAULT_SYNC_INTERVAL_MS
}

fn default_snapshot_interval_ms() -> u64 {
    DEFAULT_SNAPSHOT_INTERVAL_MS
}

fn default_registry_id() -> String {
    "pohw-registry".to_string()
}

fn default_rpc_addr() -> SocketAddr {
    "127.0.0.1:8645".parse().unwrap()
}

fn default_sync_addr() -> SocketAddr {
    "127.0.0.1:8646".parse().unwrap()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    #[serde(default = "default_registry_id")]
    pub registry_id: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,
    #[serde(default = "default_snapshot_interval_ms")]
    pub snapshot_interval_ms: u64,
    #[serde(default)]
    pub anchoring: AnchoringConfig,
    #[serde(default)]
    pub peers: Vec<String>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_rpc_addr")]
    pub rpc_addr: SocketAddr,
    #[serde(default = "default_sync_addr")]
    pub sync_addr: SocketAddr,
    /// Base URL this registry publishes itself under, used in claim objects
    /// (§4.12). Not in the distilled §6 field list; needed to render
    /// `registryBaseUrl` without guessing it from `rpc_addr`.
    #[serde(default)]
    pub registry_base_url: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry_id: default_registry_id(),
            batch_size: default_batch_size(),
            sync_interval_ms: default_sync_interval_ms(),
            snapshot_interval_ms: default_snapshot_interval_ms(),
            anchoring: AnchoringConfig::default(),
            peers: Vec::new(),
            store: StoreConfig::default(),
            rpc_addr: default_rpc_addr(),
            sync_addr: default_sync_addr(),
            registry_base_url: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchoringConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bitcoin: Option<ChainAnchorConfig>,
    #[serde(default)]
    pub ethereum: Option<ChainAnchorConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainAnchorConfig {
    pub network: String,
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Opaque; forward-compatible with direct-signing strategies. The
    /// current strategies submit through the chain RPC's own wallet
    /// (`estimatesmartfee`/`eth_sendTransaction`), so this is carried but
    /// unused today — see the §9 "zkProofBlob" precedent for the pattern.
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub source_address: Option<String>,
    /// The alternate address form (P2PKH vs. P2WPKH/Bech32) of the same key,
    /// tried for UTXO discovery when `source_address` comes up empty.
    /// Bitcoin-only; ignored for Ethereum.
    #[serde(default)]
    pub source_address_alt: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    File { path: String },
    Sql { connection: String },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File { path: "./data/pohw".to_string() }
    }
}

impl RegistryConfig {
    /// Load from a JSON file; missing tunables fall back to their defaults
    /// (`#[serde(default = "...")]` on every field), matching the host's
    /// `load_or_generate_genesis_params` file-load shape.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading registry config from {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing registry config {}", path.display()))
    }

    pub fn store_path(&self) -> String {
        match &self.store {
            StoreConfig::File { path } => path.clone(),
            StoreConfig::Sql { connection } => connection.clone(),
        }
    }
}
