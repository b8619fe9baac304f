//! pohw-node — the registry node binary.
//!
//! Startup sequence (§9 "synchronous boot sequence", §10.5):
//!   1. Open (or initialise) the state database
//!   2. Load identity documents and attestors (no reads may 5xx on an
//!      uninitialized cache — there is none; this step only warms logs)
//!   3. Start the batcher and peer-sync background tasks
//!   4. Start the JSON-RPC and peer-sync HTTP servers

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use pohw_anchor::AnchorCoordinator;
use pohw_anchor::{bitcoin::BitcoinAnchorStrategy, bitcoin::BitcoinNetwork, ethereum::EthereumAnchorStrategy, rpc::JsonRpcClient};
use pohw_intake::IntakePipeline;
use pohw_peer::PeerSyncWorker;
use pohw_rpc::{RpcServer, RpcServerState, SyncServerState};
use pohw_store::{AttestorStore, IdentityStore, RegistryStore};

use config::{AnchoringConfig, RegistryConfig};

#[derive(Parser, Debug)]
#[command(name = "pohw-node", version, about = "PoHW attestation registry node")]
struct Args {
    /// Path to the registry config JSON (optional; defaults apply when absent).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the persistent store. Overrides the config file's `store.path`.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// JSON-RPC listen address. Overrides the config file's `rpcAddr`.
    #[arg(long)]
    rpc_addr: Option<SocketAddr>,

    /// Peer-sync HTTP listen address. Overrides the config file's `syncAddr`.
    #[arg(long)]
    sync_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,pohw=debug".parse().unwrap()))
        .init();

    let args = Args::parse();
    info!("pohw-node starting");

    let mut cfg = match &args.config {
        Some(path) => RegistryConfig::load(path)?,
        None => {
            warn!("no --config provided, using default registry configuration");
            RegistryConfig::default()
        }
    };
    if let Some(addr) = args.rpc_addr {
        cfg.rpc_addr = addr;
    }
    if let Some(addr) = args.sync_addr {
        cfg.sync_addr = addr;
    }

    // ── Store ──────────────────────────────────────────────────────────────────
    let data_dir = args.data_dir.map(|p| p.display().to_string()).unwrap_or_else(|| cfg.store_path());
    std::fs::create_dir_all(&data_dir).with_context(|| format!("creating data dir {data_dir}"))?;
    let store = Arc::new(RegistryStore::open(&data_dir).context("opening registry store")?);

    // ── Boot-time cache warm (§9) ────────────────────────────────────────────────
    let documents = store.list_documents().context("loading identity documents")?;
    let attestors = store.list_attestors().context("loading attestors")?;
    info!(identity_documents = documents.len(), attestors = attestors.len(), "boot state loaded");

    // ── Intake + batch-threshold signal ─────────────────────────────────────────
    // `IntakePipeline::batch_signal` is a blocking `std::sync::mpsc::Sender`
    // (library crates never depend on an async runtime type, §10.2); bridge it
    // onto the async batcher loop via a dedicated blocking thread.
    let (std_tx, std_rx) = std::sync::mpsc::channel::<()>();
    let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<()>(8);
    tokio::task::spawn_blocking(move || {
        while std_rx.recv().is_ok() {
            if async_tx.blocking_send(()).is_err() {
                break;
            }
        }
    });

    let mut intake = IntakePipeline::new(Arc::clone(&store), cfg.registry_id.clone());
    intake.batch_size = cfg.batch_size;
    intake.batch_signal = Some(std_tx);

    // ── Batcher background task ─────────────────────────────────────────────────
    {
        let store = Arc::clone(&store);
        let batch_size = cfg.batch_size;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    Some(()) = async_rx.recv() => {}
                }
                let now = chrono::Utc::now().timestamp();
                match pohw_batcher::drain_batch(&store, now, batch_size) {
                    Ok(Some(batch)) => info!(batch_id = %batch.batch_id, size = batch.size, "batch drained"),
                    Ok(None) => {}
                    Err(err) => warn!(error = %err, "batch drain failed"),
                }
            }
        });
    }

    // ── Anchor coordinator ───────────────────────────────────────────────────────
    let anchor = build_anchor_coordinator(&cfg.registry_id, &cfg.anchoring);

    // ── Peer-sync worker ─────────────────────────────────────────────────────────
    let peer_sync_handle = if cfg.peers.is_empty() {
        None
    } else {
        let (worker, handle) = PeerSyncWorker::new(Arc::clone(&store), cfg.peers.clone());
        let worker = worker.with_interval_ms(cfg.sync_interval_ms);
        tokio::spawn(worker.run());
        Some(Arc::new(handle))
    };

    // ── JSON-RPC server ──────────────────────────────────────────────────────────
    let registry_base_url = cfg.registry_base_url.clone().unwrap_or_else(|| format!("http://{}", cfg.rpc_addr));
    let rpc_state = Arc::new(RpcServerState {
        store: Arc::clone(&store),
        intake,
        registry_id: cfg.registry_id.clone(),
        registry_base_url,
        batch_size: cfg.batch_size,
        anchor: anchor.map(Arc::new),
        peer_sync: peer_sync_handle,
    });
    let _rpc_handle = RpcServer::new(rpc_state).start(cfg.rpc_addr).await.context("starting JSON-RPC server")?;

    // ── Peer-sync HTTP server ────────────────────────────────────────────────────
    let sync_state = Arc::new(SyncServerState { store: Arc::clone(&store), registry_id: cfg.registry_id.clone() });
    let sync_addr = cfg.sync_addr;
    tokio::spawn(async move {
        if let Err(err) = pohw_rpc::serve_sync(sync_state, sync_addr).await {
            warn!(error = %err, "peer-sync HTTP server exited");
        }
    });

    info!("pohw-node ready");
    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("pohw-node shutting down");
    Ok(())
}

/// Build an `AnchorCoordinator` from config, when anchoring is enabled and at
/// least one chain is configured. Per-chain config that's present but
/// malformed (e.g. an unrecognised bitcoin network) logs a warning and is
/// skipped rather than failing the whole boot.
fn build_anchor_coordinator(registry_id: &str, cfg: &AnchoringConfig) -> Option<AnchorCoordinator> {
    if !cfg.enabled {
        return None;
    }

    let bitcoin = cfg.bitcoin.as_ref().and_then(|chain| {
        let network = match chain.network.as_str() {
            "mainnet" => BitcoinNetwork::Mainnet,
            "testnet" => BitcoinNetwork::Testnet,
            other => {
                warn!(network = other, "unrecognised bitcoin network in config, skipping bitcoin anchoring");
                return None;
            }
        };
        let source_address = chain.source_address.clone().unwrap_or_default();
        if source_address.is_empty() {
            warn!("bitcoin anchoring enabled but no sourceAddress configured, skipping");
            return None;
        }
        Some(BitcoinAnchorStrategy {
            network,
            node_rpc: chain.rpc_url.as_ref().map(|url| JsonRpcClient::new(url.clone())),
            explorer_base_url: None,
            source_address,
            source_address_alt: chain.source_address_alt.clone(),
            http: reqwest::Client::new(),
        })
    });

    let ethereum = cfg.ethereum.as_ref().and_then(|chain| {
        let Some(rpc_url) = &chain.rpc_url else {
            warn!("ethereum anchoring enabled but no rpcUrl configured, skipping");
            return None;
        };
        let address = chain.source_address.clone().unwrap_or_default();
        if address.is_empty() {
            warn!("ethereum anchoring enabled but no sourceAddress configured, skipping");
            return None;
        }
        Some(EthereumAnchorStrategy { rpc: JsonRpcClient::new(rpc_url.clone()), address })
    });

    if bitcoin.is_none() && ethereum.is_none() {
        return None;
    }
    Some(AnchorCoordinator { registry_id: registry_id.to_string(), bitcoin, ethereum })
}
