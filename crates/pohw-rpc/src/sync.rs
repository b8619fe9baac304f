//! The peer-sync read-only surface (§4.10, §6): plain HTTP GET routes
//! returning JSON, served alongside (but on a separate port from) the
//! JSON-RPC API — `pohw-peer::PeerClient` is the matching consumer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use pohw_core::PohwError;
use pohw_peer::MerkleRootExchange;
use pohw_store::{BatchStore, ProofStore, RegistryStore};

pub struct SyncServerState {
    pub store: Arc<RegistryStore>,
    pub registry_id: String,
}

struct ApiError(PohwError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

impl From<PohwError> for ApiError {
    fn from(e: PohwError) -> Self {
        Self(e)
    }
}

async fn root_exchange(State(state): State<Arc<SyncServerState>>) -> Result<Json<MerkleRootExchange>, ApiError> {
    let latest = state.store.get_latest_batch()?;
    let total_proofs = state.store.count_total_proofs()?;
    let total_batches = state.store.list_batches()?.len() as u64;

    let (merkle_root, batch_id) = match latest {
        Some(batch) => (batch.root, batch.batch_id),
        None => (pohw_core::hash(b""), String::new()),
    };

    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);

    Ok(Json(MerkleRootExchange {
        peer_registry_id: state.registry_id.clone(),
        merkle_root,
        batch_id,
        timestamp,
        total_proofs,
        total_batches,
        signature: None,
    }))
}

#[derive(Deserialize)]
struct ProofsSinceQuery {
    since: u64,
}

async fn proofs_since(State(state): State<Arc<SyncServerState>>, Query(q): Query<ProofsSinceQuery>) -> Result<Json<Vec<pohw_core::ProofRecord>>, ApiError> {
    Ok(Json(state.store.list_proofs_since(q.since)?))
}

async fn batches(State(state): State<Arc<SyncServerState>>) -> Result<Json<Vec<pohw_core::Batch>>, ApiError> {
    Ok(Json(state.store.list_batches()?))
}

pub fn router(state: Arc<SyncServerState>) -> Router {
    Router::new()
        .route("/v1/sync/root", get(root_exchange))
        .route("/v1/sync/proofs", get(proofs_since))
        .route("/v1/sync/batches", get(batches))
        .with_state(state)
}

pub async fn serve(state: Arc<SyncServerState>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "pohw-rpc peer-sync HTTP server started");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
