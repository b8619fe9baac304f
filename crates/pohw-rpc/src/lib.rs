pub mod api;
pub mod server;
pub mod sync;
pub mod types;

pub use api::PohwApiServer;
pub use server::{RpcServer, RpcServerState};
pub use sync::{SyncServerState, router as sync_router, serve as serve_sync};
