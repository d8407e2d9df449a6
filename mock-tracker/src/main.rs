//! Mock tracker + storage node, used only by `mogfs-fuse`'s integration
//! tests. Grounded in the teacher's `server/src/main.rs` (axum + tokio +
//! tower-http + tracing_subscriber), generalized from a generic file
//! server's routes to the tracker RPC + storage-node surface in §4.1/§4.2.
//!
//! Route table and handlers live in `lib.rs` so tests can embed the same
//! server in-process instead of depending on this binary running.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mock_tracker::{build_router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "mock_tracker=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
    let state = Arc::new(AppState::new(addr.to_string()));
    let app = build_router(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
