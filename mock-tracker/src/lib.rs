//! Library surface so `mogfs-fuse`'s integration tests can spin up a
//! mock tracker + storage node in-process, instead of depending on a
//! separately started binary the way the teacher's own `server/tests/`
//! assumed a long-running `cargo run` instance.

pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/list", get(handlers::list_root))
        .route("/list/*path", get(handlers::list_path))
        .route("/paths/*key", get(handlers::get_paths))
        .route("/file_info/*key", get(handlers::file_info))
        .route("/create_open", post(handlers::create_open))
        .route("/create_close", post(handlers::create_close))
        .route("/key/*key", delete(handlers::delete_key))
        .route("/rename", post(handlers::rename))
        .route("/update_class", post(handlers::update_class))
        .route("/devices", get(handlers::devices))
        .route("/storage/:fid", get(handlers::storage_get).put(handlers::storage_put))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
