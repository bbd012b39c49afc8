//! Route table.
//!
//! ```text
//! GET  /api/datasets
//! GET  /api/rows
//! GET  /api/options
//! GET  /api/sample-calls
//! GET  /api/sample-calls/{call_id}
//! GET  /api/graph
//! GET  /*                → static front-end (when the directory exists)
//! ```

use std::path::Path;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api;
use crate::state::AppState;

pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .route("/api/datasets", get(api::list_datasets))
        .route("/api/rows", get(api::get_rows))
        .route("/api/options", get(api::get_options))
        .route("/api/sample-calls", get(api::list_sample_calls))
        .route("/api/sample-calls/{call_id}", get(api::get_sample_call))
        .route("/api/graph", get(api::get_graph));

    match static_dir {
        Some(dir) if dir.is_dir() => {
            router = router.fallback_service(ServeDir::new(dir));
        }
        Some(dir) => {
            tracing::warn!(static_dir = %dir.display(), "Static directory missing, front-end not served");
        }
        None => {}
    }

    router.layer(CorsLayer::permissive()).with_state(state)
}
