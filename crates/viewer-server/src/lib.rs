//! viewer-server: HTTP API for the earnings results viewer.
//!
//! Serves the tabular result datasets, the sample-call catalog, and
//! knowledge-graph subgraphs as JSON under `/api/`, with the static
//! front-end mounted as the fallback.

mod api;
pub mod error;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
