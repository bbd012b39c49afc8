//! Shared request state.

use std::sync::Arc;

use viewer_core::ServerConfig;
use viewer_data::{CallCatalog, DatasetCache};
use viewer_graph::GraphService;

/// Services injected into every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub datasets: Arc<DatasetCache>,
    pub calls: Arc<CallCatalog>,
    pub graph: Arc<GraphService>,
}

impl AppState {
    pub fn new(datasets: DatasetCache, calls: CallCatalog, graph: GraphService) -> Self {
        Self {
            datasets: Arc::new(datasets),
            calls: Arc::new(calls),
            graph: Arc::new(graph),
        }
    }

    /// Build every service from the server configuration.
    ///
    /// Fails only if the sample-call document exists but cannot be read.
    pub fn from_config(config: &ServerConfig) -> viewer_data::Result<Self> {
        let datasets = DatasetCache::new(&config.data_dir, config.dataset_suffix.clone());
        let calls = CallCatalog::load(&config.sample_calls_path)?;
        let graph = GraphService::from_sources(&config.credential_sources());
        Ok(Self::new(datasets, calls, graph))
    }
}
