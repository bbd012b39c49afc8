//! The process-wide graph handle: resolved configuration plus a lazily
//! connected client.

use tokio::sync::OnceCell;
use viewer_core::{CredentialSource, GraphCredentials};

use crate::client::{GraphClient, GraphConfig, GraphError};
use crate::projection::Subgraph;
use crate::queries::SubgraphScope;

/// Connects on first use. Only client creation is serialised; queries run
/// concurrently on the shared client.
pub struct GraphService {
    config: Result<GraphConfig, String>,
    client: OnceCell<GraphClient>,
}

impl GraphService {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config: Ok(config),
            client: OnceCell::new(),
        }
    }

    /// A service whose every request fails with [`GraphError::Config`].
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self {
            config: Err(reason.into()),
            client: OnceCell::new(),
        }
    }

    /// Resolve credentials from `sources`. Incomplete credentials do not fail
    /// startup; they surface on the first graph request.
    pub fn from_sources(sources: &[CredentialSource]) -> Self {
        match GraphCredentials::resolve(sources) {
            Ok(creds) => Self::new(GraphConfig::from_credentials(&creds)),
            Err(e) => {
                tracing::warn!(error = %e, "Graph store not configured");
                Self::unconfigured(e.to_string())
            }
        }
    }

    /// The shared client, connecting it on the first call.
    ///
    /// A failed connection is not cached; the next call tries again.
    pub async fn client(&self) -> Result<&GraphClient, GraphError> {
        let config = self
            .config
            .as_ref()
            .map_err(|reason| GraphError::Config(reason.clone()))?;
        self.client
            .get_or_try_init(|| GraphClient::connect(config))
            .await
    }

    /// Subgraph around `ticker`, or a fact sample when no ticker is given.
    pub async fn subgraph(&self, ticker: Option<&str>, limit: u32) -> Result<Subgraph, GraphError> {
        let scope = SubgraphScope::from_ticker(ticker);
        let triples = self.client().await?.fetch_triples(&scope, limit).await?;
        let graph = Subgraph::from_triples(triples);
        tracing::debug!(
            ?scope,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Projected subgraph"
        );
        Ok(graph)
    }
}
