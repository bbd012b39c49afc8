//! Pooled, read-only access to the earnings knowledge graph.

use neo4rs::{ConfigBuilder, Graph, Query, Row};
use viewer_core::GraphCredentials;

const POOL_SIZE: u32 = 16;
const ROWS_PER_FETCH: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Credentials were missing or incomplete when the service was built.
    #[error("Neo4j configuration error: {0}")]
    Config(String),

    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    /// A returned column did not decode as the expected node or relationship.
    #[error("Unexpected graph row: {0}")]
    Serialization(String),
}

/// Connection parameters for the graph store.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl GraphConfig {
    pub fn from_credentials(creds: &GraphCredentials) -> Self {
        Self {
            uri: creds.uri.clone(),
            user: creds.username.clone(),
            password: creds.password.clone(),
            max_connections: POOL_SIZE,
            fetch_size: ROWS_PER_FETCH,
        }
    }
}

/// Shared handle to the neo4rs pool. Clones share the pool.
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let settings = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| {
                GraphError::Connection(format!("invalid settings for {}: {e}", config.uri))
            })?;

        let graph = Graph::connect(settings).await.map_err(|e| {
            GraphError::Connection(format!("cannot reach {}: {e}", config.uri))
        })?;

        tracing::info!(uri = %config.uri, user = %config.user, "Graph store connected");
        Ok(Self { graph })
    }

    /// Run `query` and drain the whole result stream.
    ///
    /// Nothing is returned unless every row arrived.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut collected = Vec::new();
        while let Some(row) = stream.next().await? {
            collected.push(row);
        }
        Ok(collected)
    }
}
