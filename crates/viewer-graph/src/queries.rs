//! Read queries for the earnings knowledge graph.

use neo4rs::{query, Query};

use crate::client::{GraphClient, GraphError};
use crate::projection::{EdgeRecord, NodeRecord, Triple};

const TICKER_NEIGHBORHOOD: &str = "MATCH (t:Ticker {symbol: $ticker})-[r]-(n)
     RETURN t AS a, r AS r, n AS b
     LIMIT $limit";

const FACT_SAMPLE: &str = "MATCH (t:Ticker)-[r:HAS_FACT]-(f:Fact)
     RETURN t AS a, r AS r, f AS b
     LIMIT $limit";

/// Which part of the graph a subgraph request covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubgraphScope {
    /// Every relationship incident to the `Ticker` node with this symbol.
    Ticker(String),
    /// A sample of `HAS_FACT` relationships between tickers and facts.
    Facts,
}

impl SubgraphScope {
    /// `Ticker` for a non-empty symbol, otherwise `Facts`.
    pub fn from_ticker(ticker: Option<&str>) -> Self {
        match ticker.map(str::trim).filter(|t| !t.is_empty()) {
            Some(symbol) => Self::Ticker(symbol.to_string()),
            None => Self::Facts,
        }
    }

    pub fn cypher(&self) -> &'static str {
        match self {
            Self::Ticker(_) => TICKER_NEIGHBORHOOD,
            Self::Facts => FACT_SAMPLE,
        }
    }

    fn to_query(&self, limit: u32) -> Query {
        let q = query(self.cypher()).param("limit", limit as i64);
        match self {
            Self::Ticker(symbol) => q.param("ticker", symbol.clone()),
            Self::Facts => q,
        }
    }
}

impl GraphClient {
    /// Fetch up to `limit` matched triples for `scope`.
    pub async fn fetch_triples(
        &self,
        scope: &SubgraphScope,
        limit: u32,
    ) -> Result<Vec<Triple>, GraphError> {
        let rows = self.query_rows(scope.to_query(limit)).await?;
        let mut triples = Vec::with_capacity(rows.len());

        for row in rows {
            let a: neo4rs::Node = row
                .get("a")
                .map_err(|e| GraphError::Serialization(format!("Failed to get node a: {e}")))?;
            let b: neo4rs::Node = row
                .get("b")
                .map_err(|e| GraphError::Serialization(format!("Failed to get node b: {e}")))?;
            let r: neo4rs::Relation = row
                .get("r")
                .map_err(|e| GraphError::Serialization(format!("Failed to get relation: {e}")))?;

            triples.push(Triple {
                a: neo4j_node_to_record(&a),
                relation: neo4j_relation_to_record(&r),
                b: neo4j_node_to_record(&b),
            });
        }

        tracing::debug!(?scope, limit, matched = triples.len(), "Fetched subgraph");
        Ok(triples)
    }
}

/// Convert a neo4rs::Node, keeping every label and property.
fn neo4j_node_to_record(node: &neo4rs::Node) -> NodeRecord {
    NodeRecord {
        id: node.id().to_string(),
        labels: node.labels().into_iter().map(String::from).collect(),
        properties: collect_properties(node.keys(), |key| node.get(key).ok()),
    }
}

/// Convert a neo4rs::Relation. Source and target follow the stored direction.
fn neo4j_relation_to_record(rel: &neo4rs::Relation) -> EdgeRecord {
    EdgeRecord {
        id: rel.id().to_string(),
        source: rel.start_node_id().to_string(),
        target: rel.end_node_id().to_string(),
        edge_type: rel.typ().to_string(),
        properties: collect_properties(rel.keys(), |key| rel.get(key).ok()),
    }
}

/// Values the JSON model cannot represent become `null`.
fn collect_properties<'a>(
    keys: Vec<&'a str>,
    get: impl Fn(&str) -> Option<serde_json::Value>,
) -> serde_json::Map<String, serde_json::Value> {
    keys.into_iter()
        .map(|key| {
            let value = get(key).unwrap_or_else(|| {
                tracing::debug!(key, "Property not representable as JSON");
                serde_json::Value::Null
            });
            (key.to_string(), value)
        })
        .collect()
}
