//! Flattening of matched (node, relationship, node) triples into the
//! node/edge shape the front-end renders.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A graph node as returned to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// A relationship as returned to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

/// One matched path: both endpoints and the relationship between them.
#[derive(Debug, Clone)]
pub struct Triple {
    pub a: NodeRecord,
    pub relation: EdgeRecord,
    pub b: NodeRecord,
}

/// Result of a subgraph query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl Subgraph {
    /// Project triples in order.
    ///
    /// Nodes are deduplicated by id, keeping the first occurrence. Edges are
    /// kept as matched, duplicates included.
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let mut seen = HashSet::new();
        let mut graph = Subgraph::default();

        for Triple { a, relation, b } in triples {
            for node in [a, b] {
                if seen.insert(node.id.clone()) {
                    graph.nodes.push(node);
                }
            }
            graph.edges.push(relation);
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node(id: &str, label: &str) -> NodeRecord {
        let mut properties = serde_json::Map::new();
        properties.insert("name".to_string(), json!(id));
        NodeRecord {
            id: id.to_string(),
            labels: vec![label.to_string()],
            properties,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> EdgeRecord {
        EdgeRecord {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            edge_type: "HAS_FACT".to_string(),
            properties: serde_json::Map::new(),
        }
    }

    fn triple(a: &str, r: &str, b: &str) -> Triple {
        Triple {
            a: node(a, "Ticker"),
            relation: edge(r, a, b),
            b: node(b, "Fact"),
        }
    }

    #[test]
    fn test_shared_ticker_node_appears_once() {
        let graph = Subgraph::from_triples(vec![
            triple("t1", "r1", "f1"),
            triple("t1", "r2", "f2"),
            triple("t1", "r3", "f3"),
        ]);

        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "f1", "f2", "f3"]);
        assert_eq!(graph.edges.len(), 3);
    }

    #[test]
    fn test_duplicate_edges_are_preserved() {
        let graph = Subgraph::from_triples(vec![triple("t1", "r1", "f1"), triple("t1", "r1", "f1")]);
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.edges[0], graph.edges[1]);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut later = node("t1", "Ticker");
        later.labels.push("Extra".to_string());
        let graph = Subgraph::from_triples(vec![
            triple("t1", "r1", "f1"),
            Triple {
                a: later,
                relation: edge("r2", "t1", "f1"),
                b: node("f1", "Fact"),
            },
        ]);
        assert_eq!(graph.nodes[0].labels, vec!["Ticker"]);
    }

    #[test]
    fn test_empty_input_is_empty_graph() {
        let graph = Subgraph::from_triples(Vec::new());
        assert_eq!(graph, Subgraph::default());
    }

    #[test]
    fn test_wire_shape() {
        let graph = Subgraph::from_triples(vec![triple("t1", "r1", "f1")]);
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            value["edges"][0],
            json!({"id": "r1", "source": "t1", "target": "f1", "type": "HAS_FACT", "properties": {}})
        );
        assert_eq!(
            value["nodes"][0],
            json!({"id": "t1", "labels": ["Ticker"], "properties": {"name": "t1"}})
        );
    }
}
