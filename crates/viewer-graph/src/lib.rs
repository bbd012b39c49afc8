//! viewer-graph: Neo4j access for the earnings knowledge graph.
//!
//! Runs the two read-only subgraph queries the viewer needs and projects the
//! returned (node, relationship, node) triples into a deduplicated node list
//! and an edge list ready for the browser.

pub mod client;
pub mod projection;
pub mod queries;
pub mod service;

pub use client::{GraphClient, GraphConfig, GraphError};
pub use projection::{EdgeRecord, NodeRecord, Subgraph, Triple};
pub use queries::SubgraphScope;
pub use service::GraphService;
