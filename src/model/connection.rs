//! Connection (directed weighted edge) between two nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NodeId;

/// Opaque connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a connection came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Proposed by the similarity linker; strength = cosine similarity.
    Semantic,
    /// Created explicitly by the user; strength is a fixed convention (0.8).
    Manual,
}

/// A directed edge from `source` to `target` with strength in [0, 1].
///
/// The store enforces at most one connection per *ordered* pair, so (A,B)
/// and (B,A) may coexist as distinct rows with different strengths. Nothing
/// in this engine relies on edge symmetry; community detection collapses the
/// edge set to an undirected simple graph before clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: NodeId,
    pub target: NodeId,
    pub strength: f32,
    pub kind: ConnectionKind,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    /// The "other" end of the connection from the given node.
    pub fn other_node(&self, from: NodeId) -> Option<NodeId> {
        if from == self.source {
            Some(self.target)
        } else if from == self.target {
            Some(self.source)
        } else {
            None
        }
    }
}
