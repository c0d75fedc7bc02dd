//! Content node in the semantic graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmbeddingVector, GalaxyId, Position};

/// Opaque node identifier, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of content a node was created from.
///
/// A tag only — file-format extraction and transcription happen outside this
/// engine; by the time a node exists its content is already text or a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Pdf,
    Audio,
}

/// A content node: a fragment of text or an image reference, with the
/// embedding the encoder produced for it and its place in the 3D layout.
///
/// `embedding` is `None` when embedding generation failed — such a node still
/// exists in the graph (the never-block-creation policy) but sits at a
/// placeholder position and never receives similarity links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub galaxy_id: GalaxyId,
    pub content_type: ContentType,
    pub content: String,
    pub label: String,
    pub embedding: Option<EmbeddingVector>,
    pub position: Position,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Node {
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}
