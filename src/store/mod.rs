//! # Graph Store Trait
//!
//! The contract between the engine and any persistence layer. The engine's
//! algorithms are stateless; everything durable — galaxies, nodes,
//! connections, embedding blobs — lives behind this trait.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory reference store for testing/embedding |
//!
//! ## Contract notes
//!
//! - Deleting a galaxy cascades to its nodes and their connections;
//!   deleting a node cascades to connections touching it.
//! - At most one connection per *ordered* (source, target) pair.
//!   `create_connection` returns `Ok(None)` when the pair already exists —
//!   a duplicate proposal is expected traffic, not an error.
//! - The engine assumes each call sees a consistent snapshot; serializing
//!   reads against writes (e.g. a batch re-layout racing an insert) is the
//!   store's responsibility.

pub mod memory;

use async_trait::async_trait;

use crate::model::*;
use crate::Result;

pub use memory::MemoryStore;

// ============================================================================
// New-node payload
// ============================================================================

/// Everything needed to persist a node. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub galaxy_id: GalaxyId,
    pub content_type: ContentType,
    pub content: String,
    pub label: String,
    pub embedding: Option<EmbeddingVector>,
    pub position: Position,
    pub metadata: serde_json::Value,
}

impl NewNode {
    pub fn new(galaxy_id: GalaxyId, content_type: ContentType, content: impl Into<String>) -> Self {
        let content = content.into();
        // Default label: leading slice of the content, as the UI shows it.
        let label = content.chars().take(40).collect();
        Self {
            galaxy_id,
            content_type,
            content,
            label,
            embedding: None,
            position: Position::ORIGIN,
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_embedding(mut self, embedding: EmbeddingVector) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

// ============================================================================
// GraphStore Trait
// ============================================================================

/// The universal persistence contract.
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    // ========================================================================
    // Galaxies
    // ========================================================================

    /// Create a named galaxy.
    async fn create_galaxy(&self, name: &str) -> Result<GalaxyId>;

    /// All galaxies, most recently modified first.
    async fn galaxies(&self) -> Result<Vec<Galaxy>>;

    /// Delete a galaxy and everything it owns. Returns true if it existed.
    async fn delete_galaxy(&self, id: GalaxyId) -> Result<bool>;

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Persist a node. The galaxy must exist.
    async fn create_node(&self, node: NewNode) -> Result<NodeId>;

    /// Get a node by id.
    async fn node(&self, id: NodeId) -> Result<Option<Node>>;

    /// All nodes of a galaxy, in creation order.
    async fn nodes(&self, galaxy: GalaxyId) -> Result<Vec<Node>>;

    /// Delete a node and the connections touching it. Returns true if it existed.
    async fn delete_node(&self, id: NodeId) -> Result<bool>;

    /// Update a node's label.
    async fn set_label(&self, id: NodeId, label: &str) -> Result<()>;

    /// Update a node's position.
    async fn set_position(&self, id: NodeId, position: Position) -> Result<()>;

    /// Bulk position update after a batch re-layout.
    ///
    /// Default falls back to sequential `set_position` calls; stores with a
    /// cheaper bulk path should override.
    async fn set_positions_bulk(&self, positions: &[(NodeId, Position)]) -> Result<()> {
        for &(id, position) in positions {
            self.set_position(id, position).await?;
        }
        Ok(())
    }

    /// Id and embedding of every node in the galaxy that has one, in
    /// creation order. This is the projection input.
    async fn embeddings(&self, galaxy: GalaxyId) -> Result<Vec<(NodeId, EmbeddingVector)>>;

    // ========================================================================
    // Connections
    // ========================================================================

    /// Persist a connection. Returns `Ok(None)` when the ordered
    /// (source, target) pair already exists.
    async fn create_connection(
        &self,
        source: NodeId,
        target: NodeId,
        strength: f32,
        kind: ConnectionKind,
    ) -> Result<Option<ConnectionId>>;

    /// Delete a connection. Returns true if it existed.
    async fn delete_connection(&self, id: ConnectionId) -> Result<bool>;

    /// All connections whose source node belongs to the galaxy.
    async fn connections(&self, galaxy: GalaxyId) -> Result<Vec<Connection>>;
}
