//! # Galaxy Service
//!
//! The orchestration layer: wires the stateless algorithms to a store and an
//! embedder, one request at a time. This is where the "never block node
//! creation" policy lives — embedding, placement, and linking each degrade
//! independently, and a node is persisted no matter which of them failed.

use tracing::{debug, info, warn};

use crate::capability::{Capabilities, CapabilityReport};
use crate::community::{self, WeightedEdge};
use crate::embed::Embedder;
use crate::layout::{self, ProjectionParams};
use crate::linker::{self, LinkProposal};
use crate::model::*;
use crate::store::{GraphStore, NewNode};
use crate::Result;

/// Strength assigned to user-created connections.
const MANUAL_CONNECTION_STRENGTH: f32 = 0.8;

/// Outcome of creating a content node.
#[derive(Debug, Clone)]
pub struct CreatedNode {
    pub node_id: NodeId,
    pub position: Position,
    /// Similarity links persisted for this node. Empty when the embedding
    /// failed or nothing cleared the threshold.
    pub links: Vec<LinkProposal>,
}

/// The primary entry point: a store, an embedder, and the capability
/// descriptor resolved once at construction.
pub struct GalaxyService<S, E> {
    store: S,
    embedder: E,
    capabilities: Capabilities,
}

impl<S: GraphStore, E: Embedder> GalaxyService<S, E> {
    pub fn new(store: S, embedder: E) -> Self {
        let capabilities = Capabilities::detect();
        info!(report = ?capabilities.report(), "galaxy service starting");
        Self { store, embedder, capabilities }
    }

    /// Construct with an explicit tier descriptor (tests force fallback
    /// paths this way).
    pub fn with_capabilities(store: S, embedder: E, capabilities: Capabilities) -> Self {
        Self { store, embedder, capabilities }
    }

    pub fn capabilities(&self) -> CapabilityReport {
        self.capabilities.report()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================================================================
    // Galaxies
    // ========================================================================

    pub async fn create_galaxy(&self, name: &str) -> Result<GalaxyId> {
        self.store.create_galaxy(name).await
    }

    pub async fn galaxies(&self) -> Result<Vec<Galaxy>> {
        self.store.galaxies().await
    }

    pub async fn delete_galaxy(&self, id: GalaxyId) -> Result<bool> {
        self.store.delete_galaxy(id).await
    }

    // ========================================================================
    // Node creation pipeline
    // ========================================================================

    /// Embed → place → persist → link.
    ///
    /// Embedding failure downgrades to a vectorless node at the placeholder
    /// position. Placement failure cannot happen (the layout tiers are
    /// total). Linking failure is logged and the node stands.
    pub async fn create_content_node(
        &self,
        galaxy: GalaxyId,
        content_type: ContentType,
        content: &str,
        metadata: Option<serde_json::Value>,
        similarity_threshold: f32,
    ) -> Result<CreatedNode> {
        let embedding = match self.embedder.embed(content_type, content).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "embedding failed, creating node without vector");
                None
            }
        };

        let position = match &embedding {
            Some(vector) => self.initial_position(galaxy, vector).await?,
            None => Position::ORIGIN,
        };

        let mut new_node = NewNode::new(galaxy, content_type, content).with_position(position);
        if let Some(vector) = embedding.clone() {
            new_node = new_node.with_embedding(vector);
        }
        if let Some(metadata) = metadata {
            new_node = new_node.with_metadata(metadata);
        }
        let node_id = self.store.create_node(new_node).await?;

        let links = match &embedding {
            Some(vector) => {
                match self.link_node(galaxy, node_id, vector, similarity_threshold).await {
                    Ok(links) => links,
                    Err(e) => {
                        warn!(node = %node_id, error = %e, "connection creation failed");
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        debug!(node = %node_id, ?position, links = links.len(), "content node created");
        Ok(CreatedNode { node_id, position, links })
    }

    /// Position a new vector in the galaxy's current coordinate frame.
    async fn initial_position(&self, galaxy: GalaxyId, vector: &EmbeddingVector) -> Result<Position> {
        let existing: Vec<EmbeddingVector> = self
            .store
            .embeddings(galaxy)
            .await?
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        Ok(layout::place_incremental(&existing, vector, &self.capabilities))
    }

    /// Propose and persist similarity links for a freshly created node.
    /// The store's ordered-pair constraint absorbs duplicate proposals.
    async fn link_node(
        &self,
        galaxy: GalaxyId,
        node_id: NodeId,
        vector: &EmbeddingVector,
        threshold: f32,
    ) -> Result<Vec<LinkProposal>> {
        let existing: Vec<(NodeId, Option<EmbeddingVector>)> = self
            .store
            .embeddings(galaxy)
            .await?
            .into_iter()
            .map(|(id, v)| (id, Some(v)))
            .collect();

        let proposals = linker::propose_links(node_id, vector, &existing, threshold);
        for proposal in &proposals {
            self.store
                .create_connection(node_id, proposal.target, proposal.similarity, ConnectionKind::Semantic)
                .await?;
        }
        Ok(proposals)
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Re-project every embedded node in the galaxy and persist the new
    /// positions. With fewer than 2 vectors there is no layout to compute
    /// and nodes are returned unchanged.
    pub async fn recompute_layout(
        &self,
        galaxy: GalaxyId,
        params: ProjectionParams,
    ) -> Result<Vec<Node>> {
        let embedded = self.store.embeddings(galaxy).await?;
        if embedded.len() < 2 {
            return self.store.nodes(galaxy).await;
        }

        let (ids, vectors): (Vec<NodeId>, Vec<EmbeddingVector>) = embedded.into_iter().unzip();
        let positions = layout::project(&vectors, &params, &self.capabilities);

        let updates: Vec<(NodeId, Position)> =
            ids.into_iter().zip(positions.into_iter()).collect();
        self.store.set_positions_bulk(&updates).await?;

        info!(galaxy = %galaxy, nodes = updates.len(), "layout recomputed");
        self.store.nodes(galaxy).await
    }

    // ========================================================================
    // Communities
    // ========================================================================

    /// Partition the galaxy's nodes into communities. Nodes without
    /// embeddings participate too — community structure comes from edges,
    /// not vectors.
    pub async fn communities(&self, galaxy: GalaxyId) -> Result<Vec<Vec<NodeId>>> {
        let node_ids: Vec<NodeId> = self
            .store
            .nodes(galaxy)
            .await?
            .into_iter()
            .map(|n| n.id)
            .collect();
        let edges: Vec<WeightedEdge> = self
            .store
            .connections(galaxy)
            .await?
            .iter()
            .map(WeightedEdge::from)
            .collect();
        Ok(community::detect(&node_ids, &edges, &self.capabilities))
    }

    // ========================================================================
    // Connections
    // ========================================================================

    /// User-created connection at the fixed manual strength. Returns None
    /// when the ordered pair already exists.
    pub async fn connect_manually(
        &self,
        source: NodeId,
        target: NodeId,
    ) -> Result<Option<ConnectionId>> {
        self.store
            .create_connection(source, target, MANUAL_CONNECTION_STRENGTH, ConnectionKind::Manual)
            .await
    }

    pub async fn disconnect(&self, id: ConnectionId) -> Result<bool> {
        self.store.delete_connection(id).await
    }
}
