//! In-memory graph store.
//!
//! The reference implementation of `GraphStore`: HashMaps behind RwLocks,
//! atomic id counters, no durability. Writes are applied immediately and
//! multi-step mutations are not atomic — safe for the one-request-at-a-time
//! model this engine is designed for, and for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::model::*;
use crate::{Error, Result};

use super::{GraphStore, NewNode};

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory store for testing and embedding.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    galaxies: RwLock<HashMap<GalaxyId, Galaxy>>,
    nodes: RwLock<HashMap<NodeId, Node>>,
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    /// Ordered-pair uniqueness index: (source, target) → connection.
    pair_index: RwLock<HashSet<(NodeId, NodeId)>>,
    next_galaxy_id: AtomicU64,
    next_node_id: AtomicU64,
    next_connection_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                galaxies: RwLock::new(HashMap::new()),
                nodes: RwLock::new(HashMap::new()),
                connections: RwLock::new(HashMap::new()),
                pair_index: RwLock::new(HashSet::new()),
                next_galaxy_id: AtomicU64::new(1),
                next_node_id: AtomicU64::new(1),
                next_connection_id: AtomicU64::new(1),
            }),
        }
    }

    /// Drop connections with either endpoint in `gone`, maintaining the
    /// pair index.
    fn drop_connections_touching(&self, gone: &HashSet<NodeId>) {
        let mut connections = self.inner.connections.write();
        let mut pairs = self.inner.pair_index.write();
        connections.retain(|_, c| {
            let keep = !gone.contains(&c.source) && !gone.contains(&c.target);
            if !keep {
                pairs.remove(&(c.source, c.target));
            }
            keep
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// GraphStore impl
// ============================================================================

#[async_trait]
impl GraphStore for MemoryStore {
    // ========================================================================
    // Galaxies
    // ========================================================================

    async fn create_galaxy(&self, name: &str) -> Result<GalaxyId> {
        let id = GalaxyId(self.inner.next_galaxy_id.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();
        let galaxy = Galaxy {
            id,
            name: name.to_string(),
            node_count: 0,
            created_at: now,
            modified_at: now,
        };
        self.inner.galaxies.write().insert(id, galaxy);
        Ok(id)
    }

    async fn galaxies(&self) -> Result<Vec<Galaxy>> {
        let mut all: Vec<Galaxy> = self.inner.galaxies.read().values().cloned().collect();
        all.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then(a.id.0.cmp(&b.id.0)));
        Ok(all)
    }

    async fn delete_galaxy(&self, id: GalaxyId) -> Result<bool> {
        if self.inner.galaxies.write().remove(&id).is_none() {
            return Ok(false);
        }
        // Cascade: nodes, then connections touching them.
        let gone: HashSet<NodeId> = {
            let mut nodes = self.inner.nodes.write();
            let ids: HashSet<NodeId> = nodes
                .values()
                .filter(|n| n.galaxy_id == id)
                .map(|n| n.id)
                .collect();
            nodes.retain(|_, n| n.galaxy_id != id);
            ids
        };
        self.drop_connections_touching(&gone);
        Ok(true)
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    async fn create_node(&self, node: NewNode) -> Result<NodeId> {
        if !self.inner.galaxies.read().contains_key(&node.galaxy_id) {
            return Err(Error::NotFound(format!("galaxy {}", node.galaxy_id)));
        }
        let id = NodeId(self.inner.next_node_id.fetch_add(1, Ordering::Relaxed));
        let stored = Node {
            id,
            galaxy_id: node.galaxy_id,
            content_type: node.content_type,
            content: node.content,
            label: node.label,
            embedding: node.embedding,
            position: node.position,
            metadata: node.metadata,
            created_at: Utc::now(),
        };
        self.inner.nodes.write().insert(id, stored);
        if let Some(galaxy) = self.inner.galaxies.write().get_mut(&node.galaxy_id) {
            galaxy.node_count += 1;
            galaxy.modified_at = Utc::now();
        }
        Ok(id)
    }

    async fn node(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.inner.nodes.read().get(&id).cloned())
    }

    async fn nodes(&self, galaxy: GalaxyId) -> Result<Vec<Node>> {
        let mut result: Vec<Node> = self
            .inner
            .nodes
            .read()
            .values()
            .filter(|n| n.galaxy_id == galaxy)
            .cloned()
            .collect();
        result.sort_by_key(|n| n.id.0);
        Ok(result)
    }

    async fn delete_node(&self, id: NodeId) -> Result<bool> {
        let removed = self.inner.nodes.write().remove(&id);
        let Some(node) = removed else { return Ok(false) };

        let gone: HashSet<NodeId> = [id].into();
        self.drop_connections_touching(&gone);

        if let Some(galaxy) = self.inner.galaxies.write().get_mut(&node.galaxy_id) {
            galaxy.node_count = galaxy.node_count.saturating_sub(1);
            galaxy.modified_at = Utc::now();
        }
        Ok(true)
    }

    async fn set_label(&self, id: NodeId, label: &str) -> Result<()> {
        let mut nodes = self.inner.nodes.write();
        let node = nodes
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("node {id}")))?;
        node.label = label.to_string();
        Ok(())
    }

    async fn set_position(&self, id: NodeId, position: Position) -> Result<()> {
        let mut nodes = self.inner.nodes.write();
        let node = nodes
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("node {id}")))?;
        node.position = position;
        Ok(())
    }

    async fn set_positions_bulk(&self, positions: &[(NodeId, Position)]) -> Result<()> {
        let mut nodes = self.inner.nodes.write();
        for &(id, position) in positions {
            if let Some(node) = nodes.get_mut(&id) {
                node.position = position;
            }
        }
        Ok(())
    }

    async fn embeddings(&self, galaxy: GalaxyId) -> Result<Vec<(NodeId, EmbeddingVector)>> {
        let mut result: Vec<(NodeId, EmbeddingVector)> = self
            .inner
            .nodes
            .read()
            .values()
            .filter(|n| n.galaxy_id == galaxy)
            .filter_map(|n| n.embedding.clone().map(|e| (n.id, e)))
            .collect();
        result.sort_by_key(|(id, _)| id.0);
        Ok(result)
    }

    // ========================================================================
    // Connections
    // ========================================================================

    async fn create_connection(
        &self,
        source: NodeId,
        target: NodeId,
        strength: f32,
        kind: ConnectionKind,
    ) -> Result<Option<ConnectionId>> {
        {
            let nodes = self.inner.nodes.read();
            for endpoint in [source, target] {
                if !nodes.contains_key(&endpoint) {
                    return Err(Error::NotFound(format!("node {endpoint}")));
                }
            }
        }
        if !self.inner.pair_index.write().insert((source, target)) {
            return Ok(None);
        }
        let id = ConnectionId(self.inner.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let connection = Connection {
            id,
            source,
            target,
            strength,
            kind,
            created_at: Utc::now(),
        };
        self.inner.connections.write().insert(id, connection);
        Ok(Some(id))
    }

    async fn delete_connection(&self, id: ConnectionId) -> Result<bool> {
        let removed = self.inner.connections.write().remove(&id);
        if let Some(c) = &removed {
            self.inner.pair_index.write().remove(&(c.source, c.target));
        }
        Ok(removed.is_some())
    }

    async fn connections(&self, galaxy: GalaxyId) -> Result<Vec<Connection>> {
        let galaxy_nodes: HashSet<NodeId> = self
            .inner
            .nodes
            .read()
            .values()
            .filter(|n| n.galaxy_id == galaxy)
            .map(|n| n.id)
            .collect();
        let mut result: Vec<Connection> = self
            .inner
            .connections
            .read()
            .values()
            .filter(|c| galaxy_nodes.contains(&c.source))
            .cloned()
            .collect();
        result.sort_by_key(|c| c.id.0);
        Ok(result)
    }
}
