//! # Community Detection
//!
//! Partitions a galaxy's nodes into disjoint groups of densely
//! interconnected nodes.
//!
//! ## Tier policy
//!
//! | Condition | Result |
//! |-----------|--------|
//! | no node ids | empty partition |
//! | no usable edges | one group holding every id |
//! | `Modularity` tier | greedy modularity optimization |
//! | `Components` tier | union-find over the strongest edges |
//! | `Whole` tier | one group holding every id |
//!
//! Under every tier the returned groups are disjoint, non-empty, and their
//! union is exactly the input id set. This operation never errors: the worst
//! case is the single all-nodes group.
//!
//! ## Edge collapsing
//!
//! The store's uniqueness constraint is on the *ordered* pair, so (A,B) and
//! (B,A) can coexist with different strengths, and callers may also hand in
//! duplicate pairs from a directed snapshot. All tiers operate on the
//! undirected simple graph obtained by merging every ordered pair onto the
//! unordered pair with the MAX strength seen — a strong manual link is never
//! diluted by a weak semantic duplicate. Self-loops and edges mentioning ids
//! outside the node set are dropped as degenerate input.

#[cfg(feature = "modularity")]
mod modularity;
mod components;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::capability::{Capabilities, CommunityTier, TierError};
use crate::model::{Connection, NodeId};

/// A directed weighted edge as handed in by the caller, before collapsing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub strength: f32,
}

impl From<&Connection> for WeightedEdge {
    fn from(c: &Connection) -> Self {
        Self { source: c.source, target: c.target, strength: c.strength }
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Partition `node_ids` into communities using `edges`.
///
/// Deterministic for a fixed graph and weights. Duplicate ids in `node_ids`
/// are treated as a set (first occurrence wins).
pub fn detect(
    node_ids: &[NodeId],
    edges: &[WeightedEdge],
    capabilities: &Capabilities,
) -> Vec<Vec<NodeId>> {
    let graph = CollapsedGraph::build(node_ids, edges);
    if graph.ids.is_empty() {
        return Vec::new();
    }
    if graph.edges.is_empty() {
        return vec![graph.ids.clone()];
    }

    for tier in &capabilities.community {
        match run_community_tier(*tier, &graph) {
            Ok(assignment) => return graph.groups(&assignment),
            Err(e) => {
                warn!(tier = ?tier, error = %e, "community tier failed, falling back");
            }
        }
    }

    // Unreachable when the descriptor ends with Whole, which cannot fail.
    vec![graph.ids.clone()]
}

fn run_community_tier(tier: CommunityTier, graph: &CollapsedGraph) -> Result<Vec<usize>, TierError> {
    match tier {
        #[cfg(feature = "modularity")]
        CommunityTier::Modularity => modularity::partition(graph.ids.len(), &graph.edges),
        #[cfg(not(feature = "modularity"))]
        CommunityTier::Modularity => {
            Err(TierError::Computation("modularity tier not compiled".into()))
        }
        CommunityTier::Components => Ok(components::partition(graph.ids.len(), &graph.edges)),
        CommunityTier::Whole => Ok(vec![0; graph.ids.len()]),
    }
}

// ============================================================================
// Collapsed graph
// ============================================================================

/// The undirected weighted simple graph all tiers run on: node ids remapped
/// to dense indices 0..n, ordered pairs merged by max strength.
struct CollapsedGraph {
    /// Dense index → original id, in first-seen input order.
    ids: Vec<NodeId>,
    /// Undirected edges (i < j), strengths merged by max, sorted by (i, j).
    edges: Vec<(usize, usize, f32)>,
}

impl CollapsedGraph {
    fn build(node_ids: &[NodeId], edges: &[WeightedEdge]) -> Self {
        let mut ids = Vec::with_capacity(node_ids.len());
        let mut index: hashbrown::HashMap<NodeId, usize> =
            hashbrown::HashMap::with_capacity(node_ids.len());
        for &id in node_ids {
            index.entry(id).or_insert_with(|| {
                ids.push(id);
                ids.len() - 1
            });
        }

        let mut merged: hashbrown::HashMap<(usize, usize), f32> = hashbrown::HashMap::new();
        for edge in edges {
            let (Some(&a), Some(&b)) = (index.get(&edge.source), index.get(&edge.target)) else {
                continue;
            };
            if a == b {
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            let entry = merged.entry(key).or_insert(f32::NEG_INFINITY);
            *entry = entry.max(edge.strength);
        }

        let mut collapsed: Vec<(usize, usize, f32)> =
            merged.into_iter().map(|((a, b), w)| (a, b, w)).collect();
        collapsed.sort_by(|x, y| x.0.cmp(&y.0).then(x.1.cmp(&y.1)));

        Self { ids, edges: collapsed }
    }

    /// Turn a per-node community assignment into groups of original ids.
    /// Groups come out ordered by their first member's dense index, members
    /// in dense-index order, so output is stable for a fixed input.
    fn groups(&self, assignment: &[usize]) -> Vec<Vec<NodeId>> {
        let mut first_seen: hashbrown::HashMap<usize, usize> = hashbrown::HashMap::new();
        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        for (i, &community) in assignment.iter().enumerate() {
            let slot = *first_seen.entry(community).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(self.ids[i]);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(values: &[u64]) -> Vec<NodeId> {
        values.iter().map(|&v| NodeId(v)).collect()
    }

    fn edge(s: u64, t: u64, w: f32) -> WeightedEdge {
        WeightedEdge { source: NodeId(s), target: NodeId(t), strength: w }
    }

    fn sorted_groups(mut groups: Vec<Vec<NodeId>>) -> Vec<Vec<NodeId>> {
        for g in &mut groups {
            g.sort();
        }
        groups.sort();
        groups
    }

    #[test]
    fn empty_ids_yield_empty_partition() {
        let caps = Capabilities::detect();
        assert!(detect(&[], &[edge(1, 2, 0.9)], &caps).is_empty());
    }

    #[test]
    fn no_edges_yield_single_group() {
        let caps = Capabilities::detect();
        let node_ids = ids(&[1, 2, 3, 4, 5, 6]);
        let groups = detect(&node_ids, &[], &caps);
        assert_eq!(groups, vec![node_ids]);
    }

    #[test]
    fn edges_to_unknown_ids_are_ignored() {
        let caps = Capabilities::detect();
        let node_ids = ids(&[1, 2]);
        // Only edge references a node the store never returned: behaves as no edges.
        let groups = detect(&node_ids, &[edge(1, 99, 0.9)], &caps);
        assert_eq!(groups, vec![node_ids]);
    }

    #[test]
    fn partition_covers_ids_exactly_under_all_tiers() {
        let node_ids = ids(&[10, 20, 30, 40, 50, 60, 70]);
        let edges = [
            edge(10, 20, 0.9),
            edge(20, 30, 0.8),
            edge(40, 50, 0.95),
            edge(50, 60, 0.7),
            edge(10, 40, 0.1),
        ];
        for caps in [
            Capabilities::detect(),
            Capabilities::fallback_only(),
            Capabilities { reducer: vec![], community: vec![CommunityTier::Whole] },
        ] {
            let groups = detect(&node_ids, &edges, &caps);
            let mut seen: Vec<NodeId> = groups.iter().flatten().copied().collect();
            seen.sort();
            let mut expected = node_ids.clone();
            expected.sort();
            assert_eq!(seen, expected, "partition must cover ids exactly once ({caps:?})");
            assert!(groups.iter().all(|g| !g.is_empty()));
        }
    }

    #[test]
    fn reverse_pairs_collapse_by_max_strength() {
        // (1,2) at 0.2 and (2,1) at 0.9 are one undirected edge of weight 0.9:
        // strong enough to merge on the fallback path.
        let node_ids = ids(&[1, 2, 3]);
        let edges = [edge(1, 2, 0.2), edge(2, 1, 0.9)];
        let groups = sorted_groups(detect(&node_ids, &edges, &Capabilities::fallback_only()));
        assert_eq!(groups, vec![ids(&[1, 2]), ids(&[3])]);
    }

    #[test]
    fn detect_is_deterministic() {
        let node_ids = ids(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let edges = [
            edge(1, 2, 0.9),
            edge(2, 3, 0.85),
            edge(1, 3, 0.8),
            edge(4, 5, 0.9),
            edge(5, 6, 0.88),
            edge(3, 4, 0.15),
            edge(7, 8, 0.99),
        ];
        let caps = Capabilities::detect();
        let a = detect(&node_ids, &edges, &caps);
        let b = detect(&node_ids, &edges, &caps);
        assert_eq!(a, b);
    }

    #[cfg(feature = "modularity")]
    #[test]
    fn modularity_tier_separates_two_cliques() {
        let node_ids = ids(&[1, 2, 3, 4, 5, 6]);
        let edges = [
            edge(1, 2, 1.0),
            edge(1, 3, 1.0),
            edge(2, 3, 1.0),
            edge(4, 5, 1.0),
            edge(4, 6, 1.0),
            edge(5, 6, 1.0),
            edge(3, 4, 0.05),
        ];
        let groups = sorted_groups(detect(&node_ids, &edges, &Capabilities::detect()));
        assert_eq!(groups, vec![ids(&[1, 2, 3]), ids(&[4, 5, 6])]);
    }
}
