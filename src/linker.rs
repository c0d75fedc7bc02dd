//! # Similarity Linker
//!
//! Decides which semantic edges a newly added node gets: one proposal per
//! existing node whose cosine similarity to the new vector reaches the
//! threshold (inclusive).
//!
//! A pure filter — evaluation order never changes the result set, there is
//! no cap on proposals, and no dedup against edges that already exist: the
//! store's unique ordered-pair constraint owns that.

use serde::{Deserialize, Serialize};

use crate::model::{cosine_similarity, EmbeddingVector, NodeId};

/// One proposed connection. The caller persists it as a `Semantic` edge
/// from the new node with strength = `similarity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkProposal {
    pub target: NodeId,
    pub similarity: f32,
}

/// Propose edges from `new_node` to every sufficiently similar existing node.
///
/// Nodes without a vector never link (a failed embedding is degenerate
/// input, not an error), and the new node never links to itself even if the
/// caller's snapshot already contains it.
pub fn propose_links(
    new_node: NodeId,
    new_vector: &EmbeddingVector,
    existing: &[(NodeId, Option<EmbeddingVector>)],
    threshold: f32,
) -> Vec<LinkProposal> {
    existing
        .iter()
        .filter(|(id, _)| *id != new_node)
        .filter_map(|(id, vector)| {
            let vector = vector.as_ref()?;
            let similarity = cosine_similarity(new_vector, vector);
            (similarity >= threshold).then_some(LinkProposal { target: *id, similarity })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vec3(x: f32, y: f32, z: f32) -> EmbeddingVector {
        EmbeddingVector::new(vec![x, y, z])
    }

    #[test]
    fn threshold_is_inclusive() {
        let new = vec3(1.0, 0.0, 0.0);
        // cos = 0.5 exactly: 60° in the xy plane.
        let at_threshold = vec3(0.5, 3.0f32.sqrt() / 2.0, 0.0);
        let below = vec3(0.49, (1.0 - 0.49f32 * 0.49).sqrt(), 0.0);

        let existing = vec![
            (NodeId(1), Some(at_threshold)),
            (NodeId(2), Some(below)),
        ];
        let links = propose_links(NodeId(99), &new, &existing, 0.5);

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, NodeId(1));
        assert!((links[0].similarity - 0.5).abs() < 1e-5);
    }

    #[test]
    fn vectorless_nodes_never_link() {
        let new = vec3(1.0, 0.0, 0.0);
        let existing = vec![(NodeId(1), None), (NodeId(2), Some(vec3(1.0, 0.0, 0.0)))];
        let links = propose_links(NodeId(99), &new, &existing, 0.5);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, NodeId(2));
    }

    #[test]
    fn self_is_skipped() {
        let new = vec3(1.0, 0.0, 0.0);
        let existing = vec![(NodeId(7), Some(vec3(1.0, 0.0, 0.0)))];
        assert!(propose_links(NodeId(7), &new, &existing, 0.5).is_empty());
    }

    #[test]
    fn zero_norm_vector_proposes_nothing_at_positive_threshold() {
        let new = vec3(0.0, 0.0, 0.0);
        let existing = vec![(NodeId(1), Some(vec3(1.0, 2.0, 3.0)))];
        assert!(propose_links(NodeId(9), &new, &existing, 0.1).is_empty());
    }

    #[test]
    fn no_upper_bound_on_proposals() {
        let new = vec3(1.0, 1.0, 1.0);
        let existing: Vec<_> = (0..200)
            .map(|i| (NodeId(i), Some(vec3(1.0, 1.0, 1.0))))
            .collect();
        let links = propose_links(NodeId(999), &new, &existing, 0.99);
        assert_eq!(links.len(), 200);
    }
}
