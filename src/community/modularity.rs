//! Greedy modularity optimization (the preferred community tier).
//!
//! Louvain-style local moves over the collapsed undirected weighted graph:
//! each node is removed from its community and reinserted into the
//! neighboring community with the best modularity gain, repeating until a
//! full pass moves nothing. Single-level — the galaxy graphs this engine
//! sees are small enough that the aggregation phase buys nothing.
//!
//! Deterministic: nodes are scanned in dense-index order and candidate
//! communities in ascending id order with strict-greater gain comparison,
//! so a fixed graph always yields the same partition.

use crate::capability::TierError;

/// Local-move passes before giving up on convergence.
const MAX_PASSES: usize = 10;

/// Resolution parameter; 1.0 is classic modularity.
const RESOLUTION: f32 = 1.0;

/// Assign each of the `n` dense-indexed nodes to a community, returned as a
/// contiguously renumbered assignment vector.
pub(crate) fn partition(n: usize, edges: &[(usize, usize, f32)]) -> Result<Vec<usize>, TierError> {
    if edges.iter().any(|&(_, _, w)| !w.is_finite()) {
        return Err(TierError::Computation("non-finite edge weight".into()));
    }

    // Adjacency over the undirected graph.
    let mut adjacency: Vec<Vec<(usize, f32)>> = vec![Vec::new(); n];
    let mut total_weight = 0.0f32;
    for &(a, b, w) in edges {
        adjacency[a].push((b, w));
        adjacency[b].push((a, w));
        total_weight += w;
    }
    if total_weight <= 0.0 {
        // All-zero strengths carry no community signal; one community each.
        return Ok((0..n).collect());
    }

    // Weighted degree per node and total degree per community.
    let degree: Vec<f32> = adjacency
        .iter()
        .map(|nb| nb.iter().map(|&(_, w)| w).sum())
        .collect();
    let mut community: Vec<usize> = (0..n).collect();
    let mut community_degree: Vec<f32> = degree.clone();

    let two_m_sq = 2.0 * total_weight * total_weight;

    for _ in 0..MAX_PASSES {
        let mut moved = false;

        for i in 0..n {
            let home = community[i];

            // Take the node out before evaluating candidates, so its own
            // degree never counts against rejoining its home community.
            community_degree[home] -= degree[i];

            // Edge weight from i into each neighboring community.
            let mut weight_to: hashbrown::HashMap<usize, f32> = hashbrown::HashMap::new();
            for &(j, w) in &adjacency[i] {
                *weight_to.entry(community[j]).or_default() += w;
            }

            let gain = |c: usize, w_ic: f32| -> f32 {
                w_ic / total_weight - RESOLUTION * degree[i] * community_degree[c] / two_m_sq
            };

            let mut best_comm = home;
            let mut best_gain = gain(home, weight_to.get(&home).copied().unwrap_or(0.0));

            let mut candidates: Vec<(usize, f32)> = weight_to.into_iter().collect();
            candidates.sort_by_key(|&(c, _)| c);
            for (c, w_ic) in candidates {
                if c == home {
                    continue;
                }
                let g = gain(c, w_ic);
                if g > best_gain {
                    best_gain = g;
                    best_comm = c;
                }
            }

            community_degree[best_comm] += degree[i];
            if best_comm != home {
                community[i] = best_comm;
                moved = true;
            }
        }

        if !moved {
            break;
        }
    }

    // Renumber to contiguous community ids in first-seen order.
    let mut renumber: hashbrown::HashMap<usize, usize> = hashbrown::HashMap::new();
    let assignment = community
        .iter()
        .map(|&c| {
            let next = renumber.len();
            *renumber.entry(c).or_insert(next)
        })
        .collect();
    Ok(assignment)
}
