//! Greedy union-find clustering (the fallback community tier).
//!
//! Edges are sorted by descending strength and only the top `n` (the node
//! count) are examined — a fixed cap to bound work, not a knob. An examined
//! edge merges its endpoints' components only when its strength is strictly
//! greater than [`MERGE_THRESHOLD`]. Nodes never merged stay singleton
//! communities.
//!
//! The structure is an arena: a dense parent array over the pre-remapped
//! indices, with path-halving `find`. Correctness does not depend on the
//! halving, only the bound on find cost does.

/// Strength a merge must strictly exceed. An edge at exactly this value
/// never merges.
pub(crate) const MERGE_THRESHOLD: f32 = 0.6;

/// Assign each of the `n` dense-indexed nodes a component label (the
/// union-find root). Infallible.
pub(crate) fn partition(n: usize, edges: &[(usize, usize, f32)]) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..n).collect();

    let mut ranked: Vec<&(usize, usize, f32)> = edges.iter().collect();
    // Endpoint tiebreak keeps the examined prefix stable under equal strengths.
    ranked.sort_by(|x, y| y.2.total_cmp(&x.2).then(x.0.cmp(&y.0)).then(x.1.cmp(&y.1)));

    for &&(a, b, strength) in ranked.iter().take(n) {
        let ra = find(&mut parent, a);
        let rb = find(&mut parent, b);
        if ra != rb && strength > MERGE_THRESHOLD {
            parent[ra] = rb;
        }
    }

    (0..n).map(|i| find(&mut parent, i)).collect()
}

/// Path-halving find: every visited node is re-pointed at its grandparent.
fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups_of(assignment: &[usize]) -> Vec<Vec<usize>> {
        let mut map: std::collections::BTreeMap<usize, Vec<usize>> = Default::default();
        for (i, &root) in assignment.iter().enumerate() {
            map.entry(root).or_default().push(i);
        }
        map.into_values().collect()
    }

    #[test]
    fn strong_pairs_merge_weak_bridge_does_not() {
        // {0,1} and {2,3} merge at 0.9; the 0.3 bridge between them is below
        // the merge threshold and never joins the two groups.
        let edges = [(0, 1, 0.9), (2, 3, 0.9), (0, 2, 0.3)];
        let groups = groups_of(&partition(4, &edges));
        assert_eq!(groups, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn threshold_is_strict() {
        assert_eq!(groups_of(&partition(2, &[(0, 1, 0.6)])), vec![vec![0], vec![1]]);
        assert_eq!(groups_of(&partition(2, &[(0, 1, 0.61)])), vec![vec![0, 1]]);
    }

    #[test]
    fn only_top_node_count_edges_are_examined() {
        // 5 nodes → cap of 5. The (3,4) edge ranks 6th by strength and is
        // never examined even though it clears the merge threshold.
        let edges = [
            (0, 1, 0.9),
            (1, 2, 0.89),
            (0, 2, 0.88),
            (0, 3, 0.87),
            (1, 3, 0.86),
            (3, 4, 0.7),
        ];
        let groups = groups_of(&partition(5, &edges));
        assert_eq!(groups, vec![vec![0, 1, 2, 3], vec![4]]);
    }

    #[test]
    fn unexamined_nodes_stay_singletons() {
        let groups = groups_of(&partition(3, &[]));
        assert_eq!(groups, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn chains_collapse_to_one_component() {
        let edges = [(0, 1, 0.9), (1, 2, 0.8), (2, 3, 0.7), (3, 4, 0.95)];
        let groups = groups_of(&partition(5, &edges));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0], vec![0, 1, 2, 3, 4]);
    }
}
