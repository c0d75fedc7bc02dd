//! Neighbor-graph manifold embedding (the preferred reducer tier).
//!
//! A self-contained nonlinear reduction in the UMAP family: build a k-nearest
//! neighbor graph over the input, calibrate per-point fuzzy membership
//! weights, symmetrize, then optimize a 3D layout by stochastic gradient
//! descent over attractive (edge) and repulsive (negative-sample) forces.
//!
//! Everything that draws randomness uses a `StdRng` seeded with
//! [`REDUCTION_SEED`], and edges are visited in sorted order, so the output
//! is a pure function of the input vectors, their order, and the parameters.

use ndarray::{Array2, ArrayView2};
use rand::prelude::*;
use smallvec::SmallVec;

use crate::capability::TierError;

use super::{Metric, ProjectionParams, REDUCTION_SEED};

/// Optimization epochs. The layout converges well before this for the batch
/// sizes this engine sees (tens to low thousands of nodes).
const N_EPOCHS: usize = 200;

/// Negative samples drawn per edge per epoch.
const NEGATIVE_SAMPLES: usize = 5;

/// Per-axis gradient clamp, keeping early high-energy epochs from flinging
/// points to infinity.
const GRADIENT_CLIP: f32 = 4.0;

/// Target for the smooth-kNN calibration: the effective neighborhood mass.
fn target_mass(k: usize) -> f32 {
    (k as f32).log2()
}

/// Default neighbor capacity; `SmallVec` stays inline for the default
/// neighborhood size of 15.
type NeighborList = SmallVec<[(usize, f32); 16]>;

// ============================================================================
// Entry point
// ============================================================================

/// Embed an n×d batch (n ≥ 5) into n×3 coordinates.
pub(crate) fn embed_3d(
    data: ArrayView2<f32>,
    params: &ProjectionParams,
) -> Result<Array2<f32>, TierError> {
    let n = data.nrows();
    let k = params.n_neighbors.clamp(2, n - 1);

    let neighbors = nearest_neighbors(data, k, params.metric);
    let edges = fuzzy_union(&neighbors, k);
    if edges.is_empty() {
        return Err(TierError::Computation("neighbor graph has no edges".into()));
    }

    let (a, b) = fit_kernel(params.min_dist.max(1e-3), 1.0);
    let positions = optimize(n, &edges, a, b);

    if positions.iter().any(|v| !v.is_finite()) {
        return Err(TierError::NonFinite);
    }
    Ok(positions)
}

// ============================================================================
// Neighbor graph
// ============================================================================

fn distance(a: ndarray::ArrayView1<f32>, b: ndarray::ArrayView1<f32>, metric: Metric) -> f32 {
    match metric {
        Metric::Cosine => {
            let dot = a.dot(&b);
            let na = a.dot(&a).sqrt();
            let nb = b.dot(&b).sqrt();
            if na == 0.0 || nb == 0.0 {
                // Zero-norm vectors are maximally distant from everything.
                1.0
            } else {
                (1.0 - dot / (na * nb)).max(0.0)
            }
        }
        Metric::Euclidean => {
            let mut sum = 0.0f32;
            for (x, y) in a.iter().zip(b.iter()) {
                let d = x - y;
                sum += d * d;
            }
            sum.sqrt()
        }
    }
}

/// Exact k-nearest neighbors by full pairwise scan. Quadratic, which is fine
/// at this engine's batch sizes; an approximate index would slot in here if
/// galaxies grew past tens of thousands of nodes.
fn nearest_neighbors(data: ArrayView2<f32>, k: usize, metric: Metric) -> Vec<NeighborList> {
    let n = data.nrows();
    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let mut dists: Vec<(f32, usize)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (distance(data.row(i), data.row(j), metric), j))
            .collect();
        // Index tiebreak keeps the neighbor choice order-stable.
        dists.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        dists.truncate(k);
        result.push(dists.into_iter().map(|(d, j)| (j, d)).collect());
    }
    result
}

/// Per-point smooth-kNN calibration: exp(-(d - rho) / sigma) membership
/// weights, with sigma found by bisection so the total neighborhood mass
/// hits log2(k).
fn membership_weights(neighbors: &NeighborList, k: usize) -> NeighborList {
    let rho = neighbors
        .iter()
        .map(|&(_, d)| d)
        .filter(|&d| d > 0.0)
        .fold(f32::INFINITY, f32::min);
    let rho = if rho.is_finite() { rho } else { 0.0 };

    let mass = |sigma: f32| -> f32 {
        neighbors
            .iter()
            .map(|&(_, d)| (-(d - rho).max(0.0) / sigma).exp())
            .sum()
    };

    let target = target_mass(k);
    let (mut lo, mut hi) = (1e-4f32, 1e4f32);
    for _ in 0..64 {
        let mid = (lo + hi) / 2.0;
        if mass(mid) > target {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    let sigma = (lo + hi) / 2.0;

    neighbors
        .iter()
        .map(|&(j, d)| (j, (-(d - rho).max(0.0) / sigma).exp()))
        .collect()
}

/// Symmetrize directed memberships into an undirected weighted edge list via
/// fuzzy-set union: w = w_ij + w_ji − w_ij·w_ji. Edges come out sorted by
/// endpoints so downstream iteration is deterministic.
fn fuzzy_union(neighbors: &[NeighborList], k: usize) -> Vec<(usize, usize, f32)> {
    let weighted: Vec<NeighborList> =
        neighbors.iter().map(|nb| membership_weights(nb, k)).collect();

    let mut pairs: hashbrown::HashMap<(usize, usize), (f32, f32)> = hashbrown::HashMap::new();
    for (i, nb) in weighted.iter().enumerate() {
        for &(j, w) in nb {
            let (key, forward) = if i < j { ((i, j), true) } else { ((j, i), false) };
            let entry = pairs.entry(key).or_insert((0.0, 0.0));
            if forward {
                entry.0 = w;
            } else {
                entry.1 = w;
            }
        }
    }

    let mut edges: Vec<(usize, usize, f32)> = pairs
        .into_iter()
        .map(|((i, j), (wij, wji))| (i, j, wij + wji - wij * wji))
        .filter(|&(_, _, w)| w > 0.0)
        .collect();
    edges.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    edges
}

// ============================================================================
// Low-dimensional kernel
// ============================================================================

/// Fit the rational kernel 1 / (1 + a·x^(2b)) to the target curve implied by
/// `min_dist` and `spread` (flat at 1 inside min_dist, exponential decay
/// outside). A two-stage grid search is plenty: the layout is insensitive to
/// the third decimal of a and b.
fn fit_kernel(min_dist: f32, spread: f32) -> (f32, f32) {
    let xs: Vec<f32> = (1..=300).map(|i| i as f32 * (3.0 * spread) / 300.0).collect();
    let target: Vec<f32> = xs
        .iter()
        .map(|&x| if x <= min_dist { 1.0 } else { (-(x - min_dist) / spread).exp() })
        .collect();

    let error = |a: f32, b: f32| -> f32 {
        xs.iter()
            .zip(&target)
            .map(|(&x, &t)| {
                let y = 1.0 / (1.0 + a * x.powf(2.0 * b));
                (y - t) * (y - t)
            })
            .sum()
    };

    let mut best = (1.0f32, 1.0f32);
    let mut best_err = f32::INFINITY;
    let mut search = |a_lo: f32, a_hi: f32, b_lo: f32, b_hi: f32, best: &mut (f32, f32), best_err: &mut f32| {
        for ai in 0..40 {
            let a = a_lo + (a_hi - a_lo) * ai as f32 / 39.0;
            for bi in 0..40 {
                let b = b_lo + (b_hi - b_lo) * bi as f32 / 39.0;
                let e = error(a, b);
                if e < *best_err {
                    *best_err = e;
                    *best = (a, b);
                }
            }
        }
    };

    search(0.05, 10.0, 0.3, 2.5, &mut best, &mut best_err);
    let (a0, b0) = best;
    search(
        (a0 - 0.3).max(0.01),
        a0 + 0.3,
        (b0 - 0.1).max(0.1),
        b0 + 0.1,
        &mut best,
        &mut best_err,
    );
    best
}

// ============================================================================
// Layout optimization
// ============================================================================

fn optimize(n: usize, edges: &[(usize, usize, f32)], a: f32, b: f32) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(REDUCTION_SEED);

    let mut pos = Array2::zeros((n, 3));
    for v in pos.iter_mut() {
        *v = rng.gen_range(-10.0f32..10.0);
    }

    let clip = |g: f32| g.clamp(-GRADIENT_CLIP, GRADIENT_CLIP);

    for epoch in 0..N_EPOCHS {
        let alpha = 1.0 - epoch as f32 / N_EPOCHS as f32;

        for &(i, j, w) in edges {
            // Attraction along the edge, scaled by its membership weight.
            let (d2, delta) = sq_dist(&pos, i, j);
            if d2 > 0.0 {
                let grad = (-2.0 * a * b * d2.powf(b - 1.0)) / (1.0 + a * d2.powf(b));
                for axis in 0..3 {
                    let g = clip(grad * delta[axis]) * alpha * w;
                    pos[[i, axis]] += g;
                    pos[[j, axis]] -= g;
                }
            }

            // Repulsion from uniformly sampled non-neighbors.
            for _ in 0..NEGATIVE_SAMPLES {
                let t = rng.gen_range(0..n);
                if t == i {
                    continue;
                }
                let (d2, delta) = sq_dist(&pos, i, t);
                let grad = (2.0 * b) / ((0.001 + d2) * (1.0 + a * d2.powf(b)));
                for axis in 0..3 {
                    let g = clip(grad * delta[axis]) * alpha;
                    pos[[i, axis]] += g;
                }
            }
        }
    }

    pos
}

#[inline]
fn sq_dist(pos: &Array2<f32>, i: usize, j: usize) -> (f32, [f32; 3]) {
    let mut delta = [0.0f32; 3];
    let mut d2 = 0.0f32;
    for axis in 0..3 {
        let d = pos[[i, axis]] - pos[[j, axis]];
        delta[axis] = d;
        d2 += d * d;
    }
    (d2, delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn clustered_data() -> Array2<f32> {
        // Two well-separated clusters of 5 points each in 4 dimensions.
        let mut data = Array2::zeros((10, 4));
        for i in 0..5 {
            for j in 0..4 {
                data[[i, j]] = 0.1 * (i as f32 + j as f32).sin();
            }
        }
        for i in 5..10 {
            for j in 0..4 {
                data[[i, j]] = 10.0 + 0.1 * (i as f32 * j as f32).cos();
            }
        }
        data
    }

    #[test]
    fn embed_is_deterministic() {
        let data = clustered_data();
        let params = ProjectionParams::default();
        let a = embed_3d(data.view(), &params).unwrap();
        let b = embed_3d(data.view(), &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn embed_output_shape_and_finiteness() {
        let data = clustered_data();
        let out = embed_3d(data.view(), &ProjectionParams::default()).unwrap();
        assert_eq!(out.shape(), &[10, 3]);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn embed_separates_distant_clusters() {
        let data = clustered_data();
        let params = ProjectionParams { n_neighbors: 4, ..Default::default() };
        let out = embed_3d(data.view(), &params).unwrap();

        let centroid = |range: std::ops::Range<usize>| -> [f32; 3] {
            let mut c = [0.0f32; 3];
            for i in range.clone() {
                for axis in 0..3 {
                    c[axis] += out[[i, axis]];
                }
            }
            c.map(|v| v / range.len() as f32)
        };
        let ca = centroid(0..5);
        let cb = centroid(5..10);
        let gap: f32 = (0..3).map(|ax| (ca[ax] - cb[ax]).powi(2)).sum::<f32>().sqrt();

        let spread_a: f32 = (0..5)
            .map(|i| {
                (0..3).map(|ax| (out[[i, ax]] - ca[ax]).powi(2)).sum::<f32>().sqrt()
            })
            .sum::<f32>()
            / 5.0;
        assert!(
            gap > spread_a,
            "clusters should separate further than their internal spread (gap {gap}, spread {spread_a})"
        );
    }

    #[test]
    fn kernel_fit_matches_reference_for_default_spacing() {
        // umap's curve fit for min_dist=0.1, spread=1.0 gives a≈1.58, b≈0.90.
        let (a, b) = fit_kernel(0.1, 1.0);
        assert!((1.2..=2.0).contains(&a), "a = {a}");
        assert!((0.75..=1.05).contains(&b), "b = {b}");
    }

    #[test]
    fn identical_points_do_not_produce_nan() {
        let data = Array2::from_elem((6, 4), 0.5f32);
        let out = embed_3d(data.view(), &ProjectionParams::default()).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
    }
}
