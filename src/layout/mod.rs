//! # Spatial Layout
//!
//! Turns batches of high-dimensional embedding vectors into 3D positions.
//!
//! ## Tier policy
//!
//! `project` degrades through explicit tiers, each used only when the
//! preceding one cannot run:
//!
//! | Input | Result |
//! |-------|--------|
//! | 0 vectors | empty |
//! | 1 vector | origin |
//! | 2–4 vectors | random sphere scatter, radius 8.0 |
//! | ≥5, `Manifold` tier | neighbor-graph embedding, rescaled to extent 15.0 |
//! | ≥5, `Principal` tier | top-3 principal directions, same rescale |
//! | ≥5, `Scatter` tier | random sphere scatter, radius 10.0 |
//!
//! The manifold tier is deterministic for a fixed input order (seed 42). The
//! principal tier is deterministic up to axis sign flips — principal
//! directions have no canonical sign, so callers must not assume sign
//! stability across slightly different inputs. The scatter tiers are
//! intentionally random: they are placeholder layouts, not geometry.
//!
//! `place_incremental` positions one new vector consistently with the
//! existing layout by re-projecting the whole set and taking the last row.
//! O(n) reductions for n sequential insertions — acceptable because
//! insertions are infrequent; hosts ingesting in bulk should batch and call
//! `project` once.

#[cfg(feature = "manifold")]
mod manifold;
mod principal;

use ndarray::{Array2, ArrayView2};
use rand::distributions::Uniform;
use rand::prelude::*;
use rand_distr::UnitSphere;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::capability::{Capabilities, ReducerTier, TierError};
use crate::model::{EmbeddingVector, Position};

// ============================================================================
// Constants
// ============================================================================

/// Maximum absolute coordinate after a successful reduction. The whole
/// result is rescaled uniformly so the layout fills the same volume
/// regardless of the reducer's raw output scale.
pub const LAYOUT_EXTENT: f32 = 15.0;

/// Added to the rescale divisor so coincident points divide cleanly.
const RESCALE_EPSILON: f32 = 1e-6;

/// Scatter radius for 2–4 vectors: too few points for stable nonlinear
/// structure, so they get placeholder positions near the origin.
const SMALL_SCATTER_RADIUS: f32 = 8.0;

/// Scatter radius for the last-resort tier.
const LAST_RESORT_RADIUS: f32 = 10.0;

/// Half-extent of the uniform cube used when incremental placement has
/// fewer than 2 reference vectors. Intentionally a cube, not a sphere —
/// see `place_incremental`.
const PLACEMENT_CUBE_HALF_EXTENT: f32 = 8.0;

/// Fixed algorithmic seed for the deterministic tiers.
pub(crate) const REDUCTION_SEED: u64 = 42;

// ============================================================================
// Parameters
// ============================================================================

/// Distance metric for the neighbor graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

/// Tuning knobs for the manifold tier. All optional with defaults; the other
/// tiers ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// Neighborhood size. Clamped to at most `vector_count - 1`.
    pub n_neighbors: usize,
    /// Minimum spacing between embedded points.
    pub min_dist: f32,
    pub metric: Metric,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self { n_neighbors: 15, min_dist: 0.1, metric: Metric::Cosine }
    }
}

// ============================================================================
// Batch projection
// ============================================================================

/// Project a batch of equal-length vectors to 3D points, same length and
/// order as the input. Never fails: every tier failure is logged and the
/// next tier runs, down to the random scatter.
pub fn project(
    vectors: &[EmbeddingVector],
    params: &ProjectionParams,
    capabilities: &Capabilities,
) -> Vec<Position> {
    let n = vectors.len();
    match n {
        0 => return Vec::new(),
        1 => return vec![Position::ORIGIN],
        2..=4 => return random_sphere(n, SMALL_SCATTER_RADIUS),
        _ => {}
    }

    let matrix = match to_matrix(vectors) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, count = n, "embedding batch is malformed, using scatter layout");
            return random_sphere(n, LAST_RESORT_RADIUS);
        }
    };

    for tier in &capabilities.reducer {
        match run_reducer_tier(*tier, matrix.view(), params) {
            Ok(points) => return points,
            Err(e) => {
                warn!(tier = ?tier, error = %e, count = n, "reducer tier failed, falling back");
            }
        }
    }

    // Unreachable when the descriptor ends with Scatter, which cannot fail.
    random_sphere(n, LAST_RESORT_RADIUS)
}

fn run_reducer_tier(
    tier: ReducerTier,
    matrix: ArrayView2<f32>,
    params: &ProjectionParams,
) -> Result<Vec<Position>, TierError> {
    let embedded = match tier {
        #[cfg(feature = "manifold")]
        ReducerTier::Manifold => manifold::embed_3d(matrix, params)?,
        #[cfg(not(feature = "manifold"))]
        ReducerTier::Manifold => {
            return Err(TierError::Computation("manifold tier not compiled".into()));
        }
        ReducerTier::Principal => principal::project_principal(matrix)?,
        ReducerTier::Scatter => {
            return Ok(random_sphere(matrix.nrows(), LAST_RESORT_RADIUS));
        }
    };
    Ok(rescale_to_extent(embedded))
}

/// Stack vectors into an n×d matrix, rejecting ragged input.
fn to_matrix(vectors: &[EmbeddingVector]) -> Result<Array2<f32>, TierError> {
    let dim = vectors[0].dim();
    if dim == 0 {
        return Err(TierError::Computation("zero-dimensional embeddings".into()));
    }
    let mut matrix = Array2::zeros((vectors.len(), dim));
    for (i, v) in vectors.iter().enumerate() {
        if v.dim() != dim {
            return Err(TierError::Computation(format!(
                "vector {i} has dimension {} but the batch has {dim}",
                v.dim()
            )));
        }
        for (j, &x) in v.as_slice().iter().enumerate() {
            matrix[[i, j]] = x;
        }
    }
    Ok(matrix)
}

/// Uniformly rescale so the maximum absolute coordinate maps to
/// [`LAYOUT_EXTENT`]. Coincident input (max ≈ 0) scales to the origin
/// rather than dividing by zero.
fn rescale_to_extent(embedded: Array2<f32>) -> Vec<Position> {
    let max_abs = embedded.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    let scale = LAYOUT_EXTENT / (max_abs + RESCALE_EPSILON);
    embedded
        .rows()
        .into_iter()
        .map(|row| Position::new(row[0] * scale, row[1] * scale, row[2] * scale))
        .collect()
}

/// Random placeholder positions inside a sphere: a uniform direction scaled
/// by a magnitude drawn from [0.3, 1.0] of the radius.
fn random_sphere(count: usize, radius: f32) -> Vec<Position> {
    let mut rng = rand::thread_rng();
    let magnitude = Uniform::new_inclusive(0.3f32, 1.0);
    (0..count)
        .map(|_| {
            let dir: [f32; 3] = UnitSphere.sample(&mut rng);
            let r = radius * rng.sample(magnitude);
            Position::new(dir[0] * r, dir[1] * r, dir[2] * r)
        })
        .collect()
}

// ============================================================================
// Incremental placement
// ============================================================================

/// Place one new vector consistently with the current layout of `existing`.
///
/// With fewer than 2 reference vectors there is no frame to place into, and
/// each axis is drawn uniformly from a cube of half-extent 8.0. (The cube is
/// deliberate: batch scatter fills a sphere, incremental placeholders fill a
/// cube, and the two populations stay visually distinguishable.)
///
/// Otherwise the new vector is appended to the full set, the combined batch
/// is projected with default parameters, and the last row is the answer —
/// the new node lands in the same coordinate frame as everything else.
pub fn place_incremental(
    existing: &[EmbeddingVector],
    new_vector: &EmbeddingVector,
    capabilities: &Capabilities,
) -> Position {
    if existing.len() < 2 {
        let mut rng = rand::thread_rng();
        let axis = Uniform::new_inclusive(-PLACEMENT_CUBE_HALF_EXTENT, PLACEMENT_CUBE_HALF_EXTENT);
        return Position::new(rng.sample(axis), rng.sample(axis), rng.sample(axis));
    }

    let mut combined = existing.to_vec();
    combined.push(new_vector.clone());
    let positions = project(&combined, &ProjectionParams::default(), capabilities);

    // project() returns one position per input; the appended vector is last.
    positions.last().copied().unwrap_or(Position::ORIGIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn caps() -> Capabilities {
        Capabilities::detect()
    }

    fn batch(rows: &[&[f32]]) -> Vec<EmbeddingVector> {
        rows.iter().map(|r| EmbeddingVector::new(r.to_vec())).collect()
    }

    /// Deterministic but non-degenerate test vectors.
    fn spiral(n: usize, dim: usize) -> Vec<EmbeddingVector> {
        (0..n)
            .map(|i| {
                let v: Vec<f32> = (0..dim)
                    .map(|j| ((i * dim + j) as f32 * 0.7).sin() + i as f32 * 0.05)
                    .collect();
                EmbeddingVector::new(v)
            })
            .collect()
    }

    #[test]
    fn project_empty_returns_empty() {
        let out = project(&[], &ProjectionParams::default(), &caps());
        assert_eq!(out, Vec::<Position>::new());
    }

    #[test]
    fn project_single_returns_origin() {
        let out = project(&batch(&[&[1.0, 2.0, 3.0]]), &ProjectionParams::default(), &caps());
        assert_eq!(out, vec![Position::ORIGIN]);
    }

    #[test]
    fn project_small_batch_scatters_within_radius() {
        for n in 2..=4 {
            let vectors = spiral(n, 6);
            let out = project(&vectors, &ProjectionParams::default(), &caps());
            assert_eq!(out.len(), n);
            for p in &out {
                assert!(p.norm() <= SMALL_SCATTER_RADIUS + 1e-4, "point {p:?} outside radius");
            }
        }
    }

    #[test]
    fn project_full_batch_fills_extent() {
        let vectors = spiral(12, 8);
        let out = project(&vectors, &ProjectionParams::default(), &caps());
        assert_eq!(out.len(), 12);
        let max_abs = out.iter().fold(0.0f32, |m, p| m.max(p.max_abs()));
        assert!(
            (max_abs - LAYOUT_EXTENT).abs() < 0.01,
            "expected extent ≈ {LAYOUT_EXTENT}, got {max_abs}"
        );
    }

    #[test]
    fn project_principal_tier_fills_extent() {
        let vectors = spiral(12, 8);
        let out = project(&vectors, &ProjectionParams::default(), &Capabilities::fallback_only());
        let max_abs = out.iter().fold(0.0f32, |m, p| m.max(p.max_abs()));
        assert!((max_abs - LAYOUT_EXTENT).abs() < 0.01, "got {max_abs}");
    }

    #[test]
    fn project_identical_vectors_is_finite() {
        let vectors: Vec<_> = (0..8).map(|_| EmbeddingVector::new(vec![0.5; 16])).collect();
        for capabilities in [caps(), Capabilities::fallback_only()] {
            let out = project(&vectors, &ProjectionParams::default(), &capabilities);
            assert_eq!(out.len(), 8);
            for p in &out {
                assert!(p.is_finite(), "degenerate batch produced {p:?}");
            }
        }
    }

    #[test]
    fn project_is_deterministic_for_fixed_input() {
        let vectors = spiral(10, 6);
        let params = ProjectionParams::default();
        let a = project(&vectors, &params, &caps());
        let b = project(&vectors, &params, &caps());
        assert_eq!(a, b);
    }

    #[test]
    fn project_ragged_batch_degrades_to_scatter() {
        let vectors = vec![
            EmbeddingVector::new(vec![1.0; 4]),
            EmbeddingVector::new(vec![1.0; 4]),
            EmbeddingVector::new(vec![1.0; 3]),
            EmbeddingVector::new(vec![1.0; 4]),
            EmbeddingVector::new(vec![1.0; 4]),
        ];
        let out = project(&vectors, &ProjectionParams::default(), &caps());
        assert_eq!(out.len(), 5);
        for p in &out {
            assert!(p.is_finite());
            assert!(p.norm() <= LAST_RESORT_RADIUS + 1e-4);
        }
    }

    #[test]
    fn place_with_no_frame_lands_in_cube() {
        let new = EmbeddingVector::new(vec![1.0, 0.0, 0.0]);
        for existing in [vec![], spiral(1, 3)] {
            for _ in 0..16 {
                let p = place_incremental(&existing, &new, &caps());
                for c in [p.x, p.y, p.z] {
                    assert!(
                        (-PLACEMENT_CUBE_HALF_EXTENT..=PLACEMENT_CUBE_HALF_EXTENT).contains(&c),
                        "coordinate {c} outside cube"
                    );
                }
            }
        }
    }

    #[test]
    fn place_matches_last_row_of_combined_projection() {
        let existing = spiral(9, 5);
        let new = EmbeddingVector::new(vec![0.9, -0.3, 0.2, 0.1, 0.4]);

        let placed = place_incremental(&existing, &new, &caps());

        let mut combined = existing.clone();
        combined.push(new);
        let projected = project(&combined, &ProjectionParams::default(), &caps());
        assert_eq!(placed, *projected.last().unwrap());
    }

    #[test]
    fn n_neighbors_larger_than_batch_is_clamped() {
        let vectors = spiral(6, 4);
        let params = ProjectionParams { n_neighbors: 50, ..Default::default() };
        let out = project(&vectors, &params, &caps());
        assert_eq!(out.len(), 6);
        for p in &out {
            assert!(p.is_finite());
        }
    }
}
