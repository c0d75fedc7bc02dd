//! Linear projection fallback: top-3 principal directions.
//!
//! Centers the batch on its mean and extracts the three leading principal
//! directions by power iteration with deflation — equivalent to truncated
//! SVD of the centered matrix, and free of external linear-algebra bindings.
//!
//! Deterministic for a fixed input (seeded start vectors), but principal
//! directions have no canonical sign: axis sign flips across slightly
//! different inputs are expected and documented at the `project` level.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::prelude::*;

use crate::capability::TierError;

use super::REDUCTION_SEED;

const POWER_ITERATIONS: usize = 100;
const CONVERGENCE_TOL: f32 = 1e-7;

/// Rank below which a direction is considered exhausted. Centered data with
/// fewer than 3 significant directions pads the remaining axes with zeros.
const RANK_EPSILON: f32 = 1e-10;

pub(crate) fn project_principal(data: ArrayView2<f32>) -> Result<Array2<f32>, TierError> {
    let (n, d) = (data.nrows(), data.ncols());
    if d == 0 {
        return Err(TierError::Computation("zero-dimensional input".into()));
    }

    let mean = data
        .mean_axis(Axis(0))
        .ok_or_else(|| TierError::Computation("empty input".into()))?;
    let centered = &data - &mean;

    let mut rng = StdRng::seed_from_u64(REDUCTION_SEED);
    let mut deflated = centered.clone();
    let mut directions: Vec<Array1<f32>> = Vec::with_capacity(3);

    for _ in 0..3.min(d.min(n)) {
        match leading_direction(&deflated, &mut rng) {
            Some(v) => {
                // Deflate: remove the found component so the next iteration
                // converges to the next direction.
                let scores = deflated.dot(&v);
                for i in 0..n {
                    for j in 0..d {
                        deflated[[i, j]] -= scores[i] * v[j];
                    }
                }
                directions.push(v);
            }
            // Remaining variance is numerically zero; stop early.
            None => break,
        }
    }

    let mut result = Array2::zeros((n, 3));
    for (c, v) in directions.iter().enumerate() {
        let scores = centered.dot(v);
        for i in 0..n {
            result[[i, c]] = scores[i];
        }
    }

    if result.iter().any(|v| !v.is_finite()) {
        return Err(TierError::NonFinite);
    }
    Ok(result)
}

/// Power-iterate v ← XᵀXv / ‖XᵀXv‖ to the dominant direction of `x`.
/// Returns None when the matrix has no remaining significant direction.
fn leading_direction(x: &Array2<f32>, rng: &mut StdRng) -> Option<Array1<f32>> {
    let d = x.ncols();
    let mut v: Array1<f32> = Array1::from_iter((0..d).map(|_| rng.gen_range(-1.0f32..1.0)));
    let norm = v.dot(&v).sqrt();
    if norm == 0.0 {
        v[0] = 1.0;
    } else {
        v /= norm;
    }

    for _ in 0..POWER_ITERATIONS {
        let w = x.t().dot(&x.dot(&v));
        let norm = w.dot(&w).sqrt();
        if norm < RANK_EPSILON {
            return None;
        }
        let next = w / norm;
        // Sign-insensitive convergence check.
        let diff = (&next - &v).iter().map(|a| a * a).sum::<f32>().sqrt();
        let flip = (&next + &v).iter().map(|a| a * a).sum::<f32>().sqrt();
        let converged = diff.min(flip) < CONVERGENCE_TOL;
        v = next;
        if converged {
            break;
        }
    }
    Some(v)
}
