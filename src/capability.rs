//! # Algorithm Capability Descriptor
//!
//! Which tiers each fallback family can run, resolved once and consulted by
//! every operation. This replaces attempt-and-catch feature detection: the
//! available tiers are known up front (cargo features), and a tier that is
//! available but fails at runtime reports a tagged [`TierError`] so the
//! caller moves down the list — no unwinding, nothing escapes.
//!
//! | Family | Tiers in priority order |
//! |--------|-------------------------|
//! | Reducer | `Manifold` → `Principal` → `Scatter` |
//! | Community | `Modularity` → `Components` → `Whole` |
//!
//! The trailing tier in each family is total: it always produces a
//! well-formed, if low-quality, result.

use serde::{Deserialize, Serialize};

// ============================================================================
// Tiers
// ============================================================================

/// Dimensionality-reduction tiers, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReducerTier {
    /// Neighbor-graph manifold embedding (feature `manifold`).
    Manifold,
    /// Linear projection onto the top-3 principal directions.
    Principal,
    /// Random sphere scatter — placeholder layout, always succeeds.
    Scatter,
}

/// Community-detection tiers, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunityTier {
    /// Greedy modularity optimization (feature `modularity`).
    Modularity,
    /// Union-find over the strongest edges.
    Components,
    /// Single all-nodes group — always succeeds.
    Whole,
}

// ============================================================================
// Descriptor
// ============================================================================

/// The resolved tier lists. Construct once via [`Capabilities::detect`] and
/// share; detection is compile-time so this is cheap, but operations take the
/// descriptor rather than re-deriving it so a host can also restrict tiers
/// (e.g. force the fallback path in tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub reducer: Vec<ReducerTier>,
    pub community: Vec<CommunityTier>,
}

impl Capabilities {
    /// Resolve the tier lists from compiled features.
    pub fn detect() -> Self {
        let mut reducer = Vec::new();
        if cfg!(feature = "manifold") {
            reducer.push(ReducerTier::Manifold);
        }
        reducer.push(ReducerTier::Principal);
        reducer.push(ReducerTier::Scatter);

        let mut community = Vec::new();
        if cfg!(feature = "modularity") {
            community.push(CommunityTier::Modularity);
        }
        community.push(CommunityTier::Components);
        community.push(CommunityTier::Whole);

        Self { reducer, community }
    }

    /// Tier lists with both preferred algorithms removed. Used by tests to
    /// force the fallback paths regardless of compiled features.
    pub fn fallback_only() -> Self {
        Self {
            reducer: vec![ReducerTier::Principal, ReducerTier::Scatter],
            community: vec![CommunityTier::Components, CommunityTier::Whole],
        }
    }

    pub fn has_manifold_reducer(&self) -> bool {
        self.reducer.contains(&ReducerTier::Manifold)
    }

    pub fn has_modularity_communities(&self) -> bool {
        self.community.contains(&CommunityTier::Modularity)
    }

    /// Read-only boolean-flag report per fallback family, for hosts that
    /// surface algorithm availability to users.
    pub fn report(&self) -> CapabilityReport {
        CapabilityReport {
            manifold_reducer: self.has_manifold_reducer(),
            modularity_communities: self.has_modularity_communities(),
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// Flat availability report, one flag per fallback family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub manifold_reducer: bool,
    pub modularity_communities: bool,
}

// ============================================================================
// Tier failure
// ============================================================================

/// Why a tier did not produce a result. Internal to the tier walkers — the
/// public operations never surface this; they log it and move on.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TierError {
    #[error("tier produced non-finite output")]
    NonFinite,

    #[error("tier computation failed: {0}")]
    Computation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_always_ends_with_total_tiers() {
        let caps = Capabilities::detect();
        assert_eq!(caps.reducer.last(), Some(&ReducerTier::Scatter));
        assert_eq!(caps.community.last(), Some(&CommunityTier::Whole));
    }

    #[test]
    fn fallback_only_excludes_preferred_tiers() {
        let caps = Capabilities::fallback_only();
        assert!(!caps.has_manifold_reducer());
        assert!(!caps.has_modularity_communities());
        let report = caps.report();
        assert!(!report.manifold_reducer);
        assert!(!report.modularity_communities);
    }

    #[cfg(all(feature = "manifold", feature = "modularity"))]
    #[test]
    fn default_features_report_both_families() {
        let report = Capabilities::detect().report();
        assert!(report.manifold_reducer);
        assert!(report.modularity_communities);
    }
}
