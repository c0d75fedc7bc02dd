//! Galaxy: the top-level named graph container.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque galaxy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GalaxyId(pub u64);

impl std::fmt::Display for GalaxyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named graph of nodes and connections. Deleting a galaxy cascades to
/// everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Galaxy {
    pub id: GalaxyId,
    pub name: String,
    pub node_count: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}
