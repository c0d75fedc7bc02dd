//! # semantic-galaxy — Semantic Content Graph Engine
//!
//! Maintains a graph of content nodes (text/image fragments) connected by
//! semantic-similarity edges, and produces a stable 3D spatial layout of that
//! graph from high-dimensional embedding vectors.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphStore` is the contract between the engine and
//!    persistence; `Embedder` is the contract with model inference
//! 2. **Clean DTOs**: `Node`, `Connection`, `EmbeddingVector` cross all boundaries
//! 3. **Stateless algorithms**: projection, linking, placement, and community
//!    detection are pure data-in/data-out functions — no side state between calls
//! 4. **Never block node creation**: every algorithm degrades through explicit
//!    tiers down to a well-formed placeholder result; no tier failure escapes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use semantic_galaxy::{GalaxyService, MemoryStore, ContentType};
//! use semantic_galaxy::embed::UnavailableEmbedder;
//!
//! # async fn example() -> semantic_galaxy::Result<()> {
//! let service = GalaxyService::new(MemoryStore::new(), UnavailableEmbedder);
//!
//! let galaxy = service.create_galaxy("Research Notes").await?;
//! let created = service
//!     .create_content_node(galaxy, ContentType::Text, "gravity bends light", None, 0.5)
//!     .await?;
//!
//! println!("node {} placed at {:?}", created.node_id, created.position);
//! # Ok(())
//! # }
//! ```
//!
//! ## Algorithm Tiers
//!
//! | Family | Preferred | Fallback | Last resort |
//! |--------|-----------|----------|-------------|
//! | Layout | Manifold (feature `manifold`) | Principal directions | Random sphere |
//! | Community | Modularity (feature `modularity`) | Greedy union-find | Single group |
//!
//! Tier availability is resolved once into a [`Capabilities`] descriptor;
//! operations walk the descriptor instead of probing at call time.

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod capability;
pub mod layout;
pub mod linker;
pub mod community;
pub mod store;
pub mod embed;
pub mod service;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Galaxy, GalaxyId, Node, NodeId, Connection, ConnectionId, ConnectionKind,
    ContentType, EmbeddingVector, Position,
};

// ============================================================================
// Re-exports: Capabilities
// ============================================================================

pub use capability::{Capabilities, CapabilityReport, CommunityTier, ReducerTier};

// ============================================================================
// Re-exports: Algorithms
// ============================================================================

pub use layout::{place_incremental, project, Metric, ProjectionParams};
pub use linker::{propose_links, LinkProposal};
pub use community::{detect, WeightedEdge};

// ============================================================================
// Re-exports: Storage & Orchestration
// ============================================================================

pub use store::{GraphStore, MemoryStore, NewNode};
pub use embed::Embedder;
pub use service::{CreatedNode, GalaxyService};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Malformed embedding buffer: {0}")]
    MalformedBuffer(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
