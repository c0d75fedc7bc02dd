//! # Semantic Graph Model
//!
//! Clean DTOs that define the content graph: galaxies own nodes, nodes carry
//! optional embedding vectors and a 3D position, connections are directed
//! weighted edges between nodes.
//!
//! These types cross every boundary: store ↔ algorithms ↔ service ↔ user.
//!
//! Design rule: NO ndarray types, NO store handles here.
//! This module is pure data — no I/O, no state, no async.

pub mod node;
pub mod connection;
pub mod galaxy;
pub mod embedding;
pub mod position;

pub use node::{ContentType, Node, NodeId};
pub use connection::{Connection, ConnectionId, ConnectionKind};
pub use galaxy::{Galaxy, GalaxyId};
pub use embedding::{cosine_similarity, EmbeddingVector};
pub use position::Position;
