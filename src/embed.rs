//! # Embedder Trait
//!
//! The engine's contract with model inference. Encoders are opaque functions
//! from content to a fixed-length float vector; loading, memoizing, and
//! running them is the host's business. The engine only ever calls `embed`
//! and tolerates failure — a node whose embedding fails is still created,
//! just unplaced and unlinked.
//!
//! Injected into `GalaxyService` at construction; never a global.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{ContentType, EmbeddingVector};
use crate::{Error, Result};

/// Which encoders the host has available, surfaced to users deciding
/// whether to ingest text, images, or audio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderStatus {
    pub text: bool,
    pub image: bool,
    pub audio_transcription: bool,
}

/// An injected encoding capability.
#[async_trait]
pub trait Embedder: Send + Sync + 'static {
    /// Encode content into a similarity-preserving vector. The returned
    /// dimensionality must be consistent for all content within one galaxy.
    async fn embed(&self, content_type: ContentType, content: &str) -> Result<EmbeddingVector>;

    /// Which encoders are loadable right now.
    fn status(&self) -> EmbedderStatus {
        EmbedderStatus::default()
    }
}

/// An embedder with no models at all: every call fails. Exercises the
/// degraded path where nodes exist without vectors.
pub struct UnavailableEmbedder;

#[async_trait]
impl Embedder for UnavailableEmbedder {
    async fn embed(&self, _content_type: ContentType, _content: &str) -> Result<EmbeddingVector> {
        Err(Error::EmbeddingError("no encoder available".into()))
    }
}
