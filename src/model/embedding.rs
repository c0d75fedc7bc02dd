//! Embedding vectors and the similarity metric defined over them.
//!
//! An embedding is a fixed-length array of f32s produced by an external
//! encoder. The engine treats it as an opaque numeric array: dimensionality
//! is consistent within one galaxy but may differ between galaxies depending
//! on which encoder produced it.
//!
//! ## Wire form
//!
//! A flat byte buffer of little-endian IEEE-754 32-bit floats,
//! length = dimensionality × 4. Stores persist this buffer as an opaque blob.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A fixed-length sequence of 32-bit floats in a similarity-preserving space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Decode the wire form: a flat buffer of little-endian f32s.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() % 4 != 0 {
            return Err(Error::MalformedBuffer(format!(
                "embedding buffer length {} is not a multiple of 4",
                data.len()
            )));
        }
        let values = data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self(values))
    }

    /// Encode to the wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.0.len() * 4);
        for v in &self.0 {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    /// Dimensionality of the vector.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl AsRef<[f32]> for EmbeddingVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Cosine similarity: dot(a,b) / (‖a‖·‖b‖).
///
/// Defined as 0.0 when either vector has zero norm — a degenerate vector is
/// similar to nothing, not an error. Mismatched lengths compare over the
/// shorter prefix of the dot product, which only arises if the caller mixed
/// encoders; the store keeps dimensionality consistent per galaxy.
pub fn cosine_similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> f32 {
    let norm_a = a.norm();
    let norm_b = b.norm();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.as_slice().iter().zip(b.as_slice()).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn bytes_roundtrip() {
        let v = EmbeddingVector::new(vec![0.5, -1.25, 3.0, f32::MIN_POSITIVE]);
        let decoded = EmbeddingVector::from_bytes(&v.to_bytes()).unwrap();
        assert_eq!(v, decoded);
    }

    #[test]
    fn from_bytes_rejects_ragged_buffer() {
        assert!(EmbeddingVector::from_bytes(&[0u8; 7]).is_err());
        assert!(EmbeddingVector::from_bytes(&[0u8; 8]).is_ok());
    }

    #[test]
    fn cosine_identical_vectors_is_one() {
        let a = EmbeddingVector::new(vec![0.3, 0.4, 0.5]);
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-6, "got {sim}");
    }

    #[test]
    fn cosine_orthogonal_unit_vectors_is_zero() {
        let a = EmbeddingVector::new(vec![1.0, 0.0]);
        let b = EmbeddingVector::new(vec![0.0, 1.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        let zero = EmbeddingVector::new(vec![0.0, 0.0, 0.0]);
        let b = EmbeddingVector::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(cosine_similarity(&zero, &b), 0.0);
        assert_eq!(cosine_similarity(&b, &zero), 0.0);
    }

    #[test]
    fn cosine_opposite_vectors_is_minus_one() {
        let a = EmbeddingVector::new(vec![1.0, 2.0]);
        let b = EmbeddingVector::new(vec![-1.0, -2.0]);
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn cosine_symmetric_and_bounded(
            a in prop::collection::vec(-100.0f32..100.0, 1..32),
            b in prop::collection::vec(-100.0f32..100.0, 1..32),
        ) {
            let n = a.len().min(b.len());
            let a = EmbeddingVector::new(a[..n].to_vec());
            let b = EmbeddingVector::new(b[..n].to_vec());
            let ab = cosine_similarity(&a, &b);
            let ba = cosine_similarity(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-5);
            prop_assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&ab));
        }
    }
}
