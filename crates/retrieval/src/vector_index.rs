//! In-memory vector index over chunk embeddings.
//!
//! Exact (flat) nearest-neighbor search. Vectors are unit-normalized at build
//! time; the distance used for ranking is the squared Euclidean distance
//! between normalized vectors, and every hit also carries the cosine
//! similarity derived from it:
//!
//! ```text
//! similarity = 1 - distance / 2        distance = 2 - 2 * similarity
//! ```
//!
//! A zero vector is treated as orthogonal to everything (similarity 0,
//! distance 2). Ties are broken by ascending id, so identical input always
//! produces identical output.

use crate::error::{RetrievalError, RetrievalResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

/// Leading bytes of a persisted index blob.
const MAGIC: &[u8; 8] = b"SIFTVIDX";

/// Current blob layout version.
const FORMAT_VERSION: u32 = 1;

/// magic + version + dimensions + count
const HEADER_LEN: usize = 8 + 4 + 4 + 8;

/// A single nearest-neighbor result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Vector id (insertion position)
    pub id: usize,

    /// Squared Euclidean distance between normalized vectors, in `[0, 4]`
    pub distance: f32,

    /// Cosine similarity, in `[-1, 1]`
    pub similarity: f32,
}

/// Convert a squared distance between unit vectors to cosine similarity.
pub fn distance_to_similarity(distance: f32) -> f32 {
    1.0 - distance / 2.0
}

/// Convert cosine similarity to a squared distance between unit vectors.
pub fn similarity_to_distance(similarity: f32) -> f32 {
    2.0 - 2.0 * similarity
}

/// Flat vector index with dense ids `0..size`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    dimensions: usize,
    /// Row-major, `size * dimensions` normalized components
    data: Vec<f32>,
}

impl VectorIndex {
    /// Build an index, assigning ids in input order.
    ///
    /// Fails if vectors disagree on dimension or contain non-finite values.
    /// Empty input builds an empty index of dimension 0.
    pub fn build(vectors: &[Vec<f32>]) -> RetrievalResult<Self> {
        let Some(first) = vectors.first() else {
            return Ok(Self::default());
        };
        let dimensions = first.len();
        if dimensions == 0 {
            return Err(RetrievalError::InvalidVector(
                "vector 0 has no components".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(vectors.len() * dimensions);
        for (id, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(RetrievalError::InvalidVector(format!(
                    "vector {} contains non-finite values",
                    id
                )));
            }
            data.extend(normalize(vector));
        }

        tracing::debug!(
            "Built vector index: {} vectors, dimension {}",
            vectors.len(),
            dimensions
        );

        Ok(Self { dimensions, data })
    }

    /// Number of vectors.
    pub fn size(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Shared dimension of every vector (0 for an empty index).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vector(&self, id: usize) -> &[f32] {
        &self.data[id * self.dimensions..(id + 1) * self.dimensions]
    }

    /// Top-`k` neighbors by ascending distance (descending similarity).
    ///
    /// Returns at most `min(k, size)` hits with no padding; an empty index or
    /// `k == 0` yields an empty result.
    pub fn search(&self, query: &[f32], k: usize) -> RetrievalResult<Vec<SearchHit>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(RetrievalError::InvalidVector(
                "query contains non-finite values".to_string(),
            ));
        }

        let query = normalize(query);
        let mut hits: Vec<SearchHit> = (0..self.size())
            .map(|id| {
                let similarity = dot(&query, self.vector(id)).clamp(-1.0, 1.0);
                SearchHit {
                    id,
                    distance: similarity_to_distance(similarity),
                    similarity,
                }
            })
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, rank_order);
            hits.truncate(k);
        }
        hits.sort_by(rank_order);

        Ok(hits)
    }

    /// Serialize to the little-endian blob format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(self.dimensions as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.size() as u64).to_le_bytes());
        for &value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Parse a blob produced by [`VectorIndex::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> RetrievalResult<Self> {
        if bytes.len() < HEADER_LEN || &bytes[..8] != MAGIC {
            return Err(RetrievalError::CorruptSnapshot(
                "index blob has no valid header".to_string(),
            ));
        }

        let version = u32::from_le_bytes(le_array(&bytes[8..12]));
        if version != FORMAT_VERSION {
            return Err(RetrievalError::CorruptSnapshot(format!(
                "unsupported index format version {}",
                version
            )));
        }

        let dimensions = u32::from_le_bytes(le_array(&bytes[12..16])) as usize;
        let count = u64::from_le_bytes(le_array(&bytes[16..24])) as usize;

        let expected_len = count
            .checked_mul(dimensions)
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| {
                RetrievalError::CorruptSnapshot("index blob size overflows".to_string())
            })?;
        if bytes.len() != expected_len {
            return Err(RetrievalError::CorruptSnapshot(format!(
                "index blob is {} bytes, header describes {}",
                bytes.len(),
                expected_len
            )));
        }
        if dimensions == 0 && count != 0 {
            return Err(RetrievalError::CorruptSnapshot(
                "index blob has vectors of dimension 0".to_string(),
            ));
        }

        let data: Vec<f32> = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(le_array(chunk)))
            .collect();
        if data.iter().any(|v| !v.is_finite()) {
            return Err(RetrievalError::CorruptSnapshot(
                "index blob contains non-finite values".to_string(),
            ));
        }

        Ok(Self {
            dimensions: if count == 0 { 0 } else { dimensions },
            data,
        })
    }

    /// Write the blob to `path`.
    pub fn persist(&self, path: &Path) -> RetrievalResult<()> {
        std::fs::write(path, self.to_bytes())?;
        tracing::debug!("Persisted vector index ({} vectors) to {:?}", self.size(), path);
        Ok(())
    }

    /// Read a blob written by [`VectorIndex::persist`].
    pub fn load(path: &Path) -> RetrievalResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// Descending similarity, then ascending id.
fn rank_order(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.similarity
        .total_cmp(&a.similarity)
        .then_with(|| a.id.cmp(&b.id))
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_vectors() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.9, 0.1, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![-1.0, 0.0, 0.0],
            vec![0.5, 0.5, 0.5],
            vec![0.0, 0.0, 2.0],
        ]
    }

    #[test]
    fn test_build_assigns_ids_in_order() {
        let index = VectorIndex::build(&sample_vectors()).unwrap();
        assert_eq!(index.size(), 6);
        assert_eq!(index.dimensions(), 3);

        let hits = index.search(&[0.0, 0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].id, 5);
        assert!((hits[0].similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_build_rejects_mixed_dimensions() {
        let result = VectorIndex::build(&[vec![1.0, 0.0], vec![1.0, 0.0, 0.0]]);
        assert!(matches!(
            result,
            Err(RetrievalError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_build_rejects_nan() {
        let result = VectorIndex::build(&[vec![1.0, f32::NAN]]);
        assert!(matches!(result, Err(RetrievalError::InvalidVector(_))));
    }

    #[test]
    fn test_empty_index_search() {
        let index = VectorIndex::build(&[]).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 2.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_ordering_and_bounds() {
        let index = VectorIndex::build(&sample_vectors()).unwrap();
        let query = [1.0, 0.2, 0.1];

        for k in 1..=10 {
            let hits = index.search(&query, k).unwrap();
            assert_eq!(hits.len(), k.min(index.size()));

            for pair in hits.windows(2) {
                assert!(pair[0].similarity >= pair[1].similarity);
                assert!(pair[0].distance <= pair[1].distance);
            }

            let mut ids: Vec<usize> = hits.iter().map(|h| h.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), hits.len());
        }

        // [0.9, 0.1, 0] points closer to the query than [1, 0, 0].
        let top = index.search(&query, 2).unwrap();
        assert_eq!(top[0].id, 1);
        assert_eq!(top[1].id, 0);
    }

    #[test]
    fn test_top_k_matches_full_sort_prefix() {
        let index = VectorIndex::build(&sample_vectors()).unwrap();
        let query = [0.3, -0.2, 0.9];

        let all = index.search(&query, index.size()).unwrap();
        for k in 1..index.size() {
            assert_eq!(index.search(&query, k).unwrap(), all[..k].to_vec());
        }
    }

    #[test]
    fn test_ties_broken_by_id() {
        let vectors = vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![1.0, 0.0],
        ];
        let index = VectorIndex::build(&vectors).unwrap();

        let hits = index.search(&[1.0, 0.0], 4).unwrap();
        let ids: Vec<usize> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 0]);

        let top2 = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(top2.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_similarity_distance_conversion() {
        let index = VectorIndex::build(&sample_vectors()).unwrap();
        let hits = index.search(&[1.0, 0.0, 0.0], 6).unwrap();

        for hit in &hits {
            assert!((distance_to_similarity(hit.distance) - hit.similarity).abs() < 1e-6);
        }
        // Opposite vector: similarity -1, distance 4.
        let last = hits.last().unwrap();
        assert_eq!(last.id, 3);
        assert!((last.similarity + 1.0).abs() < 1e-6);
        assert!((last.distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_vector_is_orthogonal() {
        let index = VectorIndex::build(&[vec![0.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits[0].id, 0);
        assert_eq!(hits[0].similarity, 0.0);
        assert_eq!(hits[0].distance, 2.0);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = VectorIndex::build(&sample_vectors()).unwrap();
        let result = index.search(&[1.0, 0.0], 3);
        assert!(matches!(
            result,
            Err(RetrievalError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_persist_load_roundtrip_preserves_search() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.bin");

        let index = VectorIndex::build(&sample_vectors()).unwrap();
        index.persist(&path).unwrap();
        let loaded = VectorIndex::load(&path).unwrap();

        assert_eq!(loaded, index);
        for query in [[1.0, 0.2, 0.1], [0.0, -1.0, 0.3], [0.5, 0.5, 0.5]] {
            assert_eq!(
                index.search(&query, 4).unwrap(),
                loaded.search(&query, 4).unwrap()
            );
        }
    }

    #[test]
    fn test_empty_roundtrip() {
        let index = VectorIndex::build(&[]).unwrap();
        let loaded = VectorIndex::from_bytes(&index.to_bytes()).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.dimensions(), 0);
    }

    #[test]
    fn test_from_bytes_rejects_damage() {
        let index = VectorIndex::build(&sample_vectors()).unwrap();
        let bytes = index.to_bytes();

        let truncated = &bytes[..bytes.len() - 3];
        assert!(matches!(
            VectorIndex::from_bytes(truncated),
            Err(RetrievalError::CorruptSnapshot(_))
        ));

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            VectorIndex::from_bytes(&bad_magic),
            Err(RetrievalError::CorruptSnapshot(_))
        ));

        let mut bad_version = bytes;
        bad_version[8] = 99;
        assert!(matches!(
            VectorIndex::from_bytes(&bad_version),
            Err(RetrievalError::CorruptSnapshot(_))
        ));
    }
}
