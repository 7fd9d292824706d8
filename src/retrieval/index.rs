//! Vector index and on-disk store
//!
//! A flat squared-Euclidean index over chunk embeddings plus a store that
//! persists the index and its parallel chunk list as one unit. The two files
//! are meaningless apart: neighbor positions returned by search index into
//! the chunk list, so they are always saved and loaded as a pair.
//!
//! Each persisted pair is keyed by a SHA-256 fingerprint of the corpus
//! snapshot it was built from. A snapshot change (new company scraped) makes
//! the stored pair stale and forces a rebuild instead of silently serving
//! retrieval results for the previous company.

use crate::embedding::squared_l2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BinaryHeap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const INDEX_FILE: &str = "corpus_index.bin";
const CHUNKS_FILE: &str = "corpus_chunks.bin";

/// Index errors
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot build an index from an empty corpus")]
    EmptyCorpus,

    #[error("persisted index pair is incomplete: missing {0}")]
    NotFound(String),

    #[error("persisted index was built from a different corpus snapshot")]
    Stale,

    #[error("index stores {expected}-dim vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index was built with embedder `{built_with}`, active embedder is `{active}`")]
    EmbedderMismatch { built_with: String, active: String },

    #[error("index/chunk pair out of sync: {vectors} vectors, {chunks} chunks")]
    PairMismatch { vectors: usize, chunks: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Flat nearest-neighbor index over fixed-dimension vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Signature of the embedder the vectors came from
    embedder: String,
    /// Fingerprint of the corpus snapshot the index was built from
    fingerprint: String,
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Build a fresh index over exactly the given vectors.
    ///
    /// The i-th vector must correspond to the i-th chunk of the corpus; the
    /// caller owns that pairing. Rebuilt wholesale on every corpus change,
    /// so there is no insertion API.
    pub fn build(
        vectors: Vec<Vec<f32>>,
        embedder: String,
        fingerprint: String,
    ) -> Result<Self, IndexError> {
        let Some(first) = vectors.first() else {
            return Err(IndexError::EmptyCorpus);
        };

        let dimension = first.len();
        for v in &vectors {
            if v.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: v.len(),
                });
            }
        }

        Ok(Self {
            embedder,
            fingerprint,
            dimension,
            vectors,
        })
    }

    /// Number of indexed vectors
    pub fn size(&self) -> usize {
        self.vectors.len()
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Signature of the embedder this index was built with
    pub fn embedder(&self) -> &str {
        &self.embedder
    }

    /// Fingerprint of the source corpus snapshot
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Refuse queries whose vectors come from a different embedder
    pub fn check_embedder(&self, active: &str) -> Result<(), IndexError> {
        if self.embedder != active {
            return Err(IndexError::EmbedderMismatch {
                built_with: self.embedder.clone(),
                active: active.to_string(),
            });
        }
        Ok(())
    }

    /// Nearest neighbors of `query`, ascending by squared-L2 distance.
    ///
    /// Returns `(position, distance)` pairs, at most `min(k, size)` of them.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        // Bounded max-heap scan: keep the k smallest distances seen so far,
        // with the current worst on top for cheap eviction.
        let mut heap: BinaryHeap<(OrderedFloat<f32>, usize)> = BinaryHeap::with_capacity(k + 1);

        for (i, vector) in self.vectors.iter().enumerate() {
            let distance = squared_l2(query, vector);
            heap.push((OrderedFloat(distance), i));
            if heap.len() > k {
                heap.pop();
            }
        }

        let mut hits: Vec<(OrderedFloat<f32>, usize)> = heap.into_vec();
        hits.sort_unstable();

        Ok(hits
            .into_iter()
            .map(|(distance, i)| (i, distance.into_inner()))
            .collect())
    }
}

/// SHA-256 fingerprint of a corpus snapshot, hex-encoded
pub fn corpus_fingerprint(corpus: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(corpus.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// On-disk store for one index/chunk pair under a fixed data directory
pub struct IndexStore {
    data_dir: PathBuf,
}

impl IndexStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE)
    }

    fn chunks_path(&self) -> PathBuf {
        self.data_dir.join(CHUNKS_FILE)
    }

    /// Persist the index and its parallel chunk list as one unit.
    ///
    /// Overwrites any previous pair: only one corpus snapshot is active at a
    /// time. Concurrent saves from separate processes are unsynchronized; a
    /// reader racing a writer may need to rebuild.
    pub fn save(&self, index: &VectorIndex, chunks: &[String]) -> Result<(), IndexError> {
        if index.size() != chunks.len() {
            return Err(IndexError::PairMismatch {
                vectors: index.size(),
                chunks: chunks.len(),
            });
        }

        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.index_path(), bincode::serialize(index)?)?;
        std::fs::write(self.chunks_path(), bincode::serialize(&chunks.to_vec())?)?;
        Ok(())
    }

    /// Load the pair built for the given corpus fingerprint.
    ///
    /// `NotFound` if either half of the pair is missing, `Stale` if the
    /// stored pair belongs to a different snapshot; both tell the caller to
    /// rebuild rather than use a partial or outdated pair.
    pub fn load(&self, fingerprint: &str) -> Result<(VectorIndex, Vec<String>), IndexError> {
        let index_bytes = read_half(&self.index_path())?;
        let chunk_bytes = read_half(&self.chunks_path())?;

        let index: VectorIndex = bincode::deserialize(&index_bytes)?;
        let chunks: Vec<String> = bincode::deserialize(&chunk_bytes)?;

        if index.fingerprint() != fingerprint {
            return Err(IndexError::Stale);
        }
        if index.size() != chunks.len() {
            return Err(IndexError::PairMismatch {
                vectors: index.size(),
                chunks: chunks.len(),
            });
        }

        Ok((index, chunks))
    }
}

fn read_half(path: &Path) -> Result<Vec<u8>, IndexError> {
    if !path.exists() {
        return Err(IndexError::NotFound(path.display().to_string()));
    }
    Ok(std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> VectorIndex {
        VectorIndex::build(
            vec![
                vec![0.0, 0.0],
                vec![1.0, 0.0],
                vec![0.0, 5.0],
                vec![3.0, 4.0],
            ],
            "test-embedder".to_string(),
            "fp-1".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_empty_is_an_error() {
        let err = VectorIndex::build(Vec::new(), "e".into(), "fp".into()).unwrap_err();
        assert!(matches!(err, IndexError::EmptyCorpus));
    }

    #[test]
    fn test_build_rejects_ragged_vectors() {
        let err = VectorIndex::build(
            vec![vec![1.0, 2.0], vec![1.0]],
            "e".into(),
            "fp".into(),
        )
        .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_search_orders_ascending_by_distance() {
        let index = sample_index();
        let hits = index.search(&[0.0, 0.0], 4).unwrap();

        let positions: Vec<usize> = hits.iter().map(|(i, _)| *i).collect();
        assert_eq!(positions, vec![0, 1, 3, 2]);

        for pair in hits.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn test_search_nearest_wins_k1() {
        // Two vectors at distances 0.1 and 0.9 from the query; k=1 must
        // return the nearer one.
        let index = VectorIndex::build(
            vec![vec![0.9], vec![0.1]],
            "e".into(),
            "fp".into(),
        )
        .unwrap();

        let hits = index.search(&[0.0], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 1);
    }

    #[test]
    fn test_search_caps_k_at_size() {
        let index = sample_index();
        let hits = index.search(&[0.0, 0.0], 99).unwrap();
        assert_eq!(hits.len(), index.size());
    }

    #[test]
    fn test_search_rejects_wrong_dimension() {
        let index = sample_index();
        let err = index.search(&[0.0, 0.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_embedder_mismatch_detected() {
        let index = sample_index();
        assert!(index.check_embedder("test-embedder").is_ok());
        assert!(matches!(
            index.check_embedder("other-model"),
            Err(IndexError::EmbedderMismatch { .. })
        ));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());

        let index = sample_index();
        let chunks: Vec<String> = (0..4).map(|i| format!("chunk {}", i)).collect();
        store.save(&index, &chunks).unwrap();

        let (loaded, loaded_chunks) = store.load("fp-1").unwrap();
        assert_eq!(loaded_chunks, chunks);
        assert_eq!(
            loaded.search(&[0.0, 0.0], 3).unwrap(),
            index.search(&[0.0, 0.0], 3).unwrap()
        );
    }

    #[test]
    fn test_load_missing_pair_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        assert!(matches!(store.load("fp-1"), Err(IndexError::NotFound(_))));
    }

    #[test]
    fn test_load_half_pair_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());

        let index = sample_index();
        let chunks: Vec<String> = (0..4).map(|i| format!("chunk {}", i)).collect();
        store.save(&index, &chunks).unwrap();
        std::fs::remove_file(dir.path().join(CHUNKS_FILE)).unwrap();

        assert!(matches!(store.load("fp-1"), Err(IndexError::NotFound(_))));
    }

    #[test]
    fn test_load_stale_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());

        let index = sample_index();
        let chunks: Vec<String> = (0..4).map(|i| format!("chunk {}", i)).collect();
        store.save(&index, &chunks).unwrap();

        assert!(matches!(store.load("fp-2"), Err(IndexError::Stale)));
    }

    #[test]
    fn test_save_rejects_mismatched_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());

        let index = sample_index();
        let err = store.save(&index, &["only one".to_string()]).unwrap_err();
        assert!(matches!(err, IndexError::PairMismatch { .. }));
    }

    #[test]
    fn test_fingerprint_changes_with_corpus() {
        assert_ne!(corpus_fingerprint("company a"), corpus_fingerprint("company b"));
        assert_eq!(corpus_fingerprint("same"), corpus_fingerprint("same"));
    }
}
