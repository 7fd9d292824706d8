//! Embedding Module
//!
//! Text embedding via FastEmbed (ONNX-based, local inference) behind the
//! [`TextEmbedder`] capability trait, so the retrieval pipeline can run
//! against a substitute embedder in tests.
//!
//! The underlying model is loaded once and lives for the process lifetime.

use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default embedding model; the same sentence-transformers MiniLM the
/// corpus snapshots were tuned against.
const DEFAULT_MODEL: EmbeddingModel = EmbeddingModel::AllMiniLML6V2;

/// Embedding dimension for AllMiniLML6V2
pub const EMBEDDING_DIMENSION: usize = 384;

/// Embedding cache capacity (entries)
const CACHE_CAPACITY: usize = 1000;

/// Text embedding capability
///
/// `signature` identifies the model configuration; a vector index records it
/// at build time and refuses queries from a different embedder.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed texts in order; one vector per input string.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text (typically a query).
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>>;

    /// Stable identifier of the embedding configuration.
    fn signature(&self) -> String;

    /// Fixed output dimension.
    fn dimension(&self) -> usize;
}

/// FastEmbed-backed embedding engine
pub struct EmbeddingEngine {
    model: Arc<RwLock<TextEmbedding>>,
    cache: Arc<RwLock<LruCache<String, Vec<f32>>>>,
    model_name: String,
}

impl EmbeddingEngine {
    /// Create an engine with the default model
    pub async fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL).await
    }

    /// Create an engine with a specific FastEmbed model
    pub async fn with_model(embedding_model: EmbeddingModel) -> Result<Self> {
        let model_name = format!("{:?}", embedding_model);
        let init_options = InitOptions::new(embedding_model);

        // Model download/load is blocking ONNX work
        let model = tokio::task::spawn_blocking(move || TextEmbedding::try_new(init_options))
            .await
            .context("Failed to spawn blocking task")?
            .context("Failed to initialize embedding model")?;

        let cache = LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap());

        Ok(Self {
            model: Arc::new(RwLock::new(model)),
            cache: Arc::new(RwLock::new(cache)),
            model_name,
        })
    }

    async fn run_model(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = self.model.clone();
        let embeddings = tokio::task::spawn_blocking(move || {
            let guard = futures::executor::block_on(model.read());
            guard.embed(texts, None)
        })
        .await
        .context("Failed to spawn blocking task")?
        .context("Failed to generate embeddings")?;
        Ok(embeddings)
    }
}

#[async_trait]
impl TextEmbedder for EmbeddingEngine {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut misses = Vec::new();
        let mut miss_indices = Vec::new();

        {
            let mut cache = self.cache.write().await;
            for (i, text) in texts.iter().enumerate() {
                if let Some(cached) = cache.get(text) {
                    results[i] = Some(cached.clone());
                } else {
                    misses.push(text.clone());
                    miss_indices.push(i);
                }
            }
        }

        if !misses.is_empty() {
            let embeddings = self.run_model(misses.clone()).await?;
            if embeddings.len() != miss_indices.len() {
                anyhow::bail!(
                    "Embedder returned {} vectors for {} inputs",
                    embeddings.len(),
                    miss_indices.len()
                );
            }

            let mut cache = self.cache.write().await;
            for (text, (idx, embedding)) in
                misses.iter().zip(miss_indices.into_iter().zip(embeddings))
            {
                cache.put(text.clone(), embedding.clone());
                results[idx] = Some(embedding);
            }
        }

        Ok(results.into_iter().map(|r| r.unwrap_or_default()).collect())
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        {
            let mut cache = self.cache.write().await;
            if let Some(cached) = cache.get(text) {
                return Ok(cached.clone());
            }
        }

        let embeddings = self.run_model(vec![text.to_string()]).await?;
        let embedding = embeddings
            .into_iter()
            .next()
            .context("No embedding generated")?;

        let mut cache = self.cache.write().await;
        cache.put(text.to_string(), embedding.clone());

        Ok(embedding)
    }

    fn signature(&self) -> String {
        self.model_name.clone()
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }
}

/// Squared Euclidean distance between two vectors.
///
/// The index metric: smaller is nearer. Mismatched lengths yield infinity so
/// a bad vector can never rank as a neighbor.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_l2_identity() {
        let v = vec![1.0, -2.0, 3.5];
        assert_eq!(squared_l2(&v, &v), 0.0);
    }

    #[test]
    fn test_squared_l2_known_value() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert_eq!(squared_l2(&a, &b), 25.0);
    }

    #[test]
    fn test_squared_l2_mismatched_lengths() {
        let a = vec![1.0];
        let b = vec![1.0, 2.0];
        assert_eq!(squared_l2(&a, &b), f32::INFINITY);
    }

    #[test]
    fn test_squared_l2_orders_by_proximity() {
        let query = vec![1.0, 1.0];
        let near = vec![1.1, 1.0];
        let far = vec![4.0, -2.0];
        assert!(squared_l2(&query, &near) < squared_l2(&query, &far));
    }
}
