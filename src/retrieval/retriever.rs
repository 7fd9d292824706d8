//! Retrieval decision logic
//!
//! Given a corpus snapshot and a question, either hand the whole corpus to
//! the prompt builder (short documents) or select the top-k nearest chunks
//! via the vector index (long documents). The boundary is a configured word
//! count, tuned jointly with the model context window.

use crate::config::RetrievalConfig;
use crate::embedding::TextEmbedder;
use crate::retrieval::chunker;
use crate::retrieval::index::{corpus_fingerprint, IndexError, IndexStore, VectorIndex};
use crate::{log_debug, log_info, log_warn};
use std::sync::Arc;
use thiserror::Error;

/// Retrieval errors
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] anyhow::Error),
}

/// Orchestrates the chunk/embed/search path for one active corpus
pub struct Retriever {
    embedder: Arc<dyn TextEmbedder>,
    store: IndexStore,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn TextEmbedder>, store: IndexStore, config: RetrievalConfig) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Produce the context string for the prompt builder.
    ///
    /// Corpora under `word_threshold` whitespace-delimited words are returned
    /// unchanged (direct-stuffing path). Longer corpora go through the
    /// retrieval path: the selected chunks are joined with a blank line in
    /// ascending-distance order, nearest first. That order, not original
    /// chunk order, is what the prompt builder receives.
    pub async fn answer_context(&self, corpus: &str, query: &str) -> Result<String, RetrieveError> {
        let word_count = corpus.split_whitespace().count();
        if word_count < self.config.word_threshold {
            log_debug!(
                "Direct-stuffing path: {} words < threshold {}",
                word_count,
                self.config.word_threshold
            );
            return Ok(corpus.to_string());
        }

        log_debug!(
            "Retrieval path: {} words >= threshold {}",
            word_count,
            self.config.word_threshold
        );

        let (index, chunks) = self.ensure_index(corpus).await?;
        index.check_embedder(&self.embedder.signature())?;

        let query_vector = self.embedder.embed_text(query).await?;
        let hits = index.search(&query_vector, self.config.top_k)?;

        let selected: Vec<&str> = hits
            .iter()
            .map(|&(position, _)| chunks[position].as_str())
            .collect();

        log_debug!(
            "Selected {} of {} chunks, nearest distance {:?}",
            selected.len(),
            chunks.len(),
            hits.first().map(|&(_, d)| d)
        );

        Ok(selected.join("\n\n"))
    }

    /// Load the persisted pair for this corpus, or rebuild it from scratch.
    ///
    /// Any load failure (missing half, stale fingerprint, undecodable file,
    /// embedder switch) falls through to a rebuild; a broken pair is never
    /// an abort condition for the question being asked.
    async fn ensure_index(&self, corpus: &str) -> Result<(VectorIndex, Vec<String>), RetrieveError> {
        let fingerprint = corpus_fingerprint(corpus);

        match self.store.load(&fingerprint) {
            Ok((index, chunks)) if index.check_embedder(&self.embedder.signature()).is_ok() => {
                log_debug!("Loaded persisted index ({} chunks)", chunks.len());
                return Ok((index, chunks));
            }
            Ok(_) => {
                log_warn!("Persisted index built with a different embedder, rebuilding");
            }
            Err(IndexError::NotFound(path)) => {
                log_debug!("No persisted index ({} missing), building", path);
            }
            Err(IndexError::Stale) => {
                log_info!("Corpus snapshot changed, rebuilding index");
            }
            Err(e) => {
                log_warn!("Failed to load persisted index, rebuilding: {}", e);
            }
        }

        self.build_index(corpus, fingerprint).await
    }

    async fn build_index(
        &self,
        corpus: &str,
        fingerprint: String,
    ) -> Result<(VectorIndex, Vec<String>), RetrieveError> {
        let chunks = chunker::split(corpus, self.config.max_chunk_chars);
        if chunks.is_empty() {
            return Err(IndexError::EmptyCorpus.into());
        }

        let vectors = self.embedder.embed_batch(&chunks).await?;
        let index = VectorIndex::build(vectors, self.embedder.signature(), fingerprint)?;

        // Persistence is best-effort; the freshly built index still answers
        // this query even if the save fails.
        if let Err(e) = self.store.save(&index, &chunks) {
            log_warn!("Failed to persist index pair: {}", e);
        } else {
            log_info!("Indexed {} chunks for current corpus", chunks.len());
        }

        Ok((index, chunks))
    }
}
