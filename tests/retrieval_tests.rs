//! End-to-end retrieval pipeline tests
//!
//! Run the retriever against a deterministic fake embedder so no model
//! download, network access or running Ollama is needed. The fake maps each
//! whitespace token to a histogram bucket, which makes nearest-neighbor
//! behavior fully predictable.

use anyhow::Result;
use async_trait::async_trait;
use leadscope::config::RetrievalConfig;
use leadscope::embedding::TextEmbedder;
use leadscope::retrieval::{corpus_fingerprint, IndexStore, Retriever};
use std::sync::Arc;

const FAKE_DIMENSION: usize = 32;

/// Deterministic substitute embedding capability
struct FakeEmbedder {
    signature: String,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self {
            signature: "fake-histogram-v1".to_string(),
        }
    }

    fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; FAKE_DIMENSION];
        let mut count = 0.0f32;
        for token in text.split_whitespace() {
            let bucket = token.bytes().map(|b| b as usize).sum::<usize>() % FAKE_DIMENSION;
            vector[bucket] += 1.0;
            count += 1.0;
        }
        if count > 0.0 {
            for value in vector.iter_mut() {
                *value /= count;
            }
        }
        vector
    }
}

#[async_trait]
impl TextEmbedder for FakeEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector_for(text))
    }

    fn signature(&self) -> String {
        self.signature.clone()
    }

    fn dimension(&self) -> usize {
        FAKE_DIMENSION
    }
}

fn test_config() -> RetrievalConfig {
    RetrievalConfig {
        // Small enough that every ten-word sentence lands in its own chunk
        max_chunk_chars: 80,
        word_threshold: 700,
        top_k: 3,
    }
}

fn make_retriever(data_dir: &std::path::Path) -> Retriever {
    Retriever::new(
        Arc::new(FakeEmbedder::new()),
        IndexStore::new(data_dir),
        test_config(),
    )
}

/// Exactly 900 words: 89 filler sentences of ten words each plus one
/// ten-token sentence about zebras in the middle.
fn corpus_900_words() -> String {
    let mut sentences: Vec<String> = (0..89)
        .map(|i| format!("Filler words about item {} keep this corpus very dull.", i))
        .collect();
    sentences.insert(
        44,
        "zebra zebra zebra zebra zebra zebra zebra zebra zebra zebra.".to_string(),
    );
    sentences.join(" ")
}

#[tokio::test]
async fn direct_path_returns_corpus_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let retriever = make_retriever(dir.path());

    let corpus = "The  quick\tbrown fox jumps over the lazy dog. That is all.";
    assert!(corpus.split_whitespace().count() < 700);

    let context = retriever.answer_context(corpus, "who jumps?").await.unwrap();
    assert_eq!(context, corpus);
}

#[tokio::test]
async fn direct_path_builds_no_index_files() {
    let dir = tempfile::tempdir().unwrap();
    let retriever = make_retriever(dir.path());

    let corpus = "Short corpus.";
    retriever.answer_context(corpus, "q").await.unwrap();

    let store = IndexStore::new(dir.path());
    assert!(store.load(&corpus_fingerprint(corpus)).is_err());
}

#[tokio::test]
async fn long_corpus_takes_retrieval_path() {
    let dir = tempfile::tempdir().unwrap();
    let retriever = make_retriever(dir.path());

    let corpus = corpus_900_words();
    assert_eq!(corpus.split_whitespace().count(), 900);

    let context = retriever
        .answer_context(&corpus, "zebra zebra zebra")
        .await
        .unwrap();

    // Never the raw corpus; exactly top_k chunks joined by blank lines
    assert_ne!(context, corpus);
    let segments: Vec<&str> = context.split("\n\n").collect();
    assert_eq!(segments.len(), 3);

    // Nearest-first: the zebra chunk must lead
    assert!(segments[0].contains("zebra"));

    // Every segment is corpus text
    for segment in &segments {
        for word in segment.split_whitespace() {
            assert!(corpus.contains(word), "unknown word {:?}", word);
        }
    }
}

#[tokio::test]
async fn retrieval_results_are_persisted_and_stable() {
    let dir = tempfile::tempdir().unwrap();
    let retriever = make_retriever(dir.path());
    let corpus = corpus_900_words();

    let first = retriever
        .answer_context(&corpus, "zebra zebra zebra")
        .await
        .unwrap();

    // The pair must now exist on disk under the corpus fingerprint
    let store = IndexStore::new(dir.path());
    let (index, chunks) = store.load(&corpus_fingerprint(&corpus)).unwrap();
    assert_eq!(index.size(), chunks.len());
    assert!(index.size() > 3);

    // A second ask reuses the persisted pair and yields identical context
    let second = retriever
        .answer_context(&corpus, "zebra zebra zebra")
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn switching_corpus_invalidates_persisted_index() {
    let dir = tempfile::tempdir().unwrap();
    let retriever = make_retriever(dir.path());

    let corpus_a = corpus_900_words();
    retriever.answer_context(&corpus_a, "q").await.unwrap();

    // Second "company": same length, different content
    let corpus_b = corpus_900_words().replace("zebra", "marmot");
    let context_b = retriever
        .answer_context(&corpus_b, "marmot marmot marmot")
        .await
        .unwrap();
    assert!(context_b.contains("marmot"));
    assert!(!context_b.contains("zebra"));

    // The stored pair now belongs to corpus B; A's fingerprint is stale
    let store = IndexStore::new(dir.path());
    assert!(store.load(&corpus_fingerprint(&corpus_a)).is_err());
    assert!(store.load(&corpus_fingerprint(&corpus_b)).is_ok());
}

#[tokio::test]
async fn fewer_chunks_than_top_k_returns_them_all() {
    let dir = tempfile::tempdir().unwrap();
    // Threshold of zero forces the retrieval path even for a tiny corpus
    let retriever = Retriever::new(
        Arc::new(FakeEmbedder::new()),
        IndexStore::new(dir.path()),
        RetrievalConfig {
            max_chunk_chars: 500,
            word_threshold: 0,
            top_k: 3,
        },
    );

    let corpus = "Only one little sentence here.";
    let context = retriever.answer_context(corpus, "anything").await.unwrap();
    assert_eq!(context, "Only one little sentence here.");
}
