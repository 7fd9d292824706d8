//! Leadscope - lead generation with local-LLM company Q&A
//!
//! Streams scraped company leads from a third-party search API, scrapes the
//! selected company's website into a corpus snapshot, and answers free-form
//! questions against it with a locally hosted language model. Long corpora go
//! through a retrieval pipeline (chunk, embed, nearest-neighbor search);
//! short ones are stuffed into the prompt directly.
//!
//! # Modules
//!
//! - [`leads`] - lead-search API client (server-sent-event stream)
//! - [`scrape`] - company-website scraping and corpus snapshots
//! - [`retrieval`] - chunker, vector index store and retrieval decision
//! - [`embedding`] - text embedding capability (FastEmbed)
//! - [`llm`] - prompt builder and Ollama completion provider
//! - [`session`] - application state shared across CLI invocations
//! - [`config`] - configuration loading and validation
//!
//! # Example
//!
//! ```rust,no_run
//! use leadscope::config::AppConfig;
//! use leadscope::embedding::EmbeddingEngine;
//! use leadscope::retrieval::{IndexStore, Retriever};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::load(None)?;
//! let embedder = Arc::new(EmbeddingEngine::new().await?);
//! let store = IndexStore::new(config.data_dir());
//! let retriever = Retriever::new(embedder, store, config.retrieval.clone());
//!
//! let corpus = std::fs::read_to_string("scraped_content.txt")?;
//! let context = retriever.answer_context(&corpus, "What does the company sell?").await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedding;
pub mod leads;
pub mod llm;
pub mod logging;
pub mod retrieval;
pub mod scrape;
pub mod session;

pub use embedding::{EmbeddingEngine, TextEmbedder};
pub use leads::{LeadClient, LeadEvent, LeadRecord};
pub use llm::{CompletionProvider, OllamaProvider};
pub use retrieval::{IndexStore, Retriever, VectorIndex};
pub use scrape::Scraper;
pub use session::Session;
