//! Retrieval pipeline: chunk -> embed -> index -> search
//!
//! - [`chunker`] - sentence-aligned bounded chunking
//! - [`index`] - flat squared-L2 index plus the persisted index/chunk pair
//! - [`retriever`] - direct-stuffing vs top-k retrieval decision

pub mod chunker;
pub mod index;
pub mod retriever;

pub use index::{corpus_fingerprint, IndexError, IndexStore, VectorIndex};
pub use retriever::{RetrieveError, Retriever};
