//! # Sagitta
//!
//! A small-scale information-retrieval evaluation engine for Rust.
//!
//! Sagitta ranks a document collection under two classic lexical models and
//! measures how well each one answers a query set against human relevance
//! judgments:
//!
//! - Vector-space ranking: smoothed tf-idf weights with cosine similarity
//! - Probabilistic ranking: Okapi BM25
//! - Fused ranking: the mean of both models' min-max normalized scores
//!
//! Both models score over one shared inverted index built from a snapshot of
//! the corpus, and the evaluation harness reports precision@k, recall@k, and
//! mean average precision per ranking signal.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use sagitta::analysis::StandardAnalyzer;
//! use sagitta::corpus::{Corpus, Document};
//! use sagitta::engine::{EngineConfig, SearchEngine, SearchRequest};
//!
//! # fn main() -> sagitta::error::Result<()> {
//! let corpus = Corpus::from_documents(vec![
//!     Document::new("d1", "the quick brown fox"),
//!     Document::new("d2", "a lazy dog sleeps"),
//! ]);
//!
//! let engine = SearchEngine::from_corpus(
//!     corpus,
//!     Arc::new(StandardAnalyzer::new()),
//!     EngineConfig::default(),
//! )?;
//!
//! let hits = engine.search(SearchRequest::new("quick fox").k(1))?;
//! assert_eq!(hits[0].doc_id, "d1");
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod eval;
pub mod fusion;
pub mod index;
pub mod model;
pub mod storage;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
