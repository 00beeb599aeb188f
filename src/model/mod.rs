//! Retrieval models and their shared scoring contract.
//!
//! Both ranking models implement [`RetrievalModel`]: fit over a token
//! corpus, score a query against every document, and rank the top k. The
//! trait is the single explicit capability the engine and the evaluation
//! harness program against; the concrete variant is selected with
//! [`ModelKind`] rather than by probing for methods.

pub mod bm25;
pub mod tfidf;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::corpus::TokenCorpus;
use crate::error::{Result, SagittaError};

pub use bm25::{Bm25Model, Bm25Params};
pub use tfidf::TfIdfModel;

/// The available retrieval model variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Vector-space model: tf-idf weighting with cosine similarity.
    VectorSpace,

    /// Probabilistic model: BM25.
    Probabilistic,
}

impl ModelKind {
    /// Short stable name, used for persistence keys and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::VectorSpace => "tfidf",
            ModelKind::Probabilistic => "bm25",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked document with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    /// The document id.
    pub doc_id: String,

    /// The relevance score under the model that produced it.
    pub score: f32,
}

/// A dense score vector over the whole document set for one query.
///
/// The key set is always exactly the current document set: one score per
/// document, aligned with the index's corpus order. The doc-id table is
/// shared (`Arc`) with the index that produced the scores, which makes the
/// key-set check during fusion a pointer comparison in the common case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreVector {
    doc_ids: Arc<[String]>,
    scores: Vec<f32>,
}

impl ScoreVector {
    /// Create a score vector; `scores` must be aligned with `doc_ids`.
    pub fn new(doc_ids: Arc<[String]>, scores: Vec<f32>) -> Result<Self> {
        if doc_ids.len() != scores.len() {
            return Err(SagittaError::invalid_argument(format!(
                "score vector has {} scores for {} documents",
                scores.len(),
                doc_ids.len()
            )));
        }
        Ok(ScoreVector { doc_ids, scores })
    }

    /// An all-zero score vector over the given document set.
    pub fn zeros(doc_ids: Arc<[String]>) -> Self {
        let scores = vec![0.0; doc_ids.len()];
        ScoreVector { doc_ids, scores }
    }

    /// Number of documents covered.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the vector covers zero documents.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Document ids in corpus order.
    pub fn doc_ids(&self) -> &Arc<[String]> {
        &self.doc_ids
    }

    /// Scores aligned with [`ScoreVector::doc_ids`].
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Iterate `(doc_id, score)` pairs in corpus order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.doc_ids
            .iter()
            .map(|id| id.as_str())
            .zip(self.scores.iter().copied())
    }

    /// Whether `other` covers the identical document-id key set.
    pub fn same_keys(&self, other: &ScoreVector) -> bool {
        Arc::ptr_eq(&self.doc_ids, &other.doc_ids) || self.doc_ids == other.doc_ids
    }

    /// The k highest-scoring documents, descending by score, ties broken by
    /// corpus order.
    ///
    /// `k` must be at least 1; asking for more documents than exist returns
    /// the full ranked corpus.
    pub fn top_k(&self, k: usize) -> Result<Vec<ScoredDoc>> {
        if k == 0 {
            return Err(SagittaError::invalid_argument(
                "top_k requires k >= 1",
            ));
        }

        let mut order: Vec<usize> = (0..self.scores.len()).collect();
        // Stable sort over indices already in corpus order keeps ties in
        // corpus order.
        order.sort_by(|&a, &b| self.scores[b].total_cmp(&self.scores[a]));
        order.truncate(k);

        Ok(order
            .into_iter()
            .map(|i| ScoredDoc {
                doc_id: self.doc_ids[i].clone(),
                score: self.scores[i],
            })
            .collect())
    }
}

/// The retrieval-model capability shared by both ranking variants.
pub trait RetrievalModel: Send + Sync {
    /// The name of this model (for reports and debugging).
    fn name(&self) -> &'static str;

    /// Fit the model over a token corpus.
    ///
    /// A failed fit leaves any previously fitted state untouched.
    fn fit(&mut self, corpus: &TokenCorpus) -> Result<()>;

    /// Whether the model has been fitted (or loaded) and can score.
    fn is_fitted(&self) -> bool;

    /// Score a query against every document.
    ///
    /// Returns a dense score vector over the whole document set; an empty
    /// token sequence yields all zeros. Fails with
    /// [`SagittaError::ModelNotFitted`] before a successful fit or load.
    fn score(&self, query_tokens: &[String]) -> Result<ScoreVector>;

    /// The k highest-scoring documents for the query.
    fn top_k(&self, query_tokens: &[String], k: usize) -> Result<Vec<ScoredDoc>> {
        self.score(query_tokens)?.top_k(k)
    }
}
