//! Probabilistic retrieval: the BM25 ranking function.
//!
//! Scores use the +1 idf variant, `ln((N - df + 0.5) / (df + 0.5) + 1)`,
//! which keeps idf non-negative even for terms present in most documents,
//! and the standard saturating term-frequency with document-length
//! normalization.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::corpus::TokenCorpus;
use crate::error::{Result, SagittaError};
use crate::index::LexicalIndex;
use crate::model::{ModelKind, RetrievalModel, ScoreVector};

/// BM25 tuning constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation parameter.
    pub k1: f32,

    /// Document-length normalization parameter.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: 1.5, b: 0.75 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Bm25State {
    /// The shared lexical index this model was fitted from.
    index: Arc<LexicalIndex>,

    /// Idf per vocabulary index.
    idf: Vec<f32>,
}

/// The probabilistic (BM25) retrieval model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Model {
    params: Bm25Params,
    state: Option<Bm25State>,
}

impl Default for Bm25Model {
    fn default() -> Self {
        Self::new(Bm25Params::default())
    }
}

impl Bm25Model {
    /// Create an unfitted model with the given parameters.
    pub fn new(params: Bm25Params) -> Self {
        Bm25Model {
            params,
            state: None,
        }
    }

    /// Fit a model from an already built index, sharing it.
    pub fn from_index(index: Arc<LexicalIndex>, params: Bm25Params) -> Result<Self> {
        let n = index.doc_count() as f64;
        let idf = (0..index.term_count() as u32)
            .map(|term_index| {
                let df = index.postings(term_index).len() as f64;
                (((n - df + 0.5) / (df + 0.5) + 1.0).ln()) as f32
            })
            .collect();

        Ok(Bm25Model {
            params,
            state: Some(Bm25State { index, idf }),
        })
    }

    /// The tuning parameters this model scores with.
    pub fn params(&self) -> Bm25Params {
        self.params
    }

    fn state(&self) -> Result<&Bm25State> {
        self.state
            .as_ref()
            .ok_or_else(|| SagittaError::not_fitted("BM25 model has not been fitted or loaded"))
    }

    /// The index this model was fitted from.
    pub fn index(&self) -> Result<&Arc<LexicalIndex>> {
        Ok(&self.state()?.index)
    }
}

impl RetrievalModel for Bm25Model {
    fn name(&self) -> &'static str {
        ModelKind::Probabilistic.as_str()
    }

    fn fit(&mut self, corpus: &TokenCorpus) -> Result<()> {
        let index = Arc::new(LexicalIndex::build(corpus)?);
        let fitted = Self::from_index(index, self.params)?;
        self.state = fitted.state;
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    fn score(&self, query_tokens: &[String]) -> Result<ScoreVector> {
        let state = self.state()?;
        let index = &state.index;
        let Bm25Params { k1, b } = self.params;
        let avgdl = index.avg_doc_length();

        let mut scores = vec![0.0f64; index.doc_count()];

        // Query tokens are not deduplicated: every occurrence adds the
        // term's saturated contribution again. Terms absent from a document
        // contribute exactly 0 to it (they have no posting).
        for token in query_tokens {
            let Some(term_index) = index.term_index(token) else {
                continue;
            };
            let idf = state.idf[term_index as usize] as f64;

            for posting in index.postings(term_index) {
                let freq = posting.term_freq as f64;
                let doc_len = index.doc_length(posting.doc) as f64;
                let norm = 1.0 - b as f64 + b as f64 * doc_len / avgdl;
                scores[posting.doc as usize] +=
                    idf * (freq * (k1 as f64 + 1.0)) / (freq + k1 as f64 * norm);
            }
        }

        ScoreVector::new(
            index.doc_ids().clone(),
            scores.into_iter().map(|s| s as f32).collect(),
        )
    }
}
