//! Vector-space retrieval: tf-idf weighting with cosine similarity.
//!
//! Document vectors use smoothed idf, `ln((1 + N) / (1 + df)) + 1`, so
//! weights never go to zero or negative and unseen terms never divide by
//! zero. Vectors are stored unnormalized with precomputed norms; cosine
//! similarity normalizes at comparison time.

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::corpus::TokenCorpus;
use crate::error::{Result, SagittaError};
use crate::index::LexicalIndex;
use crate::model::{ModelKind, RetrievalModel, ScoreVector};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TfIdfState {
    /// The shared lexical index this model was fitted from.
    index: Arc<LexicalIndex>,

    /// Smoothed idf per vocabulary index.
    idf: Vec<f32>,

    /// Euclidean norm of each document's weight vector, in corpus order.
    doc_norms: Vec<f32>,
}

/// The vector-space (tf-idf / cosine) retrieval model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfIdfModel {
    state: Option<TfIdfState>,
}

impl TfIdfModel {
    /// Create an unfitted model.
    pub fn new() -> Self {
        TfIdfModel { state: None }
    }

    /// Fit a model from an already built index, sharing it.
    pub fn from_index(index: Arc<LexicalIndex>) -> Result<Self> {
        let n = index.doc_count() as f64;
        let term_count = index.term_count();

        let mut idf = vec![0.0f32; term_count];
        let mut doc_norms_sq = vec![0.0f64; index.doc_count()];

        for term_index in 0..term_count as u32 {
            let df = index.postings(term_index).len() as f64;
            let value = (((1.0 + n) / (1.0 + df)).ln() + 1.0) as f32;
            idf[term_index as usize] = value;

            for posting in index.postings(term_index) {
                let weight = posting.term_freq as f64 * value as f64;
                doc_norms_sq[posting.doc as usize] += weight * weight;
            }
        }

        let doc_norms = doc_norms_sq.into_iter().map(|sq| sq.sqrt() as f32).collect();

        Ok(TfIdfModel {
            state: Some(TfIdfState {
                index,
                idf,
                doc_norms,
            }),
        })
    }

    fn state(&self) -> Result<&TfIdfState> {
        self.state
            .as_ref()
            .ok_or_else(|| SagittaError::not_fitted("tf-idf model has not been fitted or loaded"))
    }

    /// The index this model was fitted from.
    pub fn index(&self) -> Result<&Arc<LexicalIndex>> {
        Ok(&self.state()?.index)
    }
}

impl RetrievalModel for TfIdfModel {
    fn name(&self) -> &'static str {
        ModelKind::VectorSpace.as_str()
    }

    fn fit(&mut self, corpus: &TokenCorpus) -> Result<()> {
        // Build first, assign last: a failed build leaves prior state intact.
        let index = Arc::new(LexicalIndex::build(corpus)?);
        let fitted = Self::from_index(index)?;
        self.state = fitted.state;
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    fn score(&self, query_tokens: &[String]) -> Result<ScoreVector> {
        let state = self.state()?;
        let index = &state.index;

        // Query weights from fitted idf only; out-of-vocabulary terms
        // contribute nothing. Each occurrence adds another idf, so the
        // weight is tf(term, query) * idf(term) without deduplication.
        let mut query_weights: AHashMap<u32, f32> = AHashMap::new();
        for token in query_tokens {
            if let Some(term_index) = index.term_index(token) {
                *query_weights.entry(term_index).or_insert(0.0) +=
                    state.idf[term_index as usize];
            }
        }

        let query_norm = query_weights
            .values()
            .map(|w| (*w as f64) * (*w as f64))
            .sum::<f64>()
            .sqrt();

        if query_norm == 0.0 {
            return Ok(ScoreVector::zeros(index.doc_ids().clone()));
        }

        let mut dot = vec![0.0f64; index.doc_count()];
        for (&term_index, &query_weight) in &query_weights {
            let idf = state.idf[term_index as usize];
            for posting in index.postings(term_index) {
                let doc_weight = posting.term_freq as f64 * idf as f64;
                dot[posting.doc as usize] += query_weight as f64 * doc_weight;
            }
        }

        let scores = dot
            .into_iter()
            .enumerate()
            .map(|(doc, dot)| {
                let doc_norm = state.doc_norms[doc] as f64;
                if doc_norm == 0.0 {
                    0.0
                } else {
                    (dot / (query_norm * doc_norm)) as f32
                }
            })
            .collect();

        ScoreVector::new(index.doc_ids().clone(), scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_corpus(docs: &[(&str, &[&str])]) -> TokenCorpus {
        let mut corpus = TokenCorpus::new();
        for (doc_id, tokens) in docs {
            corpus.push(*doc_id, tokens.iter().map(|t| t.to_string()).collect());
        }
        corpus
    }

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn fitted(docs: &[(&str, &[&str])]) -> TfIdfModel {
        let mut model = TfIdfModel::new();
        model.fit(&token_corpus(docs)).unwrap();
        model
    }

    #[test]
    fn test_score_before_fit_fails() {
        let model = TfIdfModel::new();
        let result = model.score(&tokens(&["anything"]));
        assert!(matches!(result, Err(SagittaError::ModelNotFitted(_))));
    }

    #[test]
    fn test_failed_fit_preserves_previous_state() {
        let mut model = fitted(&[("d1", &["apple"])]);
        assert!(model.fit(&TokenCorpus::new()).is_err());
        assert!(model.is_fitted());
        assert_eq!(model.score(&tokens(&["apple"])).unwrap().len(), 1);
    }

    #[test]
    fn test_cosine_similarity_hand_computed() {
        // d1 = [apple, apple, banana], d2 = [banana, cherry], query = [apple]
        // idf(apple) = ln(3/2)+1, idf(banana) = 1
        // cos(q, d1) = (idf_a * 2*idf_a) / (idf_a * sqrt((2*idf_a)^2 + 1))
        let model = fitted(&[
            ("d1", &["apple", "apple", "banana"]),
            ("d2", &["banana", "cherry"]),
        ]);
        let scores = model.score(&tokens(&["apple"])).unwrap();

        let idf_a = (3.0f64 / 2.0).ln() + 1.0;
        let expected = (2.0 * idf_a) / (4.0 * idf_a * idf_a + 1.0).sqrt();
        assert!((scores.scores()[0] as f64 - expected).abs() < 1e-5);
        assert_eq!(scores.scores()[1], 0.0);
    }

    #[test]
    fn test_empty_query_scores_all_zero() {
        let model = fitted(&[("d1", &["apple"]), ("d2", &["banana"])]);
        let scores = model.score(&[]).unwrap();
        assert_eq!(scores.scores(), &[0.0, 0.0]);
    }

    #[test]
    fn test_oov_query_terms_contribute_zero() {
        let model = fitted(&[("d1", &["apple"]), ("d2", &["banana"])]);
        let oov_only = model.score(&tokens(&["durian"])).unwrap();
        assert_eq!(oov_only.scores(), &[0.0, 0.0]);

        // Mixed: the OOV term changes nothing next to the known term.
        let known = model.score(&tokens(&["apple"])).unwrap();
        let mixed = model.score(&tokens(&["apple", "durian"])).unwrap();
        assert_eq!(known.scores(), mixed.scores());
    }

    #[test]
    fn test_empty_document_scores_zero_not_nan() {
        let model = fitted(&[("d1", &["apple"]), ("empty", &[])]);
        let scores = model.score(&tokens(&["apple"])).unwrap();
        assert_eq!(scores.scores()[1], 0.0);
        assert!(scores.scores().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_refit_is_idempotent() {
        let docs: &[(&str, &[&str])] = &[
            ("d1", &["apple", "banana"]),
            ("d2", &["banana", "cherry", "cherry"]),
        ];
        let once = fitted(docs);
        let mut twice = fitted(docs);
        twice.fit(&token_corpus(docs)).unwrap();

        let query = tokens(&["banana", "cherry"]);
        let a = once.score(&query).unwrap();
        let b = twice.score(&query).unwrap();
        for (x, y) in a.scores().iter().zip(b.scores()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ranking_prefers_higher_term_frequency() {
        let model = fitted(&[
            ("light", &["apple", "banana"]),
            ("heavy", &["apple", "apple", "apple"]),
        ]);
        let top = model.top_k(&tokens(&["apple"]), 2).unwrap();
        assert_eq!(top[0].doc_id, "heavy");
    }
}
