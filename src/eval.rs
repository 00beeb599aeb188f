//! The evaluation harness: retrieval-quality metrics against relevance
//! judgments.
//!
//! [`Evaluator`] runs one retrieval model over a query set at a fixed
//! cutoff `k` and computes precision@k, recall@k, and average precision per
//! query, plus their arithmetic means over *all* queries. Queries with no
//! relevant retrieved documents contribute 0 to every mean; mean average
//! precision divides by the total query count, not by the count of queries
//! with hits.
//!
//! Per-query scoring is a pure read over immutable model state, so queries
//! are evaluated in parallel and the aggregation is an order-independent
//! sum.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::corpus::{Query, QuerySet, JudgmentSet};
use crate::error::{Result, SagittaError};
use crate::model::RetrievalModel;

/// Per-query evaluation components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetrics {
    /// The evaluated query.
    pub query_id: String,

    /// Precision at k: tp / (tp + fp), 0 when nothing was retrieved.
    pub precision: f64,

    /// Recall at k: tp / (tp + fn), 0 when nothing is judged relevant.
    pub recall: f64,

    /// Average precision over the ranked retrieved list.
    pub average_precision: f64,
}

/// Aggregate evaluation result for one model at one cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// The result cutoff the metrics were computed at.
    pub k: usize,

    /// Number of evaluated queries.
    pub query_count: usize,

    /// Mean precision@k over all queries.
    pub mean_precision: f64,

    /// Mean recall@k over all queries.
    pub mean_recall: f64,

    /// Mean average precision over all queries.
    pub mean_average_precision: f64,

    /// The per-query components that produced the means.
    pub per_query: Vec<QueryMetrics>,
}

/// Evaluates one retrieval model against a judgment set.
pub struct Evaluator<'a> {
    model: &'a dyn RetrievalModel,
    analyzer: &'a dyn Analyzer,
    judgments: &'a JudgmentSet,
    k: usize,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator for `model` at cutoff `k`.
    pub fn new(
        model: &'a dyn RetrievalModel,
        analyzer: &'a dyn Analyzer,
        judgments: &'a JudgmentSet,
        k: usize,
    ) -> Result<Self> {
        if k == 0 {
            return Err(SagittaError::invalid_argument(
                "evaluation cutoff k must be >= 1",
            ));
        }
        Ok(Evaluator {
            model,
            analyzer,
            judgments,
            k,
        })
    }

    /// The ordered top-k doc ids the model retrieves for a query.
    pub fn retrieved_docs(&self, query: &Query) -> Result<Vec<String>> {
        let tokens = self.analyzer.analyze(&query.text)?;
        let ranked = self.model.top_k(&tokens, self.k)?;
        Ok(ranked.into_iter().map(|doc| doc.doc_id).collect())
    }

    /// Precision and recall at k for one query.
    ///
    /// Zero denominators (nothing retrieved, or nothing judged relevant)
    /// yield 0.0 rather than an arithmetic error, keeping the metric total
    /// over degenerate queries.
    pub fn precision_recall(&self, query: &Query) -> Result<(f64, f64)> {
        let retrieved = self.retrieved_docs(query)?;
        Ok(self.precision_recall_of(query, &retrieved))
    }

    /// Average precision for one query: at each rank holding a relevant
    /// document, accumulate hits / rank, then divide by the hit count.
    /// A query with zero relevant retrieved documents has AP 0.
    pub fn average_precision(&self, query: &Query) -> Result<f64> {
        let retrieved = self.retrieved_docs(query)?;
        Ok(self.average_precision_of(query, &retrieved))
    }

    /// Evaluate every query and aggregate.
    pub fn evaluate(&self, queries: &QuerySet) -> Result<EvaluationReport> {
        let per_query: Vec<QueryMetrics> = queries
            .queries()
            .par_iter()
            .map(|query| self.query_metrics(query))
            .collect::<Result<_>>()?;

        let count = per_query.len();
        let denom = if count == 0 { 1.0 } else { count as f64 };

        Ok(EvaluationReport {
            k: self.k,
            query_count: count,
            mean_precision: per_query.iter().map(|m| m.precision).sum::<f64>() / denom,
            mean_recall: per_query.iter().map(|m| m.recall).sum::<f64>() / denom,
            mean_average_precision: per_query
                .iter()
                .map(|m| m.average_precision)
                .sum::<f64>()
                / denom,
            per_query,
        })
    }

    /// All metrics for one query, retrieving once.
    pub fn query_metrics(&self, query: &Query) -> Result<QueryMetrics> {
        let retrieved = self.retrieved_docs(query)?;
        let (precision, recall) = self.precision_recall_of(query, &retrieved);
        let average_precision = self.average_precision_of(query, &retrieved);
        Ok(QueryMetrics {
            query_id: query.query_id.clone(),
            precision,
            recall,
            average_precision,
        })
    }

    fn precision_recall_of(&self, query: &Query, retrieved: &[String]) -> (f64, f64) {
        let relevant = self.judgments.relevant_docs(&query.query_id);
        let tp = retrieved
            .iter()
            .filter(|doc_id| relevant.contains(doc_id.as_str()))
            .count();

        let precision = if retrieved.is_empty() {
            0.0
        } else {
            tp as f64 / retrieved.len() as f64
        };
        let recall = if relevant.is_empty() {
            0.0
        } else {
            tp as f64 / relevant.len() as f64
        };
        (precision, recall)
    }

    fn average_precision_of(&self, query: &Query, retrieved: &[String]) -> f64 {
        let relevant = self.judgments.relevant_docs(&query.query_id);

        let mut hits = 0u64;
        let mut sum_precisions = 0.0f64;
        for (position, doc_id) in retrieved.iter().enumerate() {
            if relevant.contains(doc_id.as_str()) {
                hits += 1;
                sum_precisions += hits as f64 / (position as f64 + 1.0);
            }
        }

        if hits > 0 {
            sum_precisions / hits as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Judgment;
    use crate::error::Result;
    use crate::model::{ScoreVector, ScoredDoc};
    use crate::corpus::TokenCorpus;
    use std::sync::Arc;

    /// A model that always returns the same ranked list, for exercising the
    /// metric arithmetic in isolation.
    struct FixedRanking {
        ranked: Vec<&'static str>,
    }

    impl RetrievalModel for FixedRanking {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn fit(&mut self, _corpus: &TokenCorpus) -> Result<()> {
            Ok(())
        }

        fn is_fitted(&self) -> bool {
            true
        }

        fn score(&self, _query_tokens: &[String]) -> Result<ScoreVector> {
            let doc_ids: Arc<[String]> =
                self.ranked.iter().map(|s| s.to_string()).collect();
            let n = doc_ids.len();
            let scores = (0..n).map(|i| (n - i) as f32).collect();
            ScoreVector::new(doc_ids, scores)
        }

        fn top_k(&self, _query_tokens: &[String], k: usize) -> Result<Vec<ScoredDoc>> {
            Ok(self
                .ranked
                .iter()
                .take(k)
                .enumerate()
                .map(|(i, doc_id)| ScoredDoc {
                    doc_id: doc_id.to_string(),
                    score: (self.ranked.len() - i) as f32,
                })
                .collect())
        }
    }

    struct PassthroughAnalyzer;

    impl Analyzer for PassthroughAnalyzer {
        fn analyze(&self, text: &str) -> Result<Vec<String>> {
            Ok(text.split_whitespace().map(|t| t.to_string()).collect())
        }

        fn name(&self) -> &'static str {
            "passthrough"
        }
    }

    fn judgments(pairs: &[(&str, &str)]) -> JudgmentSet {
        JudgmentSet::from_judgments(
            &pairs
                .iter()
                .map(|(q, d)| Judgment {
                    query_id: q.to_string(),
                    doc_id: d.to_string(),
                })
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_perfect_retrieval() {
        let model = FixedRanking { ranked: vec!["A", "B"] };
        let qrels = judgments(&[("q1", "A"), ("q1", "B")]);
        let evaluator = Evaluator::new(&model, &PassthroughAnalyzer, &qrels, 2).unwrap();

        let (precision, recall) = evaluator
            .precision_recall(&Query::new("q1", "whatever"))
            .unwrap();
        assert_eq!(precision, 1.0);
        assert_eq!(recall, 1.0);
    }

    #[test]
    fn test_half_right_retrieval() {
        let model = FixedRanking { ranked: vec!["C", "A"] };
        let qrels = judgments(&[("q1", "A"), ("q1", "B")]);
        let evaluator = Evaluator::new(&model, &PassthroughAnalyzer, &qrels, 2).unwrap();

        let (precision, recall) = evaluator
            .precision_recall(&Query::new("q1", "whatever"))
            .unwrap();
        assert_eq!(precision, 0.5);
        assert_eq!(recall, 0.5);
    }

    #[test]
    fn test_average_precision_example() {
        // relevant = {A, C}; retrieved = [B, A, C, D]
        // hits at positions 2 and 3: AP = (1/2 + 2/3) / 2
        let model = FixedRanking {
            ranked: vec!["B", "A", "C", "D"],
        };
        let qrels = judgments(&[("q1", "A"), ("q1", "C")]);
        let evaluator = Evaluator::new(&model, &PassthroughAnalyzer, &qrels, 4).unwrap();

        let ap = evaluator
            .average_precision(&Query::new("q1", "whatever"))
            .unwrap();
        assert!((ap - (0.5 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_relevant_retrieved_is_zero_not_error() {
        let model = FixedRanking { ranked: vec!["X", "Y"] };
        let qrels = judgments(&[("q1", "A")]);
        let evaluator = Evaluator::new(&model, &PassthroughAnalyzer, &qrels, 2).unwrap();
        let query = Query::new("q1", "whatever");

        let (precision, recall) = evaluator.precision_recall(&query).unwrap();
        assert_eq!(precision, 0.0);
        assert_eq!(recall, 0.0);
        assert_eq!(evaluator.average_precision(&query).unwrap(), 0.0);
    }

    #[test]
    fn test_query_without_judgments_is_zero() {
        let model = FixedRanking { ranked: vec!["A"] };
        let qrels = judgments(&[]);
        let evaluator = Evaluator::new(&model, &PassthroughAnalyzer, &qrels, 1).unwrap();

        let metrics = evaluator
            .query_metrics(&Query::new("unjudged", "whatever"))
            .unwrap();
        assert_eq!(metrics.precision, 0.0);
        assert_eq!(metrics.recall, 0.0);
        assert_eq!(metrics.average_precision, 0.0);
    }

    #[test]
    fn test_map_divides_by_total_query_count() {
        // q1 retrieves its only relevant doc at rank 1 (AP 1.0); q2 finds
        // nothing (AP 0). MAP = (1.0 + 0.0) / 2, not 1.0 / 1.
        let model = FixedRanking { ranked: vec!["A", "B"] };
        let qrels = judgments(&[("q1", "A"), ("q2", "Z")]);
        let evaluator = Evaluator::new(&model, &PassthroughAnalyzer, &qrels, 2).unwrap();

        let queries = QuerySet::from_queries(vec![
            Query::new("q1", "first"),
            Query::new("q2", "second"),
        ]);
        let report = evaluator.evaluate(&queries).unwrap();

        assert_eq!(report.query_count, 2);
        assert!((report.mean_average_precision - 0.5).abs() < 1e-12);
        assert!((report.mean_precision - 0.25).abs() < 1e-12);
        assert!((report.mean_recall - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_k_zero_is_invalid() {
        let model = FixedRanking { ranked: vec!["A"] };
        let qrels = judgments(&[]);
        assert!(Evaluator::new(&model, &PassthroughAnalyzer, &qrels, 0).is_err());
    }

    #[test]
    fn test_empty_query_set() {
        let model = FixedRanking { ranked: vec!["A"] };
        let qrels = judgments(&[("q1", "A")]);
        let evaluator = Evaluator::new(&model, &PassthroughAnalyzer, &qrels, 1).unwrap();

        let report = evaluator.evaluate(&QuerySet::default()).unwrap();
        assert_eq!(report.query_count, 0);
        assert_eq!(report.mean_average_precision, 0.0);
    }
}
