//! The search engine: orchestrates both ranking models behind one entry
//! point.
//!
//! A [`SearchEngine`] owns one fitted snapshot at a time: a shared lexical
//! index, the two models fitted from it, and the corpus documents for
//! response fields. Scoring is a pure read over the snapshot, so any number
//! of searches can run concurrently; refitting builds a fresh snapshot off
//! to the side and swaps it in with one write, so in-flight searches always
//! see one consistent version.
//!
//! Evaluation results are memoized per (metric, k, judgment set, snapshot)
//! and never served stale: a refit or a different judgment set changes the
//! key, and `force` always recomputes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::Analyzer;
use crate::corpus::{Corpus, JudgmentSet, QuerySet, TokenCorpus};
use crate::error::{Result, SagittaError};
use crate::eval::{EvaluationReport, Evaluator};
use crate::fusion;
use crate::index::{IndexStats, LexicalIndex};
use crate::model::{
    Bm25Model, Bm25Params, ModelKind, RetrievalModel, ScoreVector, TfIdfModel,
};
use crate::storage::ModelStore;

/// Which ranking signal a search should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScoreMetric {
    /// tf-idf cosine similarity only.
    VectorSpace,

    /// BM25 only.
    Probabilistic,

    /// Mean of both models' min-max normalized scores.
    #[default]
    Fused,
}

impl ScoreMetric {
    /// Short stable name, used in reports and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreMetric::VectorSpace => "tfidf",
            ScoreMetric::Probabilistic => "bm25",
            ScoreMetric::Fused => "fused",
        }
    }
}

impl std::fmt::Display for ScoreMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable engine configuration, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Result cutoff used when a search request does not specify one.
    pub default_k: usize,

    /// Ranking signal used when a search request does not specify one.
    pub default_metric: ScoreMetric,

    /// BM25 tuning constants.
    pub bm25: Bm25Params,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_k: 10,
            default_metric: ScoreMetric::Fused,
            bm25: Bm25Params::default(),
        }
    }
}

/// A search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Raw query text; the engine runs it through the analyzer.
    pub query: String,

    /// Result cutoff; engine default when absent.
    pub k: Option<usize>,

    /// Ranking signal; engine default when absent.
    pub metric: Option<ScoreMetric>,
}

impl SearchRequest {
    /// Create a request for the given query text with engine defaults.
    pub fn new<S: Into<String>>(query: S) -> Self {
        SearchRequest {
            query: query.into(),
            k: None,
            metric: None,
        }
    }

    /// Set the result cutoff.
    pub fn k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    /// Set the ranking signal.
    pub fn metric(mut self, metric: ScoreMetric) -> Self {
        self.metric = Some(metric);
        self
    }
}

/// One search result: the document plus its selected score and non-numeric
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched document id.
    pub doc_id: String,

    /// The score under the requested metric.
    pub score: f32,

    /// The document's non-numeric fields.
    pub fields: BTreeMap<String, Value>,
}

/// One fitted snapshot: index, models, and documents, all consistent.
struct EngineState {
    index: Arc<LexicalIndex>,
    tfidf: TfIdfModel,
    bm25: Bm25Model,
    corpus: Corpus,
    doc_positions: AHashMap<String, usize>,
    generation: u64,
}

impl EngineState {
    fn document_fields(&self, doc_id: &str) -> BTreeMap<String, Value> {
        self.doc_positions
            .get(doc_id)
            .map(|&pos| self.corpus.documents()[pos].display_fields())
            .unwrap_or_default()
    }
}

type EvalCacheKey = (ScoreMetric, usize, u64, u64);

/// The query engine binding preprocessing, scoring, fusion, and evaluation.
pub struct SearchEngine {
    config: EngineConfig,
    analyzer: Arc<dyn Analyzer>,
    state: RwLock<Option<Arc<EngineState>>>,
    eval_cache: Mutex<AHashMap<EvalCacheKey, Arc<EvaluationReport>>>,
    generation: AtomicU64,
}

impl SearchEngine {
    /// Create an engine with no fitted snapshot.
    ///
    /// The engine is not ready until [`SearchEngine::fit`] or
    /// [`SearchEngine::open`] succeeds.
    pub fn new(analyzer: Arc<dyn Analyzer>, config: EngineConfig) -> Self {
        SearchEngine {
            config,
            analyzer,
            state: RwLock::new(None),
            eval_cache: Mutex::new(AHashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Create an engine and fit both models from the corpus in one step.
    pub fn from_corpus(
        corpus: Corpus,
        analyzer: Arc<dyn Analyzer>,
        config: EngineConfig,
    ) -> Result<Self> {
        let engine = Self::new(analyzer, config);
        engine.fit(corpus)?;
        Ok(engine)
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether both models are fitted and searches can be served.
    pub fn is_ready(&self) -> bool {
        self.state.read().is_some()
    }

    /// Tokenize the corpus, build the shared index, fit both models, and
    /// publish the new snapshot atomically.
    ///
    /// Fitting is pure and in-memory; nothing is persisted until
    /// [`SearchEngine::persist`] is called. A failed fit leaves the previous
    /// snapshot (if any) serving searches.
    pub fn fit(&self, corpus: Corpus) -> Result<()> {
        let mut tokens = TokenCorpus::new();
        for document in corpus.iter() {
            tokens.push(document.doc_id.clone(), self.analyzer.analyze(&document.text)?);
        }

        let index = Arc::new(LexicalIndex::build(&tokens)?);
        let tfidf = TfIdfModel::from_index(index.clone())?;
        let bm25 = Bm25Model::from_index(index.clone(), self.config.bm25)?;

        self.install(index, tfidf, bm25, corpus)
    }

    /// Load both models from previously persisted state and bind them to the
    /// corpus snapshot.
    ///
    /// Fails with [`SagittaError::ModelNotFound`] when either name was never
    /// saved, and with [`SagittaError::InvalidArgument`] when the persisted
    /// document set does not match the corpus.
    pub fn open(
        &self,
        store: &ModelStore,
        tfidf_name: &str,
        bm25_name: &str,
        corpus: Corpus,
    ) -> Result<()> {
        let tfidf: TfIdfModel = store.load(tfidf_name, ModelKind::VectorSpace)?;
        let bm25: Bm25Model = store.load(bm25_name, ModelKind::Probabilistic)?;

        let index = tfidf.index()?.clone();
        if bm25.index()?.doc_ids() != index.doc_ids() {
            return Err(SagittaError::invalid_argument(format!(
                "persisted models '{tfidf_name}' and '{bm25_name}' cover different document sets"
            )));
        }

        let corpus_ids: Vec<&str> = corpus.iter().map(|d| d.doc_id.as_str()).collect();
        let index_ids: Vec<&str> = index.doc_ids().iter().map(|s| s.as_str()).collect();
        if corpus_ids != index_ids {
            return Err(SagittaError::invalid_argument(
                "persisted model state does not match the corpus snapshot",
            ));
        }

        self.install(index, tfidf, bm25, corpus)
    }

    /// Persist both fitted models under the given names.
    pub fn persist(&self, store: &ModelStore, tfidf_name: &str, bm25_name: &str) -> Result<()> {
        let state = self.snapshot()?;
        store.save(tfidf_name, ModelKind::VectorSpace, &state.tfidf)?;
        store.save(bm25_name, ModelKind::Probabilistic, &state.bm25)?;
        Ok(())
    }

    fn install(
        &self,
        index: Arc<LexicalIndex>,
        tfidf: TfIdfModel,
        bm25: Bm25Model,
        corpus: Corpus,
    ) -> Result<()> {
        let doc_positions = corpus
            .iter()
            .enumerate()
            .map(|(pos, doc)| (doc.doc_id.clone(), pos))
            .collect();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let state = Arc::new(EngineState {
            index,
            tfidf,
            bm25,
            corpus,
            doc_positions,
            generation,
        });

        *self.state.write() = Some(state);
        // Results computed against older snapshots must never be served.
        self.eval_cache.lock().clear();
        Ok(())
    }

    fn snapshot(&self) -> Result<Arc<EngineState>> {
        self.state.read().clone().ok_or_else(|| {
            SagittaError::not_ready("fit or open the engine before searching")
        })
    }

    /// Execute a search: analyze, score, normalize, fuse, rank.
    pub fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>> {
        let state = self.snapshot()?;
        let k = request.k.unwrap_or(self.config.default_k);
        let metric = request.metric.unwrap_or(self.config.default_metric);

        let tokens = self.analyzer.analyze(&request.query)?;
        let scores = Self::scores_for(&state, metric, &tokens)?;
        let ranked = scores.top_k(k)?;

        Ok(ranked
            .into_iter()
            .map(|doc| {
                let fields = state.document_fields(&doc.doc_id);
                SearchHit {
                    doc_id: doc.doc_id,
                    score: doc.score,
                    fields,
                }
            })
            .collect())
    }

    fn scores_for(
        state: &EngineState,
        metric: ScoreMetric,
        tokens: &[String],
    ) -> Result<ScoreVector> {
        match metric {
            ScoreMetric::VectorSpace => Ok(fusion::normalize(&state.tfidf.score(tokens)?)),
            ScoreMetric::Probabilistic => Ok(fusion::normalize(&state.bm25.score(tokens)?)),
            ScoreMetric::Fused => fusion::fuse(&[
                fusion::normalize(&state.tfidf.score(tokens)?),
                fusion::normalize(&state.bm25.score(tokens)?),
            ]),
        }
    }

    /// Evaluate the selected ranking signal against a judgment set.
    ///
    /// Results are cached per (metric, k, judgment set, snapshot); `force`
    /// bypasses the cache and recomputes.
    pub fn evaluate(
        &self,
        metric: ScoreMetric,
        queries: &QuerySet,
        judgments: &JudgmentSet,
        k: usize,
        force: bool,
    ) -> Result<Arc<EvaluationReport>> {
        let state = self.snapshot()?;
        let key: EvalCacheKey = (metric, k, judgments.fingerprint(), state.generation);

        if !force
            && let Some(report) = self.eval_cache.lock().get(&key)
        {
            return Ok(report.clone());
        }

        let fused;
        let model: &dyn RetrievalModel = match metric {
            ScoreMetric::VectorSpace => &state.tfidf,
            ScoreMetric::Probabilistic => &state.bm25,
            ScoreMetric::Fused => {
                fused = FusedScorer::new(&state.tfidf, &state.bm25);
                &fused
            }
        };

        let evaluator = Evaluator::new(model, self.analyzer.as_ref(), judgments, k)?;
        let report = Arc::new(evaluator.evaluate(queries)?);
        self.eval_cache.lock().insert(key, report.clone());
        Ok(report)
    }

    /// Statistics about the current snapshot's index.
    pub fn stats(&self) -> Result<IndexStats> {
        Ok(self.snapshot()?.index.stats())
    }

    /// Number of entries currently held by the evaluation cache.
    pub fn eval_cache_len(&self) -> usize {
        self.eval_cache.lock().len()
    }
}

/// Scores a query through both models, normalized and mean-fused.
///
/// An ephemeral adapter over two fitted models, letting the evaluation
/// harness treat the fused ranking signal as just another retrieval model.
pub struct FusedScorer<'a> {
    tfidf: &'a TfIdfModel,
    bm25: &'a Bm25Model,
}

impl<'a> FusedScorer<'a> {
    /// Create a fused scorer over two fitted models.
    pub fn new(tfidf: &'a TfIdfModel, bm25: &'a Bm25Model) -> Self {
        FusedScorer { tfidf, bm25 }
    }
}

impl RetrievalModel for FusedScorer<'_> {
    fn name(&self) -> &'static str {
        "fused"
    }

    fn fit(&mut self, _corpus: &TokenCorpus) -> Result<()> {
        Err(SagittaError::invalid_argument(
            "a fused scorer is fitted through its underlying models",
        ))
    }

    fn is_fitted(&self) -> bool {
        self.tfidf.is_fitted() && self.bm25.is_fitted()
    }

    fn score(&self, query_tokens: &[String]) -> Result<ScoreVector> {
        fusion::fuse(&[
            fusion::normalize(&self.tfidf.score(query_tokens)?),
            fusion::normalize(&self.bm25.score(query_tokens)?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StandardAnalyzer;
    use crate::corpus::{Document, Judgment, Query};
    use crate::storage::{MemoryStorage, ModelStore};

    fn small_corpus() -> Corpus {
        Corpus::from_documents(vec![
            Document::new("d1", "rust search engine ranking"),
            Document::new("d2", "cooking pasta recipes"),
            Document::new("d3", "rust programming language"),
        ])
    }

    fn analyzer() -> Arc<dyn Analyzer> {
        Arc::new(StandardAnalyzer::new())
    }

    fn ready_engine() -> SearchEngine {
        SearchEngine::from_corpus(small_corpus(), analyzer(), EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_search_before_fit_fails() {
        let engine = SearchEngine::new(analyzer(), EngineConfig::default());
        assert!(!engine.is_ready());
        let result = engine.search(SearchRequest::new("rust"));
        assert!(matches!(result, Err(SagittaError::EngineNotReady(_))));
    }

    #[test]
    fn test_search_returns_relevant_docs_first() {
        let engine = ready_engine();
        let hits = engine.search(SearchRequest::new("rust ranking").k(3)).unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].doc_id, "d1");
        assert!(hits[0].score >= hits[1].score);
        assert!(hits[1].score >= hits[2].score);
        assert!(hits[0].fields.contains_key("text"));
    }

    #[test]
    fn test_search_respects_metric_selection() {
        let engine = ready_engine();
        for metric in [
            ScoreMetric::VectorSpace,
            ScoreMetric::Probabilistic,
            ScoreMetric::Fused,
        ] {
            let hits = engine
                .search(SearchRequest::new("rust").k(3).metric(metric))
                .unwrap();
            assert_eq!(hits.len(), 3);
            // Both rust documents outrank the cooking one under any metric.
            assert_ne!(hits[0].doc_id, "d2");
            assert_ne!(hits[1].doc_id, "d2");
        }
    }

    #[test]
    fn test_search_k_beyond_corpus_returns_all() {
        let engine = ready_engine();
        let hits = engine.search(SearchRequest::new("rust").k(50)).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_fit_on_empty_corpus_keeps_previous_snapshot() {
        let engine = ready_engine();
        assert!(engine.fit(Corpus::default()).is_err());
        assert!(engine.is_ready());
        assert_eq!(engine.stats().unwrap().doc_count, 3);
    }

    #[test]
    fn test_persist_and_open_roundtrip() {
        let store = ModelStore::new(Arc::new(MemoryStorage::new()));
        let engine = ready_engine();
        engine.persist(&store, "tfidf", "bm25").unwrap();

        let reopened = SearchEngine::new(analyzer(), EngineConfig::default());
        reopened.open(&store, "tfidf", "bm25", small_corpus()).unwrap();

        let before = engine.search(SearchRequest::new("rust").k(3)).unwrap();
        let after = reopened.search(SearchRequest::new("rust").k(3)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_open_missing_model_fails() {
        let store = ModelStore::new(Arc::new(MemoryStorage::new()));
        let engine = SearchEngine::new(analyzer(), EngineConfig::default());
        let result = engine.open(&store, "tfidf", "bm25", small_corpus());
        assert!(matches!(result, Err(SagittaError::ModelNotFound(_))));
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_open_with_mismatched_corpus_fails() {
        let store = ModelStore::new(Arc::new(MemoryStorage::new()));
        ready_engine().persist(&store, "tfidf", "bm25").unwrap();

        let other_corpus = Corpus::from_documents(vec![Document::new("x", "different")]);
        let engine = SearchEngine::new(analyzer(), EngineConfig::default());
        let result = engine.open(&store, "tfidf", "bm25", other_corpus);
        assert!(matches!(result, Err(SagittaError::InvalidArgument(_))));
    }

    fn eval_fixtures() -> (QuerySet, JudgmentSet) {
        let queries = QuerySet::from_queries(vec![Query::new("q1", "rust programming")]);
        let judgments = JudgmentSet::from_judgments(&[
            Judgment {
                query_id: "q1".into(),
                doc_id: "d1".into(),
            },
            Judgment {
                query_id: "q1".into(),
                doc_id: "d3".into(),
            },
        ]);
        (queries, judgments)
    }

    #[test]
    fn test_evaluate_all_metrics() {
        let engine = ready_engine();
        let (queries, judgments) = eval_fixtures();

        for metric in [
            ScoreMetric::VectorSpace,
            ScoreMetric::Probabilistic,
            ScoreMetric::Fused,
        ] {
            let report = engine
                .evaluate(metric, &queries, &judgments, 2, false)
                .unwrap();
            assert_eq!(report.query_count, 1);
            // Both relevant docs mention "rust": any metric ranks them top-2.
            assert_eq!(report.mean_precision, 1.0);
            assert_eq!(report.mean_recall, 1.0);
            assert_eq!(report.mean_average_precision, 1.0);
        }
    }

    #[test]
    fn test_evaluation_cache_hits_and_invalidation() {
        let engine = ready_engine();
        let (queries, judgments) = eval_fixtures();

        let first = engine
            .evaluate(ScoreMetric::Fused, &queries, &judgments, 2, false)
            .unwrap();
        let second = engine
            .evaluate(ScoreMetric::Fused, &queries, &judgments, 2, false)
            .unwrap();
        // Cache hit: the same Arc comes back.
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.eval_cache_len(), 1);

        // A different k is a different key.
        engine
            .evaluate(ScoreMetric::Fused, &queries, &judgments, 3, false)
            .unwrap();
        assert_eq!(engine.eval_cache_len(), 2);

        // A different judgment set never reuses the cached report.
        let other = JudgmentSet::from_judgments(&[Judgment {
            query_id: "q1".into(),
            doc_id: "d2".into(),
        }]);
        let changed = engine
            .evaluate(ScoreMetric::Fused, &queries, &other, 2, false)
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &changed));

        // Refitting drops the cache wholesale.
        engine.fit(small_corpus()).unwrap();
        assert_eq!(engine.eval_cache_len(), 0);
    }

    #[test]
    fn test_evaluate_force_recomputes() {
        let engine = ready_engine();
        let (queries, judgments) = eval_fixtures();

        let cached = engine
            .evaluate(ScoreMetric::Probabilistic, &queries, &judgments, 2, false)
            .unwrap();
        let forced = engine
            .evaluate(ScoreMetric::Probabilistic, &queries, &judgments, 2, true)
            .unwrap();
        assert!(!Arc::ptr_eq(&cached, &forced));
        assert_eq!(*cached, *forced);
    }

    #[test]
    fn test_fused_scorer_cannot_be_fitted() {
        let engine = ready_engine();
        let state = engine.snapshot().unwrap();
        let mut scorer = FusedScorer::new(&state.tfidf, &state.bm25);
        assert!(scorer.is_fitted());
        assert!(scorer.fit(&TokenCorpus::new()).is_err());
    }
}
