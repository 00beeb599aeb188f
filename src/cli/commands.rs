//! Command implementations for the Sagitta CLI.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::analysis::StandardAnalyzer;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::corpus::{Corpus, JudgmentSet, QuerySet};
use crate::engine::{EngineConfig, ScoreMetric, SearchEngine, SearchRequest};
use crate::error::{Result, SagittaError};
use crate::model::Bm25Params;
use crate::storage::{FileStorage, ModelStore};

/// Name the tf-idf model is persisted under inside a model directory.
const TFIDF_NAME: &str = "tfidf";

/// Name the BM25 model is persisted under inside a model directory.
const BM25_NAME: &str = "bm25";

/// Execute a CLI command.
pub fn execute_command(args: SagittaArgs) -> Result<()> {
    match &args.command {
        Command::Fit(fit_args) => fit_models(fit_args.clone(), &args),
        Command::Search(search_args) => search_models(search_args.clone(), &args),
        Command::Evaluate(eval_args) => evaluate_models(eval_args.clone(), &args),
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
    }
}

fn model_store(model_dir: &Path) -> Result<ModelStore> {
    let storage = FileStorage::new(model_dir)?;
    Ok(ModelStore::new(Arc::new(storage)))
}

/// Open an engine over previously persisted models and the given corpus.
fn open_engine(model_dir: &Path, corpus_path: &Path) -> Result<SearchEngine> {
    let corpus = Corpus::from_json_file(corpus_path)?;
    let store = model_store(model_dir)?;
    let engine = SearchEngine::new(Arc::new(StandardAnalyzer::new()), EngineConfig::default());
    engine.open(&store, TFIDF_NAME, BM25_NAME, corpus)?;
    Ok(engine)
}

/// Fit both models from a corpus and persist them.
fn fit_models(args: FitArgs, cli_args: &SagittaArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Fitting models from: {}", args.corpus.display());
        println!("Into: {}", args.model_dir.display());
    }

    let store = model_store(&args.model_dir)?;
    if !args.force && (store.exists(TFIDF_NAME) || store.exists(BM25_NAME)) {
        return Err(SagittaError::invalid_argument(
            "model directory already holds fitted models; use --force to overwrite",
        ));
    }

    let start_time = Instant::now();
    let corpus = Corpus::from_json_file(&args.corpus)?;

    let config = EngineConfig {
        bm25: Bm25Params {
            k1: args.k1,
            b: args.b,
        },
        ..EngineConfig::default()
    };
    let engine = SearchEngine::from_corpus(corpus, Arc::new(StandardAnalyzer::new()), config)?;
    engine.persist(&store, TFIDF_NAME, BM25_NAME)?;

    let stats = engine.stats()?;
    output_result(
        "Models fitted and persisted",
        &FitOutput {
            model_dir: args.model_dir.to_string_lossy().to_string(),
            documents: stats.doc_count,
            terms: stats.term_count,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Search persisted models.
fn search_models(args: SearchArgs, cli_args: &SagittaArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Searching models in: {}", args.model_dir.display());
        println!("Query: {}", args.query);
    }

    let engine = open_engine(&args.model_dir, &args.corpus)?;
    let metric = ScoreMetric::from(args.metric);

    let start_time = Instant::now();
    let hits = engine.search(
        SearchRequest::new(args.query.as_str())
            .k(args.limit)
            .metric(metric),
    )?;

    output_result(
        "Search completed",
        &SearchOutput {
            query: args.query,
            metric: metric.as_str().to_string(),
            hits,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Evaluate persisted models against relevance judgments.
fn evaluate_models(args: EvaluateArgs, cli_args: &SagittaArgs) -> Result<()> {
    let engine = open_engine(&args.model_dir, &args.corpus)?;

    let queries = QuerySet::from_json_file(&args.queries)?;
    let judgments = JudgmentSet::from_json_file(&args.judgments)?;

    if cli_args.verbosity() > 1 {
        println!(
            "Evaluating {} queries against {} judged queries at k={}",
            queries.len(),
            judgments.query_count(),
            args.k
        );
    }

    let metric = ScoreMetric::from(args.metric);
    let start_time = Instant::now();
    let report = engine.evaluate(metric, &queries, &judgments, args.k, false)?;

    let mut report = (*report).clone();
    if !args.per_query {
        report.per_query.clear();
    }

    output_result(
        "Evaluation completed",
        &EvaluationOutput {
            metric: metric.as_str().to_string(),
            report,
            duration_ms: start_time.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

/// Show index statistics for persisted models.
fn show_stats(args: StatsArgs, cli_args: &SagittaArgs) -> Result<()> {
    let engine = open_engine(&args.model_dir, &args.corpus)?;
    let stats = engine.stats()?;

    output_result(
        "Model statistics",
        &StatsOutput {
            model_dir: args.model_dir.to_string_lossy().to_string(),
            documents: stats.doc_count,
            terms: stats.term_count,
            avg_doc_length: stats.avg_doc_length,
        },
        cli_args,
    )
}
