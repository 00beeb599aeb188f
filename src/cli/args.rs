//! Command line argument parsing for the Sagitta CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::ScoreMetric;

/// Sagitta - a small-scale retrieval evaluation engine
#[derive(Parser, Debug, Clone)]
#[command(name = "sagitta")]
#[command(about = "Rank and evaluate a document collection with tf-idf, BM25, and fused scoring")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SagittaArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl SagittaArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fit both ranking models from a corpus and persist them
    Fit(FitArgs),

    /// Search a fitted model directory
    Search(SearchArgs),

    /// Evaluate ranking quality against relevance judgments
    Evaluate(EvaluateArgs),

    /// Show statistics about a fitted model directory
    Stats(StatsArgs),
}

/// Arguments for fitting models
#[derive(Parser, Debug, Clone)]
pub struct FitArgs {
    /// Directory to persist the fitted models into
    #[arg(value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Corpus file path (JSON array of documents)
    #[arg(short, long, value_name = "CORPUS_FILE")]
    pub corpus: PathBuf,

    /// Overwrite previously persisted models
    #[arg(long)]
    pub force: bool,

    /// BM25 term-frequency saturation constant
    #[arg(long, default_value = "1.5")]
    pub k1: f32,

    /// BM25 length-normalization constant
    #[arg(long, default_value = "0.75")]
    pub b: f32,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Directory holding the persisted models
    #[arg(value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Corpus file the models were fitted from
    #[arg(short, long, value_name = "CORPUS_FILE")]
    pub corpus: PathBuf,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Ranking metric
    #[arg(short = 'm', long, default_value = "fused")]
    pub metric: MetricArg,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Directory holding the persisted models
    #[arg(value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Corpus file the models were fitted from
    #[arg(short, long, value_name = "CORPUS_FILE")]
    pub corpus: PathBuf,

    /// Query file path (JSON array of queries)
    #[arg(long, value_name = "QUERY_FILE")]
    pub queries: PathBuf,

    /// Relevance judgment file path (JSON array of qrels)
    #[arg(long, value_name = "JUDGMENT_FILE")]
    pub judgments: PathBuf,

    /// Result cutoff for precision/recall
    #[arg(short, long, default_value = "10")]
    pub k: usize,

    /// Ranking metric to evaluate
    #[arg(short = 'm', long, default_value = "fused")]
    pub metric: MetricArg,

    /// Include per-query metrics in the output
    #[arg(long)]
    pub per_query: bool,
}

/// Arguments for model statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Directory holding the persisted models
    #[arg(value_name = "MODEL_DIR")]
    pub model_dir: PathBuf,

    /// Corpus file the models were fitted from
    #[arg(short, long, value_name = "CORPUS_FILE")]
    pub corpus: PathBuf,
}

/// Ranking metrics selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricArg {
    /// tf-idf cosine similarity
    Tfidf,
    /// BM25
    Bm25,
    /// Mean of both normalized scores
    Fused,
}

impl From<MetricArg> for ScoreMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Tfidf => ScoreMetric::VectorSpace,
            MetricArg::Bm25 => ScoreMetric::Probabilistic,
            MetricArg::Fused => ScoreMetric::Fused,
        }
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
