//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::args::{OutputFormat, SagittaArgs};
use crate::engine::SearchHit;
use crate::error::Result;
use crate::eval::EvaluationReport;

/// Result structure for model fitting.
#[derive(Debug, Serialize, Deserialize)]
pub struct FitOutput {
    pub model_dir: String,
    pub documents: usize,
    pub terms: usize,
    pub duration_ms: u64,
}

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchOutput {
    pub query: String,
    pub metric: String,
    pub hits: Vec<SearchHit>,
    pub duration_ms: u64,
}

/// Result structure for evaluation runs.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub metric: String,
    pub report: EvaluationReport,
    pub duration_ms: u64,
}

/// Index statistics for a fitted model directory.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsOutput {
    pub model_dir: String,
    pub documents: usize,
    pub terms: usize,
    pub avg_doc_length: f64,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &SagittaArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &SagittaArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;

    match result {
        _ if std::any::type_name::<T>().contains("SearchOutput") => {
            output_search_human(&value, args)
        }
        _ if std::any::type_name::<T>().contains("EvaluationOutput") => {
            output_evaluation_human(&value, args)
        }
        _ => {
            // Generic key/value rendering for the remaining result types.
            if let Value::Object(map) = &value {
                for (key, val) in map {
                    println!("  {key}: {val}");
                }
            } else {
                println!("{value}");
            }
            Ok(())
        }
    }
}

fn output_search_human(value: &Value, args: &SagittaArgs) -> Result<()> {
    let metric = value["metric"].as_str().unwrap_or("?");
    let hits = value["hits"].as_array().cloned().unwrap_or_default();

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!("{} result(s), metric={metric}:", hits.len());
    for (rank, hit) in hits.iter().enumerate() {
        let doc_id = hit["doc_id"].as_str().unwrap_or("?");
        let score = hit["score"].as_f64().unwrap_or(0.0);
        println!("  {}. {doc_id}  (score: {score:.4})", rank + 1);

        if args.verbosity() > 1
            && let Some(fields) = hit["fields"].as_object()
        {
            for (name, val) in fields {
                println!("     {name}: {val}");
            }
        }
    }

    if let Some(ms) = value["duration_ms"].as_u64() {
        println!();
        println!("Took {ms} ms");
    }
    Ok(())
}

fn output_evaluation_human(value: &Value, args: &SagittaArgs) -> Result<()> {
    let metric = value["metric"].as_str().unwrap_or("?");
    let report = &value["report"];

    println!("Evaluation (metric={metric}, k={}):", report["k"]);
    println!("  queries:                {}", report["query_count"]);
    println!(
        "  mean precision@k:       {:.4}",
        report["mean_precision"].as_f64().unwrap_or(0.0)
    );
    println!(
        "  mean recall@k:          {:.4}",
        report["mean_recall"].as_f64().unwrap_or(0.0)
    );
    println!(
        "  mean average precision: {:.4}",
        report["mean_average_precision"].as_f64().unwrap_or(0.0)
    );

    if args.verbosity() > 1
        && let Some(per_query) = report["per_query"].as_array()
    {
        println!();
        for entry in per_query {
            println!(
                "  {}: P={:.4} R={:.4} AP={:.4}",
                entry["query_id"].as_str().unwrap_or("?"),
                entry["precision"].as_f64().unwrap_or(0.0),
                entry["recall"].as_f64().unwrap_or(0.0),
                entry["average_precision"].as_f64().unwrap_or(0.0),
            );
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &SagittaArgs) -> Result<()> {
    let output = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{output}");
    Ok(())
}
