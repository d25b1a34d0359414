use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::config::ExperimentConfig;
use super::record::ExampleOutcome;
use super::summary::{AblationRow, ExperimentSummary};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub timestamp: String,
    pub config: ExperimentConfig,
}

/// Everything a run writes to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFile {
    pub metadata: RunMetadata,
    pub summary: Option<ExperimentSummary>,
    pub results: Vec<ExampleOutcome>,
}

pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `grounded_exp_{ts}.json` for a single run, `grounded_exp_k{k}_{ts}.json`
/// for one leg of an ablation.
pub fn result_file_name(ablation_top_k: Option<usize>, timestamp: &str) -> String {
    match ablation_top_k {
        Some(k) => format!("grounded_exp_k{}_{}.json", k, timestamp),
        None => format!("grounded_exp_{}.json", timestamp),
    }
}

/// Pretty-prints `value` to `dir/file_name`, creating `dir` if needed.
pub async fn save_json<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create results directory '{}'", dir.display()))?;

    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(value).context("Failed to serialize results")?;
    fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write results to '{}'", path.display()))?;

    info!(path = %path.display(), "results saved");
    Ok(path)
}

pub async fn load_result_file(path: &Path) -> Result<ResultFile> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read results file '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results file '{}'", path.display()))
}

pub fn print_summary(summary: Option<&ExperimentSummary>, top_k: usize) {
    let Some(summary) = summary else {
        println!("  No valid results to summarize.");
        return;
    };
    let rule = "=".repeat(60);
    let b = &summary.baseline;
    let g = &summary.grounded;

    println!("\n{}", rule);
    println!("SUMMARY (k={})", top_k);
    println!("{}", rule);
    println!("Examples: {} ({} failed)", summary.num_examples, summary.num_errors);
    println!();
    println!("                        | Baseline | Grounded | Δ        |");
    println!("{}", "-".repeat(60));
    println!(
        "Constraint violations   | {:>8} | {:>8} | {:>+8} |",
        b.violation_count,
        g.violation_count,
        g.violation_count as i64 - b.violation_count as i64
    );
    println!(
        "Constraint rate         | {:>7.1}% | {:>7.1}% | {:>+7.1}% |",
        b.violation_rate * 100.0,
        g.violation_rate * 100.0,
        (g.violation_rate - b.violation_rate) * 100.0
    );
    println!(
        "Grounding violations    | {:>8} | {:>8} | {:>+8} |",
        b.grounding_violation_count,
        g.grounding_violation_count,
        g.grounding_violation_count as i64 - b.grounding_violation_count as i64
    );
    println!(
        "Grounding rate          | {:>7.1}% | {:>7.1}% | {:>+7.1}% |",
        b.grounding_violation_rate * 100.0,
        g.grounding_violation_rate * 100.0,
        (g.grounding_violation_rate - b.grounding_violation_rate) * 100.0
    );
    println!(
        "Avg novel ingredients   | {:>8.2} | {:>8.2} | {:>+8.2} |",
        b.avg_novel_ingredients,
        g.avg_novel_ingredients,
        g.avg_novel_ingredients - b.avg_novel_ingredients
    );
    if b.avg_novel_ingredients > 0.0 {
        println!("\nNovel ingredient reduction: {:.1}%", summary.novel_reduction_percent());
    }
    println!("\n{}\n", rule);
}

pub fn print_ablation_comparison(rows: &[AblationRow]) {
    let rule = "=".repeat(70);
    println!("\n{}", rule);
    println!("ABLATION COMPARISON: Effect of k on grounding");
    println!("{}", rule);
    println!(
        "\n{:>5} | {:>20} | {:>20} | {:>12} |",
        "k", "Baseline Avg Novel", "Grounded Avg Novel", "Reduction"
    );
    println!("{}", "-".repeat(70));
    for row in rows {
        println!(
            "{:>5} | {:>20.2} | {:>20.2} | {:>11.1}% |",
            row.top_k, row.baseline_avg_novel, row.grounded_avg_novel, row.reduction_percent
        );
    }
    println!("\n{}\n", rule);
}
