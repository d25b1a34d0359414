use serde::{Deserialize, Serialize};

use super::record::{ExampleOutcome, StrategyRun};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    /// Outputs that broke the dietary constraint.
    pub violation_count: usize,
    pub violation_rate: f64,
    pub grounding_violation_count: usize,
    pub grounding_violation_rate: f64,
    pub avg_novel_ingredients: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    /// Completed examples the rates are computed over.
    pub num_examples: usize,
    pub num_errors: usize,
    pub baseline: StrategySummary,
    pub grounded: StrategySummary,
}

impl ExperimentSummary {
    /// Drop in average novel ingredients from baseline to grounded, in percent.
    /// Zero when the baseline had none.
    pub fn novel_reduction_percent(&self) -> f64 {
        let baseline = self.baseline.avg_novel_ingredients;
        if baseline > 0.0 {
            (baseline - self.grounded.avg_novel_ingredients) / baseline * 100.0
        } else {
            0.0
        }
    }
}

fn summarize<'a>(runs: impl Iterator<Item = &'a StrategyRun>, n: usize) -> StrategySummary {
    let mut violation_count = 0;
    let mut grounding_violation_count = 0;
    let mut novel_total = 0;
    for run in runs {
        if run.evaluation.constraint_check.violated {
            violation_count += 1;
        }
        if run.evaluation.grounding_check.report.violated {
            grounding_violation_count += 1;
        }
        novel_total += run.evaluation.grounding_check.report.count;
    }

    let n = n as f64;
    StrategySummary {
        violation_count,
        violation_rate: violation_count as f64 / n,
        grounding_violation_count,
        grounding_violation_rate: grounding_violation_count as f64 / n,
        avg_novel_ingredients: novel_total as f64 / n,
    }
}

/// Aggregates completed records only; `None` when nothing completed.
pub fn compute_summary(outcomes: &[ExampleOutcome]) -> Option<ExperimentSummary> {
    let completed: Vec<_> = outcomes.iter().filter_map(ExampleOutcome::record).collect();
    if completed.is_empty() {
        return None;
    }
    let n = completed.len();

    Some(ExperimentSummary {
        num_examples: n,
        num_errors: outcomes.len() - n,
        baseline: summarize(completed.iter().map(|r| &r.baseline), n),
        grounded: summarize(completed.iter().map(|r| &r.grounded), n),
    })
}

/// One line of the ablation comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AblationRow {
    pub top_k: usize,
    pub baseline_avg_novel: f64,
    pub grounded_avg_novel: f64,
    pub reduction_percent: f64,
}

impl AblationRow {
    pub fn new(top_k: usize, summary: &ExperimentSummary) -> Self {
        Self {
            top_k,
            baseline_avg_novel: summary.baseline.avg_novel_ingredients,
            grounded_avg_novel: summary.grounded.avg_novel_ingredients,
            reduction_percent: summary.novel_reduction_percent(),
        }
    }
}
