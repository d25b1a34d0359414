use serde::{Deserialize, Serialize};

use crate::generation::{GenerationOutput, Strategy};
use crate::grounding::{DietaryConstraint, EvaluationResult};
use crate::recipe::Recipe;
use crate::retrieval::RetrievedSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRecipeRef {
    pub name: String,
    pub ingredients: Vec<String>,
}

impl From<&Recipe> for BaseRecipeRef {
    fn from(recipe: &Recipe) -> Self {
        Self {
            name: recipe.name.clone(),
            ingredients: recipe.ingredients(),
        }
    }
}

/// One strategy's generated text and its evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    pub output: String,
    pub strategy: Strategy,
    pub constraint: DietaryConstraint,
    pub evaluation: EvaluationResult,
}

impl StrategyRun {
    pub fn new(generated: GenerationOutput, evaluation: EvaluationResult) -> Self {
        Self {
            output: generated.text,
            strategy: generated.strategy,
            constraint: generated.constraint,
            evaluation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub example_id: usize,
    pub base_recipe: BaseRecipeRef,
    pub retrieved_recipes: Vec<RetrievedSummary>,
    /// Sorted.
    pub allowed_ingredients: Vec<String>,
    pub baseline: StrategyRun,
    pub grounded: StrategyRun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleFailure {
    pub example_id: usize,
    pub base_recipe: BaseRecipeRef,
    pub error: String,
}

/// Entry of the `results` list: a full record, or the error that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExampleOutcome {
    Completed(Box<ExperimentRecord>),
    Failed(ExampleFailure),
}

impl ExampleOutcome {
    pub fn example_id(&self) -> usize {
        match self {
            ExampleOutcome::Completed(record) => record.example_id,
            ExampleOutcome::Failed(failure) => failure.example_id,
        }
    }

    pub fn record(&self) -> Option<&ExperimentRecord> {
        match self {
            ExampleOutcome::Completed(record) => Some(record),
            ExampleOutcome::Failed(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ExampleOutcome::Failed(_))
    }
}
