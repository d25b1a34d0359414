use serde::{Deserialize, Serialize};

use super::checker::{check_constraint, ViolationReport};
use super::constraint::DietaryConstraint;
use crate::recipe::IngredientSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    /// Source or substitution ingredients found in the text, sorted.
    pub mentioned: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HallucinationReport {
    pub constraint_violation: ViolationReport,
    pub ingredient_consistency: ConsistencyReport,
    pub has_hallucination: bool,
}

/// Coarse sanity check: the output is consistent when at least one source
/// ingredient or allowed substitution appears literally in it.
pub fn check_ingredient_consistency(
    text: &str,
    source_ingredients: &IngredientSet,
    substitutions: &[(&str, &[&str])],
) -> ConsistencyReport {
    let lower = text.to_lowercase();

    let mut valid = source_ingredients.clone();
    for (_, replacements) in substitutions {
        valid.extend(replacements.iter().map(|r| r.to_string()));
    }

    let mentioned: Vec<String> = valid
        .into_iter()
        .filter(|ing| !ing.is_empty() && lower.contains(ing.as_str()))
        .collect();

    if mentioned.is_empty() {
        ConsistencyReport {
            consistent: false,
            mentioned,
            message: "No recognized ingredients from source recipes found".to_string(),
        }
    } else {
        let preview: Vec<&str> = mentioned.iter().take(5).map(String::as_str).collect();
        ConsistencyReport {
            consistent: true,
            message: format!("Recipe uses valid ingredients: {}", preview.join(", ")),
            mentioned,
        }
    }
}

/// Constraint scan plus consistency check. An output hallucinates when it
/// breaks the constraint or mentions nothing from its sources.
pub fn evaluate_hallucinations(
    text: &str,
    constraint: DietaryConstraint,
    source_ingredients: &IngredientSet,
) -> HallucinationReport {
    let constraint_violation = check_constraint(text, &constraint.hallucination_keywords());
    let ingredient_consistency =
        check_ingredient_consistency(text, source_ingredients, constraint.substitutions());
    let has_hallucination = constraint_violation.violated || !ingredient_consistency.consistent;

    HallucinationReport {
        constraint_violation,
        ingredient_consistency,
        has_hallucination,
    }
}
