use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::constraint::DietaryConstraint;
use super::extractor::IngredientExtractor;
use super::normalizer::Normalizer;
use crate::recipe::IngredientSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationReport {
    pub violated: bool,
    pub items: Vec<String>,
    pub count: usize,
}

impl ViolationReport {
    pub fn from_items(items: Vec<String>) -> Self {
        Self {
            violated: !items.is_empty(),
            count: items.len(),
            items,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingReport {
    #[serde(flatten)]
    pub report: ViolationReport,
    /// Number of ingredients extracted from the output, before normalization.
    pub extracted_count: usize,
}

/// Decides which checks gate `overall_valid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ValidityPolicy {
    /// Grounding violations are reported but never reject an output.
    #[default]
    ConstraintOnly,
    ConstraintAndGrounding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub extracted_ingredients: Vec<String>,
    pub constraint_check: ViolationReport,
    pub grounding_check: GroundingReport,
    pub overall_valid: bool,
}

/// Case-insensitive substring scan of the whole text. Each matched keyword is
/// listed once, in keyword order.
pub fn check_constraint<S: AsRef<str>>(text: &str, forbidden: &[S]) -> ViolationReport {
    let lower = text.to_lowercase();
    let found = forbidden
        .iter()
        .map(|s| s.as_ref())
        .filter(|keyword| !keyword.is_empty() && lower.contains(&keyword.to_lowercase()))
        .map(str::to_string)
        .collect();
    ViolationReport::from_items(found)
}

/// Marks every extracted ingredient whose normalized form is missing from the
/// normalized allowed set. Ingredients that normalize to the same form are
/// counted once, reported under the first spelling seen.
pub fn check_grounding<S: AsRef<str>>(
    normalizer: &Normalizer,
    extracted: &[S],
    allowed: &IngredientSet,
    use_lemma: Option<bool>,
) -> GroundingReport {
    let allowed_norm = normalizer.normalize_set(allowed, use_lemma);

    let mut seen = HashSet::new();
    let novel = extracted
        .iter()
        .map(|s| s.as_ref())
        .filter(|ing| {
            let norm = normalizer.normalize(ing, use_lemma);
            seen.insert(norm.clone()) && !allowed_norm.contains(&norm)
        })
        .map(str::to_string)
        .collect();

    GroundingReport {
        report: ViolationReport::from_items(novel),
        extracted_count: extracted.len(),
    }
}

/// Runs extraction once, then the constraint and grounding checks on the result.
#[derive(Clone)]
pub struct ViolationChecker {
    extractor: IngredientExtractor,
    normalizer: Normalizer,
    forbidden: Vec<String>,
    policy: ValidityPolicy,
}

impl ViolationChecker {
    pub fn new(
        extractor: IngredientExtractor,
        normalizer: Normalizer,
        constraint: DietaryConstraint,
        policy: ValidityPolicy,
    ) -> Self {
        Self {
            extractor,
            normalizer,
            forbidden: constraint.forbidden_keywords(),
            policy,
        }
    }

    pub fn evaluate(&self, text: &str, allowed: &IngredientSet) -> EvaluationResult {
        self.evaluate_with(text, allowed, None)
    }

    pub fn evaluate_with(
        &self,
        text: &str,
        allowed: &IngredientSet,
        use_lemma: Option<bool>,
    ) -> EvaluationResult {
        let extracted = self.extractor.extract(text);
        let constraint_check = check_constraint(text, &self.forbidden);
        let grounding_check = check_grounding(&self.normalizer, &extracted, allowed, use_lemma);

        let overall_valid = match self.policy {
            ValidityPolicy::ConstraintOnly => !constraint_check.violated,
            ValidityPolicy::ConstraintAndGrounding => {
                !constraint_check.violated && !grounding_check.report.violated
            }
        };

        EvaluationResult {
            extracted_ingredients: extracted,
            constraint_check,
            grounding_check,
            overall_valid,
        }
    }
}
