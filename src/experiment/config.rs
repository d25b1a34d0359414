use serde::{Deserialize, Serialize};

use crate::grounding::{DietaryConstraint, ValidityPolicy};
use crate::retrieval::DEFAULT_ALPHA;

pub const DEFAULT_NUM_EXAMPLES: usize = 500;
pub const DEFAULT_ABLATION_NUM_EXAMPLES: usize = 1000;
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_TOP_K_VALUES: &[usize] = &[3, 5];
pub const DEFAULT_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_SEED: u64 = 42;
/// Log progress every this many finished examples.
pub const PROGRESS_INTERVAL: usize = 10;

/// Resolved settings of one run, written into the result file metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub num_examples: usize,
    pub top_k: usize,
    pub alpha: f64,
    pub model: String,
    pub provider: String,
    pub constraint: DietaryConstraint,
    pub random_seed: u64,
    pub use_lemma: bool,
    pub workers: usize,
    pub validity_policy: ValidityPolicy,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            num_examples: DEFAULT_NUM_EXAMPLES,
            top_k: DEFAULT_TOP_K,
            alpha: DEFAULT_ALPHA,
            model: DEFAULT_MODEL.to_string(),
            provider: "ollama".to_string(),
            constraint: DietaryConstraint::Vegetarian,
            random_seed: DEFAULT_SEED,
            use_lemma: true,
            workers: 1,
            validity_policy: ValidityPolicy::default(),
        }
    }
}

impl ExperimentConfig {
    /// Same run settings with a different retrieval depth.
    pub fn with_top_k(&self, top_k: usize) -> Self {
        Self {
            top_k,
            ..self.clone()
        }
    }
}
