use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use super::config::PROGRESS_INTERVAL;
use super::record::{BaseRecipeRef, ExampleFailure, ExampleOutcome, ExperimentRecord, StrategyRun};
use crate::api_connection::ApiConnectionError;
use crate::generation::{Generator, TextGenerator};
use crate::grounding::{DietaryConstraint, ViolationChecker};
use crate::recipe::Recipe;
use crate::retrieval::{allowed_ingredients, RetrievedSummary, Retriever};

/// Picks `n` bases with a seeded RNG. Asking for more than exist returns all
/// of them in dataset order.
pub fn sample_bases(bases: &[Recipe], n: usize, seed: u64) -> Vec<Recipe> {
    if n > bases.len() {
        warn!(
            requested = n,
            available = bases.len(),
            "more examples requested than available, using all"
        );
        return bases.to_vec();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    bases.choose_multiple(&mut rng, n).cloned().collect()
}

/// Read-only state shared by every example of a run.
pub struct ExperimentContext {
    pub corpus: Vec<Recipe>,
    pub checker: ViolationChecker,
    pub constraint: DietaryConstraint,
    pub use_lemma: bool,
}

/// Retrieve, generate with both strategies, evaluate both.
pub async fn run_example<G: TextGenerator>(
    generator: &Generator<G>,
    context: &ExperimentContext,
    retriever: Retriever,
    example_id: usize,
    base: &Recipe,
) -> Result<ExperimentRecord, ApiConnectionError> {
    let retrieved = retriever.retrieve_similar(base, &context.corpus);
    let allowed = allowed_ingredients(&retrieved);
    let references: Vec<&Recipe> = retrieved.iter().map(|scored| scored.recipe).collect();

    let baseline = generator.baseline(base, &references, context.constraint).await?;
    let grounded = generator
        .grounded(base, &references, &allowed, context.constraint)
        .await?;

    let use_lemma = Some(context.use_lemma);
    let baseline_eval = context.checker.evaluate_with(&baseline.text, &allowed, use_lemma);
    let grounded_eval = context.checker.evaluate_with(&grounded.text, &allowed, use_lemma);

    Ok(ExperimentRecord {
        example_id,
        base_recipe: BaseRecipeRef::from(base),
        retrieved_recipes: retrieved.iter().map(RetrievedSummary::from).collect(),
        allowed_ingredients: allowed.into_iter().collect(),
        baseline: StrategyRun::new(baseline, baseline_eval),
        grounded: StrategyRun::new(grounded, grounded_eval),
    })
}

fn failure(example_id: usize, base: &Recipe, error: String) -> ExampleOutcome {
    ExampleOutcome::Failed(ExampleFailure {
        example_id,
        base_recipe: BaseRecipeRef::from(base),
        error,
    })
}

/// Fans examples out over at most `workers` concurrent tasks. A failing
/// example is recorded in place and never stops the batch.
pub struct ExperimentRunner<G> {
    generator: Generator<G>,
    context: Arc<ExperimentContext>,
    workers: usize,
}

impl<G: TextGenerator> ExperimentRunner<G> {
    pub fn new(generator: Generator<G>, context: ExperimentContext, workers: usize) -> Self {
        Self {
            generator,
            context: Arc::new(context),
            workers: workers.max(1),
        }
    }

    /// Outcomes ordered by example id (1-based position in `bases`).
    pub async fn run(&self, bases: &[Recipe], retriever: Retriever) -> Vec<ExampleOutcome> {
        let total = bases.len();
        let permits = Arc::new(Semaphore::new(self.workers));
        let (tx, mut rx) = mpsc::channel(self.workers * 2);

        for (idx, base) in bases.iter().enumerate() {
            let example_id = idx + 1;
            let permits = Arc::clone(&permits);
            let tx = tx.clone();
            let generator = self.generator.clone();
            let context = Arc::clone(&self.context);
            let base = base.clone();

            tokio::spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => {
                        match run_example(&generator, &context, retriever, example_id, &base).await {
                            Ok(record) => ExampleOutcome::Completed(Box::new(record)),
                            Err(err) => {
                                warn!(example_id, recipe = %base.name, error = %err, "example failed");
                                failure(example_id, &base, err.to_string())
                            }
                        }
                    }
                    Err(err) => failure(example_id, &base, err.to_string()),
                };
                if tx.send(outcome).await.is_err() {
                    debug!(example_id, "result channel closed");
                }
            });
        }
        drop(tx);

        let mut outcomes = BTreeMap::new();
        while let Some(outcome) = rx.recv().await {
            let done = outcomes.len() + 1;
            if done == 1 || done % PROGRESS_INTERVAL == 0 || done == total {
                info!(done, total, top_k = retriever.top_k, "examples finished");
            }
            outcomes.insert(outcome.example_id(), outcome);
        }

        bases
            .iter()
            .enumerate()
            .map(|(idx, base)| {
                outcomes.remove(&(idx + 1)).unwrap_or_else(|| {
                    failure(idx + 1, base, "worker task ended without a result".to_string())
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::{IngredientExtractor, Normalizer, ValidityPolicy};

    struct EchoGenerator;

    impl TextGenerator for EchoGenerator {
        async fn generate(&self, _model: &str, prompt: &str) -> Result<String, ApiConnectionError> {
            if prompt.contains("Broken Pie") {
                return Err(ApiConnectionError::EmptyResponse);
            }
            if prompt.contains("ALLOWED INGREDIENTS") {
                Ok("Ingredients:\n- chickpeas\n- onion\n\nSteps:\n1. Cook.".to_string())
            } else {
                Ok("Ingredients:\n- chicken\n- saffron\n\nSteps:\n1. Cook.".to_string())
            }
        }
    }

    fn context() -> anyhow::Result<ExperimentContext> {
        Ok(ExperimentContext {
            corpus: vec![
                Recipe::flat("Chickpea Curry", &["chickpeas", "curry powder", "onion"], "Simmer."),
                Recipe::flat("Lentil Soup", &["lentils", "onion"], "Boil."),
            ],
            checker: ViolationChecker::new(
                IngredientExtractor::with_rules()?,
                Normalizer::default(),
                DietaryConstraint::Vegetarian,
                ValidityPolicy::default(),
            ),
            constraint: DietaryConstraint::Vegetarian,
            use_lemma: true,
        })
    }

    #[test]
    fn test_sampling_is_seeded() {
        let bases: Vec<Recipe> = (0..20)
            .map(|i| Recipe::flat(format!("Dish {}", i), &["x"], ""))
            .collect();
        let first: Vec<String> = sample_bases(&bases, 5, 42).into_iter().map(|r| r.name).collect();
        let second: Vec<String> = sample_bases(&bases, 5, 42).into_iter().map(|r| r.name).collect();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert_eq!(sample_bases(&bases, 50, 42).len(), 20);
    }

    #[tokio::test]
    async fn test_failed_example_is_recorded_and_batch_continues() -> anyhow::Result<()> {
        let generator = Generator::new(Arc::new(EchoGenerator), "test-model");
        let runner = ExperimentRunner::new(generator, context()?, 3);
        let bases = vec![
            Recipe::flat("Chicken Curry", &["chicken", "curry powder", "onion"], "Cook."),
            Recipe::flat("Broken Pie", &["pork"], "Bake."),
            Recipe::flat("Beef Soup", &["beef", "onion"], "Boil."),
        ];

        let outcomes = runner.run(&bases, Retriever::new(1, 0.4)).await;

        let ids: Vec<usize> = outcomes.iter().map(ExampleOutcome::example_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(outcomes[1].is_failure());

        let record = outcomes[0].record().ok_or_else(|| anyhow::anyhow!("missing record"))?;
        assert_eq!(record.retrieved_recipes[0].name, "Chickpea Curry");
        assert_eq!(record.allowed_ingredients, vec!["chickpeas", "curry powder", "onion"]);
        assert!(record.baseline.evaluation.constraint_check.violated);
        assert_eq!(record.baseline.evaluation.grounding_check.report.items, vec!["chicken", "saffron"]);
        assert!(record.grounded.evaluation.overall_valid);
        assert_eq!(record.grounded.evaluation.grounding_check.report.count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_single_worker_matches_parallel() -> anyhow::Result<()> {
        let bases = vec![
            Recipe::flat("Chicken Curry", &["chicken", "curry powder", "onion"], "Cook."),
            Recipe::flat("Beef Soup", &["beef", "onion"], "Boil."),
        ];
        let sequential = ExperimentRunner::new(Generator::new(Arc::new(EchoGenerator), "m"), context()?, 1)
            .run(&bases, Retriever::default())
            .await;
        let parallel = ExperimentRunner::new(Generator::new(Arc::new(EchoGenerator), "m"), context()?, 4)
            .run(&bases, Retriever::default())
            .await;
        assert_eq!(sequential, parallel);
        Ok(())
    }
}
