use recipe_grounding::api_connection::ApiConnectionError;
use recipe_grounding::experiment::report::load_result_file;
use recipe_grounding::experiment::{
    compute_summary, result_file_name, sample_bases, save_json, ExperimentConfig,
    ExperimentContext, ExperimentRunner, ResultFile, RunMetadata,
};
use recipe_grounding::generation::{Generator, TextGenerator};
use recipe_grounding::grounding::{
    DietaryConstraint, IngredientExtractor, Normalizer, ValidityPolicy, ViolationChecker,
};
use recipe_grounding::recipe::load_pairs_dataset;
use recipe_grounding::retrieval::Retriever;
use std::io::Write;
use std::sync::Arc;
use tempfile::{tempdir, NamedTempFile};

/// Baseline prompts get a meaty answer with extra ingredients, grounded
/// prompts (which carry the allow-list) stay inside it.
struct ScriptedGenerator;

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _model: &str, prompt: &str) -> Result<String, ApiConnectionError> {
        if prompt.contains("ALLOWED INGREDIENTS") {
            Ok("**Ingredients:**\n- Chickpeas\n- Onions\n\n**Steps:**\n1. Simmer everything.".to_string())
        } else {
            Ok("Ingredients:\n- chicken\n- ghee\n- saffron\n\nInstructions:\n1. Fry.".to_string())
        }
    }
}

const DATASET: &str = r#"{
    "metadata": {"source": "test"},
    "pairs": [
        {
            "base": {"id": 1, "name": "Chicken Curry", "ingredients": ["chicken", "curry powder", "onion"], "steps": "Cook."},
            "target": {"id": 2, "name": "Chickpea Curry", "ingredients": ["chickpeas", "curry powder", "onion"], "steps": "Simmer."}
        },
        {
            "base": {"id": 3, "name": "Beef Stew", "ingredients": ["beef", "carrot"], "steps": "Stew."},
            "target": {"id": 4, "name": "Lentil Stew", "ingredients": ["lentils", "carrot"], "steps": "Stew."}
        }
    ]
}"#;

fn write_dataset() -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{}", DATASET)?;
    file.flush()?;
    Ok(file)
}

fn checker() -> anyhow::Result<ViolationChecker> {
    Ok(ViolationChecker::new(
        IngredientExtractor::with_rules()?,
        Normalizer::with_rules(true),
        DietaryConstraint::Vegetarian,
        ValidityPolicy::ConstraintOnly,
    ))
}

#[tokio::test]
async fn test_grounded_experiment_end_to_end() -> anyhow::Result<()> {
    let dataset_file = write_dataset()?;
    let dataset = load_pairs_dataset(dataset_file.path())?;
    let bases = sample_bases(&dataset.bases(), 2, 42);
    assert_eq!(bases.len(), 2);

    let context = ExperimentContext {
        corpus: dataset.corpus(),
        checker: checker()?,
        constraint: DietaryConstraint::Vegetarian,
        use_lemma: true,
    };
    let generator = Generator::new(Arc::new(ScriptedGenerator), "scripted");
    let runner = ExperimentRunner::new(generator, context, 2);

    let results = runner.run(&bases, Retriever::new(1, 0.4)).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|outcome| !outcome.is_failure()));

    let curry = results
        .iter()
        .filter_map(|outcome| outcome.record())
        .find(|record| record.base_recipe.name == "Chicken Curry")
        .ok_or_else(|| anyhow::anyhow!("Chicken Curry record missing"))?;
    assert_eq!(curry.retrieved_recipes.len(), 1);
    assert_eq!(curry.retrieved_recipes[0].name, "Chickpea Curry");
    assert!((curry.retrieved_recipes[0].score - 0.4).abs() < 1e-9);
    assert_eq!(
        curry.allowed_ingredients,
        vec!["chickpeas", "curry powder", "onion"]
    );

    assert!(curry.baseline.evaluation.constraint_check.violated);
    assert!(!curry.baseline.evaluation.overall_valid);
    assert_eq!(
        curry.baseline.evaluation.grounding_check.report.items,
        vec!["chicken", "ghee", "saffron"]
    );
    // Plural and case differences are absorbed by lemmatization.
    assert!(curry.grounded.evaluation.overall_valid);
    assert!(!curry.grounded.evaluation.grounding_check.report.violated);

    let summary = compute_summary(&results).ok_or_else(|| anyhow::anyhow!("no summary"))?;
    assert_eq!(summary.num_examples, 2);
    assert_eq!(summary.num_errors, 0);
    assert_eq!(summary.baseline.violation_rate, 1.0);
    assert_eq!(summary.grounded.violation_rate, 0.0);
    assert_eq!(summary.baseline.avg_novel_ingredients, 3.0);
    // The stew's grounded answer is off its own allow-list.
    assert_eq!(summary.grounded.avg_novel_ingredients, 1.0);
    assert!((summary.novel_reduction_percent() - 66.667).abs() < 1e-3);

    let results_dir = tempdir()?;
    let timestamp = "20240101_120000";
    let file = ResultFile {
        metadata: RunMetadata {
            timestamp: timestamp.to_string(),
            config: ExperimentConfig {
                num_examples: bases.len(),
                top_k: 1,
                ..ExperimentConfig::default()
            },
        },
        summary: Some(summary),
        results,
    };
    let path = save_json(results_dir.path(), &result_file_name(None, timestamp), &file).await?;
    assert!(path.ends_with("grounded_exp_20240101_120000.json"));

    let reloaded = load_result_file(&path).await?;
    assert_eq!(reloaded.metadata.config.top_k, 1);
    assert_eq!(reloaded.summary, file.summary);
    let reloaded_ids: Vec<usize> = reloaded.results.iter().map(|o| o.example_id()).collect();
    assert_eq!(reloaded_ids, vec![1, 2]);
    assert!(reloaded.results.iter().all(|outcome| outcome.record().is_some()));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_service_is_recorded_per_example() -> anyhow::Result<()> {
    struct DownGenerator;

    impl TextGenerator for DownGenerator {
        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ApiConnectionError> {
            Err(ApiConnectionError::UnsupportedProvider("offline".to_string()))
        }
    }

    let dataset_file = write_dataset()?;
    let dataset = load_pairs_dataset(dataset_file.path())?;
    let context = ExperimentContext {
        corpus: dataset.corpus(),
        checker: checker()?,
        constraint: DietaryConstraint::Vegetarian,
        use_lemma: true,
    };
    let runner = ExperimentRunner::new(Generator::new(Arc::new(DownGenerator), "m"), context, 1);

    let results = runner.run(&dataset.bases(), Retriever::default()).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|outcome| outcome.is_failure()));
    assert!(compute_summary(&results).is_none());
    Ok(())
}
