use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use recipe_grounding::api_connection::{ChatClient, Provider, DEFAULT_BACKOFF};
use recipe_grounding::cli::{
    parse_args, AblationArgs, CcArgs, CheckArgs, Commands, EvaluationArgs, GenerationArgs,
    GroundedArgs, ProviderKind, RunArgs, ValidateArgs,
};
use recipe_grounding::experiment::cc::{print_cc_summary, DEFAULT_QUERY_IDS};
use recipe_grounding::experiment::config::DEFAULT_TOP_K_VALUES;
use recipe_grounding::experiment::report::{print_ablation_comparison, print_summary};
use recipe_grounding::experiment::{
    compute_summary, result_file_name, run_cc_experiment, sample_bases, save_json, timestamp_now,
    AblationRow, ExperimentConfig, ExperimentContext, ExperimentRunner, ResultFile, RunMetadata,
};
use recipe_grounding::generation::Generator;
use recipe_grounding::grounding::{IngredientExtractor, Normalizer, ViolationChecker};
use recipe_grounding::recipe::{load_pairs_dataset, load_toy_recipes, IngredientSet, Recipe};
use recipe_grounding::retrieval::Retriever;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = parse_args();

    match cli.command {
        Commands::Grounded(args) => run_grounded(args).await,
        Commands::Ablation(args) => run_ablation(args).await,
        Commands::Cc(args) => run_cc(args).await,
        Commands::Check(args) => run_check(args).await,
        Commands::Validate(args) => run_validate(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_generator(args: &GenerationArgs) -> Result<Generator<ChatClient>> {
    let provider = match args.provider {
        ProviderKind::Ollama => Provider::ollama(),
        ProviderKind::Openrouter => Provider::openrouter(&args.api_key_env),
    };
    let client = ChatClient::new(provider, Duration::from_secs(args.timeout_secs))
        .context("Failed to build HTTP client")?
        .with_retries(args.max_attempts, DEFAULT_BACKOFF);
    Ok(Generator::new(Arc::new(client), args.model.clone()))
}

fn build_checker(args: &EvaluationArgs) -> Result<ViolationChecker> {
    Ok(ViolationChecker::new(
        IngredientExtractor::with_rules()?,
        Normalizer::with_rules(!args.no_lemma),
        args.constraint,
        args.validity_policy,
    ))
}

struct PreparedRun {
    runner: ExperimentRunner<ChatClient>,
    bases: Vec<Recipe>,
    config: ExperimentConfig,
}

fn prepare_run(
    run: &RunArgs,
    generation: &GenerationArgs,
    evaluation: &EvaluationArgs,
    num_examples: usize,
    top_k: usize,
) -> Result<PreparedRun> {
    let dataset = load_pairs_dataset(&run.dataset)?;
    let corpus = dataset.corpus();
    let all_bases = dataset.bases();
    info!(corpus = corpus.len(), bases = all_bases.len(), "loaded recipe pairs");

    let bases = sample_bases(&all_bases, num_examples, run.seed);
    info!(sampled = bases.len(), seed = run.seed, "sampled test examples");

    let generator = build_generator(generation)?;
    let config = ExperimentConfig {
        num_examples: bases.len(),
        top_k,
        alpha: run.alpha,
        model: generation.model.clone(),
        provider: generator.client().provider().name().to_string(),
        constraint: evaluation.constraint,
        random_seed: run.seed,
        use_lemma: !evaluation.no_lemma,
        workers: run.workers,
        validity_policy: evaluation.validity_policy,
    };

    let context = ExperimentContext {
        corpus,
        checker: build_checker(evaluation)?,
        constraint: evaluation.constraint,
        use_lemma: config.use_lemma,
    };
    let runner = ExperimentRunner::new(generator, context, run.workers);

    Ok(PreparedRun {
        runner,
        bases,
        config,
    })
}

async fn run_grounded(args: GroundedArgs) -> Result<()> {
    let prepared = prepare_run(
        &args.run,
        &args.generation,
        &args.evaluation,
        args.num_examples,
        args.top_k,
    )?;
    info!(
        examples = prepared.bases.len(),
        top_k = args.top_k,
        model = %prepared.config.model,
        "running baseline vs grounded experiment"
    );

    let retriever = Retriever::new(args.top_k, args.run.alpha);
    let results = prepared.runner.run(&prepared.bases, retriever).await;
    let summary = compute_summary(&results);

    let timestamp = timestamp_now();
    let file = ResultFile {
        metadata: RunMetadata {
            timestamp: timestamp.clone(),
            config: prepared.config,
        },
        summary,
        results,
    };
    save_json(&args.run.results_dir, &result_file_name(None, &timestamp), &file).await?;

    print_summary(file.summary.as_ref(), args.top_k);
    Ok(())
}

async fn run_ablation(args: AblationArgs) -> Result<()> {
    let top_k_values = if args.top_k_values.is_empty() {
        DEFAULT_TOP_K_VALUES.to_vec()
    } else {
        args.top_k_values.clone()
    };
    let first_k = top_k_values.first().copied().unwrap_or_default();
    let prepared = prepare_run(
        &args.run,
        &args.generation,
        &args.evaluation,
        args.num_examples,
        first_k,
    )?;

    let timestamp = timestamp_now();
    let mut rows = Vec::with_capacity(top_k_values.len());
    for (idx, &top_k) in top_k_values.iter().enumerate() {
        info!(top_k, leg = idx + 1, legs = top_k_values.len(), "running ablation leg");

        let retriever = Retriever::new(top_k, args.run.alpha);
        let results = prepared.runner.run(&prepared.bases, retriever).await;
        let summary = compute_summary(&results);

        let file = ResultFile {
            metadata: RunMetadata {
                timestamp: timestamp.clone(),
                config: prepared.config.with_top_k(top_k),
            },
            summary,
            results,
        };
        save_json(
            &args.run.results_dir,
            &result_file_name(Some(top_k), &timestamp),
            &file,
        )
        .await?;

        print_summary(file.summary.as_ref(), top_k);
        match &file.summary {
            Some(summary) => rows.push(AblationRow::new(top_k, summary)),
            None => warn!(top_k, "no completed examples, leaving k out of the comparison"),
        }
    }

    print_ablation_comparison(&rows);
    Ok(())
}

async fn run_cc(args: CcArgs) -> Result<()> {
    let recipes = load_toy_recipes(&args.dataset)?;
    let generator = build_generator(&args.generation)?;
    let query_ids: Vec<String> = if args.query_ids.is_empty() {
        DEFAULT_QUERY_IDS.iter().map(|id| id.to_string()).collect()
    } else {
        args.query_ids.clone()
    };

    let file = run_cc_experiment(&generator, &recipes, &query_ids, args.constraint).await?;
    if let Some(summary) = &file.summary {
        print_cc_summary(summary);
    }

    let file_name = format!("experiment_{}.json", timestamp_now());
    save_json(&args.results_dir, &file_name, &file).await?;
    Ok(())
}

async fn read_allowed(args: &CheckArgs) -> Result<IngredientSet> {
    let mut allowed: IngredientSet = args
        .allowed
        .iter()
        .map(|ing| ing.trim().to_lowercase())
        .filter(|ing| !ing.is_empty())
        .collect();

    if let Some(path) = &args.allowed_file {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read allowed ingredients '{}'", path.display()))?;
        allowed.extend(
            content
                .lines()
                .map(|line| line.trim().to_lowercase())
                .filter(|line| !line.is_empty()),
        );
    }
    Ok(allowed)
}

async fn run_check(args: CheckArgs) -> Result<()> {
    let text = fs::read_to_string(&args.recipe_file)
        .await
        .with_context(|| format!("Failed to read recipe file '{}'", args.recipe_file.display()))?;
    let allowed = read_allowed(&args).await?;
    if allowed.is_empty() {
        warn!("allowed ingredient set is empty, every extracted ingredient will count as novel");
    }

    let checker = build_checker(&args.evaluation)?;
    let result = checker.evaluate(&text, &allowed);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let recipes = load_toy_recipes(&args.dataset)?;
    let mut total_issues = 0;

    for recipe in &recipes {
        let Some(graph) = recipe.graph() else {
            warn!(recipe = %recipe.name, "recipe has no graph, skipping");
            continue;
        };
        let issues: Vec<_> = graph
            .check_structure()
            .into_iter()
            .chain(graph.check_ingredient_coverage(recipe.steps()))
            .chain(graph.check_action_coverage(recipe.steps()))
            .collect();

        if issues.is_empty() {
            println!("{} ({}): OK", recipe.name, recipe.key());
        } else {
            println!("{} ({}):", recipe.name, recipe.key());
            for issue in &issues {
                println!("  - {}", issue);
            }
        }
        total_issues += issues.len();
    }

    println!("\nValidated {} recipes, {} issues found.", recipes.len(), total_issues);
    if total_issues > 0 {
        anyhow::bail!("{} validation issues in {}", total_issues, args.dataset.display());
    }
    Ok(())
}
