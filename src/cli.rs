use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::api_connection::DEFAULT_MAX_ATTEMPTS;
use crate::experiment::config::{
    DEFAULT_ABLATION_NUM_EXAMPLES, DEFAULT_MODEL, DEFAULT_NUM_EXAMPLES, DEFAULT_SEED, DEFAULT_TOP_K,
};
use crate::grounding::{DietaryConstraint, ValidityPolicy};
use crate::retrieval::DEFAULT_ALPHA;

#[derive(Parser, Debug)]
#[command(
    name = "recipe_grounding",
    author,
    version,
    about = "Grounded recipe adaptation experiments",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Baseline vs grounded adaptation over sampled recipe pairs
    Grounded(GroundedArgs),
    /// The grounded experiment repeated for several retrieval depths
    Ablation(AblationArgs),
    /// Text-RAG vs graph-RAG on the toy graph dataset
    Cc(CcArgs),
    /// Evaluate one generated recipe against an allowed-ingredient list
    Check(CheckArgs),
    /// Validate the recipe graphs of the toy dataset
    Validate(ValidateArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProviderKind {
    Ollama,
    Openrouter,
}

#[derive(Args, Debug, Clone)]
pub struct GenerationArgs {
    #[arg(long, value_enum, default_value_t = ProviderKind::Ollama)]
    pub provider: ProviderKind,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Environment variable holding the OpenRouter key
    #[arg(long, default_value = "OPENROUTER_API_KEY")]
    pub api_key_env: String,

    /// Per-request timeout
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluationArgs {
    #[arg(long, value_enum, default_value_t = DietaryConstraint::Vegetarian)]
    pub constraint: DietaryConstraint,

    /// Compare ingredients without lemmatization
    #[arg(long, default_value_t = false)]
    pub no_lemma: bool,

    #[arg(long, value_enum, default_value_t = ValidityPolicy::ConstraintOnly)]
    pub validity_policy: ValidityPolicy,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Recipe pairs dataset (`{"metadata": .., "pairs": [..]}`)
    #[arg(long, default_value = "data/recipepairs_veg_eval.json")]
    pub dataset: PathBuf,

    /// Weight of ingredient overlap in the retrieval score, in [0, 1]
    #[arg(long, default_value_t = DEFAULT_ALPHA, value_parser = parse_alpha)]
    pub alpha: f64,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Examples processed concurrently
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct GroundedArgs {
    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub generation: GenerationArgs,

    #[command(flatten)]
    pub evaluation: EvaluationArgs,

    #[arg(long, default_value_t = DEFAULT_NUM_EXAMPLES)]
    pub num_examples: usize,

    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,
}

#[derive(Args, Debug, Clone)]
pub struct AblationArgs {
    #[command(flatten)]
    pub run: RunArgs,

    #[command(flatten)]
    pub generation: GenerationArgs,

    #[command(flatten)]
    pub evaluation: EvaluationArgs,

    #[arg(long, default_value_t = DEFAULT_ABLATION_NUM_EXAMPLES)]
    pub num_examples: usize,

    /// Retrieval depths to compare; repeatable. Defaults to 3 and 5.
    #[arg(long = "top-k")]
    pub top_k_values: Vec<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct CcArgs {
    #[command(flatten)]
    pub generation: GenerationArgs,

    /// Toy dataset (`{"recipes": [..]}`)
    #[arg(long, default_value = "data/recipes.json")]
    pub dataset: PathBuf,

    /// Query recipe ids; repeatable. Defaults to recipe_001 and recipe_003.
    #[arg(long = "query-id")]
    pub query_ids: Vec<String>,

    #[arg(long, value_enum, default_value_t = DietaryConstraint::Vegetarian)]
    pub constraint: DietaryConstraint,

    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Path to the generated recipe text file
    #[arg(short, long)]
    pub recipe_file: PathBuf,

    /// Allowed ingredients, comma separated
    #[arg(long, value_delimiter = ',')]
    pub allowed: Vec<String>,

    /// File with one allowed ingredient per line
    #[arg(long)]
    pub allowed_file: Option<PathBuf>,

    #[command(flatten)]
    pub evaluation: EvaluationArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = "data/recipes.json")]
    pub dataset: PathBuf,
}

fn parse_alpha(value: &str) -> Result<f64, String> {
    let alpha: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if (0.0..=1.0).contains(&alpha) {
        Ok(alpha)
    } else {
        Err(format!("alpha must be between 0 and 1, got {}", alpha))
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grounded_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["recipe_grounding", "grounded"])?;
        let Commands::Grounded(args) = cli.command else {
            anyhow::bail!("expected grounded subcommand");
        };
        assert_eq!(args.num_examples, 500);
        assert_eq!(args.top_k, 3);
        assert_eq!(args.run.alpha, 0.4);
        assert_eq!(args.run.seed, 42);
        assert_eq!(args.generation.model, "llama3.2:3b");
        assert_eq!(args.generation.provider, ProviderKind::Ollama);
        assert_eq!(args.evaluation.constraint, DietaryConstraint::Vegetarian);
        assert!(!args.evaluation.no_lemma);
        Ok(())
    }

    #[test]
    fn test_alpha_outside_unit_interval_is_rejected() -> anyhow::Result<()> {
        assert!(Cli::try_parse_from(["recipe_grounding", "grounded", "--alpha", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["recipe_grounding", "grounded", "--alpha", "-0.1"]).is_err());
        assert!(Cli::try_parse_from(["recipe_grounding", "grounded", "--alpha", "NaN"]).is_err());

        let cli = Cli::try_parse_from(["recipe_grounding", "ablation", "--alpha", "1"])?;
        let Commands::Ablation(args) = cli.command else {
            anyhow::bail!("expected ablation subcommand");
        };
        assert_eq!(args.run.alpha, 1.0);
        Ok(())
    }

    #[test]
    fn test_ablation_repeated_top_k() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "recipe_grounding",
            "ablation",
            "--top-k",
            "2",
            "--top-k",
            "8",
            "--constraint",
            "gluten-free",
        ])?;
        let Commands::Ablation(args) = cli.command else {
            anyhow::bail!("expected ablation subcommand");
        };
        assert_eq!(args.top_k_values, vec![2, 8]);
        assert_eq!(args.num_examples, 1000);
        assert_eq!(args.evaluation.constraint, DietaryConstraint::GlutenFree);
        Ok(())
    }

    #[test]
    fn test_check_allowed_list_is_comma_separated() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "recipe_grounding",
            "check",
            "-r",
            "out.txt",
            "--allowed",
            "tofu,onion",
            "--validity-policy",
            "constraint-and-grounding",
        ])?;
        let Commands::Check(args) = cli.command else {
            anyhow::bail!("expected check subcommand");
        };
        assert_eq!(args.allowed, vec!["tofu", "onion"]);
        assert_eq!(args.evaluation.validity_policy, ValidityPolicy::ConstraintAndGrounding);
        Ok(())
    }
}
