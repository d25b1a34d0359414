pub mod cc;
pub mod config;
pub mod record;
pub mod report;
pub mod runner;
pub mod summary;

pub use cc::{run_cc_experiment, summarize_cc, CcRecord, CcResultFile, CcSummary};
pub use config::ExperimentConfig;
pub use record::{BaseRecipeRef, ExampleFailure, ExampleOutcome, ExperimentRecord, StrategyRun};
pub use report::{result_file_name, save_json, timestamp_now, ResultFile, RunMetadata};
pub use runner::{run_example, sample_bases, ExperimentContext, ExperimentRunner};
pub use summary::{compute_summary, AblationRow, ExperimentSummary, StrategySummary};
