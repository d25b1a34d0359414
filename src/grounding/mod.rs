pub mod checker;
pub mod constraint;
pub mod extractor;
pub mod hallucination;
pub mod normalizer;
pub mod phrase_parser;

pub use checker::{
    check_constraint, check_grounding, EvaluationResult, GroundingReport, ValidityPolicy,
    ViolationChecker, ViolationReport,
};
pub use constraint::DietaryConstraint;
pub use extractor::{ExtractionConfig, IngredientExtractor};
pub use hallucination::{
    check_ingredient_consistency, evaluate_hallucinations, ConsistencyReport, HallucinationReport,
};
pub use normalizer::{Lemmatizer, Normalizer, RuleLemmatizer};
pub use phrase_parser::{PhraseParseError, PhraseParser, RuleParser};
