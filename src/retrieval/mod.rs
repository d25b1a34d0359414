pub mod retriever;
pub mod similarity;

pub use retriever::{allowed_ingredients, RetrievalError, RetrievedSummary, Retriever, ScoredRecipe};
pub use similarity::{combined_similarity, jaccard, name_jaccard, DEFAULT_ALPHA};
