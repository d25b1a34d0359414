use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::similarity::{combined_similarity, jaccard, DEFAULT_ALPHA};
use crate::recipe::{IngredientSet, Recipe};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("Recipe {0} not found in corpus")]
    RecipeNotFound(String),
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredRecipe<'a> {
    pub recipe: &'a Recipe,
    pub score: f64,
}

/// Name and score of a retrieved recipe, as written to result files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedSummary {
    pub name: String,
    pub score: f64,
}

impl<'a> From<&ScoredRecipe<'a>> for RetrievedSummary {
    fn from(scored: &ScoredRecipe<'a>) -> Self {
        Self {
            name: scored.recipe.name.clone(),
            score: scored.score,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    pub top_k: usize,
    pub alpha: f64,
}

impl Default for Retriever {
    fn default() -> Self {
        Self {
            top_k: 3,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl Retriever {
    pub fn new(top_k: usize, alpha: f64) -> Self {
        Self { top_k, alpha }
    }

    /// ID-indexed mode: look the query up by key, exclude it, rank by
    /// ingredient jaccard only.
    pub fn retrieve_by_id<'a>(
        &self,
        query_key: &str,
        corpus: &'a [Recipe],
    ) -> Result<Vec<ScoredRecipe<'a>>, RetrievalError> {
        let query = corpus
            .iter()
            .find(|recipe| recipe.key() == query_key)
            .ok_or_else(|| RetrievalError::RecipeNotFound(query_key.to_string()))?;
        let query_ingredients = query.ingredient_set();

        let scored = corpus
            .par_iter()
            .filter(|recipe| recipe.key() != query_key)
            .map(|recipe| ScoredRecipe {
                recipe,
                score: jaccard(&query_ingredients, &recipe.ingredient_set()),
            })
            .collect();
        Ok(self.rank(scored))
    }

    /// Object mode: self-exclusion by name, ranking by combined similarity.
    pub fn retrieve_similar<'a>(&self, query: &Recipe, corpus: &'a [Recipe]) -> Vec<ScoredRecipe<'a>> {
        let query_ingredients = query.ingredient_set();

        let scored = corpus
            .par_iter()
            .filter(|recipe| recipe.name != query.name)
            .map(|recipe| ScoredRecipe {
                recipe,
                score: combined_similarity(
                    query,
                    recipe,
                    &query_ingredients,
                    &recipe.ingredient_set(),
                    self.alpha,
                ),
            })
            .collect();
        self.rank(scored)
    }

    /// Stable sort keeps corpus order among equal scores.
    fn rank<'a>(&self, mut scored: Vec<ScoredRecipe<'a>>) -> Vec<ScoredRecipe<'a>> {
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(self.top_k);
        scored
    }
}

/// Union of the ingredient sets of all retrieved recipes.
pub fn allowed_ingredients(retrieved: &[ScoredRecipe<'_>]) -> IngredientSet {
    retrieved
        .iter()
        .flat_map(|scored| scored.recipe.ingredient_set())
        .collect()
}
