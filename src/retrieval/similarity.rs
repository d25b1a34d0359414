use std::collections::BTreeSet;

use crate::recipe::{IngredientSet, Recipe};

/// Weight of ingredient overlap against title overlap in `combined_similarity`.
pub const DEFAULT_ALPHA: f64 = 0.4;

/// `|A ∩ B| / |A ∪ B|`, 0.0 when the union is empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

fn name_tokens(name: &str) -> BTreeSet<String> {
    name.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Jaccard over lowercased whitespace tokens of two recipe titles.
pub fn name_jaccard(name1: &str, name2: &str) -> f64 {
    jaccard(&name_tokens(name1), &name_tokens(name2))
}

/// `alpha * ingredient jaccard + (1 - alpha) * name jaccard`.
pub fn combined_similarity(
    recipe1: &Recipe,
    recipe2: &Recipe,
    ingredients1: &IngredientSet,
    ingredients2: &IngredientSet,
    alpha: f64,
) -> f64 {
    let ingredient_sim = jaccard(ingredients1, ingredients2);
    let name_sim = name_jaccard(&recipe1.name, &recipe2.name);
    alpha * ingredient_sim + (1.0 - alpha) * name_sim
}
