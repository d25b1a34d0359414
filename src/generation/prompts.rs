use super::context::{format_query_recipe, format_retrieved_context};
use crate::grounding::DietaryConstraint;
use crate::recipe::{IngredientSet, Recipe};

/// Adaptation prompt with the retrieved recipes as free inspiration.
pub fn baseline_prompt(query: &Recipe, retrieved: &[&Recipe], constraint: DietaryConstraint) -> String {
    format!(
        "You are a recipe adaptation assistant.

ORIGINAL RECIPE TO ADAPT:
{query}

SIMILAR RECIPES FOR INSPIRATION:
{retrieved}

TASK: Adapt the original recipe to be {constraint}.

Generate the adapted recipe with:
1. A list of ingredients
2. Step-by-step instructions

Adapted recipe:",
        query = format_query_recipe(query),
        retrieved = format_retrieved_context(retrieved),
        constraint = constraint,
    )
}

/// Same skeleton as [`baseline_prompt`] plus the allow-list and the rules
/// restricting the model to it. `allowed` is sorted and deduplicated by type.
pub fn grounded_prompt(
    query: &Recipe,
    retrieved: &[&Recipe],
    allowed: &IngredientSet,
    constraint: DietaryConstraint,
) -> String {
    let allowed_list = allowed.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    format!(
        "You are a recipe adaptation assistant with STRICT ingredient constraints.

ORIGINAL RECIPE TO ADAPT:
{query}

SIMILAR RECIPES FOR REFERENCE:
{retrieved}

ALLOWED INGREDIENTS (use ONLY these):
{allowed_list}

TASK: Adapt the original recipe to be {constraint}.

CRITICAL RULES:
- You MUST use only ingredients from the ALLOWED INGREDIENTS list above.
- Do NOT introduce any new ingredients not in the list.
- If an ingredient is needed but not in the list, find a substitute from the list or omit it.

Generate the adapted recipe with:
1. A list of ingredients (only from allowed list)
2. Step-by-step instructions

Adapted recipe:",
        query = format_query_recipe(query),
        retrieved = format_retrieved_context(retrieved),
        allowed_list = allowed_list,
        constraint = constraint,
    )
}

/// Shared prompt for the text-RAG and graph-RAG styles; only the context differs.
pub fn rag_prompt(context: &str, constraint: DietaryConstraint) -> String {
    format!(
        "You are a recipe adaptation assistant. Given similar recipes and a constraint, generate an adapted recipe.

Similar recipes:
{context}

Constraint: {constraint}

Generate a step-by-step adapted recipe that satisfies the constraint. Be concise and practical.

Adapted recipe:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (Recipe, Recipe, Recipe) {
        (
            Recipe::flat("Chicken Curry", &["chicken", "curry powder", "onion"], "Cook."),
            Recipe::flat("Chickpea Curry", &["chickpeas", "curry powder", "onion"], "Simmer."),
            Recipe::flat("Dal", &["lentils", "onion"], "Boil."),
        )
    }

    #[test]
    fn test_baseline_has_no_allow_list() {
        let (query, a, b) = fixtures();
        let prompt = baseline_prompt(&query, &[&a, &b], DietaryConstraint::Vegetarian);
        assert!(prompt.starts_with("You are a recipe adaptation assistant.\n\nORIGINAL RECIPE TO ADAPT:\nName: Chicken Curry"));
        assert!(prompt.contains("SIMILAR RECIPES FOR INSPIRATION:\nRecipe 1: Chickpea Curry"));
        assert!(prompt.contains("TASK: Adapt the original recipe to be vegetarian."));
        assert!(!prompt.contains("ALLOWED INGREDIENTS"));
        assert!(prompt.ends_with("Adapted recipe:"));
    }

    #[test]
    fn test_grounded_lists_sorted_allowed_ingredients() {
        let (query, a, b) = fixtures();
        let allowed: IngredientSet = a.ingredient_set().union(&b.ingredient_set()).cloned().collect();
        let prompt = grounded_prompt(&query, &[&a, &b], &allowed, DietaryConstraint::GlutenFree);
        assert!(prompt.contains(
            "ALLOWED INGREDIENTS (use ONLY these):\nchickpeas, curry powder, lentils, onion\n"
        ));
        assert!(prompt.contains("to be gluten-free."));
        assert!(prompt.contains("- You MUST use only ingredients from the ALLOWED INGREDIENTS list above."));
        assert!(prompt.ends_with("Adapted recipe:"));
    }

    #[test]
    fn test_rag_prompt_embeds_context() {
        let prompt = rag_prompt("Recipe: Dal\nText: Boil.\n", DietaryConstraint::Vegetarian);
        assert!(prompt.contains("Similar recipes:\nRecipe: Dal\nText: Boil.\n\n\nConstraint: vegetarian"));
    }
}
