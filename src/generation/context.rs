use crate::recipe::Recipe;

pub fn format_query_recipe(query: &Recipe) -> String {
    format!(
        "Name: {}\nIngredients: {}\nSteps: {}",
        query.name,
        query.ingredients().join(", "),
        query.steps()
    )
}

/// Numbered name/ingredients/steps blocks, one blank line after each.
pub fn format_retrieved_context(recipes: &[&Recipe]) -> String {
    let mut parts = Vec::with_capacity(recipes.len() * 4);
    for (i, recipe) in recipes.iter().enumerate() {
        parts.push(format!("Recipe {}: {}", i + 1, recipe.name));
        parts.push(format!("Ingredients: {}", recipe.ingredients().join(", ")));
        parts.push(format!("Steps: {}", recipe.steps()));
        parts.push(String::new());
    }
    parts.join("\n")
}

pub fn format_text_rag_context(recipes: &[&Recipe]) -> String {
    let mut parts = Vec::with_capacity(recipes.len() * 3);
    for recipe in recipes {
        parts.push(format!("Recipe: {}", recipe.name));
        parts.push(format!("Text: {}", recipe.steps()));
        parts.push(String::new());
    }
    parts.join("\n")
}

/// Renders each recipe graph as one line per action:
/// `Step i. verb → name (quantity unit state) [role], ...`.
/// Flat recipes have no structure and only contribute their header.
pub fn format_graph_rag_context(recipes: &[&Recipe]) -> String {
    let mut parts = Vec::new();
    for recipe in recipes {
        parts.push(format!("Recipe: {}", recipe.name));
        parts.push("Structure:".to_string());

        if let Some(graph) = recipe.graph() {
            for action in &graph.actions {
                let described: Vec<String> = graph
                    .edges_from(&action.id)
                    .filter_map(|edge| {
                        let ingredient = graph.ingredient(&edge.target)?;
                        let details: Vec<String> = [
                            edge.quantity_text(),
                            edge.unit.clone().filter(|u| !u.is_empty()),
                            edge.state.clone().filter(|s| !s.is_empty()),
                        ]
                        .into_iter()
                        .flatten()
                        .collect();

                        let mut line = ingredient.name.clone();
                        if !details.is_empty() {
                            line.push_str(&format!(" ({})", details.join(" ")));
                        }
                        line.push_str(&format!(" [{}]", edge.role));
                        Some(line)
                    })
                    .collect();

                let listed = if described.is_empty() {
                    "—".to_string()
                } else {
                    described.join(", ")
                };
                parts.push(format!("  Step {}. {} → {}", action.step_index, action.verb, listed));
            }
        }

        parts.push(String::new());
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn graph_recipe() -> Result<Recipe> {
        let recipe = serde_json::from_value(serde_json::json!({
            "id": "recipe_002",
            "name": "Chickpea Curry",
            "text": "Fry the onion, then simmer chickpeas.",
            "graph": {
                "ingredients": [
                    {"id": "i1", "name": "onion"},
                    {"id": "i2", "name": "chickpeas"}
                ],
                "actions": [
                    {"id": "a1", "verb": "fry", "step_index": 1},
                    {"id": "a2", "verb": "simmer", "step_index": 2},
                    {"id": "a3", "verb": "serve", "step_index": 3}
                ],
                "edges": [
                    {"source": "a1", "target": "i1", "role": "input", "quantity": 1, "state": "diced"},
                    {"source": "a2", "target": "i2", "role": "input", "quantity": "400", "unit": "g"}
                ]
            }
        }))?;
        Ok(recipe)
    }

    #[test]
    fn test_query_format() {
        let query = Recipe::flat("Chicken Curry", &["chicken", "onion"], "Cook it.");
        assert_eq!(
            format_query_recipe(&query),
            "Name: Chicken Curry\nIngredients: chicken, onion\nSteps: Cook it."
        );
    }

    #[test]
    fn test_retrieved_context_numbers_recipes() {
        let a = Recipe::flat("Dal", &["lentils", "onion"], "Simmer.");
        let b = Recipe::flat("Salad", &["lettuce"], "Toss.");
        let context = format_retrieved_context(&[&a, &b]);
        assert_eq!(
            context,
            "Recipe 1: Dal\nIngredients: lentils, onion\nSteps: Simmer.\n\nRecipe 2: Salad\nIngredients: lettuce\nSteps: Toss.\n"
        );
    }

    #[test]
    fn test_text_rag_context() -> Result<()> {
        let recipe = graph_recipe()?;
        assert_eq!(
            format_text_rag_context(&[&recipe]),
            "Recipe: Chickpea Curry\nText: Fry the onion, then simmer chickpeas.\n"
        );
        Ok(())
    }

    #[test]
    fn test_graph_rag_context() -> Result<()> {
        let recipe = graph_recipe()?;
        let context = format_graph_rag_context(&[&recipe]);
        let lines: Vec<&str> = context.lines().collect();
        assert_eq!(lines[0], "Recipe: Chickpea Curry");
        assert_eq!(lines[1], "Structure:");
        assert_eq!(lines[2], "  Step 1. fry → onion (1 diced) [input]");
        assert_eq!(lines[3], "  Step 2. simmer → chickpeas (400 g) [input]");
        assert_eq!(lines[4], "  Step 3. serve → —");
        Ok(())
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(format_retrieved_context(&[]), "");
        assert_eq!(format_graph_rag_context(&[]), "");
    }
}
