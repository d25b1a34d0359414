pub mod data_loader;
pub mod graph;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub use data_loader::{load_pairs_dataset, load_toy_recipes, PairsDataset, RecipePair};
pub use graph::{GraphAction, GraphEdge, GraphIngredient, GraphIssue, EdgeRole, RecipeGraph};

/// Set of lowercased, trimmed ingredient names.
pub type IngredientSet = BTreeSet<String>;

/// Recipe ids are integers in the pairs dataset and strings in the toy dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipeId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeId::Numeric(id) => write!(f, "{}", id),
            RecipeId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// The two on-disk recipe shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipeBody {
    /// Toy shape: free text plus a bipartite ingredient/action graph.
    Graph { text: String, graph: RecipeGraph },
    /// Pairs shape: flat ingredient list plus a steps string.
    Flat {
        ingredients: Vec<String>,
        #[serde(default)]
        steps: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecipeId>,
    pub name: String,
    #[serde(flatten)]
    pub body: RecipeBody,
}

impl Recipe {
    pub fn flat(name: impl Into<String>, ingredients: &[&str], steps: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            body: RecipeBody::Flat {
                ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
                steps: steps.into(),
            },
        }
    }

    pub fn with_id(mut self, id: RecipeId) -> Self {
        self.id = Some(id);
        self
    }

    /// Identity used by ID-indexed retrieval: the id when present, else the name.
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => self.name.clone(),
        }
    }

    /// Ingredient names in recipe order, as written.
    pub fn ingredients(&self) -> Vec<String> {
        match &self.body {
            RecipeBody::Graph { graph, .. } => {
                graph.ingredients.iter().map(|i| i.name.clone()).collect()
            }
            RecipeBody::Flat { ingredients, .. } => ingredients.clone(),
        }
    }

    pub fn ingredient_set(&self) -> IngredientSet {
        self.ingredients()
            .iter()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Step text for flat recipes, full text for graph recipes.
    pub fn steps(&self) -> &str {
        match &self.body {
            RecipeBody::Graph { text, .. } => text,
            RecipeBody::Flat { steps, .. } => steps,
        }
    }

    pub fn graph(&self) -> Option<&RecipeGraph> {
        match &self.body {
            RecipeBody::Graph { graph, .. } => Some(graph),
            RecipeBody::Flat { .. } => None,
        }
    }
}
