use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphIngredient {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphAction {
    pub id: String,
    pub verb: String,
    pub step_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRole {
    Input,
    Output,
}

/// Role is kept as raw text so that invalid roles in a dataset can be reported
/// by validation instead of failing the whole load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl GraphEdge {
    pub fn parsed_role(&self) -> Option<EdgeRole> {
        match self.role.as_str() {
            "input" => Some(EdgeRole::Input),
            "output" => Some(EdgeRole::Output),
            _ => None,
        }
    }

    /// Quantity rendered for prompts; numbers and strings are both accepted.
    pub fn quantity_text(&self) -> Option<String> {
        match &self.quantity {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) if s.is_empty() => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeGraph {
    pub ingredients: Vec<GraphIngredient>,
    #[serde(default)]
    pub actions: Vec<GraphAction>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphIssue {
    #[error("Edge source '{0}' is an ingredient, should be an action.")]
    SourceIsIngredient(String),
    #[error("Edge target '{0}' is an action, should be an ingredient.")]
    TargetIsAction(String),
    #[error("Edge source '{0}' does not reference any action.")]
    UnknownSource(String),
    #[error("Edge target '{0}' does not reference any ingredient.")]
    UnknownTarget(String),
    #[error("Edge role '{0}' is invalid. Must be 'input' or 'output'.")]
    InvalidRole(String),
    #[error("Ingredient '{0}' not found in text.")]
    IngredientNotInText(String),
    #[error("Action verb '{0}' not found in text.")]
    ActionNotInText(String),
}

impl RecipeGraph {
    pub fn ingredient(&self, id: &str) -> Option<&GraphIngredient> {
        self.ingredients.iter().find(|ing| ing.id == id)
    }

    pub fn edges_from<'a>(&'a self, action_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == action_id)
    }

    /// Every edge must run action -> ingredient and carry a valid role.
    pub fn check_structure(&self) -> Vec<GraphIssue> {
        let ingredient_ids: HashSet<&str> = self.ingredients.iter().map(|i| i.id.as_str()).collect();
        let action_ids: HashSet<&str> = self.actions.iter().map(|a| a.id.as_str()).collect();

        let mut issues = Vec::new();
        for edge in &self.edges {
            if ingredient_ids.contains(edge.source.as_str()) {
                issues.push(GraphIssue::SourceIsIngredient(edge.source.clone()));
            } else if !action_ids.contains(edge.source.as_str()) {
                issues.push(GraphIssue::UnknownSource(edge.source.clone()));
            }
            if action_ids.contains(edge.target.as_str()) {
                issues.push(GraphIssue::TargetIsAction(edge.target.clone()));
            } else if !ingredient_ids.contains(edge.target.as_str()) {
                issues.push(GraphIssue::UnknownTarget(edge.target.clone()));
            }
            if edge.parsed_role().is_none() {
                issues.push(GraphIssue::InvalidRole(edge.role.clone()));
            }
        }
        issues
    }

    /// Ingredient names must appear in the text, either as written or with a
    /// trailing "s". Independent of the grounding lemmatizer.
    pub fn check_ingredient_coverage(&self, text: &str) -> Vec<GraphIssue> {
        let text = text.to_lowercase();
        self.ingredients
            .iter()
            .map(|ing| ing.name.to_lowercase())
            .filter(|name| !text.contains(name.as_str()) && !text.contains(&format!("{}s", name)))
            .map(GraphIssue::IngredientNotInText)
            .collect()
    }

    pub fn check_action_coverage(&self, text: &str) -> Vec<GraphIssue> {
        let text = text.to_lowercase();
        self.actions
            .iter()
            .map(|action| action.verb.to_lowercase())
            .filter(|verb| !text.contains(verb.as_str()))
            .map(GraphIssue::ActionNotInText)
            .collect()
    }
}
