use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use super::context::{format_graph_rag_context, format_text_rag_context};
use super::prompts::{baseline_prompt, grounded_prompt, rag_prompt};
use crate::api_connection::ApiConnectionError;
use crate::grounding::DietaryConstraint;
use crate::recipe::{IngredientSet, Recipe};

/// A backing text-generation service: `(model, prompt) -> text`.
pub trait TextGenerator: Send + Sync + 'static {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, ApiConnectionError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Baseline,
    Grounded,
    TextRag,
    GraphRag,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Baseline => "baseline",
            Strategy::Grounded => "grounded",
            Strategy::TextRag => "text_rag",
            Strategy::GraphRag => "graph_rag",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub text: String,
    pub strategy: Strategy,
    pub constraint: DietaryConstraint,
}

/// Builds the prompt for a strategy and returns the service's answer as is.
/// Empty or malformed text is passed through; service errors propagate.
pub struct Generator<G> {
    client: Arc<G>,
    model: String,
}

impl<G> Clone for Generator<G> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            model: self.model.clone(),
        }
    }
}

impl<G: TextGenerator> Generator<G> {
    pub fn new(client: Arc<G>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn client(&self) -> &G {
        &self.client
    }

    pub async fn baseline(
        &self,
        query: &Recipe,
        retrieved: &[&Recipe],
        constraint: DietaryConstraint,
    ) -> Result<GenerationOutput, ApiConnectionError> {
        let prompt = baseline_prompt(query, retrieved, constraint);
        self.complete(Strategy::Baseline, &prompt, constraint).await
    }

    pub async fn grounded(
        &self,
        query: &Recipe,
        retrieved: &[&Recipe],
        allowed: &IngredientSet,
        constraint: DietaryConstraint,
    ) -> Result<GenerationOutput, ApiConnectionError> {
        let prompt = grounded_prompt(query, retrieved, allowed, constraint);
        self.complete(Strategy::Grounded, &prompt, constraint).await
    }

    pub async fn text_rag(
        &self,
        retrieved: &[&Recipe],
        constraint: DietaryConstraint,
    ) -> Result<GenerationOutput, ApiConnectionError> {
        let prompt = rag_prompt(&format_text_rag_context(retrieved), constraint);
        self.complete(Strategy::TextRag, &prompt, constraint).await
    }

    pub async fn graph_rag(
        &self,
        retrieved: &[&Recipe],
        constraint: DietaryConstraint,
    ) -> Result<GenerationOutput, ApiConnectionError> {
        let prompt = rag_prompt(&format_graph_rag_context(retrieved), constraint);
        self.complete(Strategy::GraphRag, &prompt, constraint).await
    }

    async fn complete(
        &self,
        strategy: Strategy,
        prompt: &str,
        constraint: DietaryConstraint,
    ) -> Result<GenerationOutput, ApiConnectionError> {
        debug!(%strategy, model = %self.model, prompt_chars = prompt.len(), "requesting generation");
        let text = self.client.generate(&self.model, prompt).await?;
        Ok(GenerationOutput {
            text,
            strategy,
            constraint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, model: &str, prompt: &str) -> Result<String, ApiConnectionError> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push((model.to_string(), prompt.to_string()));
            }
            Ok(String::new())
        }
    }

    struct DownGenerator;

    impl TextGenerator for DownGenerator {
        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ApiConnectionError> {
            Err(ApiConnectionError::EmptyResponse)
        }
    }

    #[tokio::test]
    async fn test_grounded_sends_allow_list_and_tags_output() -> anyhow::Result<()> {
        let client = Arc::new(RecordingGenerator::default());
        let generator = Generator::new(Arc::clone(&client), "llama3.2:3b");
        let query = Recipe::flat("Beef Stew", &["beef", "carrot"], "Stew.");
        let reference = Recipe::flat("Lentil Stew", &["lentils", "carrot"], "Stew.");
        let allowed = reference.ingredient_set();

        let output = generator
            .grounded(&query, &[&reference], &allowed, DietaryConstraint::Vegetarian)
            .await?;

        assert_eq!(output.strategy, Strategy::Grounded);
        assert_eq!(output.constraint, DietaryConstraint::Vegetarian);
        assert_eq!(output.text, "");

        let prompts = client.prompts.lock().map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].0, "llama3.2:3b");
        assert!(prompts[0].1.contains("carrot, lentils"));
        Ok(())
    }

    #[tokio::test]
    async fn test_service_errors_propagate() {
        let generator = Generator::new(Arc::new(DownGenerator), "m");
        let query = Recipe::flat("Beef Stew", &["beef"], "Stew.");
        let result = generator.baseline(&query, &[], DietaryConstraint::Vegetarian).await;
        assert!(matches!(result, Err(ApiConnectionError::EmptyResponse)));
    }

    #[test]
    fn test_strategy_serializes_snake_case() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&Strategy::GraphRag)?, "\"graph_rag\"");
        assert_eq!(Strategy::TextRag.to_string(), "text_rag");
        Ok(())
    }
}
