//! Toy comparison of text-RAG and graph-RAG context on graph-annotated recipes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::generation::{Generator, TextGenerator};
use crate::grounding::{evaluate_hallucinations, DietaryConstraint, HallucinationReport};
use crate::recipe::{IngredientSet, Recipe};
use crate::retrieval::{RetrievedSummary, Retriever};

pub const DEFAULT_QUERY_IDS: &[&str] = &["recipe_001", "recipe_003"];
pub const CC_TOP_K: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagRun {
    pub output: String,
    pub evaluation: HallucinationReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CcRecord {
    pub query_recipe_id: String,
    pub query_recipe_name: String,
    pub constraint: DietaryConstraint,
    pub model: String,
    pub timestamp: String,
    pub retrieved_recipes: Vec<RetrievedSummary>,
    pub text_rag: RagRun,
    pub graph_rag: RagRun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CcSummary {
    pub total_experiments: usize,
    pub text_rag_hallucinations: usize,
    pub graph_rag_hallucinations: usize,
    pub text_rag_success_rate: f64,
    pub graph_rag_success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CcResultFile {
    pub results: Vec<CcRecord>,
    pub summary: Option<CcSummary>,
}

pub fn summarize_cc(records: &[CcRecord]) -> Option<CcSummary> {
    if records.is_empty() {
        return None;
    }
    let total = records.len();
    let text = records.iter().filter(|r| r.text_rag.evaluation.has_hallucination).count();
    let graph = records.iter().filter(|r| r.graph_rag.evaluation.has_hallucination).count();
    Some(CcSummary {
        total_experiments: total,
        text_rag_hallucinations: text,
        graph_rag_hallucinations: graph,
        text_rag_success_rate: 1.0 - text as f64 / total as f64,
        graph_rag_success_rate: 1.0 - graph as f64 / total as f64,
    })
}

/// Runs one query through both RAG styles. A query id missing from `recipes`
/// fails with `RetrievalError::RecipeNotFound`.
pub async fn run_cc_query<G: TextGenerator>(
    generator: &Generator<G>,
    recipes: &[Recipe],
    query_id: &str,
    constraint: DietaryConstraint,
    retriever: Retriever,
) -> Result<CcRecord> {
    let retrieved = retriever.retrieve_by_id(query_id, recipes)?;
    let query = recipes
        .iter()
        .find(|r| r.key() == query_id)
        .with_context(|| format!("Recipe {} not found in corpus", query_id))?;
    let references: Vec<&Recipe> = retrieved.iter().map(|scored| scored.recipe).collect();
    info!(
        query = %query.name,
        retrieved = ?references.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "retrieved similar recipes"
    );

    let sources: IngredientSet = references.iter().flat_map(|r| r.ingredient_set()).collect();

    let text_rag = generator
        .text_rag(&references, constraint)
        .await
        .with_context(|| format!("text-RAG generation failed for {}", query_id))?;
    let graph_rag = generator
        .graph_rag(&references, constraint)
        .await
        .with_context(|| format!("graph-RAG generation failed for {}", query_id))?;

    let text_eval = evaluate_hallucinations(&text_rag.text, constraint, &sources);
    let graph_eval = evaluate_hallucinations(&graph_rag.text, constraint, &sources);
    info!(
        query_id,
        text_rag_hallucination = text_eval.has_hallucination,
        graph_rag_hallucination = graph_eval.has_hallucination,
        "evaluated adaptations"
    );

    Ok(CcRecord {
        query_recipe_id: query_id.to_string(),
        query_recipe_name: query.name.clone(),
        constraint,
        model: generator.model().to_string(),
        timestamp: chrono::Local::now().to_rfc3339(),
        retrieved_recipes: retrieved.iter().map(RetrievedSummary::from).collect(),
        text_rag: RagRun {
            output: text_rag.text,
            evaluation: text_eval,
        },
        graph_rag: RagRun {
            output: graph_rag.text,
            evaluation: graph_eval,
        },
    })
}

/// Queries run in order; the first failure aborts the run.
pub async fn run_cc_experiment<G: TextGenerator>(
    generator: &Generator<G>,
    recipes: &[Recipe],
    query_ids: &[String],
    constraint: DietaryConstraint,
) -> Result<CcResultFile> {
    let retriever = Retriever::new(CC_TOP_K, 0.0);
    let mut results = Vec::with_capacity(query_ids.len());
    for query_id in query_ids {
        results.push(run_cc_query(generator, recipes, query_id, constraint, retriever).await?);
    }
    let summary = summarize_cc(&results);
    Ok(CcResultFile { results, summary })
}

pub fn print_cc_summary(summary: &CcSummary) {
    println!("Total experiments: {}", summary.total_experiments);
    println!("\nText-RAG:");
    println!("  Hallucinations: {}", summary.text_rag_hallucinations);
    println!("  Success rate: {:.1}%", summary.text_rag_success_rate * 100.0);
    println!("\nGraph-RAG:");
    println!("  Hallucinations: {}", summary.graph_rag_hallucinations);
    println!("  Success rate: {:.1}%", summary.graph_rag_success_rate * 100.0);
}
