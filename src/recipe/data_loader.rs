use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Recipe;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipePair {
    pub base: Recipe,
    pub target: Recipe,
    #[serde(default)]
    pub constraint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairsDataset {
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub pairs: Vec<RecipePair>,
}

impl PairsDataset {
    /// Adapted targets form the retrieval corpus.
    pub fn corpus(&self) -> Vec<Recipe> {
        self.pairs.iter().map(|pair| pair.target.clone()).collect()
    }

    /// Base recipes are the queries to adapt.
    pub fn bases(&self) -> Vec<Recipe> {
        self.pairs.iter().map(|pair| pair.base.clone()).collect()
    }
}

#[derive(Debug, Deserialize)]
struct ToyDataset {
    recipes: Vec<Recipe>,
}

fn read_json_file(path: &Path, label: &str) -> Result<String> {
    if !path.exists() {
        return Err(anyhow::anyhow!("{} file not found at: {:?}", label, path));
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file at {:?}", label, path))
}

pub fn load_pairs_dataset(path: &Path) -> Result<PairsDataset> {
    let content = read_json_file(path, "Pairs dataset")?;
    let dataset: PairsDataset = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse pairs dataset at {:?}", path))?;

    if dataset.pairs.is_empty() {
        return Err(anyhow::anyhow!("No recipe pairs loaded from {:?}", path));
    }
    Ok(dataset)
}

pub fn load_toy_recipes(path: &Path) -> Result<Vec<Recipe>> {
    let content = read_json_file(path, "Recipe dataset")?;
    let dataset: ToyDataset = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse recipe dataset at {:?}", path))?;

    if dataset.recipes.is_empty() {
        return Err(anyhow::anyhow!("No recipes loaded from {:?}", path));
    }
    Ok(dataset.recipes)
}
