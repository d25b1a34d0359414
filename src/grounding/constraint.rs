use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

const MEAT_KEYWORDS: &[&str] = &[
    "chicken", "beef", "pork", "lamb", "turkey", "bacon", "ham", "sausage", "meat", "steak",
    "veal", "duck", "prosciutto", "salami", "pepperoni", "chorizo",
];

/// Shorter list screened by the text-RAG vs graph-RAG comparison.
const HALLUCINATION_MEAT_KEYWORDS: &[&str] =
    &["chicken", "beef", "pork", "lamb", "fish", "shrimp", "meat"];

const GLUTEN_KEYWORDS: &[&str] = &[
    "wheat", "barley", "rye", "all-purpose flour", "bread crumbs", "breadcrumbs", "pasta",
    "couscous", "semolina", "bulgur", "spelt", "farro", "seitan",
];

const VEGETARIAN_SUBSTITUTIONS: &[(&str, &[&str])] = &[
    ("chicken", &["chickpeas", "tofu", "tempeh"]),
    ("beef", &["black beans", "lentils", "mushrooms"]),
    ("pork", &["tempeh", "jackfruit"]),
    ("lamb", &["lentils", "beans"]),
    ("fish", &["tofu", "tempeh"]),
    ("shrimp", &["tofu", "mushrooms"]),
];

const GLUTEN_FREE_SUBSTITUTIONS: &[(&str, &[&str])] = &[
    ("all-purpose flour", &["rice flour", "almond flour", "oat flour"]),
    ("pasta", &["rice noodles", "zucchini noodles"]),
    ("couscous", &["quinoa", "rice"]),
    ("bread crumbs", &["ground almonds", "cornmeal"]),
    ("seitan", &["tofu", "tempeh"]),
];

/// Dietary rule an adaptation must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryConstraint {
    Vegetarian,
    GlutenFree,
}

impl DietaryConstraint {
    pub fn as_str(&self) -> &'static str {
        match self {
            DietaryConstraint::Vegetarian => "vegetarian",
            DietaryConstraint::GlutenFree => "gluten-free",
        }
    }

    /// Keywords whose presence anywhere in the output violates the constraint.
    pub fn forbidden_keywords(&self) -> Vec<String> {
        let keywords = match self {
            DietaryConstraint::Vegetarian => MEAT_KEYWORDS,
            DietaryConstraint::GlutenFree => GLUTEN_KEYWORDS,
        };
        keywords.iter().map(|k| k.to_string()).collect()
    }

    /// Keywords the hallucination check screens RAG outputs for.
    pub fn hallucination_keywords(&self) -> Vec<String> {
        let keywords = match self {
            DietaryConstraint::Vegetarian => HALLUCINATION_MEAT_KEYWORDS,
            DietaryConstraint::GlutenFree => GLUTEN_KEYWORDS,
        };
        keywords.iter().map(|k| k.to_string()).collect()
    }

    /// Forbidden ingredient -> acceptable replacements.
    pub fn substitutions(&self) -> &'static [(&'static str, &'static [&'static str])] {
        match self {
            DietaryConstraint::Vegetarian => VEGETARIAN_SUBSTITUTIONS,
            DietaryConstraint::GlutenFree => GLUTEN_FREE_SUBSTITUTIONS,
        }
    }
}

impl fmt::Display for DietaryConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
