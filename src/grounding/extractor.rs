use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::phrase_parser::{PhraseParser, RuleParser};

/// Names shorter than this are treated as parse noise.
pub const DEFAULT_MIN_NAME_CHARS: usize = 2;
/// Names longer than this many words are treated as mis-parsed sentences.
pub const DEFAULT_MAX_NAME_WORDS: usize = 4;

/// Headers, equipment and meta words that the parser can return as names.
const GARBAGE_WORDS: &[&str] = &[
    "ingredients", "ingredient", "steps", "step", "instructions", "instruction", "directions",
    "direction", "method", "note", "notes", "tip", "tips", "serves", "serving", "servings",
    "yield", "prep", "saucepan", "pan", "pot", "bowl", "skillet", "oven", "baking sheet",
    "adapted", "recipe", "vegetarian", "vegan", "original",
];

/// First words that mark a line as a step or commentary.
const INSTRUCTION_STARTERS: &[&str] = &[
    "cook", "bake", "mix", "stir", "add", "combine", "heat", "place", "pour", "serve", "let",
    "bring", "reduce", "simmer", "boil", "fry", "saute", "chop", "dice", "slice", "preheat",
    "set", "cover", "remove", "in", "the", "this", "you", "for", "with", "here", "note", "tip",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub min_name_chars: usize,
    pub max_name_words: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_name_chars: DEFAULT_MIN_NAME_CHARS,
            max_name_words: DEFAULT_MAX_NAME_WORDS,
        }
    }
}

/// Pulls ingredient names out of generated recipe text. Best effort: lines
/// the phrase parser rejects contribute nothing and never abort extraction.
#[derive(Clone)]
pub struct IngredientExtractor {
    parser: Arc<dyn PhraseParser>,
    config: ExtractionConfig,
    bold: Regex,
    italic: Regex,
    stray_emphasis: Regex,
    section: Regex,
    line_prefix: Regex,
}

impl IngredientExtractor {
    pub fn new(parser: Arc<dyn PhraseParser>, config: ExtractionConfig) -> Result<Self> {
        // Wrapped spans only, so `* ` bullet prefixes survive.
        let bold = Regex::new(r"\*\*(\S(?:.*?\S)?)\*\*|__(\S(?:.*?\S)?)__")
            .context("failed to compile bold regex")?;
        let italic = Regex::new(r"\*(\S(?:.*?\S)?)\*|_(\S(?:.*?\S)?)_")
            .context("failed to compile italic regex")?;
        let stray_emphasis =
            Regex::new(r"\*\*|__").context("failed to compile emphasis regex")?;
        let section = Regex::new(
            r"(?is)ingredients?:?\s*\n(.*?)(?:\n\s*steps?:?|\n\s*instructions?:?|\n\s*directions?:?|\n\s*method:?|$)",
        )
        .context("failed to compile ingredients section regex")?;
        let line_prefix =
            Regex::new(r"^[\d.\-*•\[\]]+\s*").context("failed to compile line prefix regex")?;
        Ok(Self {
            parser,
            config,
            bold,
            italic,
            stray_emphasis,
            section,
            line_prefix,
        })
    }

    pub fn with_rules() -> Result<Self> {
        Self::new(Arc::new(RuleParser), ExtractionConfig::default())
    }

    /// Distinct ingredient names in order of first appearance, deduplicated
    /// case-insensitively, first-seen casing kept.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let unbolded = self.bold.replace_all(text, "${1}${2}");
        let unemphasized = self.italic.replace_all(&unbolded, "${1}${2}");
        let clean_text = self.stray_emphasis.replace_all(&unemphasized, "");

        let region = match self.section.captures(&clean_text).and_then(|caps| caps.get(1)) {
            Some(section) => section.as_str(),
            None => {
                debug!("no ingredients header found, scanning whole text");
                &*clean_text
            }
        };

        let mut seen = HashSet::new();
        let mut ingredients = Vec::new();
        for line in region.lines() {
            for name in self.parse_line(line) {
                let key = name.trim().to_lowercase();
                if self.accepts(&key) && seen.insert(key) {
                    ingredients.push(name);
                }
            }
        }
        ingredients
    }

    fn parse_line(&self, line: &str) -> Vec<String> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        let line = self.line_prefix.replace(line, "");
        let line = line.trim();
        if line.is_empty() || line.ends_with(':') || line.starts_with('#') {
            return Vec::new();
        }

        let first_word = line
            .split_whitespace()
            .next()
            .map(str::to_lowercase)
            .unwrap_or_default();
        if INSTRUCTION_STARTERS.contains(&first_word.as_str()) {
            return Vec::new();
        }

        match self.parser.parse(line) {
            Ok(names) => names,
            Err(err) => {
                debug!(error = %err, "skipping unparsable line");
                Vec::new()
            }
        }
    }

    fn accepts(&self, name_lower: &str) -> bool {
        !name_lower.is_empty()
            && !GARBAGE_WORDS.contains(&name_lower)
            && name_lower.chars().count() >= self.config.min_name_chars
            && name_lower.split_whitespace().count() <= self.config.max_name_words
    }
}
