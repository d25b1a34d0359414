use std::sync::Arc;

use crate::recipe::IngredientSet;

/// Reduces a single lowercase token to its dictionary base form.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, token: &str) -> String;
}

/// Words that look inflected but are not.
const UNINFLECTED: &[&str] = &[
    "asparagus", "citrus", "couscous", "grits", "hummus", "lemongrass", "molasses",
    "octopus", "swiss", "watercress", "series", "species",
];

const IRREGULAR: &[(&str, &str)] = &[
    ("cookies", "cookie"),
    ("halves", "half"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("loaves", "loaf"),
    ("calves", "calf"),
];

/// Suffix-rule English lemmatizer covering the plural nouns and past
/// participles that show up in ingredient lists ("tomatoes", "diced",
/// "chopped", "berries", "jalapeños"). Rules are applied until the token
/// stops changing, and every rule shortens the token, so the result is a
/// fixed point. Punctuation around a word ("tomatoes,") is kept in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleLemmatizer;

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn vowel_groups(word: &[char]) -> usize {
    let mut groups = 0;
    let mut in_group = false;
    for &c in word {
        if is_vowel(c) {
            if !in_group {
                groups += 1;
            }
            in_group = true;
        } else {
            in_group = false;
        }
    }
    groups
}

/// Consonant-vowel-consonant ending, last consonant not w/x/y.
fn ends_cvc(word: &[char]) -> bool {
    let n = word.len();
    n >= 3
        && !is_vowel(word[n - 3])
        && is_vowel(word[n - 2])
        && !is_vowel(word[n - 1])
        && !matches!(word[n - 1], 'w' | 'x' | 'y')
}

fn past_participle_base(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    let Some(&last) = chars.last() else {
        return String::new();
    };

    if n >= 2 && chars[n - 2] == last && !is_vowel(last) && !matches!(last, 'l' | 's' | 'z' | 'f') {
        return chars[..n - 1].iter().collect();
    }
    let restores_e = matches!(last, 'c' | 'v' | 'z')
        || (n >= 2 && last == 'l' && matches!(chars[n - 2], 'b' | 'c' | 'd' | 'f' | 'g' | 'k' | 'p' | 't' | 'z'))
        || (vowel_groups(&chars) == 1 && ends_cvc(&chars));
    if restores_e {
        format!("{}e", stem)
    } else {
        stem.to_string()
    }
}

impl RuleLemmatizer {
    fn apply_once(&self, word: &str) -> String {
        if UNINFLECTED.contains(&word) {
            return word.to_string();
        }
        if let Some((_, base)) = IRREGULAR.iter().find(|(inflected, _)| *inflected == word) {
            return base.to_string();
        }

        let len = word.chars().count();
        if len > 4 {
            if let Some(stem) = word.strip_suffix("ies") {
                return format!("{}y", stem);
            }
        }
        if len >= 4 {
            if let Some(stem) = word.strip_suffix("ied") {
                return format!("{}y", stem);
            }
        }
        if len > 4 {
            if let Some(stem) = word.strip_suffix("oes") {
                return format!("{}o", stem);
            }
        }
        if let Some(stem) = word.strip_suffix("es") {
            if ["x", "z", "ch", "sh", "ss"].iter().any(|end| stem.ends_with(end)) {
                return stem.to_string();
            }
        }
        if len > 3 && !["ss", "us", "is"].iter().any(|end| word.ends_with(end)) {
            if let Some(stem) = word.strip_suffix('s') {
                return stem.to_string();
            }
        }
        if len >= 5 && !word.ends_with("eed") {
            if let Some(stem) = word.strip_suffix("ed") {
                if stem.chars().any(is_vowel) {
                    return past_participle_base(stem);
                }
            }
        }
        word.to_string()
    }

    fn lemmatize_word(&self, word: &str) -> String {
        let mut current = word.to_string();
        loop {
            let next = self.apply_once(&current);
            if next.len() >= current.len() {
                return current;
            }
            current = next;
        }
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize(&self, token: &str) -> String {
        let not_letter = |c: char| !c.is_alphabetic();
        let word = token.trim_matches(not_letter);
        if word.chars().count() < 3 || !word.chars().all(|c| c.is_alphabetic() && !c.is_uppercase()) {
            return token.to_string();
        }

        let lead = token.len() - token.trim_start_matches(not_letter).len();
        let trail = token.len() - token.trim_end_matches(not_letter).len();
        format!(
            "{}{}{}",
            &token[..lead],
            self.lemmatize_word(word),
            &token[token.len() - trail..]
        )
    }
}

/// Lowercases and trims ingredient strings, optionally lemmatizing each
/// whitespace token. The lemmatizer is injected by the caller.
#[derive(Clone)]
pub struct Normalizer {
    lemmatizer: Arc<dyn Lemmatizer>,
    use_lemma: bool,
}

impl Normalizer {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>, use_lemma: bool) -> Self {
        Self { lemmatizer, use_lemma }
    }

    pub fn with_rules(use_lemma: bool) -> Self {
        Self::new(Arc::new(RuleLemmatizer), use_lemma)
    }

    /// `use_lemma` overrides the normalizer's default for this call only.
    pub fn normalize(&self, text: &str, use_lemma: Option<bool>) -> String {
        let normalized = text.trim().to_lowercase();
        if !use_lemma.unwrap_or(self.use_lemma) {
            return normalized;
        }
        normalized
            .split_whitespace()
            .map(|token| self.lemmatizer.lemmatize(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn normalize_set<I>(&self, ingredients: I, use_lemma: Option<bool>) -> IngredientSet
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        ingredients
            .into_iter()
            .map(|ing| self.normalize(ing.as_ref(), use_lemma))
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::with_rules(true)
    }
}
