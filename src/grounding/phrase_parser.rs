use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhraseParseError {
    #[error("line contains no ingredient text: '{0}'")]
    NoIngredientText(String),
}

/// Parses one ingredient line ("2 cups diced tomatoes, drained") into the
/// ingredient names it mentions.
pub trait PhraseParser: Send + Sync {
    fn parse(&self, line: &str) -> Result<Vec<String>, PhraseParseError>;
}

const UNITS: &[&str] = &[
    "bag", "bags", "bottle", "bottles", "box", "boxes", "bunch", "bunches", "c", "can", "cans",
    "clove", "cloves", "cup", "cups", "dash", "dashes", "g", "gallon", "gallons", "gram", "grams",
    "handful", "handfuls", "head", "heads", "jar", "jars", "kg", "kilogram", "kilograms", "l",
    "lb", "lbs", "liter", "liters", "litre", "litres", "mg", "ml", "milliliter", "milliliters",
    "ounce", "ounces", "oz", "package", "packages", "packet", "packets", "piece", "pieces",
    "pinch", "pinches", "pint", "pints", "pkg", "pound", "pounds", "quart", "quarts", "slice",
    "slices", "sprig", "sprigs", "stalk", "stalks", "stick", "sticks", "tablespoon",
    "tablespoons", "tbs", "tbsp", "teaspoon", "teaspoons", "tsp",
];

/// Size and preparation words that qualify an ingredient without naming it.
const MODIFIERS: &[&str] = &[
    "a", "an", "of", "large", "medium", "small", "chopped", "diced", "minced", "sliced", "grated",
    "peeled", "crushed", "cubed", "finely", "roughly", "coarsely", "thinly", "freshly", "halved",
    "quartered", "rinsed", "drained", "softened", "melted", "beaten", "packed", "heaping",
    "level", "about", "approximately",
];

const TRAILING_NOTES: &[&str] = &[
    "to taste",
    "for garnish",
    "for serving",
    "as needed",
    "optional",
];

const FRACTIONS: &[char] = &['½', '¼', '¾', '⅓', '⅔', '⅛', '⅜', '⅝', '⅞'];

fn is_quantity(token: &str) -> bool {
    token
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || FRACTIONS.contains(&c))
        .unwrap_or(false)
}

fn strip_parenthesized(line: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    let mut lowered = text.chars().flat_map(char::to_lowercase);
    prefix.chars().all(|p| lowered.next() == Some(p))
}

/// Offset in `head` of the first word-start where `note` (lowercase) begins,
/// compared case-insensitively.
fn note_start(head: &str, note: &str) -> Option<usize> {
    head.char_indices()
        .map(|(pos, _)| pos)
        .filter(|&pos| pos == 0 || head[..pos].ends_with(char::is_whitespace))
        .find(|&pos| starts_with_ignore_case(&head[pos..], note))
}

fn clean_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\'' && !FRACTIONS.contains(&c))
}

/// Heuristic parser: drops quantities, units, size and preparation words,
/// parenthetical remarks and trailing notes, then splits the remaining name on
/// "and" / "or".
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleParser;

impl RuleParser {
    fn component_name(&self, component: &str) -> Option<String> {
        let tokens: Vec<&str> = component
            .split_whitespace()
            .map(clean_token)
            .filter(|token| !token.is_empty())
            .collect();

        let mut start = 0;
        while start < tokens.len() {
            let lower = tokens[start].to_lowercase();
            if is_quantity(tokens[start]) || UNITS.contains(&lower.as_str()) || MODIFIERS.contains(&lower.as_str()) {
                start += 1;
            } else {
                break;
            }
        }

        let name: Vec<&str> = tokens[start..]
            .iter()
            .copied()
            .filter(|token| !MODIFIERS.contains(&token.to_lowercase().as_str()) && !is_quantity(token))
            .collect();
        if name.is_empty() {
            None
        } else {
            Some(name.join(" "))
        }
    }
}

impl PhraseParser for RuleParser {
    fn parse(&self, line: &str) -> Result<Vec<String>, PhraseParseError> {
        if !line.chars().any(char::is_alphabetic) {
            return Err(PhraseParseError::NoIngredientText(line.to_string()));
        }

        let without_notes = strip_parenthesized(line);
        let head = without_notes
            .split(|c: char| c == ',' || c == ';')
            .next()
            .unwrap_or_default();
        let head = head.split(" - ").next().unwrap_or_default();

        let mut head = head.trim().to_string();
        for note in TRAILING_NOTES {
            if let Some(pos) = note_start(&head, note) {
                head.truncate(pos);
            }
        }

        let normalized_separators = head
            .replace(" & ", " and ")
            .replace(" AND ", " and ")
            .replace(" Or ", " or ")
            .replace(" OR ", " or ");

        Ok(normalized_separators
            .split(" and ")
            .flat_map(|part| part.split(" or "))
            .filter_map(|component| self.component_name(component))
            .collect())
    }
}
