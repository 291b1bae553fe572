use serde::Deserialize;
use thiserror::Error;

/// Built-in shorthand table, tried in order; first match wins. Matching is a
/// case-insensitive substring test, so "deshi alu" still maps to Potato.
/// "murgi" must not fire for "murgir moshla" — that line is a spice mix and
/// is caught by the later two-word rules.
const BUILTIN_RULES: &[(&str, Option<&str>, &str)] = &[
    ("lobon", None, "Salt"),
    ("chal", None, "Rice"),
    ("alu", None, "Potato"),
    ("peyaj", None, "Onion"),
    ("tel", None, "Oil"),
    ("holud", None, "Turmeric"),
    ("morich", None, "Chili"),
    ("ada", None, "Ginger"),
    ("roshun", None, "Garlic"),
    ("tomato", None, "Tomato"),
    ("vat", None, "Rice"),
    ("murgi", Some("moshla"), "Chicken"),
    ("chini", None, "Sugar"),
    ("murgir moshla", None, "Chicken Masala"),
    ("mangsher moshla", None, "Chicken Masala"),
];

/// A user-supplied transliteration rule loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct NameRule {
    pub needle: String,
    #[serde(default)]
    pub exclude: Option<String>,
    pub canonical: String,
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<NameRule>,
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to parse rule file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Normalizes free-text item names to canonical English names. Custom rules
/// are tried before the built-in table.
#[derive(Debug, Clone, Default)]
pub struct Transliterator {
    custom: Vec<NameRule>,
}

impl Transliterator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads extra rules from a TOML document with `[[rules]]` entries:
    ///
    /// ```toml
    /// [[rules]]
    /// needle = "begun"
    /// canonical = "Eggplant"
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(content)?;
        Ok(Transliterator { custom: file.rules })
    }

    /// Trim, collapse whitespace, then apply the first matching rule. With no
    /// match the cleaned name is returned capitalized-first, rest lowercased.
    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let lower = cleaned.to_lowercase();

        for rule in &self.custom {
            let excluded = rule
                .exclude
                .as_deref()
                .is_some_and(|e| lower.contains(&e.to_lowercase()));
            if !excluded && lower.contains(&rule.needle.to_lowercase()) {
                return rule.canonical.clone();
            }
        }

        for (needle, exclude, canonical) in BUILTIN_RULES {
            let excluded = exclude.is_some_and(|e| lower.contains(e));
            if !excluded && lower.contains(needle) {
                return (*canonical).to_string();
            }
        }

        capitalize_first(&cleaned)
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
