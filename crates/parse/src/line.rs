use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

use messbook_core::{Money, Unit};

use crate::translit::Transliterator;

/// A structured purchase candidate extracted from one free-text line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedItem {
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: Option<Unit>,
    pub price: Money,
}

/// Result of parsing a pasted block: accepted candidates plus the lines no
/// pattern accepted, so the caller can tell the user exactly what to fix.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchParse {
    pub items: Vec<ParsedItem>,
    pub unparsed: Vec<String>,
}

impl BatchParse {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ordered free-text line patterns, most specific first. Every regex uses the
/// same named groups (`name`, `qty`, `unit`, `price`) so extraction is shared.
/// The four-field no-currency shape is tried before the bare two-field
/// fallbacks: "Alu 1 KG 30" must keep its quantity and unit instead of being
/// swallowed by the lazy "name price" shape.
const PATTERNS: &[&str] = &[
    // name qty unit = price currency        e.g. "vat 5 kg = 500 tk"
    r"(?i)^(?P<name>.+?)\s+(?P<qty>\d+(?:\.\d+)?)\s*(?P<unit>[a-zA-Z]+)\s*=\s*(?P<price>\d+(?:\.\d+)?)\s*(?:tk|bdt|taka)$",
    // name qty unit price currency          e.g. "vat 5kg 500 tk"
    r"(?i)^(?P<name>.+?)\s+(?P<qty>\d+(?:\.\d+)?)\s*(?P<unit>[a-zA-Z]+)\s+(?P<price>\d+(?:\.\d+)?)\s*(?:tk|bdt|taka)$",
    // name price currency qty unit          e.g. "vat 500 bdt 5 kg"
    r"(?i)^(?P<name>.+?)\s+(?P<price>\d+(?:\.\d+)?)\s*(?:tk|bdt|taka)\s+(?P<qty>\d+(?:\.\d+)?)\s*(?P<unit>[a-zA-Z]+)$",
    // name price currency                   e.g. "lobon 42 tk"
    r"(?i)^(?P<name>.+?)\s+(?P<price>\d+(?:\.\d+)?)\s*(?:tk|bdt|taka)$",
    // name qty unit price                   e.g. "Alu 1 KG 30"
    r"(?i)^(?P<name>.+?)\s+(?P<qty>\d+(?:\.\d+)?)\s*(?P<unit>[a-zA-Z]+)\s+(?P<price>\d+(?:\.\d+)?)$",
    // name = price                          e.g. "Salt = 42"
    r"^(?P<name>.+?)\s*=\s*(?P<price>\d+(?:\.\d+)?)$",
    // name price                            e.g. "Rice 270"
    r"^(?P<name>.+?)\s+(?P<price>\d+(?:\.\d+)?)$",
];

pub struct LineParser {
    patterns: Vec<Regex>,
    translit: Transliterator,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new(Transliterator::new())
    }
}

impl LineParser {
    pub fn new(translit: Transliterator) -> Self {
        let patterns = PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("invalid line pattern"))
            .collect();
        LineParser { patterns, translit }
    }

    /// Parses one line. Returns `None` when no pattern accepts it. A pattern
    /// only accepts when its price group parses as a strictly positive
    /// number; otherwise the remaining patterns are still tried.
    pub fn parse_line(&self, line: &str) -> Option<ParsedItem> {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            return None;
        }

        for pattern in &self.patterns {
            let Some(caps) = pattern.captures(&line) else {
                continue;
            };

            let name = caps.name("name").map(|m| m.as_str().trim())?;
            let price = caps
                .name("price")
                .and_then(|m| Decimal::from_str(m.as_str()).ok());
            let Some(price) = price.filter(|p| *p > Decimal::ZERO) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            let quantity = caps
                .name("qty")
                .and_then(|m| Decimal::from_str(m.as_str()).ok())
                .unwrap_or(Decimal::ONE);
            let unit = caps.name("unit").map(|m| Unit::parse(m.as_str()));

            return Some(ParsedItem {
                item_name: self.translit.normalize(name),
                quantity,
                unit,
                price: Money::from_decimal(price),
            });
        }

        None
    }

    /// Splits a pasted block on newlines and commas and parses each candidate
    /// line independently.
    pub fn parse_block(&self, block: &str) -> BatchParse {
        let mut batch = BatchParse::default();
        for candidate in block.split(['\n', ',']) {
            let candidate = candidate.trim();
            if candidate.is_empty() {
                continue;
            }
            match self.parse_line(candidate) {
                Some(item) => batch.items.push(item),
                None => batch.unparsed.push(candidate.to_string()),
            }
        }
        batch
    }
}
