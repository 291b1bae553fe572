pub mod line;
pub mod translit;

pub use line::{BatchParse, LineParser, ParsedItem};
pub use translit::{NameRule, RuleError, Transliterator};
