pub mod export;
pub mod masala;
pub mod summary;

pub use export::{report_csv, ExportError};
pub use masala::{DishMealCounts, Ingredient, IngredientCost, SeasoningAllocator};
pub use summary::{build_report, ItemSummary, MemberSummary, RangeReport};
