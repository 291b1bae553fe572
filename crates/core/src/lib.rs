pub mod category;
pub mod meal;
pub mod member;
pub mod money;
pub mod period;
pub mod purchase;

pub use category::{Category, DishType};
pub use meal::{MealId, MealRecord};
pub use member::{Member, MemberId};
pub use money::Money;
pub use period::DateRange;
pub use purchase::{DomainError, Purchase, PurchaseId, Unit};
