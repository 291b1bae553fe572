use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::member::MemberId;
use super::purchase::{DomainError, PurchaseId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealId(pub i64);

impl fmt::Display for MealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One member eating one purchased item on one date. Several records per
/// member and day are allowed, one per consumed item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealRecord {
    pub id: Option<MealId>,
    pub date: NaiveDate,
    pub member_id: MemberId,
    pub purchase_id: PurchaseId,
    pub meal_count: u32,
}

impl MealRecord {
    pub fn new(date: NaiveDate, member_id: MemberId, purchase_id: PurchaseId, meal_count: u32) -> Self {
        MealRecord {
            id: None,
            date,
            member_id,
            purchase_id,
            meal_count,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.meal_count == 0 {
            return Err(DomainError::ZeroMealCount);
        }
        Ok(())
    }
}
