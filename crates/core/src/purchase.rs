use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use super::category::Category;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseId(pub i64);

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Measurement unit attached to a purchase line. The parser accepts any
/// alphabetic unit token, so unknown units are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Kg,
    Gram,
    Liter,
    Ml,
    Piece,
    Dozen,
    Other(String),
}

impl Unit {
    pub fn parse(s: &str) -> Unit {
        match s.to_lowercase().as_str() {
            "kg" | "kgs" | "kilo" | "kilogram" => Unit::Kg,
            "g" | "gm" | "gram" | "grams" => Unit::Gram,
            "l" | "ltr" | "liter" | "litre" => Unit::Liter,
            "ml" => Unit::Ml,
            "pc" | "pcs" | "piece" | "pieces" => Unit::Piece,
            "dz" | "dozen" => Unit::Dozen,
            _ => Unit::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Unit::Kg => "KG",
            Unit::Gram => "Gram",
            Unit::Liter => "Liter",
            Unit::Ml => "ml",
            Unit::Piece => "pc",
            Unit::Dozen => "Dozen",
            Unit::Other(s) => s,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Units travel as plain strings on the wire and in storage.
impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(D::Error::custom("unit must not be empty"));
        }
        Ok(Unit::parse(&s))
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("item name must not be empty")]
    EmptyItemName,
    #[error("member name must not be empty")]
    EmptyMemberName,
    #[error("quantity must not be negative")]
    NegativeQuantity,
    #[error("price must not be negative")]
    NegativePrice,
    #[error("meal count must be at least 1")]
    ZeroMealCount,
}

/// One shopping line. `price` is the total paid for the line, not per unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Option<PurchaseId>,
    pub item_name: String,
    pub quantity: Decimal,
    pub unit: Option<Unit>,
    pub price: Money,
    pub purchased_at: NaiveDate,
    pub category: Option<Category>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Purchase {
    pub fn new(item_name: &str, quantity: Decimal, price: Money, purchased_at: NaiveDate) -> Self {
        Purchase {
            id: None,
            item_name: item_name.to_string(),
            quantity,
            unit: None,
            price,
            purchased_at,
            category: None,
            notes: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Category as stored, falling back to keyword classification.
    pub fn effective_category(&self) -> Category {
        self.category.unwrap_or_else(|| Category::of(&self.item_name))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.item_name.trim().is_empty() {
            return Err(DomainError::EmptyItemName);
        }
        if self.quantity < Decimal::ZERO {
            return Err(DomainError::NegativeQuantity);
        }
        if self.price.is_negative() {
            return Err(DomainError::NegativePrice);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn validate_accepts_zero_quantity_and_price() {
        let p = Purchase::new("Salt", Decimal::ZERO, Money::zero(), date(2024, 1, 1));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_name() {
        let p = Purchase::new("  ", Decimal::ONE, Money::from_cents(100), date(2024, 1, 1));
        assert_eq!(p.validate(), Err(DomainError::EmptyItemName));
    }

    #[test]
    fn validate_rejects_negative_price() {
        let p = Purchase::new("Salt", Decimal::ONE, Money::from_cents(-1), date(2024, 1, 1));
        assert_eq!(p.validate(), Err(DomainError::NegativePrice));
    }

    #[test]
    fn validate_rejects_negative_quantity() {
        let p = Purchase::new(
            "Salt",
            Decimal::from(-1),
            Money::from_cents(100),
            date(2024, 1, 1),
        );
        assert_eq!(p.validate(), Err(DomainError::NegativeQuantity));
    }

    #[test]
    fn effective_category_prefers_stored_value() {
        let mut p = Purchase::new("Chicken", Decimal::ONE, Money::from_cents(100), date(2024, 1, 1));
        assert_eq!(p.effective_category(), Category::Meat);
        p.category = Some(Category::Others);
        assert_eq!(p.effective_category(), Category::Others);
    }

    #[test]
    fn unit_parse_common_spellings() {
        assert_eq!(Unit::parse("KG"), Unit::Kg);
        assert_eq!(Unit::parse("kgs"), Unit::Kg);
        assert_eq!(Unit::parse("Litre"), Unit::Liter);
        assert_eq!(Unit::parse("pcs"), Unit::Piece);
        assert_eq!(Unit::parse("bosta"), Unit::Other("bosta".to_string()));
    }

    #[test]
    fn unit_serializes_as_display_string() {
        let json = serde_json::to_string(&Unit::Kg).unwrap();
        assert_eq!(json, "\"KG\"");
        let back: Unit = serde_json::from_str("\"kg\"").unwrap();
        assert_eq!(back, Unit::Kg);
    }
}
