use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use messbook_core::{DishType, Money};

/// A shared seasoning ingredient whose period cost is spread across dishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingredient {
    Onion,
    Potato,
    Turmeric,
    Chili,
    Ginger,
    Garlic,
    ChickenMasala,
    Oil,
    Tomato,
    GoromMasala,
    Custom(String),
}

impl Ingredient {
    pub fn parse(s: &str) -> Ingredient {
        match s.to_lowercase().as_str() {
            "onion" => Ingredient::Onion,
            "potato" => Ingredient::Potato,
            "turmeric" => Ingredient::Turmeric,
            "chili" => Ingredient::Chili,
            "ginger" => Ingredient::Ginger,
            "garlic" => Ingredient::Garlic,
            "chicken-masala" => Ingredient::ChickenMasala,
            "oil" => Ingredient::Oil,
            "tomato" => Ingredient::Tomato,
            "gorom-masala" => Ingredient::GoromMasala,
            _ => Ingredient::Custom(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Ingredient::Onion => "onion",
            Ingredient::Potato => "potato",
            Ingredient::Turmeric => "turmeric",
            Ingredient::Chili => "chili",
            Ingredient::Ginger => "ginger",
            Ingredient::Garlic => "garlic",
            Ingredient::ChickenMasala => "chicken-masala",
            Ingredient::Oil => "oil",
            Ingredient::Tomato => "tomato",
            Ingredient::GoromMasala => "gorom-masala",
            Ingredient::Custom(s) => s,
        }
    }

    /// Fixed usage map: which dish types consume this ingredient. Custom
    /// ingredients have no known consumers and therefore allocate nothing.
    pub fn used_by(&self) -> &'static [DishType] {
        use DishType::*;
        match self {
            Ingredient::Onion => &[Daal, Chicken, Fish, Egg, Vegetables, PotatoMash],
            Ingredient::Turmeric | Ingredient::Garlic | Ingredient::Oil => {
                &[Daal, Chicken, Fish, Egg, Vegetables]
            }
            Ingredient::Potato => &[Chicken, Fish, Vegetables, PotatoMash],
            Ingredient::Chili | Ingredient::Ginger | Ingredient::GoromMasala => {
                &[Chicken, Fish, Egg, Vegetables]
            }
            Ingredient::Tomato => &[Fish, Vegetables],
            Ingredient::ChickenMasala => &[Chicken],
            Ingredient::Custom(_) => &[],
        }
    }

    /// Onion, turmeric, garlic and oil go into everything including daal, but
    /// a daal recipe only uses half the normal amount per meal.
    fn half_share_for_daal(&self) -> bool {
        matches!(
            self,
            Ingredient::Onion | Ingredient::Turmeric | Ingredient::Garlic | Ingredient::Oil
        )
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Ingredient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Ingredient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(D::Error::custom("ingredient must not be empty"));
        }
        Ok(Ingredient::parse(&s))
    }
}

/// User-entered aggregate cost of one seasoning ingredient for the period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCost {
    pub ingredient: Ingredient,
    pub total_cost: Money,
}

/// How many meals of each dish type were cooked in the costing period.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DishMealCounts {
    #[serde(default)]
    pub daal: u32,
    #[serde(default)]
    pub chicken: u32,
    #[serde(default)]
    pub fish: u32,
    #[serde(default)]
    pub egg: u32,
    #[serde(default)]
    pub vegetables: u32,
    #[serde(default)]
    pub potato_mash: u32,
}

impl DishMealCounts {
    pub fn get(&self, dish: DishType) -> u32 {
        match dish {
            DishType::Daal => self.daal,
            DishType::Chicken => self.chicken,
            DishType::Fish => self.fish,
            DishType::Egg => self.egg,
            DishType::Vegetables => self.vegetables,
            DishType::PotatoMash => self.potato_mash,
        }
    }
}

/// Distributes period seasoning costs over dish types, proportional to meal
/// counts. Pure: the same inputs always produce the same rates.
#[derive(Debug, Clone, Default)]
pub struct SeasoningAllocator {
    costs: Vec<IngredientCost>,
    counts: DishMealCounts,
}

impl SeasoningAllocator {
    pub fn new(costs: Vec<IngredientCost>, counts: DishMealCounts) -> Self {
        SeasoningAllocator { costs, counts }
    }

    pub fn counts(&self) -> DishMealCounts {
        self.counts
    }

    /// Per-meal contribution of one ingredient to one dish type, at full
    /// decimal precision (rounding only happens at report edges).
    pub fn ingredient_rate(&self, cost: &IngredientCost, dish: DishType) -> Decimal {
        let used: Vec<DishType> = cost
            .ingredient
            .used_by()
            .iter()
            .copied()
            .filter(|d| self.counts.get(*d) > 0)
            .collect();
        let total_meals: u32 = used.iter().map(|d| self.counts.get(*d)).sum();
        if total_meals == 0 {
            // No consuming dish type has meals: contribution is 0, not an error.
            return Decimal::ZERO;
        }

        let total = cost.total_cost.amount();
        let base = total / Decimal::from(total_meals);

        if cost.ingredient.half_share_for_daal() && used.contains(&DishType::Daal) {
            if dish == DishType::Daal {
                return base / Decimal::TWO;
            }
            if !used.contains(&dish) {
                return Decimal::ZERO;
            }
            // Daal pays half the base rate; the saved amount is spread back
            // over every other consuming meal.
            let daal_meals = Decimal::from(self.counts.daal);
            let allocated_to_daal = base / Decimal::TWO * daal_meals;
            let remaining_meals = total_meals - self.counts.daal;
            if remaining_meals == 0 {
                return Decimal::ZERO;
            }
            return (total - allocated_to_daal) / Decimal::from(remaining_meals);
        }

        if used.contains(&dish) {
            base
        } else {
            Decimal::ZERO
        }
    }

    /// Average per-meal seasoning cost of a dish type: the sum of every
    /// ingredient's per-meal contribution. Exactly 0 for a dish type with no
    /// meals in the period.
    pub fn per_meal_cost(&self, dish: DishType) -> Decimal {
        if self.counts.get(dish) == 0 {
            return Decimal::ZERO;
        }
        self.costs
            .iter()
            .map(|c| self.ingredient_rate(c, dish))
            .sum()
    }

    /// Total seasoning cost attributed to a dish type over the period.
    pub fn dish_total(&self, dish: DishType) -> Decimal {
        self.per_meal_cost(dish) * Decimal::from(self.counts.get(dish))
    }

    /// Sum of all entered ingredient costs.
    pub fn grand_total_input(&self) -> Money {
        self.costs.iter().map(|c| c.total_cost).sum()
    }
}
