use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of purchase categories. Assigned explicitly by the user or via
/// [`Category::of`] when no category was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Rice,
    Daal,
    Meat,
    Fish,
    Vegetables,
    Masala,
    Others,
}

const RICE_KEYWORDS: &[&str] = &["rice", "chal", "vat", "ata", "flour", "bread"];
const DAAL_KEYWORDS: &[&str] = &["daal", "dal", "lentil", "bean", "chickpea"];
const MEAT_KEYWORDS: &[&str] = &["meat", "beef", "mutton", "lamb"];
const FISH_KEYWORDS: &[&str] = &["fish", "mach", "shrimp", "prawn", "crab"];
const VEGETABLE_KEYWORDS: &[&str] = &[
    "potato", "alu", "onion", "peyaj", "tomato", "carrot", "cucumber", "cabbage", "cauliflower",
    "spinach", "lettuce", "pepper",
];
const MASALA_KEYWORDS: &[&str] = &[
    "holud",
    "morich",
    "ada",
    "roshun",
    "murgir moshla",
    "mangsher moshla",
    "gura moshla",
    "gorom moshla",
    "garam masala",
    "turmeric",
    "chili",
    "ginger",
    "garlic",
    "spice",
    "masala",
    "chicken masala",
];

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| name.contains(k))
}

impl Category {
    /// Keyword classification of an item name. Groups are tried in a fixed
    /// order because some names satisfy more than one group: "chicken masala"
    /// must resolve to Masala, so the Meat group excludes names that also
    /// contain "masala"/"moshla".
    pub fn of(item_name: &str) -> Category {
        let name = item_name.to_lowercase();

        let chicken = (name.contains("chicken") && !name.contains("masala"))
            || (name.contains("murgi") && !name.contains("moshla"));

        if contains_any(&name, RICE_KEYWORDS) {
            Category::Rice
        } else if contains_any(&name, DAAL_KEYWORDS) {
            Category::Daal
        } else if chicken || contains_any(&name, MEAT_KEYWORDS) {
            Category::Meat
        } else if contains_any(&name, FISH_KEYWORDS) {
            Category::Fish
        } else if contains_any(&name, VEGETABLE_KEYWORDS) {
            Category::Vegetables
        } else if contains_any(&name, MASALA_KEYWORDS) {
            Category::Masala
        } else {
            Category::Others
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Rice => "Rice",
            Category::Daal => "Daal",
            Category::Meat => "Meat",
            Category::Fish => "Fish",
            Category::Vegetables => "Vegetables",
            Category::Masala => "Masala",
            Category::Others => "Others",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "Rice" => Some(Category::Rice),
            "Daal" => Some(Category::Daal),
            "Meat" => Some(Category::Meat),
            "Fish" => Some(Category::Fish),
            "Vegetables" => Some(Category::Vegetables),
            "Masala" => Some(Category::Masala),
            "Others" => Some(Category::Others),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dish types a consumed item maps to for seasoning-cost allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DishType {
    Daal,
    Chicken,
    Fish,
    Egg,
    Vegetables,
    PotatoMash,
}

impl DishType {
    pub const ALL: [DishType; 6] = [
        DishType::Daal,
        DishType::Chicken,
        DishType::Fish,
        DishType::Egg,
        DishType::Vegetables,
        DishType::PotatoMash,
    ];

    /// Maps a consumed item's name to the dish type it was cooked as.
    /// Potato keywords resolve to PotatoMash before the vegetable group so a
    /// potato dish is never mistaken for a generic vegetable curry.
    pub fn of(item_name: &str) -> Option<DishType> {
        let name = item_name.to_lowercase();
        let has = |keywords: &[&str]| contains_any(&name, keywords);

        if has(&["daal", "dal", "lentil"]) {
            Some(DishType::Daal)
        } else if has(&["chicken", "murgi", "meat", "beef", "mutton", "lamb"]) {
            Some(DishType::Chicken)
        } else if has(&["fish", "mach", "shrimp", "prawn"]) {
            Some(DishType::Fish)
        } else if has(&["egg", "dim"]) {
            Some(DishType::Egg)
        } else if has(&["potato", "alu"]) {
            Some(DishType::PotatoMash)
        } else if has(&[
            "onion", "peyaj", "tomato", "carrot", "cucumber", "cabbage", "cauliflower", "spinach",
            "lettuce", "pepper",
        ]) {
            Some(DishType::Vegetables)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DishType::Daal => "daal",
            DishType::Chicken => "chicken",
            DishType::Fish => "fish",
            DishType::Egg => "egg",
            DishType::Vegetables => "vegetables",
            DishType::PotatoMash => "potato-mash",
        }
    }
}

impl fmt::Display for DishType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
