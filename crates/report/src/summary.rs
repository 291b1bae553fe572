use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use messbook_core::{
    DateRange, DishType, MealRecord, Member, MemberId, Money, Purchase, PurchaseId,
};

use crate::masala::SeasoningAllocator;

/// Per-member cost breakdown for one reporting period.
#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub member_id: MemberId,
    pub name: String,
    pub meals: u32,
    pub base_cost: Money,
    pub seasoning_cost: Money,
    pub grand_total: Money,
}

/// Per-purchase consumption breakdown. `per_meal_cost` amortizes the full
/// purchase price over every meal ever recorded against it, not only meals
/// inside the report range, so the rate is stable across reporting periods.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSummary {
    pub purchase_id: PurchaseId,
    pub item_name: String,
    pub total_cost: Money,
    pub meals_in_range: u32,
    pub lifetime_meals: u32,
    pub per_meal_cost: Decimal,
}

/// A complete cost report for one date range.
#[derive(Debug, Clone, Serialize)]
pub struct RangeReport {
    pub range: DateRange,
    pub total_expense: Money,
    pub total_meals: u32,
    /// Meals inside the range whose purchase or member no longer exists.
    /// They count toward `total_meals` but carry no cost to any member.
    pub unattributed_meals: u32,
    pub per_meal_average: Money,
    pub by_member: Vec<MemberSummary>,
    pub by_item: Vec<ItemSummary>,
}

/// Builds a report from full datasets. Pure: callers pass every purchase and
/// meal record, not a pre-filtered slice, because per-meal rates amortize over
/// lifetime consumption and members may eat from purchases made before the
/// range started.
pub fn build_report(
    range: DateRange,
    purchases: &[Purchase],
    meals: &[MealRecord],
    members: &[Member],
    allocator: &SeasoningAllocator,
) -> RangeReport {
    let purchase_by_id: HashMap<i64, &Purchase> = purchases
        .iter()
        .filter_map(|p| p.id.map(|id| (id.0, p)))
        .collect();
    let member_ids: HashSet<i64> = members.iter().filter_map(|m| m.id.map(|id| id.0)).collect();

    let mut lifetime_meals: HashMap<i64, u32> = HashMap::new();
    for meal in meals {
        *lifetime_meals.entry(meal.purchase_id.0).or_insert(0) += meal.meal_count;
    }

    let in_range: Vec<&MealRecord> = meals.iter().filter(|m| range.contains(m.date)).collect();

    let total_meals: u32 = in_range.iter().map(|m| m.meal_count).sum();
    let unattributed_meals: u32 = in_range
        .iter()
        .filter(|m| {
            !purchase_by_id.contains_key(&m.purchase_id.0)
                || !member_ids.contains(&m.member_id.0)
        })
        .map(|m| m.meal_count)
        .sum();

    let total_expense: Money = purchases
        .iter()
        .filter(|p| range.contains(p.purchased_at))
        .map(|p| p.price)
        .sum();

    let per_meal_average = if total_meals == 0 {
        Money::zero()
    } else {
        Money::from_decimal(total_expense.amount() / Decimal::from(total_meals))
    };

    let per_meal_rate = |purchase_id: PurchaseId| -> Decimal {
        let Some(purchase) = purchase_by_id.get(&purchase_id.0) else {
            return Decimal::ZERO;
        };
        match lifetime_meals.get(&purchase_id.0) {
            Some(&n) if n > 0 => purchase.price.amount() / Decimal::from(n),
            _ => Decimal::ZERO,
        }
    };

    let by_member = members
        .iter()
        .filter_map(|member| {
            let member_id = member.id?;
            let mut meal_total = 0u32;
            let mut base = Decimal::ZERO;
            let mut seasoning = Decimal::ZERO;

            for meal in in_range.iter().filter(|m| m.member_id == member_id) {
                meal_total += meal.meal_count;
                base += per_meal_rate(meal.purchase_id) * Decimal::from(meal.meal_count);

                if let Some(purchase) = purchase_by_id.get(&meal.purchase_id.0) {
                    if let Some(dish) = DishType::of(&purchase.item_name) {
                        seasoning +=
                            allocator.per_meal_cost(dish) * Decimal::from(meal.meal_count);
                    }
                }
            }

            Some(MemberSummary {
                member_id,
                name: member.name.clone(),
                meals: meal_total,
                base_cost: Money::from_decimal(base),
                seasoning_cost: Money::from_decimal(seasoning),
                grand_total: Money::from_decimal(base + seasoning),
            })
        })
        .collect();

    let by_item = purchases
        .iter()
        .filter(|p| range.contains(p.purchased_at))
        .filter_map(|purchase| {
            let purchase_id = purchase.id?;
            let meals_in_range: u32 = in_range
                .iter()
                .filter(|m| m.purchase_id == purchase_id)
                .map(|m| m.meal_count)
                .sum();
            // Purchases nobody ate from in this period stay out of the
            // breakdown; they still count toward the period's expense.
            if meals_in_range == 0 {
                return None;
            }
            Some(ItemSummary {
                purchase_id,
                item_name: purchase.item_name.clone(),
                total_cost: purchase.price,
                meals_in_range,
                lifetime_meals: lifetime_meals.get(&purchase_id.0).copied().unwrap_or(0),
                per_meal_cost: per_meal_rate(purchase_id),
            })
        })
        .collect();

    RangeReport {
        range,
        total_expense,
        total_meals,
        unattributed_meals,
        per_meal_average,
        by_member,
        by_item,
    }
}
