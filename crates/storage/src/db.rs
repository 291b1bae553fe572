use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

use messbook_core::{
    Category, MealId, MealRecord, Member, MemberId, Money, Purchase, PurchaseId, Unit,
};

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA cache_size = -32000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

// meal_records deliberately carries no foreign keys: deleting a purchase or a
// member keeps its historical meal rows, which reports then surface as
// unattributed meals.
async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS purchases (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_name TEXT NOT NULL,
            quantity TEXT NOT NULL,
            unit TEXT,
            price_cents INTEGER NOT NULL,
            purchased_at TEXT NOT NULL,
            category TEXT,
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meal_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            member_id INTEGER NOT NULL,
            purchase_id INTEGER NOT NULL,
            meal_count INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

type PurchaseRow = (
    i64,
    String,
    String,
    Option<String>,
    i64,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

const PURCHASE_COLUMNS: &str =
    "id, item_name, quantity, unit, price_cents, purchased_at, category, notes, created_at, updated_at";

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|t| t.and_utc())
}

fn purchase_from_row(r: PurchaseRow) -> Purchase {
    Purchase {
        id: Some(PurchaseId(r.0)),
        item_name: r.1,
        quantity: Decimal::from_str(&r.2).unwrap_or_default(),
        unit: r.3.map(|u| Unit::parse(&u)),
        price: Money::from_cents(r.4),
        purchased_at: r.5.parse().unwrap_or_default(),
        category: r.6.as_deref().and_then(Category::parse),
        notes: r.7,
        created_at: parse_timestamp(&r.8),
        updated_at: parse_timestamp(&r.9),
    }
}

pub async fn insert_purchase(pool: &DbPool, purchase: &Purchase) -> Result<PurchaseId, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO purchases (item_name, quantity, unit, price_cents, purchased_at, category, notes) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&purchase.item_name)
    .bind(purchase.quantity.to_string())
    .bind(purchase.unit.as_ref().map(|u| u.as_str().to_string()))
    .bind(purchase.price.to_cents())
    .bind(purchase.purchased_at.to_string())
    .bind(purchase.category.map(|c| c.as_str()))
    .bind(&purchase.notes)
    .execute(pool)
    .await?;

    Ok(PurchaseId(result.last_insert_rowid()))
}

/// Inserts a batch of purchases in one transaction: either every row lands
/// or none does.
pub async fn insert_purchases(
    pool: &DbPool,
    purchases: &[Purchase],
) -> Result<Vec<PurchaseId>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut ids = Vec::with_capacity(purchases.len());
    for purchase in purchases {
        let result = sqlx::query(
            "INSERT INTO purchases (item_name, quantity, unit, price_cents, purchased_at, category, notes) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&purchase.item_name)
        .bind(purchase.quantity.to_string())
        .bind(purchase.unit.as_ref().map(|u| u.as_str().to_string()))
        .bind(purchase.price.to_cents())
        .bind(purchase.purchased_at.to_string())
        .bind(purchase.category.map(|c| c.as_str()))
        .bind(&purchase.notes)
        .execute(&mut *tx)
        .await?;
        ids.push(PurchaseId(result.last_insert_rowid()));
    }
    tx.commit().await?;
    Ok(ids)
}

pub async fn get_purchase(pool: &DbPool, id: PurchaseId) -> Result<Option<Purchase>, sqlx::Error> {
    let row = sqlx::query_as::<_, PurchaseRow>(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases WHERE id = ?"
    ))
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(purchase_from_row))
}

pub async fn get_all_purchases(pool: &DbPool) -> Result<Vec<Purchase>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
        "SELECT {PURCHASE_COLUMNS} FROM purchases ORDER BY purchased_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(purchase_from_row).collect())
}

/// Purchases filtered by a case-insensitive name substring and an inclusive
/// date window. Every filter is optional.
pub async fn list_purchases(
    pool: &DbPool,
    query: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<Purchase>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
        r#"
        SELECT {PURCHASE_COLUMNS} FROM purchases
        WHERE (?1 IS NULL OR item_name LIKE '%' || ?1 || '%')
          AND (?2 IS NULL OR purchased_at >= ?2)
          AND (?3 IS NULL OR purchased_at <= ?3)
        ORDER BY purchased_at DESC, id DESC
        "#
    ))
    .bind(query)
    .bind(start.map(|d| d.to_string()))
    .bind(end.map(|d| d.to_string()))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(purchase_from_row).collect())
}

pub async fn update_purchase(
    pool: &DbPool,
    id: PurchaseId,
    purchase: &Purchase,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE purchases
        SET item_name = ?, quantity = ?, unit = ?, price_cents = ?, purchased_at = ?,
            category = ?, notes = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&purchase.item_name)
    .bind(purchase.quantity.to_string())
    .bind(purchase.unit.as_ref().map(|u| u.as_str().to_string()))
    .bind(purchase.price.to_cents())
    .bind(purchase.purchased_at.to_string())
    .bind(purchase.category.map(|c| c.as_str()))
    .bind(&purchase.notes)
    .bind(id.0)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_purchase(pool: &DbPool, id: PurchaseId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM purchases WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

type MemberRow = (i64, String, i64, String, String);

fn member_from_row(r: MemberRow) -> Member {
    Member {
        id: Some(MemberId(r.0)),
        name: r.1,
        active: r.2 != 0,
        created_at: parse_timestamp(&r.3),
        updated_at: parse_timestamp(&r.4),
    }
}

pub async fn insert_member(pool: &DbPool, member: &Member) -> Result<MemberId, sqlx::Error> {
    let result = sqlx::query("INSERT INTO members (name, active) VALUES (?, ?)")
        .bind(&member.name)
        .bind(member.active as i64)
        .execute(pool)
        .await?;
    Ok(MemberId(result.last_insert_rowid()))
}

pub async fn get_member(pool: &DbPool, id: MemberId) -> Result<Option<Member>, sqlx::Error> {
    let row = sqlx::query_as::<_, MemberRow>(
        "SELECT id, name, active, created_at, updated_at FROM members WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(member_from_row))
}

pub async fn get_all_members(pool: &DbPool) -> Result<Vec<Member>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MemberRow>(
        "SELECT id, name, active, created_at, updated_at FROM members ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(member_from_row).collect())
}

pub async fn update_member(pool: &DbPool, id: MemberId, member: &Member) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE members SET name = ?, active = ?, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(&member.name)
    .bind(member.active as i64)
    .bind(id.0)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_member(pool: &DbPool, id: MemberId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

type MealRow = (i64, String, i64, i64, i64);

fn meal_from_row(r: MealRow) -> MealRecord {
    MealRecord {
        id: Some(MealId(r.0)),
        date: r.1.parse().unwrap_or_default(),
        member_id: MemberId(r.2),
        purchase_id: PurchaseId(r.3),
        meal_count: r.4.max(0) as u32,
    }
}

pub async fn insert_meal(pool: &DbPool, meal: &MealRecord) -> Result<MealId, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO meal_records (date, member_id, purchase_id, meal_count) VALUES (?, ?, ?, ?)",
    )
    .bind(meal.date.to_string())
    .bind(meal.member_id.0)
    .bind(meal.purchase_id.0)
    .bind(meal.meal_count as i64)
    .execute(pool)
    .await?;
    Ok(MealId(result.last_insert_rowid()))
}

pub async fn get_all_meals(pool: &DbPool) -> Result<Vec<MealRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MealRow>(
        "SELECT id, date, member_id, purchase_id, meal_count FROM meal_records ORDER BY date, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(meal_from_row).collect())
}

/// Meal records inside an optional inclusive date window.
pub async fn list_meals(
    pool: &DbPool,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<MealRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MealRow>(
        r#"
        SELECT id, date, member_id, purchase_id, meal_count FROM meal_records
        WHERE (?1 IS NULL OR date >= ?1)
          AND (?2 IS NULL OR date <= ?2)
        ORDER BY date, id
        "#,
    )
    .bind(start.map(|d| d.to_string()))
    .bind(end.map(|d| d.to_string()))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(meal_from_row).collect())
}

pub async fn update_meal(pool: &DbPool, id: MealId, meal: &MealRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE meal_records SET date = ?, member_id = ?, purchase_id = ?, meal_count = ? WHERE id = ?",
    )
    .bind(meal.date.to_string())
    .bind(meal.member_id.0)
    .bind(meal.purchase_id.0)
    .bind(meal.meal_count as i64)
    .bind(id.0)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_meal(pool: &DbPool, id: MealId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM meal_records WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
