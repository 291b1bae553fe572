use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use messbook_core::{
    Category, DateRange, MealId, MealRecord, Member, MemberId, Money, Purchase, PurchaseId,
};
use messbook_parse::LineParser;
use messbook_report::{
    build_report, report_csv, DishMealCounts, IngredientCost, RangeReport, SeasoningAllocator,
};
use messbook_storage as storage;
use messbook_storage::DbPool;

use crate::error::ApiError;

pub fn router(pool: DbPool) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/purchases", get(list_purchases).post(create_purchase))
        .route("/api/purchases/parse", post(parse_purchases))
        .route(
            "/api/purchases/{id}",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
        .route("/api/members", get(list_members).post(create_member))
        .route("/api/members/{id}", put(update_member).delete(delete_member))
        .route("/api/meals", get(list_meals).post(create_meal))
        .route("/api/meals/{id}", put(update_meal).delete(delete_meal))
        .route("/api/report", post(run_report))
        .route("/api/report/csv", post(run_report_csv))
        .with_state(pool)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "messbook-api" }))
}

#[derive(Debug, Deserialize)]
struct PurchaseFilter {
    q: Option<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct PurchaseTotals {
    total_quantity: Decimal,
    total_amount: Money,
}

#[derive(Debug, Serialize)]
struct PurchaseList {
    purchases: Vec<Purchase>,
    totals: PurchaseTotals,
}

async fn list_purchases(
    State(pool): State<DbPool>,
    Query(filter): Query<PurchaseFilter>,
) -> Result<Json<PurchaseList>, ApiError> {
    let purchases =
        storage::list_purchases(&pool, filter.q.as_deref(), filter.start, filter.end).await?;
    let totals = PurchaseTotals {
        total_quantity: purchases.iter().map(|p| p.quantity).sum(),
        total_amount: purchases.iter().map(|p| p.price).sum(),
    };
    Ok(Json(PurchaseList { purchases, totals }))
}

async fn create_purchase(
    State(pool): State<DbPool>,
    Json(mut purchase): Json<Purchase>,
) -> Result<(StatusCode, Json<Purchase>), ApiError> {
    purchase.validate()?;
    if purchase.category.is_none() {
        purchase.category = Some(purchase.effective_category());
    }

    let id = storage::insert_purchase(&pool, &purchase).await?;
    let stored = storage::get_purchase(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("purchase"))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn get_purchase(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
) -> Result<Json<Purchase>, ApiError> {
    let purchase = storage::get_purchase(&pool, PurchaseId(id))
        .await?
        .ok_or(ApiError::NotFound("purchase"))?;
    Ok(Json(purchase))
}

async fn update_purchase(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
    Json(purchase): Json<Purchase>,
) -> Result<Json<Purchase>, ApiError> {
    purchase.validate()?;
    if !storage::update_purchase(&pool, PurchaseId(id), &purchase).await? {
        return Err(ApiError::NotFound("purchase"));
    }
    let stored = storage::get_purchase(&pool, PurchaseId(id))
        .await?
        .ok_or(ApiError::NotFound("purchase"))?;
    Ok(Json(stored))
}

async fn delete_purchase(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !storage::delete_purchase(&pool, PurchaseId(id)).await? {
        return Err(ApiError::NotFound("purchase"));
    }
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
struct ParseRequest {
    text: String,
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ParseResponse {
    created: Vec<Purchase>,
    unparsed: Vec<String>,
}

/// Parses a pasted shopping block and stores every accepted line as a
/// purchase dated `date` (today when omitted). Rejected lines come back
/// verbatim so the client can show them for correction.
async fn parse_purchases(
    State(pool): State<DbPool>,
    Json(request): Json<ParseRequest>,
) -> Result<(StatusCode, Json<ParseResponse>), ApiError> {
    let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
    let batch = LineParser::default().parse_block(&request.text);

    let purchases: Vec<Purchase> = batch
        .items
        .into_iter()
        .map(|item| {
            let mut purchase = Purchase::new(&item.item_name, item.quantity, item.price, date);
            purchase.unit = item.unit;
            purchase.category = Some(Category::of(&item.item_name));
            purchase
        })
        .collect();

    // One transaction for the whole block: a failed batch leaves no rows.
    let ids = storage::insert_purchases(&pool, &purchases).await?;
    let mut created = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(stored) = storage::get_purchase(&pool, id).await? {
            created.push(stored);
        }
    }

    tracing::info!(
        accepted = created.len(),
        rejected = batch.unparsed.len(),
        "parsed purchase block"
    );

    let status = if created.is_empty() && !batch.unparsed.is_empty() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(ParseResponse {
            created,
            unparsed: batch.unparsed,
        }),
    ))
}

async fn list_members(State(pool): State<DbPool>) -> Result<Json<Vec<Member>>, ApiError> {
    Ok(Json(storage::get_all_members(&pool).await?))
}

async fn create_member(
    State(pool): State<DbPool>,
    Json(member): Json<Member>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    member.validate()?;
    let id = storage::insert_member(&pool, &member).await?;
    let stored = storage::get_member(&pool, id)
        .await?
        .ok_or(ApiError::NotFound("member"))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn update_member(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
    Json(member): Json<Member>,
) -> Result<Json<Member>, ApiError> {
    member.validate()?;
    if !storage::update_member(&pool, MemberId(id), &member).await? {
        return Err(ApiError::NotFound("member"));
    }
    let stored = storage::get_member(&pool, MemberId(id))
        .await?
        .ok_or(ApiError::NotFound("member"))?;
    Ok(Json(stored))
}

async fn delete_member(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !storage::delete_member(&pool, MemberId(id)).await? {
        return Err(ApiError::NotFound("member"));
    }
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
struct MealFilter {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

async fn list_meals(
    State(pool): State<DbPool>,
    Query(filter): Query<MealFilter>,
) -> Result<Json<Vec<MealRecord>>, ApiError> {
    Ok(Json(
        storage::list_meals(&pool, filter.start, filter.end).await?,
    ))
}

async fn create_meal(
    State(pool): State<DbPool>,
    Json(meal): Json<MealRecord>,
) -> Result<(StatusCode, Json<MealRecord>), ApiError> {
    meal.validate()?;
    if storage::get_member(&pool, meal.member_id).await?.is_none() {
        return Err(ApiError::Validation("unknown member".to_string()));
    }
    if storage::get_purchase(&pool, meal.purchase_id).await?.is_none() {
        return Err(ApiError::Validation("unknown purchase".to_string()));
    }

    let id = storage::insert_meal(&pool, &meal).await?;
    let mut stored = meal;
    stored.id = Some(id);
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn update_meal(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
    Json(meal): Json<MealRecord>,
) -> Result<Json<MealRecord>, ApiError> {
    meal.validate()?;
    if !storage::update_meal(&pool, MealId(id), &meal).await? {
        return Err(ApiError::NotFound("meal record"));
    }
    let mut stored = meal;
    stored.id = Some(MealId(id));
    Ok(Json(stored))
}

async fn delete_meal(
    State(pool): State<DbPool>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !storage::delete_meal(&pool, MealId(id)).await? {
        return Err(ApiError::NotFound("meal record"));
    }
    Ok(Json(json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
struct ReportRequest {
    start: NaiveDate,
    end: NaiveDate,
    #[serde(default)]
    ingredient_costs: Vec<IngredientCost>,
    #[serde(default)]
    dish_meals: DishMealCounts,
}

async fn compute_report(pool: &DbPool, request: ReportRequest) -> Result<RangeReport, ApiError> {
    if request.start > request.end {
        return Err(ApiError::Validation(
            "start date must not be after end date".to_string(),
        ));
    }

    let purchases = storage::get_all_purchases(pool).await?;
    let meals = storage::get_all_meals(pool).await?;
    let members = storage::get_all_members(pool).await?;
    let allocator = SeasoningAllocator::new(request.ingredient_costs, request.dish_meals);

    Ok(build_report(
        DateRange::new(request.start, request.end),
        &purchases,
        &meals,
        &members,
        &allocator,
    ))
}

async fn run_report(
    State(pool): State<DbPool>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<RangeReport>, ApiError> {
    Ok(Json(compute_report(&pool, request).await?))
}

async fn run_report_csv(
    State(pool): State<DbPool>,
    Json(request): Json<ReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = compute_report(&pool, request).await?;
    let csv = report_csv(&report)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], csv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn test_app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let pool = storage::create_db(&dir.path().join("messbook.db"))
            .await
            .unwrap();
        (dir, router(pool))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> axum::response::Response {
        app.clone().oneshot(request).await.unwrap()
    }

    // Raw decimals serialize with whatever scale arithmetic left behind, so
    // compare them numerically.
    fn dec_field(value: &serde_json::Value) -> f64 {
        value.as_str().unwrap().parse().unwrap()
    }

    fn purchase_body(name: &str, price: &str, date: &str) -> serde_json::Value {
        json!({
            "id": null,
            "item_name": name,
            "quantity": "1",
            "unit": null,
            "price": price,
            "purchased_at": date,
            "category": null,
            "notes": null,
            "created_at": null,
            "updated_at": null,
        })
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let (_dir, app) = test_app().await;
        let response = send(&app, get_request("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn purchase_crud_round_trip() {
        let (_dir, app) = test_app().await;

        let response = send(
            &app,
            json_request("POST", "/api/purchases", purchase_body("Rice", "270", "2024-06-01")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        let id = created["id"].as_i64().unwrap();
        // Category was auto-classified on save.
        assert_eq!(created["category"], "Rice");

        let response = send(&app, get_request(&format!("/api/purchases/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched["item_name"], "Rice");

        let mut edited = purchase_body("Rice", "300", "2024-06-01");
        edited["category"] = json!("Rice");
        let response = send(
            &app,
            json_request("PUT", &format!("/api/purchases/{id}"), edited),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["price"], "300.00");

        let response = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/purchases/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, get_request(&format!("/api/purchases/{id}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_purchase_is_rejected() {
        let (_dir, app) = test_app().await;
        let response = send(
            &app,
            json_request("POST", "/api/purchases", purchase_body("  ", "100", "2024-06-01")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "item name must not be empty");
    }

    #[tokio::test]
    async fn purchase_list_filters_and_totals() {
        let (_dir, app) = test_app().await;
        for (name, price, date) in [
            ("Rice", "270", "2024-06-01"),
            ("Salt", "42", "2024-06-05"),
            ("Salt", "45", "2024-07-01"),
        ] {
            send(
                &app,
                json_request("POST", "/api/purchases", purchase_body(name, price, date)),
            )
            .await;
        }

        let response = send(
            &app,
            get_request("/api/purchases?q=salt&start=2024-06-01&end=2024-06-30"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["purchases"].as_array().unwrap().len(), 1);
        assert_eq!(body["totals"]["total_amount"], "42.00");
    }

    #[tokio::test]
    async fn parse_endpoint_creates_purchases_and_reports_rejects() {
        let (_dir, app) = test_app().await;
        let response = send(
            &app,
            json_request(
                "POST",
                "/api/purchases/parse",
                json!({ "text": "Alu 1 KG 30\nlobon 42 tk\nno price here", "date": "2024-06-01" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;

        let created = body["created"].as_array().unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0]["item_name"], "Potato");
        assert_eq!(created[0]["unit"], "KG");
        assert_eq!(created[1]["item_name"], "Salt");
        assert_eq!(body["unparsed"], json!(["no price here"]));
    }

    #[tokio::test]
    async fn parse_endpoint_with_nothing_usable_is_unprocessable() {
        let (_dir, app) = test_app().await;
        let response = send(
            &app,
            json_request(
                "POST",
                "/api/purchases/parse",
                json!({ "text": "just words, more words" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn meal_creation_checks_references() {
        let (_dir, app) = test_app().await;
        let response = send(
            &app,
            json_request(
                "POST",
                "/api/meals",
                json!({
                    "id": null,
                    "date": "2024-06-02",
                    "member_id": 1,
                    "purchase_id": 1,
                    "meal_count": 1,
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "unknown member");
    }

    async fn seed_household(app: &Router) -> (i64, i64) {
        let response = send(
            app,
            json_request(
                "POST",
                "/api/members",
                json!({
                    "id": null,
                    "name": "Rahim",
                    "active": true,
                    "created_at": null,
                    "updated_at": null,
                }),
            ),
        )
        .await;
        let member_id = body_json(response).await["id"].as_i64().unwrap();

        let response = send(
            app,
            json_request("POST", "/api/purchases", purchase_body("Rice", "200", "2024-06-01")),
        )
        .await;
        let purchase_id = body_json(response).await["id"].as_i64().unwrap();

        send(
            app,
            json_request(
                "POST",
                "/api/meals",
                json!({
                    "id": null,
                    "date": "2024-06-02",
                    "member_id": member_id,
                    "purchase_id": purchase_id,
                    "meal_count": 4,
                }),
            ),
        )
        .await;

        (member_id, purchase_id)
    }

    fn june_report() -> serde_json::Value {
        json!({ "start": "2024-06-01", "end": "2024-06-30" })
    }

    #[tokio::test]
    async fn meal_list_supports_date_window() {
        let (_dir, app) = test_app().await;
        seed_household(&app).await;

        let response = send(&app, get_request("/api/meals?start=2024-06-01&end=2024-06-30")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let response = send(&app, get_request("/api/meals?start=2024-07-01")).await;
        let body = body_json(response).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_reflects_purchase_edits() {
        let (_dir, app) = test_app().await;
        let (_, purchase_id) = seed_household(&app).await;

        let response = send(&app, json_request("POST", "/api/report", june_report())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let before = body_json(response).await;
        assert_eq!(dec_field(&before["by_item"][0]["per_meal_cost"]), 50.0);
        assert_eq!(before["by_member"][0]["base_cost"], "200.00");

        let mut edited = purchase_body("Rice", "400", "2024-06-01");
        edited["category"] = json!("Rice");
        send(
            &app,
            json_request("PUT", &format!("/api/purchases/{purchase_id}"), edited),
        )
        .await;

        let after = body_json(send(&app, json_request("POST", "/api/report", june_report())).await).await;
        assert_eq!(dec_field(&after["by_item"][0]["per_meal_cost"]), 100.0);
        assert_eq!(after["by_member"][0]["base_cost"], "400.00");
    }

    #[tokio::test]
    async fn report_counts_meals_of_deleted_purchases_as_unattributed() {
        let (_dir, app) = test_app().await;
        let (_, purchase_id) = seed_household(&app).await;

        send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/purchases/{purchase_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        let body = body_json(send(&app, json_request("POST", "/api/report", june_report())).await).await;
        assert_eq!(body["total_meals"], 4);
        assert_eq!(body["unattributed_meals"], 4);
        assert_eq!(body["by_member"][0]["base_cost"], "0.00");
    }

    #[tokio::test]
    async fn report_applies_seasoning_allocation() {
        let (_dir, app) = test_app().await;

        // One member eats 3 chicken meals; 100 BDT of onion over 10 chicken
        // meals gives 10 per meal.
        let response = send(
            &app,
            json_request(
                "POST",
                "/api/members",
                json!({
                    "id": null,
                    "name": "Karim",
                    "active": true,
                    "created_at": null,
                    "updated_at": null,
                }),
            ),
        )
        .await;
        let member_id = body_json(response).await["id"].as_i64().unwrap();

        let response = send(
            &app,
            json_request("POST", "/api/purchases", purchase_body("Chicken", "450", "2024-06-01")),
        )
        .await;
        let purchase_id = body_json(response).await["id"].as_i64().unwrap();

        send(
            &app,
            json_request(
                "POST",
                "/api/meals",
                json!({
                    "id": null,
                    "date": "2024-06-02",
                    "member_id": member_id,
                    "purchase_id": purchase_id,
                    "meal_count": 3,
                }),
            ),
        )
        .await;

        let request = json!({
            "start": "2024-06-01",
            "end": "2024-06-30",
            "ingredient_costs": [{ "ingredient": "onion", "total_cost": "100" }],
            "dish_meals": { "chicken": 10 },
        });
        let body = body_json(send(&app, json_request("POST", "/api/report", request)).await).await;
        assert_eq!(body["by_member"][0]["seasoning_cost"], "30.00");
    }

    #[tokio::test]
    async fn report_rejects_inverted_range() {
        let (_dir, app) = test_app().await;
        let response = send(
            &app,
            json_request(
                "POST",
                "/api/report",
                json!({ "start": "2024-06-30", "end": "2024-06-01" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn csv_report_is_plain_text() {
        let (_dir, app) = test_app().await;
        seed_household(&app).await;

        let response = send(&app, json_request("POST", "/api/report/csv", june_report())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/csv"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("Report From,2024-06-01,To,2024-06-30"));
        assert!(text.contains("Member Breakdown"));
        assert!(text.contains("Rice,200.00,4,50.00"));
    }
}
