//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use openbudget_core::Database;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup_test_app() -> Router {
    let db = Database::in_memory().unwrap();
    create_router(db, ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> axum::response::Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn send_raw(app: &Router, method: &str, uri: &str, raw: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(raw.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let response = send(app, "POST", uri, Some(body)).await;
    assert_eq!(response.status(), StatusCode::CREATED, "POST {}", uri);
    get_body_json(response).await
}

async fn create_category(app: &Router, name: &str, kind: &str) -> String {
    let json = create(app, "/categories", json!({ "name": name, "type": kind })).await;
    json["id"].as_str().unwrap().to_string()
}

async fn create_budget(app: &Router, category_id: &str, start: &str, end: &str) -> String {
    let json = create(
        app,
        "/budgets",
        json!({
            "name": format!("Budget {}", start),
            "amount": 500,
            "type": "EXPENSE",
            "categoryId": category_id,
            "startDate": start,
            "endDate": end
        }),
    )
    .await;
    json["id"].as_str().unwrap().to_string()
}

async fn create_transaction(app: &Router, body: Value) -> Value {
    create(app, "/transactions", body).await
}

async fn list(app: &Router, uri: &str) -> Vec<Value> {
    let response = send(app, "GET", uri, None).await;
    assert_eq!(response.status(), StatusCode::OK, "GET {}", uri);
    get_body_json(response).await.as_array().unwrap().clone()
}

async fn assert_error(response: axum::response::Response, status: StatusCode) -> String {
    assert_eq!(response.status(), status);
    let json = get_body_json(response).await;
    json["error"]
        .as_str()
        .expect("error body should carry a message")
        .to_string()
}

// ========== General ==========

#[tokio::test]
async fn test_welcome() {
    let app = setup_test_app();
    let response = send(&app, "GET", "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["message"], "Welcome to OpenBudget API");
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = setup_test_app();
    let response = send(&app, "GET", "/categories", None).await;

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("content-security-policy").is_some());
}

#[test]
fn test_parse_origins() {
    assert_eq!(
        parse_origins(" http://localhost:5173, ,https://budget.example.com "),
        vec!["http://localhost:5173", "https://budget.example.com"]
    );
    assert!(parse_origins("").is_empty());
}

#[test]
fn test_core_errors_map_to_status_codes() {
    let validation = AppError::from(openbudget_core::Error::validation("bad"));
    assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

    let missing = AppError::from(openbudget_core::Error::NotFound("Budget not found".into()));
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let backend = AppError::from(openbudget_core::Error::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        "disk full",
    )));
    assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ========== Categories ==========

#[tokio::test]
async fn test_category_create_and_fetch() {
    let app = setup_test_app();

    let created = create(
        &app,
        "/categories",
        json!({
            "name": "Food",
            "type": "EXPENSE",
            "description": "Groceries and eating out",
            "icon": "utensils",
            "color": "#ff8800"
        }),
    )
    .await;
    assert_eq!(created["name"], "Food");
    assert_eq!(created["type"], "EXPENSE");
    assert!(created["createdAt"].is_string());

    let id = created["id"].as_str().unwrap();
    let response = send(&app, "GET", &format!("/categories/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["color"], "#ff8800");
    assert_eq!(json["transactions"], json!([]));
}

#[tokio::test]
async fn test_category_duplicate_name_rejected() {
    let app = setup_test_app();
    create_category(&app, "Food", "EXPENSE").await;

    let response = send(
        &app,
        "POST",
        "/categories",
        Some(json!({ "name": "Food", "type": "INCOME" })),
    )
    .await;
    let message = assert_error(response, StatusCode::BAD_REQUEST).await;
    assert_eq!(message, "Category name must be unique");
}

#[tokio::test]
async fn test_category_invalid_color_rejected() {
    let app = setup_test_app();
    let response = send(
        &app,
        "POST",
        "/categories",
        Some(json!({ "name": "Food", "type": "EXPENSE", "color": "#12345" })),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_malformed_bodies_return_json_errors() {
    let app = setup_test_app();

    let response = send_raw(&app, "POST", "/categories", "{not json").await;
    let message = assert_error(response, StatusCode::BAD_REQUEST).await;
    assert!(message.starts_with("Invalid JSON"));

    // Missing required field
    let response = send(&app, "POST", "/categories", Some(json!({ "name": "Food" }))).await;
    assert_error(response, StatusCode::BAD_REQUEST).await;

    // Enum values are case-sensitive
    let response = send(
        &app,
        "POST",
        "/categories",
        Some(json!({ "name": "Food", "type": "expense" })),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_category_update_and_type_filter() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;
    create_category(&app, "Salary", "INCOME").await;

    let response = send(
        &app,
        "PUT",
        &format!("/categories/{}", food),
        Some(json!({ "name": "Groceries", "type": "EXPENSE", "icon": "cart" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["name"], "Groceries");
    assert_eq!(json["icon"], "cart");

    let expenses = list(&app, "/categories?type=EXPENSE").await;
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0]["name"], "Groceries");

    // Empty and unknown parameters are ignored
    assert_eq!(list(&app, "/categories?type=&color=red").await.len(), 2);
}

#[tokio::test]
async fn test_category_delete_cascades() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;
    let budget = create_budget(&app, &food, "2024-01-01", "2024-03-31").await;
    create_transaction(
        &app,
        json!({
            "type": "EXPENSE",
            "amount": 20,
            "description": "Market",
            "categoryId": food,
            "budgetId": budget,
            "date": "2024-01-10"
        }),
    )
    .await;

    let response = send(&app, "DELETE", &format!("/categories/{}", food), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(list(&app, "/transactions").await.is_empty());
    assert!(list(&app, "/budgets").await.is_empty());

    let response = send(&app, "GET", &format!("/categories/{}", food), None).await;
    let message = assert_error(response, StatusCode::NOT_FOUND).await;
    assert_eq!(message, "Category not found");
}

// ========== Budgets ==========

#[tokio::test]
async fn test_budget_lifecycle() {
    let app = setup_test_app();
    let category_id = create_category(&app, "Food", "EXPENSE").await;

    let created = create(
        &app,
        "/budgets",
        json!({
            "name": "Groceries Q1",
            "amount": 500,
            "type": "EXPENSE",
            "categoryId": category_id,
            "startDate": "2024-01-01",
            "endDate": "2024-03-31"
        }),
    )
    .await;
    assert_eq!(created["name"], "Groceries Q1");
    assert_eq!(created["amount"], 500.0);
    assert_eq!(created["categoryId"], category_id.as_str());
    assert_eq!(created["category"]["name"], "Food");
    assert_eq!(created["transactions"], json!([]));
    assert!(created["startDate"]
        .as_str()
        .unwrap()
        .starts_with("2024-01-01T00:00:00"));

    let id = created["id"].as_str().unwrap();
    let uri = format!("/budgets/{}", id);

    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());

    let response = send(&app, "GET", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_body_json(response).await;
    assert_eq!(json, json!({ "error": "Budget not found" }));
}

#[tokio::test]
async fn test_budget_unknown_category_rejected() {
    let app = setup_test_app();
    let response = send(
        &app,
        "POST",
        "/budgets",
        Some(json!({
            "name": "Ghost",
            "amount": 10,
            "type": "EXPENSE",
            "categoryId": "does-not-exist",
            "startDate": "2024-01-01",
            "endDate": "2024-01-31"
        })),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST).await;
}

#[tokio::test]
async fn test_budget_date_filters() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;

    let last_year = create_budget(&app, &food, "2023-10-01", "2023-12-31").await;
    let q1 = create_budget(&app, &food, "2024-01-01", "2024-03-31").await;
    let q4 = create_budget(&app, &food, "2024-10-01", "2024-12-31").await;
    let spanning = create_budget(&app, &food, "2024-12-01", "2025-01-31").await;

    let all = list(&app, "/budgets").await;
    let ids: Vec<&str> = all.iter().map(|b| b["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![spanning.as_str(), q4.as_str(), q1.as_str(), last_year.as_str()]);

    let in_2024 = list(&app, "/budgets?startDate=2024-01-01&endDate=2024-12-31").await;
    let ids: Vec<&str> = in_2024.iter().map(|b| b["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![q4.as_str(), q1.as_str()]);

    let by_category = list(&app, &format!("/budgets?categoryId={}&type=INCOME", food)).await;
    assert!(by_category.is_empty());
}

#[tokio::test]
async fn test_five_digit_years_rejected_without_breaking_lists() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;
    create_budget(&app, &food, "2024-01-01", "2024-03-31").await;

    let response = send(
        &app,
        "POST",
        "/budgets",
        Some(json!({
            "name": "Far future", "amount": 10, "type": "EXPENSE",
            "categoryId": food, "startDate": "+10000-01-01", "endDate": "+10000-12-31"
        })),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST).await;

    let response = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({
            "type": "EXPENSE", "amount": 10, "description": "Time travel",
            "categoryId": food, "date": "+10000-01-01"
        })),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST).await;

    // `%2B` is an encoded `+`
    for uri in ["/budgets?startDate=%2B10000-01-01", "/transactions?endDate=%2B10000-01-01"] {
        let response = send(&app, "GET", uri, None).await;
        assert_error(response, StatusCode::BAD_REQUEST).await;
    }

    assert_eq!(list(&app, "/budgets").await.len(), 1);
    assert!(list(&app, "/transactions").await.is_empty());
    let categories = list(&app, "/categories").await;
    assert_eq!(categories[0]["transactions"], json!([]));
}

#[tokio::test]
async fn test_budget_update_not_found_before_validation() {
    let app = setup_test_app();
    let response = send_raw(&app, "PUT", "/budgets/missing", "{}").await;
    let message = assert_error(response, StatusCode::NOT_FOUND).await;
    assert_eq!(message, "Budget not found");
}

#[tokio::test]
async fn test_budget_delete_detaches_transactions() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;
    let budget = create_budget(&app, &food, "2024-01-01", "2024-03-31").await;

    let tx = create_transaction(
        &app,
        json!({
            "type": "EXPENSE",
            "amount": 42.5,
            "description": "Market",
            "categoryId": food,
            "budgetId": budget,
            "date": "2024-02-01"
        }),
    )
    .await;
    assert_eq!(tx["budget"]["id"], budget.as_str());

    let fetched = send(&app, "GET", &format!("/budgets/{}", budget), None).await;
    let json = get_body_json(fetched).await;
    assert_eq!(json["transactions"].as_array().unwrap().len(), 1);

    let response = send(&app, "DELETE", &format!("/budgets/{}", budget), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let tx_id = tx["id"].as_str().unwrap();
    let response = send(&app, "GET", &format!("/transactions/{}", tx_id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["budgetId"], Value::Null);
    assert_eq!(json["budget"], Value::Null);
    assert_eq!(json["category"]["id"], food.as_str());
}

// ========== Transactions ==========

#[tokio::test]
async fn test_transaction_create_defaults() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;

    let tx = create_transaction(
        &app,
        json!({
            "type": "EXPENSE",
            "amount": 0,
            "description": "Free sample",
            "categoryId": food
        }),
    )
    .await;
    assert_eq!(tx["isRecurring"], false);
    assert_eq!(tx["recurringFrequency"], Value::Null);
    assert_eq!(tx["budgetId"], Value::Null);
    assert!(tx["date"].is_string());
    assert_eq!(tx["category"]["name"], "Food");
}

#[tokio::test]
async fn test_transaction_amount_and_frequency_validation() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;

    let response = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({
            "type": "EXPENSE",
            "amount": -0.01,
            "description": "Refund?",
            "categoryId": food
        })),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST).await;

    let response = send(
        &app,
        "POST",
        "/transactions",
        Some(json!({
            "type": "EXPENSE",
            "amount": 30,
            "description": "Gym",
            "categoryId": food,
            "isRecurring": true,
            "recurringFrequency": "FORTNIGHTLY"
        })),
    )
    .await;
    assert_error(response, StatusCode::BAD_REQUEST).await;

    let weekly = create_transaction(
        &app,
        json!({
            "type": "EXPENSE",
            "amount": 30,
            "description": "Gym",
            "categoryId": food,
            "isRecurring": true,
            "recurringFrequency": "WEEKLY"
        }),
    )
    .await;
    assert_eq!(weekly["isRecurring"], true);
    assert_eq!(weekly["recurringFrequency"], "WEEKLY");
}

#[tokio::test]
async fn test_transaction_date_range_filter() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;

    for day in ["2023-12-31", "2024-01-01", "2024-06-15", "2024-12-31", "2025-01-01"] {
        create_transaction(
            &app,
            json!({
                "type": "EXPENSE",
                "amount": 10,
                "description": format!("Shop {}", day),
                "categoryId": food,
                "date": day
            }),
        )
        .await;
    }

    let ranged = list(&app, "/transactions?startDate=2024-01-01&endDate=2024-12-31").await;
    let descriptions: Vec<&str> = ranged
        .iter()
        .map(|t| t["description"].as_str().unwrap())
        .collect();
    assert_eq!(
        descriptions,
        vec!["Shop 2024-12-31", "Shop 2024-06-15", "Shop 2024-01-01"]
    );
}

#[tokio::test]
async fn test_transaction_filters() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;
    let salary = create_category(&app, "Salary", "INCOME").await;

    create_transaction(
        &app,
        json!({
            "type": "EXPENSE", "amount": 9.99, "description": "Music",
            "categoryId": food, "isRecurring": true, "recurringFrequency": "MONTHLY"
        }),
    )
    .await;
    create_transaction(
        &app,
        json!({ "type": "EXPENSE", "amount": 12, "description": "Lunch", "categoryId": food }),
    )
    .await;
    create_transaction(
        &app,
        json!({ "type": "INCOME", "amount": 3000, "description": "Pay", "categoryId": salary }),
    )
    .await;

    let recurring = list(&app, "/transactions?isRecurring=true").await;
    assert_eq!(recurring.len(), 1);
    assert_eq!(recurring[0]["description"], "Music");

    let income = list(&app, "/transactions?type=INCOME").await;
    assert_eq!(income.len(), 1);
    assert_eq!(income[0]["description"], "Pay");

    let food_only = list(&app, &format!("/transactions?categoryId={}&isRecurring=false", food)).await;
    assert_eq!(food_only.len(), 1);
    assert_eq!(food_only[0]["description"], "Lunch");
}

#[tokio::test]
async fn test_unparseable_filters_rejected() {
    let app = setup_test_app();
    for uri in [
        "/transactions?startDate=yesterday",
        "/transactions?isRecurring=maybe",
        "/transactions?type=expense",
        "/budgets?endDate=2024-13-01",
        "/categories?type=TRANSFER",
    ] {
        let response = send(&app, "GET", uri, None).await;
        assert_error(response, StatusCode::BAD_REQUEST).await;
    }
}

#[tokio::test]
async fn test_transaction_update() {
    let app = setup_test_app();
    let food = create_category(&app, "Food", "EXPENSE").await;
    let tx = create_transaction(
        &app,
        json!({
            "type": "EXPENSE", "amount": 10, "description": "Lunch",
            "categoryId": food, "date": "2024-03-01"
        }),
    )
    .await;
    let uri = format!("/transactions/{}", tx["id"].as_str().unwrap());

    let response = send(
        &app,
        "PUT",
        &uri,
        Some(json!({
            "type": "EXPENSE", "amount": 12.75, "description": "Lunch and coffee",
            "categoryId": food
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 12.75);
    assert_eq!(json["description"], "Lunch and coffee");
    assert!(json["date"].as_str().unwrap().starts_with("2024-03-01"));

    let response = send_raw(&app, "PUT", "/transactions/missing", "not json").await;
    let message = assert_error(response, StatusCode::NOT_FOUND).await;
    assert_eq!(message, "Transaction not found");

    let response = send(&app, "DELETE", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = send(&app, "DELETE", &uri, None).await;
    assert_error(response, StatusCode::NOT_FOUND).await;
}
