//! Loan integration tests: the expenses borrowings and lendings write
//!
//! Require DATABASE_URL pointing at a disposable Postgres database.

use axum::http::StatusCode;
use axum::Router;
use serde_json::{json, Value};
use sqlx::Executor;

mod common;

use common::{create_budget, send, API_KEY, OTHER_API_KEY};

async fn budget_expenses(app: &Router, budget: &str) -> Vec<Value> {
    let (status, json) = send(app, "GET", &format!("/api/expenses?budgetId={}", budget), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    json["expenses"].as_array().unwrap().clone()
}

fn names(expenses: &[Value]) -> Vec<String> {
    let mut names: Vec<String> = expenses
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_borrowing_repay_records_expense_once() {
    let db = common::setup_test_db().await;
    let app = common::app(&db.pool);
    let budget = create_budget(&app, 2024, 7, 60000.0).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/borrowings",
        API_KEY,
        Some(json!({ "budgetId": budget, "lenderName": "Ravi", "amount": 2000, "date": "2024-07-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["borrowing"]["lenderName"], "Ravi");
    assert_eq!(json["borrowing"]["isRepaid"], false);
    let borrowing = json["borrowing"]["id"].as_str().unwrap().to_string();

    // Borrowing alone writes no expense
    assert!(budget_expenses(&app, &budget).await.is_empty());

    let (status, json) = send(&app, "PUT", &format!("/api/borrowings/{}/repay", borrowing), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Borrowing marked as repaid and expense created");
    assert_eq!(json["borrowing"]["isRepaid"], true);
    assert!(json["borrowing"]["repaidDate"].is_string());

    let expenses = budget_expenses(&app, &budget).await;
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0]["name"], "Loan Repayment to Ravi");
    assert_eq!(expenses[0]["category"], "Bills & Utilities");
    assert_eq!(expenses[0]["amount"], 2000.0);
    assert_eq!(expenses[0]["notes"], "Automatic expense for repaying loan to Ravi");
    assert_eq!(expenses[0]["sourceKind"], "borrowing_repayment");

    // Repaying again changes nothing
    let (status, json) = send(&app, "PUT", &format!("/api/borrowings/{}/repay", borrowing), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Borrowing is already marked as repaid");
    assert_eq!(budget_expenses(&app, &budget).await.len(), 1);

    // Another user cannot repay it
    let (status, json) = send(&app, "PUT", &format!("/api/borrowings/{}/repay", borrowing), OTHER_API_KEY, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_code"], "borrowing_not_found");

    // Un-marking removes the repayment expense
    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/borrowings/{}", borrowing),
        API_KEY,
        Some(json!({ "isRepaid": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["borrowing"]["isRepaid"], false);
    assert!(json["borrowing"]["repaidDate"].is_null());
    assert!(budget_expenses(&app, &budget).await.is_empty());

    // Marking through update writes it again with the given date
    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/borrowings/{}", borrowing),
        API_KEY,
        Some(json!({ "isRepaid": true, "repaidDate": "2024-07-20" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["borrowing"]["repaidDate"], "2024-07-20T00:00:00Z");
    let expenses = budget_expenses(&app, &budget).await;
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0]["date"], "2024-07-20T00:00:00Z");

    // Deleting the borrowing removes its repayment
    let (status, _) = send(&app, "DELETE", &format!("/api/borrowings/{}", borrowing), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(budget_expenses(&app, &budget).await.is_empty());
}

#[tokio::test]
async fn test_lending_lifecycle_pairs_expenses() {
    let db = common::setup_test_db().await;
    let app = common::app(&db.pool);
    let budget = create_budget(&app, 2024, 8, 45000.0).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/lendings",
        API_KEY,
        Some(json!({ "budgetId": budget, "borrowerName": "Asha", "amount": "500", "date": "2024-08-03" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Lending created successfully with automatic expense entry");
    assert_eq!(json["lending"]["borrowerName"], "Asha");
    assert_eq!(json["expense"]["name"], "Money lent to Asha");
    assert_eq!(json["expense"]["category"], "Other");
    assert_eq!(json["expense"]["amount"], 500.0);
    assert_eq!(json["expense"]["notes"], "Automatic expense for lending: Money lent out");
    let lending = json["lending"]["id"].as_str().unwrap().to_string();

    let (status, json) = send(&app, "PUT", &format!("/api/lendings/{}/repay", lending), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Lending marked as repaid and income recorded");
    assert_eq!(json["lending"]["isRepaid"], true);

    let expenses = budget_expenses(&app, &budget).await;
    assert_eq!(names(&expenses), vec!["Loan Repayment from Asha", "Money lent to Asha"]);
    let income = expenses
        .iter()
        .find(|e| e["name"] == "Loan Repayment from Asha")
        .unwrap();
    assert_eq!(income["amount"], -500.0);
    assert_eq!(income["notes"], "Automatic income for loan repayment from Asha");

    // Outflow and income cancel out; the lending is no longer outstanding
    let (_, json) = send(&app, "GET", &format!("/api/budgets/{}/summary", budget), API_KEY, None).await;
    assert_eq!(json["summary"]["totalExpenses"], 0.0);
    assert_eq!(json["summary"]["totalLendings"], 0.0);
    assert_eq!(json["summary"]["lendingCount"], 1);

    // Filter by repaid flag
    let (_, json) = send(&app, "GET", "/api/lendings?isRepaid=false", API_KEY, None).await;
    assert!(json["lendings"].as_array().unwrap().is_empty());
    let (_, json) = send(&app, "GET", "/api/lendings?isRepaid=true", API_KEY, None).await;
    assert_eq!(json["lendings"][0]["budget"]["monthName"], "August");

    // Un-marking removes only the income
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/lendings/{}", lending),
        API_KEY,
        Some(json!({ "isRepaid": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&budget_expenses(&app, &budget).await), vec!["Money lent to Asha"]);

    // Repay again, then delete: both generated rows go
    let (status, _) = send(&app, "PUT", &format!("/api/lendings/{}/repay", lending), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(budget_expenses(&app, &budget).await.len(), 2);

    let (status, json) = send(&app, "DELETE", &format!("/api/lendings/{}", lending), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Lending deleted successfully");
    assert!(budget_expenses(&app, &budget).await.is_empty());
}

#[tokio::test]
async fn test_lending_delete_falls_back_to_unlinked_match() {
    let db = common::setup_test_db().await;
    let app = common::app(&db.pool);
    let budget = create_budget(&app, 2024, 9, 45000.0).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/lendings",
        API_KEY,
        Some(json!({ "budgetId": budget, "borrowerName": "Dev", "amount": 300, "date": "2024-09-01", "notes": "train tickets" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["expense"]["notes"], "Automatic expense for lending: train tickets");
    let lending = json["lending"]["id"].as_str().unwrap().to_string();

    // Simulate rows imported without a source link
    sqlx::query("UPDATE expenses SET source_kind = NULL, source_id = NULL")
        .execute(&db.pool)
        .await
        .unwrap();

    // A user-entered expense with a different name survives
    let (status, _) = send(
        &app,
        "POST",
        "/api/expenses",
        API_KEY,
        Some(json!({ "budgetId": budget, "name": "Train", "category": "Travel", "amount": 300, "date": "2024-09-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "DELETE", &format!("/api/lendings/{}", lending), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&budget_expenses(&app, &budget).await), vec!["Train"]);
}

#[tokio::test]
async fn test_loan_validation_and_ownership() {
    let db = common::setup_test_db().await;
    let app = common::app(&db.pool);
    let budget = create_budget(&app, 2024, 10, 45000.0).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/lendings",
        API_KEY,
        Some(json!({ "budgetId": budget, "borrowerName": " ", "amount": 0, "date": "2024-10-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["borrowerName", "amount"]);

    // Budget owned by someone else
    let (status, json) = send(
        &app,
        "POST",
        "/api/borrowings",
        OTHER_API_KEY,
        Some(json!({ "budgetId": budget, "lenderName": "Bank", "amount": 10, "date": "2024-10-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_code"], "budget_not_found");
}

#[tokio::test]
async fn test_paired_write_failure_keeps_loan() {
    let db = common::setup_test_db().await;
    let app = common::app(&db.pool);
    let budget = create_budget(&app, 2024, 11, 45000.0).await;

    // Generated names end with the counterparty; reject those for "Fail"
    db.pool
        .execute("ALTER TABLE expenses ADD CONSTRAINT expenses_reject_fail CHECK (name NOT LIKE '%Fail')")
        .await
        .unwrap();

    let (status, json) = send(
        &app,
        "POST",
        "/api/lendings",
        API_KEY,
        Some(json!({ "budgetId": budget, "borrowerName": "Fail", "amount": 400, "date": "2024-11-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Lending created but expense creation failed");
    assert_eq!(json["lending"]["borrowerName"], "Fail");
    assert!(json["expense"].is_null());
    let lending = json["lending"]["id"].as_str().unwrap().to_string();

    let (status, json) = send(&app, "PUT", &format!("/api/lendings/{}/repay", lending), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Lending marked as repaid but income recording failed");
    assert_eq!(json["lending"]["isRepaid"], true);

    let (status, json) = send(
        &app,
        "POST",
        "/api/borrowings",
        API_KEY,
        Some(json!({ "budgetId": budget, "lenderName": "Fail", "amount": 900, "date": "2024-11-03" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let borrowing = json["borrowing"]["id"].as_str().unwrap().to_string();

    let (status, json) = send(&app, "PUT", &format!("/api/borrowings/{}/repay", borrowing), API_KEY, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Borrowing marked as repaid but expense creation failed");
    assert_eq!(json["borrowing"]["isRepaid"], true);

    // Loans stand, no expense rows were written
    assert!(budget_expenses(&app, &budget).await.is_empty());
    let (_, json) = send(&app, "GET", &format!("/api/lendings/{}", lending), API_KEY, None).await;
    assert_eq!(json["lending"]["isRepaid"], true);
}

#[tokio::test]
async fn test_update_gives_up_when_repaid_flag_keeps_moving() {
    let db = common::setup_test_db().await;
    let app = common::app(&db.pool);
    let budget = create_budget(&app, 2024, 12, 45000.0).await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/borrowings",
        API_KEY,
        Some(json!({ "budgetId": budget, "lenderName": "Mira", "amount": 250, "date": "2024-12-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let borrowing = json["borrowing"]["id"].as_str().unwrap().to_string();

    // Every conditional update on a rename to "Stuck" matches no row
    db.pool
        .execute(
            "CREATE OR REPLACE FUNCTION hold_update() RETURNS trigger AS $$ \
             BEGIN RETURN NULL; END; $$ LANGUAGE plpgsql; \
             CREATE TRIGGER borrowings_hold_updates BEFORE UPDATE ON borrowings \
             FOR EACH ROW WHEN (NEW.lender_name = 'Stuck') EXECUTE FUNCTION hold_update();",
        )
        .await
        .unwrap();

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/borrowings/{}", borrowing),
        API_KEY,
        Some(json!({ "lenderName": "Stuck" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error_code"], "concurrent_modification");

    // Other edits still go through
    let (status, json) = send(
        &app,
        "PUT",
        &format!("/api/borrowings/{}", borrowing),
        API_KEY,
        Some(json!({ "lenderName": "Mira K" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["borrowing"]["lenderName"], "Mira K");
}
