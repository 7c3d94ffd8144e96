//! Expense endpoints

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::OperationContext;
use crate::error::AppError;
use crate::handlers::{CreateExpenseCommand, ExpenseHandler, ExpenseQuery, UpdateExpenseCommand};

use super::dto::{ExpenseResponse, MessageResponse};
use super::extract::{ApiJson, ApiPath, ApiQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub budget_id: Uuid,
    pub name: String,
    pub category: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListParams {
    pub budget_id: Option<Uuid>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseMutationResponse {
    pub message: &'static str,
    pub expense: ExpenseResponse,
}

#[derive(Debug, Serialize)]
pub struct ExpenseGetResponse {
    pub expense: ExpenseResponse,
}

#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<ExpenseResponse>,
}

pub fn router() -> Router<PgPool> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route(
            "/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
}

/// POST /api/expenses
async fn create_expense(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseMutationResponse>), AppError> {
    let mut command = CreateExpenseCommand::new(
        request.budget_id,
        request.name,
        request.category,
        request.amount,
        request.date,
    );
    if let Some(notes) = request.notes {
        command = command.with_notes(notes);
    }

    let expense = ExpenseHandler::new(pool).create(command, &context).await?;

    Ok((
        StatusCode::CREATED,
        Json(ExpenseMutationResponse {
            message: "Expense created successfully",
            expense: ExpenseResponse::from(&expense),
        }),
    ))
}

/// GET /api/expenses
async fn list_expenses(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiQuery(params): ApiQuery<ExpenseListParams>,
) -> Result<Json<ExpenseListResponse>, AppError> {
    let query = ExpenseQuery {
        budget_id: params.budget_id,
        category: params.category,
        start_date: params.start_date,
        end_date: params.end_date,
    };
    let expenses = ExpenseHandler::new(pool).list(query, &context).await?;

    Ok(Json(ExpenseListResponse {
        expenses: expenses.iter().map(ExpenseResponse::from).collect(),
    }))
}

/// GET /api/expenses/:id
async fn get_expense(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(expense_id): ApiPath<Uuid>,
) -> Result<Json<ExpenseGetResponse>, AppError> {
    let expense = ExpenseHandler::new(pool).get(expense_id, &context).await?;
    Ok(Json(ExpenseGetResponse {
        expense: ExpenseResponse::from(&expense),
    }))
}

/// PUT /api/expenses/:id
async fn update_expense(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(expense_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateExpenseRequest>,
) -> Result<Json<ExpenseMutationResponse>, AppError> {
    let command = UpdateExpenseCommand {
        expense_id,
        name: request.name,
        category: request.category,
        amount: request.amount,
        date: request.date,
        notes: request.notes,
    };
    let expense = ExpenseHandler::new(pool).update(command, &context).await?;

    Ok(Json(ExpenseMutationResponse {
        message: "Expense updated successfully",
        expense: ExpenseResponse::from(&expense),
    }))
}

/// DELETE /api/expenses/:id
async fn delete_expense(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(expense_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    ExpenseHandler::new(pool).delete(expense_id, &context).await?;
    Ok(Json(MessageResponse::new("Expense deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_expense_request_deserialize() {
        let json = r#"{
            "budgetId": "550e8400-e29b-41d4-a716-446655440000",
            "name": "Groceries",
            "category": "Food & Dining",
            "amount": 1250.75,
            "date": "2024-05-02"
        }"#;

        let request: CreateExpenseRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.category, "Food & Dining");
        assert_eq!(request.amount, dec!(1250.75));
        assert!(request.notes.is_none());
    }

    #[test]
    fn test_update_expense_request_is_partial() {
        let request: UpdateExpenseRequest = serde_json::from_str(r#"{"notes": ""}"#).unwrap();
        assert_eq!(request.notes.as_deref(), Some(""));
        assert!(request.amount.is_none());
        assert!(request.name.is_none());
    }
}
