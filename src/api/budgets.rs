//! Budget endpoints

use std::collections::BTreeMap;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{BudgetSummary, OperationContext};
use crate::error::AppError;
use crate::handlers::{BudgetHandler, CreateBudgetCommand, UpdateBudgetCommand};

use super::dto::{BudgetDetailResponse, BudgetResponse, MessageResponse};
use super::extract::{ApiJson, ApiPath};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetRequest {
    pub year: i32,
    pub month_number: i32,
    #[serde(default)]
    pub income: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    pub income: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BudgetMutationResponse {
    pub message: &'static str,
    pub budget: BudgetResponse,
}

#[derive(Debug, Serialize)]
pub struct BudgetListResponse {
    pub budgets: Vec<BudgetDetailResponse>,
}

#[derive(Debug, Serialize)]
pub struct BudgetGetResponse {
    pub budget: BudgetDetailResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBody {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub income: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_expenses: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub remaining: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_borrowings: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_lendings: Decimal,
    pub by_category: BTreeMap<String, f64>,
    pub expense_count: usize,
    pub borrowing_count: usize,
    pub lending_count: usize,
}

impl From<BudgetSummary> for SummaryBody {
    fn from(summary: BudgetSummary) -> Self {
        Self {
            income: summary.income,
            total_expenses: summary.total_expenses,
            remaining: summary.remaining,
            total_borrowings: summary.total_borrowings,
            total_lendings: summary.total_lendings,
            by_category: summary
                .by_category
                .into_iter()
                .map(|(category, total)| (category, total.to_f64().unwrap_or_default()))
                .collect(),
            expense_count: summary.expense_count,
            borrowing_count: summary.borrowing_count,
            lending_count: summary.lending_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: SummaryBody,
}

// =========================================================================
// Router
// =========================================================================

pub fn router() -> Router<PgPool> {
    Router::new()
        .route("/", get(list_budgets).post(create_budget))
        .route(
            "/:id",
            get(get_budget).put(update_budget).delete(delete_budget),
        )
        .route("/:id/summary", get(budget_summary))
}

/// POST /api/budgets
async fn create_budget(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<BudgetMutationResponse>), AppError> {
    let command = CreateBudgetCommand::new(request.year, request.month_number)
        .with_income(request.income);
    let budget = BudgetHandler::new(pool).create(command, &context).await?;

    Ok((
        StatusCode::CREATED,
        Json(BudgetMutationResponse {
            message: "Budget created successfully",
            budget: BudgetResponse::from(&budget),
        }),
    ))
}

/// GET /api/budgets
async fn list_budgets(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<BudgetListResponse>, AppError> {
    let budgets = BudgetHandler::new(pool).list(&context).await?;
    Ok(Json(BudgetListResponse {
        budgets: budgets.iter().map(BudgetDetailResponse::from).collect(),
    }))
}

/// GET /api/budgets/:id
async fn get_budget(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(budget_id): ApiPath<Uuid>,
) -> Result<Json<BudgetGetResponse>, AppError> {
    let detail = BudgetHandler::new(pool).get(budget_id, &context).await?;
    Ok(Json(BudgetGetResponse {
        budget: BudgetDetailResponse::from(&detail),
    }))
}

/// PUT /api/budgets/:id
async fn update_budget(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(budget_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateBudgetRequest>,
) -> Result<Json<BudgetMutationResponse>, AppError> {
    let command = UpdateBudgetCommand::new(budget_id, request.income);
    let budget = BudgetHandler::new(pool).update(command, &context).await?;

    Ok(Json(BudgetMutationResponse {
        message: "Budget updated successfully",
        budget: BudgetResponse::from(&budget),
    }))
}

/// DELETE /api/budgets/:id
async fn delete_budget(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(budget_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    BudgetHandler::new(pool).delete(budget_id, &context).await?;
    Ok(Json(MessageResponse::new(
        "Budget and associated data deleted successfully",
    )))
}

/// GET /api/budgets/:id/summary
async fn budget_summary(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(budget_id): ApiPath<Uuid>,
) -> Result<Json<SummaryResponse>, AppError> {
    let summary = BudgetHandler::new(pool).summary(budget_id, &context).await?;
    Ok(Json(SummaryResponse {
        summary: summary.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_budget_request_accepts_string_or_number_income() {
        let request: CreateBudgetRequest =
            serde_json::from_str(r#"{"year": 2024, "monthNumber": 3, "income": "45000.50"}"#)
                .unwrap();
        assert_eq!(request.income, dec!(45000.50));

        let request: CreateBudgetRequest =
            serde_json::from_str(r#"{"year": 2024, "monthNumber": 3, "income": 45000}"#).unwrap();
        assert_eq!(request.income, dec!(45000));
    }

    #[test]
    fn test_create_budget_request_income_defaults_to_zero() {
        let request: CreateBudgetRequest =
            serde_json::from_str(r#"{"year": 2024, "monthNumber": 3}"#).unwrap();
        assert_eq!(request.income, Decimal::ZERO);
    }

    #[test]
    fn test_summary_body_shape() {
        let mut by_category = BTreeMap::new();
        by_category.insert("Other".to_string(), dec!(-250.5));
        let summary = BudgetSummary {
            income: dec!(1000),
            total_expenses: dec!(-250.5),
            remaining: dec!(1250.5),
            total_borrowings: Decimal::ZERO,
            total_lendings: Decimal::ZERO,
            by_category,
            expense_count: 1,
            borrowing_count: 0,
            lending_count: 1,
        };

        let json = serde_json::to_value(SummaryResponse {
            summary: summary.into(),
        })
        .unwrap();
        assert_eq!(json["summary"]["totalExpenses"], -250.5);
        assert_eq!(json["summary"]["byCategory"]["Other"], -250.5);
        assert_eq!(json["summary"]["lendingCount"], 1);
    }
}
