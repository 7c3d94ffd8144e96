//! Borrowing and lending endpoints
//!
//! The two resources share a handler and differ in the counterparty key,
//! the response envelope and the messages they return.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::OperationContext;
use crate::error::AppError;
use crate::handlers::{CreateLoanCommand, LoanHandler, LoanQuery, UpdateLoanCommand};

use super::dto::{ExpenseResponse, LoanResponse, MessageResponse};
use super::extract::{ApiJson, ApiPath, ApiQuery};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBorrowingRequest {
    pub budget_id: Uuid,
    pub lender_name: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLendingRequest {
    pub budget_id: Uuid,
    pub borrower_name: String,
    pub amount: Decimal,
    pub date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBorrowingRequest {
    #[serde(default)]
    pub lender_name: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_repaid: Option<bool>,
    #[serde(default)]
    pub repaid_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLendingRequest {
    #[serde(default)]
    pub borrower_name: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_repaid: Option<bool>,
    #[serde(default)]
    pub repaid_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanListParams {
    pub budget_id: Option<Uuid>,
    pub is_repaid: Option<bool>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<LoanListParams> for LoanQuery {
    fn from(params: LoanListParams) -> Self {
        Self {
            budget_id: params.budget_id,
            is_repaid: params.is_repaid,
            start_date: params.start_date,
            end_date: params.end_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BorrowingResponse {
    pub message: &'static str,
    pub borrowing: LoanResponse,
}

#[derive(Debug, Serialize)]
pub struct BorrowingGetResponse {
    pub borrowing: LoanResponse,
}

#[derive(Debug, Serialize)]
pub struct BorrowingListResponse {
    pub borrowings: Vec<LoanResponse>,
}

#[derive(Debug, Serialize)]
pub struct LendingResponse {
    pub message: &'static str,
    pub lending: LoanResponse,
}

/// Creation also reports the outflow expense; null when its write failed
#[derive(Debug, Serialize)]
pub struct LendingCreatedResponse {
    pub message: &'static str,
    pub lending: LoanResponse,
    pub expense: Option<ExpenseResponse>,
}

#[derive(Debug, Serialize)]
pub struct LendingGetResponse {
    pub lending: LoanResponse,
}

#[derive(Debug, Serialize)]
pub struct LendingListResponse {
    pub lendings: Vec<LoanResponse>,
}

// =========================================================================
// Routers
// =========================================================================

pub fn borrowings_router() -> Router<PgPool> {
    Router::new()
        .route("/", get(list_borrowings).post(create_borrowing))
        .route(
            "/:id",
            get(get_borrowing)
                .put(update_borrowing)
                .delete(delete_borrowing),
        )
        .route("/:id/repay", put(repay_borrowing))
}

pub fn lendings_router() -> Router<PgPool> {
    Router::new()
        .route("/", get(list_lendings).post(create_lending))
        .route(
            "/:id",
            get(get_lending).put(update_lending).delete(delete_lending),
        )
        .route("/:id/repay", put(repay_lending))
}

// =========================================================================
// Borrowings
// =========================================================================

/// POST /api/borrowings
async fn create_borrowing(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<CreateBorrowingRequest>,
) -> Result<(StatusCode, Json<BorrowingResponse>), AppError> {
    let mut command = CreateLoanCommand::new(
        request.budget_id,
        request.lender_name,
        request.amount,
        request.date,
    );
    if let Some(notes) = request.notes {
        command = command.with_notes(notes);
    }

    let result = LoanHandler::borrowings(pool).create(command, &context).await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowingResponse {
            message: "Borrowing created successfully",
            borrowing: LoanResponse::borrowing(&result.loan, None),
        }),
    ))
}

/// GET /api/borrowings
async fn list_borrowings(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiQuery(params): ApiQuery<LoanListParams>,
) -> Result<Json<BorrowingListResponse>, AppError> {
    let loans = LoanHandler::borrowings(pool)
        .list(params.into(), &context)
        .await?;

    Ok(Json(BorrowingListResponse {
        borrowings: loans
            .iter()
            .map(|l| LoanResponse::borrowing(&l.record, l.budget.as_ref()))
            .collect(),
    }))
}

/// GET /api/borrowings/:id
async fn get_borrowing(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(borrowing_id): ApiPath<Uuid>,
) -> Result<Json<BorrowingGetResponse>, AppError> {
    let loan = LoanHandler::borrowings(pool)
        .get(borrowing_id, &context)
        .await?;

    Ok(Json(BorrowingGetResponse {
        borrowing: LoanResponse::borrowing(&loan.record, loan.budget.as_ref()),
    }))
}

/// PUT /api/borrowings/:id
async fn update_borrowing(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(borrowing_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateBorrowingRequest>,
) -> Result<Json<BorrowingResponse>, AppError> {
    let command = UpdateLoanCommand {
        loan_id: borrowing_id,
        counterparty: request.lender_name,
        amount: request.amount,
        date: request.date,
        notes: request.notes,
        is_repaid: request.is_repaid,
        repaid_date: request.repaid_date,
    };
    let loan = LoanHandler::borrowings(pool)
        .update(command, &context)
        .await?;

    Ok(Json(BorrowingResponse {
        message: "Borrowing updated successfully",
        borrowing: LoanResponse::borrowing(&loan.record, loan.budget.as_ref()),
    }))
}

/// DELETE /api/borrowings/:id
async fn delete_borrowing(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(borrowing_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    LoanHandler::borrowings(pool)
        .delete(borrowing_id, &context)
        .await?;
    Ok(Json(MessageResponse::new("Borrowing deleted successfully")))
}

/// PUT /api/borrowings/:id/repay
async fn repay_borrowing(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(borrowing_id): ApiPath<Uuid>,
) -> Result<Json<BorrowingResponse>, AppError> {
    let result = LoanHandler::borrowings(pool)
        .repay(borrowing_id, &context)
        .await?;

    let repay = &result.record;
    let message = match (repay.transitioned, repay.paired.is_some()) {
        (false, _) => "Borrowing is already marked as repaid",
        (true, true) => "Borrowing marked as repaid and expense created",
        (true, false) => "Borrowing marked as repaid but expense creation failed",
    };

    Ok(Json(BorrowingResponse {
        message,
        borrowing: LoanResponse::borrowing(&repay.loan, result.budget.as_ref()),
    }))
}

// =========================================================================
// Lendings
// =========================================================================

/// POST /api/lendings
async fn create_lending(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<CreateLendingRequest>,
) -> Result<(StatusCode, Json<LendingCreatedResponse>), AppError> {
    let mut command = CreateLoanCommand::new(
        request.budget_id,
        request.borrower_name,
        request.amount,
        request.date,
    );
    if let Some(notes) = request.notes {
        command = command.with_notes(notes);
    }

    let result = LoanHandler::lendings(pool).create(command, &context).await?;

    let message = if result.paired_failed {
        "Lending created but expense creation failed"
    } else {
        "Lending created successfully with automatic expense entry"
    };

    Ok((
        StatusCode::CREATED,
        Json(LendingCreatedResponse {
            message,
            lending: LoanResponse::lending(&result.loan, None),
            expense: result.paired.as_ref().map(|e| ExpenseResponse::new(e, None)),
        }),
    ))
}

/// GET /api/lendings
async fn list_lendings(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiQuery(params): ApiQuery<LoanListParams>,
) -> Result<Json<LendingListResponse>, AppError> {
    let loans = LoanHandler::lendings(pool)
        .list(params.into(), &context)
        .await?;

    Ok(Json(LendingListResponse {
        lendings: loans
            .iter()
            .map(|l| LoanResponse::lending(&l.record, l.budget.as_ref()))
            .collect(),
    }))
}

/// GET /api/lendings/:id
async fn get_lending(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(lending_id): ApiPath<Uuid>,
) -> Result<Json<LendingGetResponse>, AppError> {
    let loan = LoanHandler::lendings(pool).get(lending_id, &context).await?;

    Ok(Json(LendingGetResponse {
        lending: LoanResponse::lending(&loan.record, loan.budget.as_ref()),
    }))
}

/// PUT /api/lendings/:id
async fn update_lending(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(lending_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateLendingRequest>,
) -> Result<Json<LendingResponse>, AppError> {
    let command = UpdateLoanCommand {
        loan_id: lending_id,
        counterparty: request.borrower_name,
        amount: request.amount,
        date: request.date,
        notes: request.notes,
        is_repaid: request.is_repaid,
        repaid_date: request.repaid_date,
    };
    let loan = LoanHandler::lendings(pool).update(command, &context).await?;

    Ok(Json(LendingResponse {
        message: "Lending updated successfully",
        lending: LoanResponse::lending(&loan.record, loan.budget.as_ref()),
    }))
}

/// DELETE /api/lendings/:id
async fn delete_lending(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(lending_id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    LoanHandler::lendings(pool).delete(lending_id, &context).await?;
    Ok(Json(MessageResponse::new("Lending deleted successfully")))
}

/// PUT /api/lendings/:id/repay
async fn repay_lending(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    ApiPath(lending_id): ApiPath<Uuid>,
) -> Result<Json<LendingResponse>, AppError> {
    let result = LoanHandler::lendings(pool)
        .repay(lending_id, &context)
        .await?;

    let repay = &result.record;
    let message = match (repay.transitioned, repay.paired.is_some()) {
        (false, _) => "Lending is already marked as repaid",
        (true, true) => "Lending marked as repaid and income recorded",
        (true, false) => "Lending marked as repaid but income recording failed",
    };

    Ok(Json(LendingResponse {
        message,
        lending: LoanResponse::lending(&repay.loan, result.budget.as_ref()),
    }))
}
