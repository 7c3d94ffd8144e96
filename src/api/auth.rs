//! Auth endpoints

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::domain::OperationContext;
use crate::error::AppError;
use crate::handlers::{ProfileHandler, SyncProfileCommand};

use super::dto::UserResponse;

#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub message: &'static str,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
}

pub fn router() -> Router<PgPool> {
    Router::new()
        .route("/sync", post(sync))
        .route("/me", get(me))
}

/// POST /api/auth/sync
async fn sync(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    request: Option<Json<SyncRequest>>,
) -> Result<(StatusCode, Json<SyncResponse>), AppError> {
    // Body is optional; an empty POST syncs with defaults
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let handler = ProfileHandler::new(pool);

    let mut command = SyncProfileCommand::new();
    if let Some(name) = request.name {
        command = command.with_name(name);
    }
    if let Some(picture) = request.picture {
        command = command.with_picture(picture);
    }

    let result = handler.sync(command, &context).await?;

    let (status, message) = if result.created {
        (StatusCode::CREATED, "User profile created")
    } else {
        (StatusCode::OK, "User synced")
    };

    Ok((
        status,
        Json(SyncResponse {
            message,
            user: result.user.into(),
        }),
    ))
}

/// GET /api/auth/me
async fn me(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<MeResponse>, AppError> {
    let user = ProfileHandler::new(pool).me(&context).await?;
    Ok(Json(MeResponse { user: user.into() }))
}
