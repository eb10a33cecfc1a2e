use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::session_dto::{LoginSessionListResponse, LoginSessionResponse},
    error::Result,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/login-sessions",
    responses(
        (status = 200, description = "All device sessions, newest login first", body = Json<LoginSessionListResponse>),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
#[axum::debug_handler]
pub async fn list_login_sessions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let threshold = crate::config::get_config().trust_threshold;
    let sessions = state.device_trust_service.list_sessions().await?;
    let items = sessions
        .into_iter()
        .map(|s| LoginSessionResponse::from_session(s, threshold))
        .collect();
    Ok(Json(LoginSessionListResponse { items }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/login-sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 204, description = "Session deleted (idempotent)"),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
#[axum::debug_handler]
pub async fn delete_login_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.device_trust_service.delete_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
