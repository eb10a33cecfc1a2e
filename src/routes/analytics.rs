use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::analytics_dto::{DailyStatResponse, TotalStatsResponse, WeeklyStatsResponse},
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/track/visitor",
    responses(
        (status = 204, description = "Visitor counted for today")
    )
)]
#[axum::debug_handler]
pub async fn track_visitor(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.analytics_service.track_visitor().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/track/whatsapp-click",
    responses(
        (status = 204, description = "WhatsApp click counted for today")
    )
)]
#[axum::debug_handler]
pub async fn track_whatsapp_click(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.analytics_service.track_whatsapp_click().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/admin/analytics/weekly",
    responses(
        (status = 200, description = "Last seven days, oldest first, zero-filled", body = Json<WeeklyStatsResponse>),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
#[axum::debug_handler]
pub async fn weekly_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.analytics_service.weekly_stats().await?;
    let items = stats.into_iter().map(DailyStatResponse::from).collect();
    Ok(Json(WeeklyStatsResponse { items }))
}

#[utoipa::path(
    get,
    path = "/api/admin/analytics/totals",
    responses(
        (status = 200, description = "All-time visitor and click totals", body = Json<TotalStatsResponse>),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
#[axum::debug_handler]
pub async fn total_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let totals = state.analytics_service.total_stats().await?;
    Ok(Json(TotalStatsResponse::from(totals)))
}
