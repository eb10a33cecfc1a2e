use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::auth_dto::{
        AuthenticatedResponse, CredentialsPayload, FlowIdPayload, FlowStatusResponse,
        QuizAnswerPayload, SessionStatusResponse, StartFlowPayload, VerifyOwnerPayload,
    },
    error::Result,
    middleware::auth::decode_admin_token,
    services::auth_service::LoginStep,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/flow/start",
    request_body = StartFlowPayload,
    responses(
        (status = 200, description = "Flow created, positioned at verify or login", body = Json<FlowStatusResponse>)
    )
)]
#[axum::debug_handler]
pub async fn start_flow(
    State(state): State<AppState>,
    Json(payload): Json<StartFlowPayload>,
) -> Result<impl IntoResponse> {
    let status = state.auth_service.start(payload.device_id).await;
    Ok(Json(FlowStatusResponse::from(status)))
}

#[utoipa::path(
    post,
    path = "/api/auth/flow/verify",
    request_body = VerifyOwnerPayload,
    responses(
        (status = 200, description = "Owner name accepted, quiz question selected", body = Json<FlowStatusResponse>),
        (status = 401, description = "Owner name mismatch"),
        (status = 404, description = "Unknown flow")
    )
)]
#[axum::debug_handler]
pub async fn verify_owner(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOwnerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let status = state
        .auth_service
        .submit_owner_name(payload.flow_id, &payload.owner_name)
        .await?;
    Ok(Json(FlowStatusResponse::from(status)))
}

#[utoipa::path(
    post,
    path = "/api/auth/flow/quiz",
    request_body = QuizAnswerPayload,
    responses(
        (status = 200, description = "Answer accepted, flow moves to login", body = Json<FlowStatusResponse>),
        (status = 401, description = "Wrong answer, same question kept"),
        (status = 404, description = "Unknown flow")
    )
)]
#[axum::debug_handler]
pub async fn answer_quiz(
    State(state): State<AppState>,
    Json(payload): Json<QuizAnswerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let status = state
        .auth_service
        .submit_quiz_answer(payload.flow_id, &payload.answer)
        .await?;
    Ok(Json(FlowStatusResponse::from(status)))
}

#[utoipa::path(
    post,
    path = "/api/auth/flow/back",
    request_body = FlowIdPayload,
    responses(
        (status = 200, description = "Flow returned to verify, quiz selection discarded", body = Json<FlowStatusResponse>),
        (status = 404, description = "Unknown flow")
    )
)]
#[axum::debug_handler]
pub async fn back_to_verify(
    State(state): State<AppState>,
    Json(payload): Json<FlowIdPayload>,
) -> Result<impl IntoResponse> {
    let status = state.auth_service.back_to_verify(payload.flow_id).await?;
    Ok(Json(FlowStatusResponse::from(status)))
}

#[utoipa::path(
    post,
    path = "/api/auth/flow/login",
    request_body = CredentialsPayload,
    responses(
        (status = 200, description = "Credentials accepted, admin token issued", body = Json<AuthenticatedResponse>),
        (status = 401, description = "Wrong credentials"),
        (status = 404, description = "Unknown flow")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(payload): Json<CredentialsPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let token = state
        .auth_service
        .login(
            payload.flow_id,
            &payload.username,
            &payload.password,
            &user_agent,
            ip.as_deref(),
        )
        .await?;

    Ok(Json(AuthenticatedResponse {
        step: LoginStep::Authenticated,
        token,
    }))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Whether the presented token is still valid", body = Json<SessionStatusResponse>)
    )
)]
#[axum::debug_handler]
pub async fn session_status(headers: HeaderMap) -> Result<impl IntoResponse> {
    let config = crate::config::get_config();
    let logged_in = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| decode_admin_token(token, &config.jwt_secret))
        .is_some();

    Ok(Json(SessionStatusResponse { logged_in }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Token discarded client-side")
    )
)]
#[axum::debug_handler]
pub async fn logout() -> Result<impl IntoResponse> {
    // Tokens are stateless; logout is the client dropping its copy.
    Ok(StatusCode::NO_CONTENT)
}

/// The forwarded-for header wins when a proxy sets it; otherwise the
/// connection's remote address. Without the fallback a direct deployment
/// would self-resolve and record the server's own egress location.
fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
}
