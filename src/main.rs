use axum::{
    routing::{delete, get, post},
    Router,
};
use kripikwasyif_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::{auth::require_admin, cors::permissive_cors},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route("/api/auth/flow/start", post(routes::auth::start_flow))
        .route("/api/auth/flow/verify", post(routes::auth::verify_owner))
        .route("/api/auth/flow/quiz", post(routes::auth::answer_quiz))
        .route("/api/auth/flow/back", post(routes::auth::back_to_verify))
        .route("/api/auth/flow/login", post(routes::auth::login))
        .route("/api/auth/session", get(routes::auth::session_status))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/track/visitor", post(routes::analytics::track_visitor))
        .route(
            "/api/track/whatsapp-click",
            post(routes::analytics::track_whatsapp_click),
        )
        .layer(axum::middleware::from_fn_with_state(
            kripikwasyif_backend::middleware::rate_limit::new_rps_state(config.public_rps),
            kripikwasyif_backend::middleware::rate_limit::rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/login-sessions",
            get(routes::session::list_login_sessions),
        )
        .route(
            "/api/admin/login-sessions/:id",
            delete(routes::session::delete_login_session),
        )
        .route(
            "/api/admin/analytics/weekly",
            get(routes::analytics::weekly_stats),
        )
        .route(
            "/api/admin/analytics/totals",
            get(routes::analytics::total_stats),
        )
        .layer(axum::middleware::from_fn(require_admin))
        .layer(axum::middleware::from_fn_with_state(
            kripikwasyif_backend::middleware::rate_limit::new_rps_state(config.admin_rps),
            kripikwasyif_backend::middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(public_api)
        .merge(admin_api)
        .with_state(app_state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
