use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ideavote::{config::AppConfig, routes, state::AppState, ws};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ideavote=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ideavote...");

    let config = AppConfig::from_env();
    let port = config.port;

    let state = Arc::new(AppState::new(config));
    state.seed_from_config().await;

    let app = Router::new()
        .route("/", get(routes::home_page).post(routes::home_login))
        .route("/send_otp", post(routes::send_otp))
        .route(
            "/otp_verification",
            get(routes::otp_verification_page).post(routes::verify_otp),
        )
        .route(
            "/judge_dashboard",
            get(routes::judge_dashboard).post(routes::judge_submit),
        )
        .route(
            "/audience_dashboard",
            get(routes::audience_dashboard).post(routes::audience_submit),
        )
        .route("/admin_dashboard", get(routes::admin_dashboard))
        .route("/result", get(routes::result))
        .route("/thank_you", get(routes::thank_you))
        .route("/logout", get(routes::logout))
        .route("/ws", get(ws::ws_handler))
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
