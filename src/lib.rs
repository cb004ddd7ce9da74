pub mod auth;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod http;
mod middleware;
pub mod models;
pub mod profile;
pub mod reviews;
pub mod session;
pub mod state;

use axum::{Router, http::StatusCode, middleware as axum_middleware};
use middleware::{cors_layer, create_rate_limiter, rate_limit_middleware};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

use crate::{config::Config, errors::AppError, state::AppState};

/// Full router with rate limiting, CORS and request tracing.
pub fn create_app(state: AppState, config: &Config) -> Router {
    let rate_limiter = create_rate_limiter(config.rate_limit_per_minute);

    Router::new()
        .merge(http::create_http_routes(state))
        .layer(axum_middleware::from_fn(move |req, next| {
            rate_limit_middleware(rate_limiter.clone(), req, next)
        }))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
}

pub async fn start_server() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;
    let app = create_app(state, &config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .map_err(|e| AppError::EnvError(format!("Failed to bind port {}: {}", config.port, e)))?;

    tracing::info!(
        "Game Hub server running at http://127.0.0.1:{} ({:?} backend)",
        config.port,
        config.backend
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| {
        tracing::error!("Server error: {}", e);
        AppError::InternalError
    })
}
