//! HTTP API

pub mod health;
pub mod menu;
pub mod story;

use axum::routing::get;
use axum::{Json, Router};
use http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::ServiceError;
use crate::state::AppState;

pub(crate) type ApiResult<T> = Result<Json<T>, ServiceError>;

/// Routes only, no middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(menu::router())
        .merge(story::router())
        .with_state(state)
}

/// Routes with tracing and CORS
pub fn build_app(state: AppState, config: &Config) -> Router {
    create_router(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}
