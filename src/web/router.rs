//! Router configuration for the web surface.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{create_mailbox, select_mailbox, view_mailboxes, AppState};
use super::middleware::{create_cors_layer, create_rate_limit, security_headers, RateLimitState};

/// Create the main router.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    // Only creation is rate limited.
    let create_route = post(create_mailbox).route_layer(middleware::from_fn(move |req, next| {
        let state = rate_limit.clone();
        create_rate_limit(state, req, next)
    }));

    Router::new()
        .route("/", get(view_mailboxes).merge(create_route))
        .route("/current", post(select_mailbox))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(security_headers)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
