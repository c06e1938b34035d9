// Route modules
pub mod content;
pub mod credits;
pub mod media;
pub mod polls;
pub mod webhook;

use crate::{
    app_state::AppState,
    middleware::{auth_middleware, create_rate_limiter, logging_middleware},
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes(state.clone()))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API v1 routes
fn api_v1_routes(state: AppState) -> Router<AppState> {
    // Paid endpoints: authenticated and rate limited
    let rate_limiter = create_rate_limiter(state.redis.clone());
    let paid_routes = Router::new()
        .route("/content/generate", post(content::generate_content))
        .route("/media/transcribe", post(media::transcribe))
        .route("/polls", post(polls::create_poll))
        .route_layer(middleware::from_fn(rate_limiter))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Auth-only routes (no rate limiting)
    let auth_only_routes = Router::new()
        .route("/credits/check", get(credits::check_credits))
        .route("/account", post(credits::bootstrap_account))
        .route("/polls/{poll_id}/vote", post(polls::vote))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public routes: poll reads and the signed payment webhook
    let public_routes = Router::new()
        .route("/polls", get(polls::list_polls))
        .route("/polls/{poll_id}", get(polls::get_poll))
        .route("/webhooks/payment", post(webhook::payment_webhook));

    // Combine all routes with request/response logging
    Router::new()
        .merge(paid_routes)
        .merge(auth_only_routes)
        .merge(public_routes)
        .layer(middleware::from_fn(logging_middleware))
}
