//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Header carrying the caller's user id. Absent means guest.
pub const USER_HEADER: &str = "x-user-id";

/// Build the application router with:
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/quests/today", get(http::http_get_today_quest))
        .route("/api/v1/quests/:id", get(http::http_get_quest).put(http::http_put_quest))
        .route("/api/v1/users", post(http::http_post_user))
        .route(
            "/api/v1/submissions",
            post(http::http_post_submission).get(http::http_get_my_submission),
        )
        .route("/api/v1/submissions/:id", get(http::http_get_submission))
        .route("/api/v1/users/me/submissions", get(http::http_get_my_history))
        .route("/api/v1/users/me/stats", get(http::http_get_my_stats))
        .route("/api/v1/users/me/average", get(http::http_get_my_average))
        .route("/api/v1/leaderboard/daily", get(http::http_get_leaderboard))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
