//! API Routes
//!
//! Configures the Axum router for the admin API.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, health_handler, remove_handler, run_handler, set_expiration_file_handler,
    set_expiration_handler, show_handler, stats_handler, AppState,
};

/// Creates the admin router with all endpoints configured.
///
/// # Endpoints
/// - `GET /cache` - List cached entries
/// - `DELETE /cache` - Clear the cache
/// - `DELETE /cache/*key` - Remove one entry
/// - `PUT /expiration` - Set the global TTL
/// - `PUT /expiration/*key` - Restart one entry's freshness window
/// - `POST /run/*key` - Resolve a key as a proxy client would
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// Keys are matched with wildcards so they may contain `/`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", get(show_handler).delete(clear_handler))
        .route("/cache/*key", delete(remove_handler))
        .route("/expiration", put(set_expiration_handler))
        .route("/expiration/*key", put(set_expiration_file_handler))
        .route("/run/*key", post(run_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
