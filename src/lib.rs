pub mod codec;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod pipeline;
pub mod state;
pub mod store;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the service router.
///
/// `/health` and `/temp` are open; `/optimize` runs the full request gate
/// inside its handler so the admit/reject order (auth, rate limit,
/// validation) stays explicit and testable.
pub fn app(state: AppState) -> Router {
    // The axum default body cap (2MB) is below the configured upload limit;
    // raise it and leave headroom for multipart framing, the gate enforces
    // the exact file-size cap itself.
    let body_limit = state.config.limits.max_upload_bytes + 64 * 1024;
    let temp_files = ServeDir::new(state.store.dir());

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/optimize", post(handlers::optimize::optimize))
        .nest_service("/temp", temp_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
