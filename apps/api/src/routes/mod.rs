pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview API
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route("/api/v1/sessions/:id", get(handlers::handle_get_session))
        .route(
            "/api/v1/sessions/:id/question",
            post(handlers::handle_set_question),
        )
        .route(
            "/api/v1/sessions/:id/advance",
            post(handlers::handle_advance_question),
        )
        .route(
            "/api/v1/sessions/:id/answers",
            post(handlers::handle_submit_answer),
        )
        .route(
            "/api/v1/sessions/:id/report",
            post(handlers::handle_generate_report),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
