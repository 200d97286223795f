use super::handlers;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Attachments and recordings can be a few megabytes
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/connection", get(handlers::connection_status))
        // Conversation
        .route(
            "/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        // Recorder control
        .route("/recorder", get(handlers::recorder_status))
        .route("/recorder/start", post(handlers::start_recording))
        .route("/recorder/pause", post(handlers::pause_recording))
        .route("/recorder/resume", post(handlers::resume_recording))
        .route("/recorder/stop", post(handlers::stop_recording))
        // Attachments
        .route("/attachments/image/:name", post(handlers::attach_image))
        .route("/attachments/file/:name", post(handlers::attach_file))
        .route("/media/:media_ref", get(handlers::get_media))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                // Add tracing middleware for request logging
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
