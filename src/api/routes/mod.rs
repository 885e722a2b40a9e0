pub mod chat;
pub mod documents;
pub mod health;
pub mod sessions;

use axum::http::{header, Method};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{middleware::request_logger, state::AppState};

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors(&state.config.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/api/v1", api_v1_routes())
        .layer(axum::middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/{id}", axum::routing::delete(sessions::end_session))
        .route(
            "/sessions/{id}/document",
            put(documents::upload_document).delete(documents::clear_document),
        )
        .route("/sessions/{id}/search", post(documents::search_document))
        .route(
            "/sessions/{id}/snapshot",
            get(documents::export_snapshot).put(documents::import_snapshot),
        )
        .route("/sessions/{id}/chat", post(chat::chat_handler))
        .route(
            "/sessions/{id}/history",
            get(chat::get_history).delete(chat::clear_history),
        )
}
