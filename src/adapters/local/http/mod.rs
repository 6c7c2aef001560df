//! REST inbound adapter.
//!
//! All routes live under `/api`. Handlers are thin: they extract the caller
//! and request data, delegate to the application services and map errors to
//! `{"error": message}` responses.

mod auth;
mod error;
mod extractors;
mod health;
mod videos;


pub use error::ApiError;

use crate::application::auth::AuthService;
use crate::application::uploads::UploadService;
use crate::ports::ai::AiHealthPort;
use crate::ports::repository::VideoRepository;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub videos: Arc<dyn VideoRepository>,
    pub uploads: UploadService,
    pub auth: AuthService,
    pub ai_health: Arc<dyn AiHealthPort>,
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match frontend_url.map(|url| url.parse::<HeaderValue>()) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(_)) => {
            warn!("Ignoring invalid FRONTEND_URL, allowing any origin");
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}

pub fn router(state: AppState, frontend_url: Option<&str>) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/profile", get(auth::profile))
        // Upload size is enforced while streaming to storage.
        .route(
            "/videos/upload",
            post(videos::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/videos", get(videos::list))
        .route("/videos/:id", get(videos::get))
        .route("/videos/:id/export", get(videos::export));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(frontend_url))
        .with_state(state)
}
