//! Monolith Binary - Single-server deployment
//!
//! This is the main entry point for local development and single-server deployment.
//! It wires up:
//! - Local adapters (filesystem, ffprobe, Redis or in-memory store)
//! - The HTTP client for the AI service
//! - The background processing pipeline and its launcher
//! - The REST API

use lectern::adapters::ai::HttpAiClient;
use lectern::adapters::local::http::{router, AppState};
use lectern::adapters::local::{FfprobeProbe, FsAdapter, MemoryStore};
use lectern::application::auth::AuthService;
use lectern::application::launcher::PipelineLauncher;
use lectern::application::orchestrator::OrchestratorService;
use lectern::application::uploads::UploadService;
use lectern::config::AppConfig;
use lectern::ports::repository::{UserRepository, VideoRepository};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "redis")]
use lectern::adapters::local::RedisPool;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    if let Err(e) = tokio::fs::create_dir_all(&config.upload_dir).await {
        error!("Failed to create upload directory {:?}: {}", config.upload_dir, e);
        std::process::exit(1);
    }
    if config.jwt_secret == AppConfig::default().jwt_secret {
        warn!("JWT_SECRET is not set, using the built-in development secret");
    }

    match config.redis_url.clone() {
        #[cfg(feature = "redis")]
        Some(url) => match RedisPool::new(&url) {
            Ok(pool) => {
                info!("Using Redis store");
                serve(config, pool).await
            }
            Err(e) => {
                error!("Failed to connect to Redis: {}", e);
                std::process::exit(1);
            }
        },
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            warn!("REDIS_URL is set but the redis feature is disabled, using the in-memory store");
            serve(config, MemoryStore::new()).await
        }
        None => {
            info!("No REDIS_URL configured, using the in-memory store");
            serve(config, MemoryStore::new()).await
        }
    }
}

async fn serve<S>(config: AppConfig, store: S)
where
    S: VideoRepository + UserRepository + Clone + 'static,
{
    // 1. Adapters
    let storage = FsAdapter::new(&config.upload_dir, config.max_file_size);
    let ai = HttpAiClient::new(config.ai_service_url.clone());

    // 2. Application Services
    let orchestrator = OrchestratorService::new(
        storage.clone(),
        ai.clone(),
        ai.clone(),
        store.clone(),
        config.segment_duration,
    );
    let launcher = PipelineLauncher::new(Arc::new(orchestrator));
    let uploads = UploadService::new(
        Arc::new(storage),
        Arc::new(FfprobeProbe::new()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        launcher,
        config.allowed_mime_types.clone(),
    );
    let auth = AuthService::new(
        Arc::new(store.clone()),
        config.jwt_secret.clone(),
        config.token_ttl_hours,
    );

    // 3. HTTP Layer
    let state = AppState {
        videos: Arc::new(store),
        uploads,
        auth,
        ai_health: Arc::new(ai),
    };
    let app = router(state, config.frontend_url.as_deref());

    // 4. Start Server
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .expect("Failed to bind TCP listener");
    info!("Listening at {}", config.bind_address());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed to start");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
