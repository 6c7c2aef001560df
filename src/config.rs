//! Configuration loaded from the environment.

use crate::domain::segmenter::DEFAULT_SEGMENT_DURATION;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Directory holding uploaded media files
    pub upload_dir: PathBuf,
    /// Upload size limit in bytes
    pub max_file_size: u64,
    /// Declared media types accepted on upload
    pub allowed_mime_types: Vec<String>,
    /// Base URL of the transcription / question generation service
    pub ai_service_url: String,
    /// Segment window length in seconds
    pub segment_duration: u64,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    /// Redis connection URL; the in-memory store is used when unset
    pub redis_url: Option<String>,
    /// Allowed CORS origin; any origin when unset
    pub frontend_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let segment_duration = match parse_or(&lookup, "SEGMENT_DURATION", DEFAULT_SEGMENT_DURATION) {
            0 => {
                warn!("SEGMENT_DURATION must be positive, using {}", DEFAULT_SEGMENT_DURATION);
                DEFAULT_SEGMENT_DURATION
            }
            seconds => seconds,
        };

        Self {
            addr: string("ADDR", "127.0.0.1"),
            port: string("PORT", "5000"),
            upload_dir: PathBuf::from(string("UPLOAD_DIR", "./uploads")),
            max_file_size: parse_or(&lookup, "MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE),
            allowed_mime_types: string("ALLOWED_MIME_TYPES", "video/mp4")
                .split(',')
                .map(|t| t.trim().to_ascii_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            ai_service_url: string("AI_SERVICE_URL", "http://localhost:8000"),
            segment_duration,
            jwt_secret: string("JWT_SECRET", "your_jwt_secret"),
            token_ttl_hours: parse_or(&lookup, "TOKEN_TTL_HOURS", 168),
            redis_url: optional("REDIS_URL"),
            frontend_url: optional("FRONTEND_URL"),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value {:?} for {}, using {}", raw, key, default);
            default
        }),
        None => default,
    }
}
