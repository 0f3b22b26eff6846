//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::service::{Service, DEFAULT_MAX_AVATAR_BYTES};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Business rules over the database and avatar storage
    pub service: Service,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Service, config: ApiConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Vec<String>,
    /// Built frontend served outside `/api`
    pub static_dir: PathBuf,
    /// Directory avatar files live in
    pub avatar_dir: PathBuf,
    /// URL prefix avatars are served under
    pub avatar_prefix: String,
    /// Largest accepted avatar upload
    pub max_avatar_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 60,
            cors_origins: Vec::new(),
            static_dir: PathBuf::from("./frontend/build"),
            avatar_dir: PathBuf::from("./uploads/avatars"),
            avatar_prefix: "/uploads/avatars".to_string(),
            max_avatar_bytes: DEFAULT_MAX_AVATAR_BYTES,
        }
    }
}

impl ApiConfig {
    /// Build from the `[api]` and `[uploads]` sections
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.api.host.clone(),
            port: config.api.port,
            request_timeout_secs: config.api.request_timeout_secs,
            cors_origins: config.api.cors_origins.clone(),
            static_dir: PathBuf::from(&config.api.static_dir),
            avatar_dir: PathBuf::from(&config.uploads.avatar_dir),
            avatar_prefix: config.uploads.public_prefix.trim_end_matches('/').to_string(),
            max_avatar_bytes: config.uploads.max_avatar_bytes,
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Body limit for the avatar route; leaves room for multipart framing
    pub fn avatar_body_limit(&self) -> usize {
        self.max_avatar_bytes + 64 * 1024
    }
}
