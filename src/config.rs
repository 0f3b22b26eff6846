//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `PEAKSTREAK_*` environment overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub uploads: UploadsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SQLite database location
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    dirs::data_local_dir()
        .map(|p| {
            p.join("peakstreak")
                .join("peakstreak.db")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./peakstreak_data/peakstreak.db".to_string())
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    /// The database path with a leading `~/` expanded to the home directory
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Built single-page frontend served outside `/api`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default = "default_feed_limit")]
    pub leaderboard_limit: u32,

    #[serde(default = "default_feed_limit")]
    pub explore_limit: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    60
}

fn default_static_dir() -> String {
    "./frontend/build".to_string()
}

fn default_feed_limit() -> u32 {
    20
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            static_dir: default_static_dir(),
            leaderboard_limit: default_feed_limit(),
            explore_limit: default_feed_limit(),
        }
    }
}

/// Token signing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret; the server refuses to start without one
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_hours: i64,
}

fn default_token_ttl() -> i64 {
    24
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl(),
        }
    }
}

/// Avatar upload configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadsConfig {
    #[serde(default = "default_avatar_dir")]
    pub avatar_dir: String,

    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,

    #[serde(default = "default_max_avatar_bytes")]
    pub max_avatar_bytes: usize,
}

fn default_avatar_dir() -> String {
    "./uploads/avatars".to_string()
}

fn default_public_prefix() -> String {
    "/uploads/avatars".to_string()
}

fn default_max_avatar_bytes() -> usize {
    2 * 1024 * 1024 // 2 MB
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            avatar_dir: default_avatar_dir(),
            public_prefix: default_public_prefix(),
            max_avatar_bytes: default_max_avatar_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in default_config_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Database
        if let Some(path) = var("PEAKSTREAK_DB_PATH") {
            self.database.path = path;
        }

        // API
        if let Some(host) = var("PEAKSTREAK_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("PEAKSTREAK_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PEAKSTREAK_API_PORT: {}", port),
            }
        }
        if let Some(dir) = var("PEAKSTREAK_STATIC_DIR") {
            self.api.static_dir = dir;
        }

        // Auth
        if let Some(secret) = var("PEAKSTREAK_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(ttl) = var("PEAKSTREAK_TOKEN_TTL_HOURS") {
            match ttl.parse() {
                Ok(hours) => self.auth.token_ttl_hours = hours,
                Err(_) => tracing::warn!("Ignoring invalid PEAKSTREAK_TOKEN_TTL_HOURS: {}", ttl),
            }
        }

        // Uploads
        if let Some(dir) = var("PEAKSTREAK_AVATAR_DIR") {
            self.uploads.avatar_dir = dir;
        }

        // Logging
        if let Some(level) = var("PEAKSTREAK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("PEAKSTREAK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Candidate config files, most specific first
pub fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|p| p.join("peakstreak").join("config.toml")),
        Some(PathBuf::from("/etc/peakstreak/config.toml")),
        Some(PathBuf::from("./config.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# PeakStreak Configuration
#
# Environment variables override these settings:
# - PEAKSTREAK_DB_PATH
# - PEAKSTREAK_API_HOST
# - PEAKSTREAK_API_PORT
# - PEAKSTREAK_STATIC_DIR
# - PEAKSTREAK_JWT_SECRET
# - PEAKSTREAK_TOKEN_TTL_HOURS
# - PEAKSTREAK_AVATAR_DIR
# - PEAKSTREAK_LOG_LEVEL
# - PEAKSTREAK_LOG_FORMAT

[database]
# SQLite database file
path = "~/.local/share/peakstreak/peakstreak.db"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8080

# Allowed CORS origins (empty allows any origin)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 60

# Built frontend, served for every path outside /api
static_dir = "./frontend/build"

# Entries returned by the leaderboard and explore feeds
leaderboard_limit = 20
explore_limit = 20

[auth]
# Secret used to sign bearer tokens (required)
jwt_secret = ""

# Token lifetime in hours
token_ttl_hours = 24

[uploads]
# Directory avatar images are written to
avatar_dir = "./uploads/avatars"

# URL prefix avatars are served under
public_prefix = "/uploads/avatars"

# Largest accepted avatar (bytes)
max_avatar_bytes = 2097152

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.request_timeout_secs, 60);
        assert!(config.api.cors_origins.is_empty());
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.uploads.max_avatar_bytes, 2 * 1024 * 1024);
        assert_eq!(config.uploads.public_prefix, "/uploads/avatars");
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = Config::parse("[api]\nport = 9000\n").unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.api.leaderboard_limit, 20);
        assert!(config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PEAKSTREAK_DB_PATH", "/tmp/p.db"),
            ("PEAKSTREAK_API_PORT", "9999"),
            ("PEAKSTREAK_JWT_SECRET", "s3cret"),
            ("PEAKSTREAK_TOKEN_TTL_HOURS", "not-a-number"),
            ("PEAKSTREAK_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, "/tmp/p.db");
        assert_eq!(config.api.port, 9999);
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_home_expansion() {
        let config = DatabaseConfig {
            path: "/var/lib/peakstreak.db".to_string(),
        };
        assert_eq!(config.resolved_path(), PathBuf::from("/var/lib/peakstreak.db"));

        if let Some(home) = dirs::home_dir() {
            let config = DatabaseConfig {
                path: "~/p/peakstreak.db".to_string(),
            };
            assert_eq!(config.resolved_path(), home.join("p/peakstreak.db"));
        }
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(matches!(Config::load(&path), Err(ConfigError::Io { .. })));

        std::fs::write(&path, "[api\nport = 1").unwrap();
        match Config::load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }
    }
}
