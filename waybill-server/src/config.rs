//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 50)
    pub body_limit_mb: usize,
    /// Maximum size of one proof image in MB (default: 25)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Bound on fingerprint computation in seconds (unset: unbounded)
    pub fingerprint_timeout_secs: Option<u64>,
    /// PostgreSQL trip store (takes precedence over `trips_file`)
    pub database_url: Option<String>,
    /// Database connection pool maximum connections (default: 20)
    pub database_max_connections: u32,
    /// JSON trip store used when no database is configured
    pub trips_file: Option<PathBuf>,
    /// JSON array of community profiles
    pub profiles_file: Option<PathBuf>,
    /// Shared secret unlocking administrator routes (disabled when unset)
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 50,
            max_file_size_mb: 25,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            fingerprint_timeout_secs: None,
            database_url: None,
            database_max_connections: 20,
            trips_file: None,
            profiles_file: None,
            admin_token: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or(defaults.host);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Rate limiting enabled by default in production, can be disabled with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            port: env_parse("PORT").unwrap_or(defaults.port),
            host,
            allowed_origins,
            body_limit_mb: env_parse("BODY_LIMIT_MB").unwrap_or(defaults.body_limit_mb),
            max_file_size_mb: env_parse("MAX_FILE_SIZE_MB").unwrap_or(defaults.max_file_size_mb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_parse("RATE_LIMIT_PER_SEC")
                .unwrap_or(defaults.rate_limit_per_sec),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            fingerprint_timeout_secs: env_parse("FINGERPRINT_TIMEOUT_SECS"),
            database_url: env_nonempty("DATABASE_URL"),
            database_max_connections: env_parse("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            trips_file: env_nonempty("TRIPS_FILE").map(PathBuf::from),
            profiles_file: env_nonempty("PROFILES_FILE").map(PathBuf::from),
            admin_token: env_nonempty("ADMIN_TOKEN"),
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn fingerprint_timeout(&self) -> Option<Duration> {
        self.fingerprint_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
