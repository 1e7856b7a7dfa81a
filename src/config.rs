use crate::error::app_error::AppError;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_PATH: &str = "/api";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    pub cors: CorsConfig,
    pub session: SessionConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_path: String,
    pub additional_base_paths: Vec<String>,
    pub enable_swagger: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Lifetime of issued session tokens and the cadence of the expiry sweep.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub duration_seconds: u64,
    pub sweep_interval_seconds: u64,
}

/// Where uploaded part pictures live and how they are exposed.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MediaConfig {
    pub root: String,
    pub url_prefix: String,
    pub max_upload_bytes: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/cartrack".to_string(),
            max_connections: 8,
            min_connections: 1,
            acquire_timeout: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            additional_base_paths: Vec::new(),
            enable_swagger: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 60 * 60,
            sweep_interval_seconds: 5 * 60,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: "media".to_string(),
            url_prefix: "/media".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl MediaConfig {
    /// The URL prefix with exactly one leading slash and none trailing.
    pub fn public_prefix(&self) -> String {
        format!("/{}", self.url_prefix.trim_matches('/'))
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. Cartrack.toml (base configuration file)
    /// 3. Environment variables prefixed with CARTRACK_ (nested keys separated by `__`)
    /// 4. DATABASE_URL and MEDIA_PATH, the variables deployments already set
    pub fn load() -> Result<Self, AppError> {
        Ok(Self::figment().extract()?)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("Cartrack.toml").nested())
            .merge(Env::prefixed("CARTRACK_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
            .merge(Env::raw().only(&["MEDIA_PATH"]).map(|_| "media.root".into()))
    }
}
