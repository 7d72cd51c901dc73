//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Public site configuration.
    #[serde(default)]
    pub site: SiteConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this site.
    pub url: String,
    /// Take client addresses from `X-Forwarded-For`/`X-Real-IP`. Enable only
    /// behind a reverse proxy that sets these headers itself.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Which object storage implementation backs the attachment bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Files under `base_path` on the local filesystem.
    #[default]
    Local,
    /// Process memory; contents are lost on restart.
    Memory,
    /// S3-compatible object storage (requires the `s3` feature).
    S3,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage implementation.
    #[serde(default)]
    pub backend: StorageKind,
    /// Root directory for the local backend. Each bucket is a subdirectory.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// URL prefix under which bucket contents are publicly served.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Bucket holding news attachments.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// S3 settings, required when `backend = "s3"`.
    #[serde(default)]
    pub s3: Option<S3Config>,
}

/// S3-compatible storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// Endpoint URL (AWS or a `MinIO` deployment).
    pub endpoint: String,
    /// Region name.
    pub region: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Path prefix within the bucket.
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Public site configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site name shown in metadata.
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Language served when the client expresses no preference.
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            base_path: default_base_path(),
            public_url: default_public_url(),
            bucket: default_bucket(),
            s3: None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            default_language: default_language(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./files")
}

fn default_public_url() -> String {
    "/files".to_string()
}

fn default_bucket() -> String {
    "news-attachments".to_string()
}

fn default_site_name() -> String {
    "AAC Optics".to_string()
}

fn default_language() -> String {
    "zh".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `AAC_ENV`)
    /// 3. Environment variables with `AAC__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("AAC_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AAC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("AAC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
