//! Configuration management
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/<env>, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Upload storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// AI inference endpoint configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Auth token configuration (environment surface for the auth collaborator)
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests (backpressure control)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Log filter directive
    #[serde(default = "default_rust_log")]
    pub rust_log: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection URL
    pub url: String,

    /// Maximum number of pooled connections (fixed at process start)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of pooled connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for durable upload storage
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Inference endpoint URL
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_ai_model")]
    pub model_id: String,

    /// Vendor compartment identifier
    #[serde(default)]
    pub compartment_id: String,

    /// API key; "mock" selects the in-process mock client
    #[serde(default = "default_ai_api_key")]
    pub api_key: String,

    /// Upper-bound request timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Signing secret for access tokens
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Signing algorithm
    #[serde(default = "default_auth_algorithm")]
    pub algorithm: String,

    /// Access token expiry in minutes
    #[serde(default = "default_token_expiry")]
    pub access_token_expire_minutes: u64,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_concurrent() -> usize {
    100
}
fn default_rust_log() -> String {
    "info,lectern=debug".to_string()
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_upload_dir() -> String {
    "uploads".to_string()
}
fn default_ai_endpoint() -> String {
    "http://localhost:9000/chat".to_string()
}
fn default_ai_model() -> String {
    "cohere.command-r-08-2024".to_string()
}
fn default_ai_api_key() -> String {
    "mock".to_string()
}
fn default_ai_timeout() -> u64 {
    240
}
fn default_auth_algorithm() -> String {
    "HS256".to_string()
}
fn default_token_expiry() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_concurrent_requests: default_max_concurrent(),
            rust_log: default_rust_log(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ai_endpoint(),
            model_id: default_ai_model(),
            compartment_id: String::new(),
            api_key: default_ai_api_key(),
            timeout_secs: default_ai_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            algorithm: default_auth_algorithm(),
            access_token_expire_minutes: default_token_expiry(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__DATABASE__URL=postgres://...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// True when the in-process mock client should be used instead of the
    /// hosted endpoint.
    pub fn use_mock(&self) -> bool {
        self.api_key == "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();
        assert_eq!(server.port, 8080);
        assert_eq!(server.max_concurrent_requests, 100);
    }

    #[test]
    fn test_ai_defaults_select_mock() {
        let ai = AiConfig::default();
        assert!(ai.use_mock());
        assert_eq!(ai.timeout(), Duration::from_secs(240));
    }

    #[test]
    fn test_auth_defaults() {
        let auth = AuthConfig::default();
        assert_eq!(auth.algorithm, "HS256");
        assert_eq!(auth.access_token_expire_minutes, 30);
        assert!(auth.secret_key.is_none());
    }
}
