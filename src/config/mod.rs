//! Configuration management for zodiac-admin
//!
//! This module handles loading, parsing, and validating application configuration
//! from YAML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "ZODIAC_ADMIN_";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Credential store configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Login notification configuration
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(yaml);
        let config: Self = serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `ZODIAC_ADMIN_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(host) = env_var("SERVER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = env_var("SERVER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid port number".to_string()))?;
        }

        if let Some(path) = env_var("DATABASE_PATH") {
            config.database.path = path;
        }

        if let Some(secret) = env_var("AUTH_SECRET") {
            config.auth.secret = Some(secret);
        }
        if let Some(email) = env_var("OWNER_EMAIL") {
            config.auth.owner_email = Some(email);
        }
        if let Some(password) = env_var("OWNER_PASSWORD") {
            config.auth.owner_password = Some(password);
        }
        if let Some(ttl) = env_var("TOKEN_TTL_SECS") {
            config.auth.token_ttl_secs = ttl
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid token TTL".to_string()))?;
        }

        if let Some(url) = env_var("NOTIFY_WEBHOOK_URL") {
            config.notify.webhook_url = Some(url);
        }

        if let Some(level) = env_var("LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the service misbehave at runtime
    ///
    /// A missing secret is not an error here: the service still starts and
    /// refuses every login and session until one is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.password_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "auth.password_iterations must be at least 1".to_string(),
            ));
        }
        if self.auth.rate_limit.max_failures == 0 {
            return Err(ConfigError::InvalidValue(
                "auth.rate_limit.max_failures must be at least 1".to_string(),
            ));
        }
        if self.database.path.is_empty() {
            return Err(ConfigError::MissingRequired("database.path".to_string()));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Session authentication configuration
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// HMAC key for session tokens; login is disabled without it
    #[serde(default)]
    pub secret: Option<String>,

    /// Email of the static owner credential
    #[serde(default)]
    pub owner_email: Option<String>,

    /// Plaintext password of the static owner credential
    #[serde(default)]
    pub owner_password: Option<String>,

    /// Session lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: i64,

    /// PBKDF2 rounds for newly hashed passwords
    #[serde(default = "default_password_iterations")]
    pub password_iterations: u32,

    /// Failed login throttling
    #[serde(default)]
    pub rate_limit: AuthRateLimitConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            owner_email: None,
            owner_password: None,
            token_ttl_secs: default_token_ttl(),
            password_iterations: default_password_iterations(),
            rate_limit: AuthRateLimitConfig::default(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("owner_email", &self.owner_email)
            .field(
                "owner_password",
                &self.owner_password.as_ref().map(|_| "<redacted>"),
            )
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("password_iterations", &self.password_iterations)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

fn default_token_ttl() -> i64 {
    crate::auth::token::DEFAULT_TOKEN_TTL_SECS
}

fn default_password_iterations() -> u32 {
    crate::auth::password::DEFAULT_ITERATIONS
}

/// Rate limiting configuration for failed logins
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthRateLimitConfig {
    /// Maximum number of failed attempts before blocking
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Duration to block after max failures (in seconds)
    #[serde(default = "default_block_duration")]
    pub block_duration_secs: u64,

    /// Window in which failures are counted (in seconds)
    #[serde(default = "default_window_duration")]
    pub window_duration_secs: u64,
}

impl Default for AuthRateLimitConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            block_duration_secs: default_block_duration(),
            window_duration_secs: default_window_duration(),
        }
    }
}

fn default_max_failures() -> u32 {
    10
}

fn default_block_duration() -> u64 {
    300
}

fn default_window_duration() -> u64 {
    600
}

/// Credential store configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "data/zodiac-admin.db".to_string()
}

/// Login notification configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotifyConfig {
    /// Webhook receiving login events; events are only logged when unset
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Webhook request timeout in seconds
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_notify_timeout(),
        }
    }
}

fn default_notify_timeout() -> u64 {
    5
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (`json` or `pretty`)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, suffix)).ok()
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax. Unset variables are left as written.
fn expand_env_vars(input: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return input.to_string();
    };

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
