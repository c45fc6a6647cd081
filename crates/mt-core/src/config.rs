//! Money tracker configuration management
//!
//! Handles configuration from a TOML file and environment variables with
//! sensible defaults for local development. The resulting `AppConfig` is
//! built once in `main` and handed to every component explicitly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Signing secret used when nothing is configured. Refused in `prod`.
pub const DEV_JWT_SECRET: &str = "development-secret-key-change-in-production";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment (only affects logging)
    pub env: Environment,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub database: DatabaseConfig,

    /// Token and password hashing configuration
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Apply environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        if let Ok(env) = std::env::var("APP_ENV") {
            self.env = env.parse()?;
        }

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("API_PORT") {
            self.server.port = parse_var("API_PORT", port)?;
        }
        if let Ok(secs) = std::env::var("REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECS", secs)?;
        }

        // Storage
        if let Ok(path) = std::env::var("STORAGE_PATH") {
            self.database.storage_path = PathBuf::from(path);
        }

        // Auth
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(ttl) = std::env::var("JWT_TTL_SECS") {
            self.auth.token_ttl_secs = parse_var("JWT_TTL_SECS", ttl)?;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            self.auth.issuer = issuer;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = Some(level);
        }

        Ok(self)
    }

    /// Reject configurations the server must not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "auth.token_ttl_secs".to_string(),
                value: "0".to_string(),
            });
        }
        if self.env == Environment::Prod && self.auth.jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::MissingRequired(
                "auth.jwt_secret (development secret is not allowed in prod)".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address string the server binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Human-readable debug logs
    #[default]
    Local,
    /// JSON debug logs
    Dev,
    /// JSON info logs
    Prod,
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Dev => write!(f, "dev"),
            Self::Prod => write!(f, "prod"),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 4,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file, created if missing
    pub storage_path: PathBuf,

    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./storage/storage.db"),
            max_connections: 5,
        }
    }
}

/// Token issuance and password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub token_ttl_secs: u64,

    /// Token issuer identifier
    pub issuer: String,

    /// Argon2 cost parameters
    pub password: PasswordHashConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_secs: 24 * 60 * 60,
            issuer: "money-tracker".to_string(),
            password: PasswordHashConfig::default(),
        }
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordHashConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; when unset the environment picks the level
    pub level: Option<String>,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.env, Environment::Local);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_ttl_secs, 86400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!("DEV".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            env = "dev"

            [server]
            port = 9000

            [database]
            storage_path = "/tmp/mt.db"

            [auth]
            jwt_secret = "s3cr3t"
            "#,
        )
        .unwrap();

        assert_eq!(config.env, Environment::Dev);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.storage_path, PathBuf::from("/tmp/mt.db"));
        assert_eq!(config.auth.jwt_secret, "s3cr3t");
        assert_eq!(config.auth.issuer, "money-tracker");
        assert_eq!(config.auth.password, PasswordHashConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_secrets() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));

        let mut config = AppConfig {
            env: Environment::Prod,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.auth.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());

        config.auth.token_ttl_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_from_file_missing() {
        let result = AppConfig::from_file("/nonexistent/mt.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError { .. })));
    }
}
