//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. `main` calls `dotenvy::dotenv()` first, so a `.env` file works too.

use std::env;
use std::str::FromStr;

/// Minimum HS256 secret length in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Default `RUST_LOG` filter for the server binary.
pub const DEFAULT_LOG_FILTER: &str = "crm_api=debug,crm_db=info,tower_http=info";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// SQLite file path, or `:memory:`.
    pub database_path: String,
    pub db_max_connections: u32,

    /// HS256 signing secret, at least [`MIN_JWT_SECRET_LEN`] bytes.
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_minutes: i64,

    /// Admin account created at startup when `admin_password` is set.
    pub admin_email: String,
    pub admin_name: String,
    pub admin_password: Option<String>,

    pub cors_allowed_origin: String,

    /// Interval between purges of expired blacklist entries.
    pub blacklist_cleanup_secs: u64,

    /// Directory for the plain-text log file, created at startup.
    pub log_dir: String,
    pub log_file: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_path: "./crm.db".to_string(),
            db_max_connections: 5,
            // Development only. Production MUST set JWT_SECRET.
            jwt_secret: "crm-dev-secret-change-in-production-0123456789".to_string(),
            jwt_issuer: "crm-api".to_string(),
            jwt_audience: "crm-clients".to_string(),
            jwt_expiry_minutes: 60,
            admin_email: "admin@crm.com".to_string(),
            admin_name: "System Administrator".to_string(),
            admin_password: None,
            cors_allowed_origin: "http://localhost:3000".to_string(),
            blacklist_cleanup_secs: 300,
            log_dir: "Logs".to_string(),
            log_file: "CRM_Logs.txt".to_string(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from any key/value source, starting from
    /// [`ApiConfig::default`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port)?,
            database_path: lookup("DATABASE_PATH").unwrap_or(defaults.database_path),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_issuer: lookup("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            jwt_audience: lookup("JWT_AUDIENCE").unwrap_or(defaults.jwt_audience),
            jwt_expiry_minutes: parse_or(&lookup, "JWT_EXPIRY_MINUTES", defaults.jwt_expiry_minutes)?,
            admin_email: lookup("ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            admin_name: lookup("ADMIN_NAME").unwrap_or(defaults.admin_name),
            admin_password: lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty()),
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN")
                .unwrap_or(defaults.cors_allowed_origin),
            blacklist_cleanup_secs: parse_or(
                &lookup,
                "BLACKLIST_CLEANUP_SECS",
                defaults.blacklist_cleanup_secs,
            )?,
            log_dir: lookup("LOG_DIR").unwrap_or(defaults.log_dir),
            log_file: lookup("LOG_FILE").unwrap_or(defaults.log_file),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                min: MIN_JWT_SECRET_LEN,
            });
        }
        if self.jwt_expiry_minutes <= 0 {
            return Err(ConfigError::InvalidValue("JWT_EXPIRY_MINUTES".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if self.blacklist_cleanup_secs == 0 {
            return Err(ConfigError::InvalidValue("BLACKLIST_CLEANUP_SECS".to_string()));
        }
        if self.log_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue("LOG_FILE".to_string()));
        }
        Ok(())
    }

    /// `host:port` for the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("JWT_SECRET must be at least {min} bytes")]
    SecretTooShort { min: usize },
}
