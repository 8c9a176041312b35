use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

use crate::auth::token::{DEFAULT_TOKEN_TTL_HOURS, MAX_TOKEN_TTL_HOURS};

/// Minimum accepted length of the token signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    #[serde(default)]
    pub rotation: Rotation,
    pub server: ServerConfig,
    /// PostgreSQL connection URL. `DATABASE_URL` takes precedence.
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default = "default_postgres_max_connections")]
    pub postgres_max_connections: u32,
    pub auth: AuthConfig,
}

fn default_postgres_max_connections() -> u32 {
    20
}

/// Log file rotation policy.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// Token signing secret. `JWT_SECRET` takes precedence.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default)]
    pub hash_cost: HashCostConfig,
}

fn default_token_ttl_hours() -> i64 {
    DEFAULT_TOKEN_TTL_HOURS
}

/// Argon2id cost parameters, fixed for the lifetime of the process.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct HashCostConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCostConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl AuthConfig {
    /// The signing secret, preferring the `JWT_SECRET` env var over the file.
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.jwt_secret.clone())
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn database_url(&self) -> Option<String> {
        std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| self.postgres_url.clone())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ttl = self.auth.token_ttl_hours;
        if ttl <= 0 || ttl > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_hours must be in 1..={}, got {}",
                MAX_TOKEN_TTL_HOURS, ttl
            )));
        }

        match self.auth.resolved_jwt_secret() {
            None => {
                return Err(ConfigError::Invalid(
                    "jwt_secret must be set via the JWT_SECRET env var or auth.jwt_secret".into(),
                ));
            }
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(ConfigError::Invalid(format!(
                    "jwt_secret must be at least {} bytes long",
                    MIN_SECRET_LEN
                )));
            }
            _ => {}
        }

        let cost = self.auth.hash_cost;
        argon2::Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| ConfigError::Invalid(format!("auth.hash_cost rejected: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
log_level: info
log_dir: ./logs
log_file: devbook.log
use_json: false
rotation: daily
server:
  host: 127.0.0.1
  port: 5000
auth:
  jwt_secret: "0123456789abcdef0123456789abcdef"
"#;

    #[test]
    fn test_defaults_applied() {
        let cfg = AppConfig::from_yaml(BASE).unwrap();
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.auth.token_ttl_hours, 6);
        assert_eq!(cfg.auth.hash_cost, HashCostConfig::default());
        assert!(cfg.postgres_url.is_none());
        assert_eq!(cfg.postgres_max_connections, 20);
        assert_eq!(cfg.rotation, Rotation::Daily);
    }

    #[test]
    fn test_short_secret_rejected() {
        let yaml = BASE.replace("0123456789abcdef0123456789abcdef", "short");
        // JWT_SECRET would override the file value
        if std::env::var("JWT_SECRET").is_ok() {
            return;
        }
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let yaml = format!("{}  token_ttl_hours: 0\n", BASE);
        let err = AppConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("token_ttl_hours"));
    }

    #[test]
    fn test_huge_ttl_rejected() {
        for ttl in ["1000000000000", "9223372036854775807", "8785"] {
            let yaml = format!("{}  token_ttl_hours: {}\n", BASE, ttl);
            let err = AppConfig::from_yaml(&yaml).unwrap_err();
            assert!(err.to_string().contains("token_ttl_hours"), "ttl {}", ttl);
        }

        let yaml = format!("{}  token_ttl_hours: 8784\n", BASE);
        assert_eq!(AppConfig::from_yaml(&yaml).unwrap().auth.token_ttl_hours, 8784);
    }

    #[test]
    fn test_bad_hash_cost_rejected() {
        let yaml = format!(
            "{}  hash_cost:\n    memory_kib: 1\n    iterations: 0\n    parallelism: 1\n",
            BASE
        );
        assert!(AppConfig::from_yaml(&yaml).is_err());
    }
}
