use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub redis_url: String,
    pub cache_ttl_secs: u64,
    pub approval_period_days: i64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let redis_url = env_map
            .get("REDIS_URL")
            .cloned()
            .unwrap_or_else(|| "redis://127.0.0.1:6379/".to_string());

        let cache_ttl_secs = env_map
            .get("CACHE_TTL_SECS")
            .map(|s| s.as_str())
            .unwrap_or("3600")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "CACHE_TTL_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let approval_period_days = env_map
            .get("APPROVAL_PERIOD_DAYS")
            .map(|s| s.as_str())
            .unwrap_or("30")
            .parse::<i64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "APPROVAL_PERIOD_DAYS".to_string(),
                    "must be a valid i64".to_string(),
                )
            })?;
        if approval_period_days < 0 {
            return Err(ConfigError::InvalidValue(
                "APPROVAL_PERIOD_DAYS".to_string(),
                "must be non-negative".to_string(),
            ));
        }

        Ok(Config {
            port,
            database_path,
            redis_url,
            cache_ttl_secs,
            approval_period_days,
        })
    }
}
