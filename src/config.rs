//! Environment-driven configuration

use anyhow::{Context, Result};
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub environment: Environment,
    pub gift_model: Option<GiftModelConfig>,
}

/// Connection details for the external generative-model API used by the
/// gift finder. Absent when no API key is configured; the chat endpoint
/// then serves keyword matches only.
#[derive(Clone, Debug)]
pub struct GiftModelConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().context("invalid PORT")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is required")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is required")?;
        let jwt_ttl_hours = env::var("JWT_TTL_HOURS").unwrap_or_else(|_| "24".to_string()).parse().context("invalid JWT_TTL_HOURS")?;

        let gift_model = env::var("GIFT_MODEL_API_KEY").ok().map(|api_key| GiftModelConfig {
            api_url: env::var("GIFT_MODEL_API_URL").unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".to_string()),
            api_key,
            model: env::var("GIFT_MODEL_NAME").unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string()),
        });

        Ok(Self { port, database_url, jwt_secret, jwt_ttl_hours, environment: environment(), gift_model })
    }
}

/// Reads `APP_ENV`; anything other than `production` counts as development.
pub fn environment() -> Environment {
    match env::var("APP_ENV").as_deref() {
        Ok("production") => Environment::Production,
        _ => Environment::Development,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_environment_default() {
        std::env::remove_var("APP_ENV");
        assert_eq!(environment(), Environment::Development);
    }
}
