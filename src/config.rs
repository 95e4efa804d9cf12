//! Configuration loaded from environment variables

use std::env;

use anyhow::Result;

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database URL (sqlite://... or sqlite::memory:)
    pub database_url: String,

    /// Maximum connection pool size
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Prefers `DATABASE_URL`; falls back to `DATABASE_PATH` (a bare file
    /// path), then to an in-memory database.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .or_else(|_| env::var("DATABASE_PATH").map(|p| format!("sqlite://{p}?mode=rwc")))
            .unwrap_or_else(|_| "sqlite::memory:".to_string());

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        // Only assert the defaults when the variables are genuinely unset;
        // the test environment may provide them.
        if env::var("DATABASE_URL").is_err() && env::var("DATABASE_PATH").is_err() {
            let config = Config::from_env().unwrap();
            assert_eq!(config.database_url, "sqlite::memory:");
        }
    }
}
