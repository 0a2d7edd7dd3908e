use std::time::Duration;

use serde::Deserialize;

use crate::db::pool::{AcquirePolicy, PoolOptions};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Database name
    pub db_name: String,

    /// Database user
    pub db_user: String,

    /// Database password
    pub db_password: String,

    /// Database host
    pub db_host: String,

    /// Database port
    pub db_port: u16,

    /// Chat-platform credential, required on every inbound message
    pub bot_token: String,

    /// Handle shown in reply headers
    #[serde(default = "default_bot_username")]
    pub bot_username: String,

    /// Connections opened eagerly at startup
    #[serde(default = "default_pool_min_size")]
    pub pool_min_size: usize,

    /// Upper bound on connections lent at once
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: usize,

    /// What `acquire` does once every connection is lent out
    #[serde(default)]
    pub pool_acquire_policy: AcquirePolicy,

    /// How long `acquire` waits under the `wait` policy
    #[serde(default = "default_pool_acquire_timeout_ms")]
    pub pool_acquire_timeout_ms: u64,

    /// Upper bound on a single lookup query
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bot_username() -> String {
    "MoviesGamabot".to_string()
}

fn default_pool_min_size() -> usize {
    1
}

fn default_pool_max_size() -> usize {
    10
}

fn default_pool_acquire_timeout_ms() -> u64 {
    5_000
}

fn default_query_timeout_ms() -> u64 {
    10_000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            min_size: self.pool_min_size,
            max_size: self.pool_max_size,
            acquire_policy: self.pool_acquire_policy,
            acquire_timeout: Duration::from_millis(self.pool_acquire_timeout_ms),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_vars() -> Vec<(String, String)> {
        [
            ("DB_NAME", "dramas"),
            ("DB_USER", "bot"),
            ("DB_PASSWORD", "secret"),
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("BOT_TOKEN", "123:abc"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_vars(required_vars()).unwrap();
        assert_eq!(config.db_port, 5432);
        assert_eq!(config.bot_username, "MoviesGamabot");
        assert_eq!(config.pool_min_size, 1);
        assert_eq!(config.pool_max_size, 10);
        assert_eq!(config.pool_acquire_policy, AcquirePolicy::Wait);
        assert_eq!(config.query_timeout(), Duration::from_secs(10));
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_required_option_fails() {
        for missing in ["DB_NAME", "DB_USER", "DB_PASSWORD", "DB_HOST", "DB_PORT", "BOT_TOKEN"] {
            let vars = required_vars().into_iter().filter(|(k, _)| k != missing);
            let err = Config::from_vars(vars).unwrap_err();
            assert!(
                err.to_string().contains(&missing.to_lowercase()),
                "expected error mentioning {missing}, got {err}"
            );
        }
    }

    #[test]
    fn test_fail_fast_policy_parsed() {
        let mut vars = required_vars();
        vars.push(("POOL_ACQUIRE_POLICY".to_string(), "fail_fast".to_string()));
        vars.push(("POOL_MAX_SIZE".to_string(), "3".to_string()));
        let options = Config::from_vars(vars).unwrap().pool_options();
        assert_eq!(options.acquire_policy, AcquirePolicy::FailFast);
        assert_eq!(options.max_size, 3);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut vars = required_vars();
        vars.retain(|(k, _)| k != "DB_PORT");
        vars.push(("DB_PORT".to_string(), "not-a-port".to_string()));
        assert!(Config::from_vars(vars).is_err());
    }
}
