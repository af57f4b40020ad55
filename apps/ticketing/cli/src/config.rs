//! Configuration for the ticketing CLI

use std::time::Duration;

use core_config::cache::CacheTtlConfig;
use core_config::{env_parse_optional, FromEnv};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use eyre::{Result, WrapErr};

#[derive(Debug, Clone)]
pub struct Config {
    pub database: PostgresConfig,
    pub redis: RedisConfig,
    pub cache: CacheTtlConfig,
    /// Deadline for each store operation (`TICKETING_OP_TIMEOUT_MS`)
    pub op_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let op_timeout = env_parse_optional::<u64>("TICKETING_OP_TIMEOUT_MS")
            .wrap_err("Invalid operation timeout")?
            .map(Duration::from_millis);

        Ok(Self {
            database: PostgresConfig::from_env().wrap_err("Invalid database configuration")?,
            redis: RedisConfig::from_env().wrap_err("Invalid Redis configuration")?,
            cache: CacheTtlConfig::from_env().wrap_err("Invalid cache configuration")?,
            op_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/tickets")),
                ("REDIS_URL", Some("redis://cache:6379")),
                ("CACHE_ENTITY_TTL_SECS", Some("60")),
                ("TICKETING_OP_TIMEOUT_MS", Some("1500")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.database.url(), "postgresql://localhost/tickets");
                assert_eq!(config.redis.url, "redis://cache:6379");
                assert_eq!(config.cache.entity_ttl, Duration::from_secs(60));
                assert_eq!(config.op_timeout, Some(Duration::from_millis(1500)));
            },
        );
    }

    #[test]
    fn test_config_without_timeout() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/tickets")),
                ("REDIS_HOST", Some("redis://localhost:6379")),
                ("REDIS_URL", None),
                ("TICKETING_OP_TIMEOUT_MS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.redis.url, "redis://localhost:6379");
                assert!(config.op_timeout.is_none());
            },
        );
    }

    #[test]
    fn test_config_requires_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            let err = Config::from_env().unwrap_err();
            assert!(format!("{:?}", err).contains("DATABASE_URL"));
        });
    }
}
