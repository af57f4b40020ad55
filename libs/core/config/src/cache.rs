use std::time::Duration;

use crate::{env_parse, ConfigError, FromEnv};

/// TTLs applied by the cache-aside layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheTtlConfig {
    /// Single entities and filtered lists
    pub entity_ttl: Duration,
    /// Rarely-changing aggregates such as the distinct-cities list
    pub aggregate_ttl: Duration,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            entity_ttl: Duration::from_secs(10 * 60),
            aggregate_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl FromEnv for CacheTtlConfig {
    /// Reads `CACHE_ENTITY_TTL_SECS` (default 600) and
    /// `CACHE_AGGREGATE_TTL_SECS` (default 86400)
    fn from_env() -> Result<Self, ConfigError> {
        let entity_secs: u64 = env_parse("CACHE_ENTITY_TTL_SECS", "600")?;
        let aggregate_secs: u64 = env_parse("CACHE_AGGREGATE_TTL_SECS", "86400")?;

        Ok(Self {
            entity_ttl: Duration::from_secs(entity_secs),
            aggregate_ttl: Duration::from_secs(aggregate_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_ttl_defaults() {
        temp_env::with_vars_unset(["CACHE_ENTITY_TTL_SECS", "CACHE_AGGREGATE_TTL_SECS"], || {
            let config = CacheTtlConfig::from_env().unwrap();
            assert_eq!(config, CacheTtlConfig::default());
            assert_eq!(config.entity_ttl, Duration::from_secs(600));
            assert_eq!(config.aggregate_ttl, Duration::from_secs(86_400));
        });
    }

    #[test]
    fn test_cache_ttl_overrides() {
        temp_env::with_vars(
            [
                ("CACHE_ENTITY_TTL_SECS", Some("30")),
                ("CACHE_AGGREGATE_TTL_SECS", Some("3600")),
            ],
            || {
                let config = CacheTtlConfig::from_env().unwrap();
                assert_eq!(config.entity_ttl, Duration::from_secs(30));
                assert_eq!(config.aggregate_ttl, Duration::from_secs(3600));
            },
        );
    }

    #[test]
    fn test_cache_ttl_invalid_value() {
        temp_env::with_var("CACHE_ENTITY_TTL_SECS", Some("soon"), || {
            let err = CacheTtlConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("CACHE_ENTITY_TTL_SECS"));
        });
    }
}
