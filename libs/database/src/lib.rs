//! Connection plumbing for the ticketing store (PostgreSQL) and cache (Redis)
//!
//! The ticketing core never opens connections itself: binaries use this crate
//! to build the two capability handles (a SeaORM `DatabaseConnection` and a
//! Redis `ConnectionManager`) and pass them to the services.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL support with SeaORM
//! - `redis` (default) - Redis support
//! - `config` - `core_config::FromEnv` implementations for the configs
//! - `all` - everything above
//!
//! # Example
//!
//! ```ignore
//! use database::{postgres, redis};
//! use migration::Migrator;
//!
//! let db = postgres::connect_with_retry(postgres::PostgresConfig::new(url), None).await?;
//! postgres::run_migrations::<Migrator>(&db, "ticketing").await?;
//! let cache = redis::connect_with_retry(redis::RedisConfig::new(redis_url), None).await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;

pub use common::{DatabaseError, DatabaseResult, HealthStatus, RetryConfig};
