//! Redis connector for the cache handle

mod config;
mod connector;
mod health;

pub use config::RedisConfig;
pub use connector::{connect, connect_with_retry};
pub use health::{check_health, check_health_detailed};

pub use redis::aio::ConnectionManager;
pub use redis::{AsyncCommands, RedisResult};
