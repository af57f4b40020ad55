use redis::aio::ConnectionManager;
use tracing::debug;

use crate::common::health::timed_probe;
use crate::common::{DatabaseError, HealthStatus};

/// Send `PING` and expect `PONG`
pub async fn check_health(conn: &mut ConnectionManager) -> Result<(), DatabaseError> {
    debug!("Running Redis health check");

    let response: String = redis::cmd("PING").query_async(conn).await.map_err(|e| {
        DatabaseError::HealthCheckFailed(format!("Redis health check failed: {}", e))
    })?;

    if response != "PONG" {
        return Err(DatabaseError::HealthCheckFailed(format!(
            "Redis PING returned unexpected response: {}",
            response
        )));
    }

    Ok(())
}

/// [`check_health`] with timing, never fails
pub async fn check_health_detailed(conn: &mut ConnectionManager) -> HealthStatus {
    timed_probe("redis", check_health(conn)).await
}
