use std::future::Future;
use std::time::Instant;

use super::DatabaseResult;

/// Outcome of a health probe against one backing store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    /// Name of the probed component ("postgres", "redis")
    pub component: &'static str,
    pub healthy: bool,
    /// Error message if unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

impl HealthStatus {
    pub fn healthy(component: &'static str, response_time_ms: u64) -> Self {
        Self {
            component,
            healthy: true,
            message: None,
            response_time_ms,
        }
    }

    pub fn unhealthy(component: &'static str, message: String, response_time_ms: u64) -> Self {
        Self {
            component,
            healthy: false,
            message: Some(message),
            response_time_ms,
        }
    }
}

/// Run a probe and time it
pub(crate) async fn timed_probe<F>(component: &'static str, probe: F) -> HealthStatus
where
    F: Future<Output = DatabaseResult<()>>,
{
    let start = Instant::now();
    let result = probe.await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthStatus::healthy(component, elapsed),
        Err(e) => HealthStatus::unhealthy(component, e.to_string(), elapsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatabaseError;

    #[test]
    fn test_health_status_constructors() {
        let ok = HealthStatus::healthy("postgres", 15);
        assert!(ok.healthy);
        assert!(ok.message.is_none());

        let bad = HealthStatus::unhealthy("redis", "connection timeout".to_string(), 5000);
        assert!(!bad.healthy);
        assert_eq!(bad.component, "redis");
        assert_eq!(bad.message.as_deref(), Some("connection timeout"));
    }

    #[tokio::test]
    async fn test_timed_probe_reports_failure_message() {
        let status = timed_probe("postgres", async {
            Err(DatabaseError::HealthCheckFailed("no route to host".to_string()))
        })
        .await;

        assert!(!status.healthy);
        assert!(status.message.unwrap().contains("no route to host"));
    }

    #[tokio::test]
    async fn test_timed_probe_success() {
        let status = timed_probe("redis", async { Ok(()) }).await;
        assert!(status.healthy);
        assert_eq!(status.component, "redis");
    }
}
