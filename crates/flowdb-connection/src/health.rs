//! Periodic health checking for the shared connection
//!
//! Once connected, the manager runs a no-op query on a fixed interval to
//! detect silently-dead connections. A failed check is always logged and
//! triggers reconnection.

use std::time::Duration;

/// Default interval between health checks
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(290);

/// Default health-check query
pub const DEFAULT_HEALTH_QUERY: &str = "SELECT version()";

/// Configuration for the periodic health check.
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// Interval between health checks
    pub interval: Duration,
    /// Query executed on each check
    pub query: String,
}

impl HealthCheckConfig {
    /// Create a health check configuration with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            query: DEFAULT_HEALTH_QUERY.into(),
        }
    }

    /// Set a custom health-check query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HEALTH_INTERVAL)
    }
}

#[cfg(test)]
mod tests;
