//! Tests for the health check configuration

use super::*;

#[test]
fn defaults_use_the_version_query() {
    let config = HealthCheckConfig::default();
    assert_eq!(config.interval, DEFAULT_HEALTH_INTERVAL);
    assert_eq!(config.query, DEFAULT_HEALTH_QUERY);
}

#[test]
fn query_is_configurable() {
    let config = HealthCheckConfig::new(Duration::from_secs(30)).with_query("SELECT 1");
    assert_eq!(config.interval, Duration::from_secs(30));
    assert_eq!(config.query, "SELECT 1");
}
