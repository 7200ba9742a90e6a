//! Pool configuration

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default upper bound on concurrent pooled connections
pub const DEFAULT_CONNECTION_LIMIT: usize = 25;

/// Connection pool configuration.
///
/// Built once when the node is configured and immutable afterwards; the
/// manager hands it to the driver's pool factory on the first `connect()`.
/// Credentials are provided by the host runtime, which owns their secure
/// storage.
#[derive(Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Database server hostname or address
    pub host: String,
    /// Database server port
    pub port: u16,
    /// User name, if the server requires authentication
    pub user: Option<String>,
    /// Password, never serialized back out
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    /// Database to select after connecting
    pub database: Option<String>,
    /// Session timezone; `"local"` leaves the server default in place
    pub timezone: String,
    /// Connection charset or collation name, normalized to upper-case
    pub charset: String,
    /// Upper bound on concurrent connections held by the pool
    pub connection_limit: usize,
}

impl PoolConfig {
    /// Create a configuration for the given host with defaults for
    /// everything else.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 3306,
            user: None,
            password: None,
            database: None,
            timezone: "local".into(),
            charset: "UTF8_GENERAL_CI".into(),
            connection_limit: DEFAULT_CONNECTION_LIMIT,
        }
    }

    /// Set the server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the credentials
    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set the database name
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the session timezone
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// Set the connection charset. Collation names are accepted and
    /// normalized to upper-case.
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into().to_uppercase();
        self
    }

    /// Set the pool's connection limit
    pub fn with_connection_limit(mut self, limit: usize) -> Self {
        self.connection_limit = limit;
        self
    }

    /// Validate the configuration.
    ///
    /// Missing required settings are a fatal initialization error, reported
    /// once when the node is constructed.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Configuration(
                "database host is not configured".into(),
            ));
        }
        if self.connection_limit == 0 {
            return Err(Error::Configuration(
                "connection limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("timezone", &self.timezone)
            .field("charset", &self.charset)
            .field("connection_limit", &self.connection_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_node_conventions() {
        let config = PoolConfig::new("db.internal");
        assert_eq!(config.port, 3306);
        assert_eq!(config.timezone, "local");
        assert_eq!(config.charset, "UTF8_GENERAL_CI");
        assert_eq!(config.connection_limit, DEFAULT_CONNECTION_LIMIT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn charset_is_normalized_to_uppercase() {
        let config = PoolConfig::new("db").with_charset("utf8mb4_unicode_ci");
        assert_eq!(config.charset, "UTF8MB4_UNICODE_CI");
    }

    #[test]
    fn empty_host_is_a_configuration_error() {
        let config = PoolConfig::new("  ");
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn debug_redacts_password() {
        let config = PoolConfig::new("db").with_credentials("root", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}
