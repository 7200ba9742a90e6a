//! MySQL pool factory

use mysql_async::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts};
use std::sync::Arc;

use flowdb_core::{DatabasePool, Error, PoolConfig, PoolFactory, Result};

use crate::MySqlPool;

/// MySQL database driver.
///
/// Creates `mysql_async` pools from a `PoolConfig`; all pooling policy is
/// the driver library's.
pub struct MySqlDriver;

impl MySqlDriver {
    /// Create a new MySQL driver instance
    pub fn new() -> Self {
        tracing::debug!("MySQL driver initialized");
        Self
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolFactory for MySqlDriver {
    fn create_pool(&self, config: &PoolConfig) -> Result<Arc<dyn DatabasePool>> {
        let opts = build_opts(config)?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = ?config.database,
            connection_limit = config.connection_limit,
            "creating MySQL pool"
        );
        Ok(Arc::new(MySqlPool::new(Pool::new(opts))))
    }
}

/// Map the node configuration onto mysql_async options.
fn build_opts(config: &PoolConfig) -> Result<Opts> {
    let mut builder = OptsBuilder::from_opts(Opts::default())
        .ip_or_hostname(config.host.as_str())
        .tcp_port(config.port);

    if let Some(user) = &config.user {
        builder = builder.user(Some(user));
    }
    if let Some(password) = &config.password {
        builder = builder.pass(Some(password));
    }
    if let Some(database) = &config.database {
        builder = builder.db_name(Some(database));
    }

    let constraints = PoolConstraints::new(1, config.connection_limit).ok_or_else(|| {
        Error::Configuration(format!(
            "invalid pool constraints (min=1, max={})",
            config.connection_limit
        ))
    })?;
    builder = builder.pool_opts(
        PoolOpts::default()
            .with_constraints(constraints)
            .with_reset_connection(false),
    );

    builder = builder.init(session_init_statements(config));
    Ok(builder.into())
}

/// Session setup statements run on every new pooled connection.
fn session_init_statements(config: &PoolConfig) -> Vec<String> {
    let mut statements = vec![charset_statement(&config.charset)];
    if let Some(stmt) = timezone_statement(&config.timezone) {
        statements.push(stmt);
    }
    statements
}

/// Build the `SET NAMES` statement for a charset or collation name.
///
/// Collation names ("UTF8_GENERAL_CI") carry the charset as their first
/// underscore-separated component.
fn charset_statement(charset: &str) -> String {
    match charset.split_once('_') {
        Some((base, _)) => format!("SET NAMES {} COLLATE {}", base.to_lowercase(), charset),
        None => format!("SET NAMES {}", charset.to_lowercase()),
    }
}

/// Build the session timezone statement; `"local"` keeps the server default.
fn timezone_statement(timezone: &str) -> Option<String> {
    if timezone.eq_ignore_ascii_case("local") {
        return None;
    }
    Some(format!("SET time_zone = '{}'", timezone.replace('\'', "''")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collation_names_split_into_charset_and_collation() {
        assert_eq!(
            charset_statement("UTF8_GENERAL_CI"),
            "SET NAMES utf8 COLLATE UTF8_GENERAL_CI"
        );
        assert_eq!(charset_statement("UTF8MB4"), "SET NAMES utf8mb4");
    }

    #[test]
    fn local_timezone_keeps_server_default() {
        assert_eq!(timezone_statement("local"), None);
        assert_eq!(
            timezone_statement("+02:00"),
            Some("SET time_zone = '+02:00'".into())
        );
    }

    #[test]
    fn init_statements_cover_charset_and_timezone() {
        let config = PoolConfig::new("db")
            .with_charset("utf8mb4_unicode_ci")
            .with_timezone("UTC");
        assert_eq!(
            session_init_statements(&config),
            vec![
                "SET NAMES utf8mb4 COLLATE UTF8MB4_UNICODE_CI".to_string(),
                "SET time_zone = 'UTC'".to_string(),
            ]
        );
    }

    #[test]
    fn opts_build_for_a_minimal_config() {
        let config = PoolConfig::new("db.internal")
            .with_port(3307)
            .with_credentials("app", "secret")
            .with_database("inventory");
        assert!(build_opts(&config).is_ok());
    }
}
