//! MySQL pool and session implementation

use async_trait::async_trait;
use mysql_async::{consts::ColumnType, prelude::*, Conn, Pool, Row as MySqlRow};

use flowdb_core::{
    DatabasePool, Error, ErrorCode, ExecStatus, Params, PooledConnection, QueryOutcome, Result,
    Row,
};

use crate::params::bind_parameters;
use crate::values::mysql_value_to_value;

/// Handle to a mysql_async pool.
pub struct MySqlPool {
    pool: Pool,
}

impl MySqlPool {
    pub(crate) fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabasePool for MySqlPool {
    async fn acquire(&self) -> Result<Box<dyn PooledConnection>> {
        let conn = self.pool.get_conn().await.map_err(classify_error)?;
        Ok(Box::new(MySqlSession { conn }))
    }

    async fn disconnect(&self) -> Result<()> {
        tracing::info!("closing MySQL connection pool");
        self.pool.clone().disconnect().await.map_err(classify_error)
    }
}

/// A connection borrowed from the pool.
///
/// Dropping the session returns the underlying connection to the pool;
/// `release` is that drop, spelled out at the call site.
pub struct MySqlSession {
    conn: Conn,
}

#[async_trait]
impl PooledConnection for MySqlSession {
    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&mut self, sql: &str, params: &Params) -> Result<QueryOutcome> {
        let final_sql = bind_parameters(sql, params);

        let mut result = self
            .conn
            .query_iter(final_sql)
            .await
            .map_err(classify_error)?;
        let affected_rows = result.affected_rows();
        let last_insert_id = result.last_insert_id();

        match result.columns() {
            Some(columns) => {
                let names: Vec<String> =
                    columns.iter().map(|c| c.name_str().to_string()).collect();
                let types: Vec<ColumnType> =
                    columns.iter().map(|c| c.column_type()).collect();

                let mysql_rows: Vec<MySqlRow> =
                    result.collect_and_drop().await.map_err(classify_error)?;

                let mut rows = Vec::with_capacity(mysql_rows.len());
                for mysql_row in mysql_rows {
                    let mut values = Vec::with_capacity(names.len());
                    for idx in 0..names.len() {
                        let raw: mysql_async::Value =
                            mysql_row.get(idx).unwrap_or(mysql_async::Value::NULL);
                        let col_type = types
                            .get(idx)
                            .copied()
                            .unwrap_or(ColumnType::MYSQL_TYPE_STRING);
                        values.push(mysql_value_to_value(raw, col_type));
                    }
                    rows.push(Row::new(names.clone(), values));
                }

                tracing::debug!(row_count = rows.len(), "query returned rows");
                Ok(QueryOutcome::Rows(rows))
            }
            None => {
                // OK packet, no result set to drain
                let _: Vec<MySqlRow> =
                    result.collect_and_drop().await.map_err(classify_error)?;
                tracing::debug!(affected_rows, "statement executed");
                Ok(QueryOutcome::Status(ExecStatus {
                    affected_rows,
                    last_insert_id,
                }))
            }
        }
    }
}

/// Fold a mysql_async error into the core error type, classifying
/// connection-level failures so the reconnect policy can act on them.
pub fn classify_error(err: mysql_async::Error) -> Error {
    match err {
        mysql_async::Error::Io(io_err) => {
            let code = match &io_err {
                mysql_async::IoError::Io(e) => match e.kind() {
                    std::io::ErrorKind::ConnectionRefused => ErrorCode::ConnectionRefused,
                    std::io::ErrorKind::ConnectionReset => ErrorCode::ConnectionReset,
                    std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof => {
                        ErrorCode::ConnectionLost
                    }
                    _ => ErrorCode::Driver("IO_ERROR".into()),
                },
                // TLS-level failures take the connection down with them
                _ => ErrorCode::ConnectionLost,
            };
            Error::database(code, io_err.to_string())
        }
        mysql_async::Error::Server(server_err) => {
            let code = match server_err.code {
                1045 => ErrorCode::AccessDenied,
                code => ErrorCode::Driver(format!("ER_{}", code)),
            };
            Error::database(code, server_err.to_string())
        }
        mysql_async::Error::Url(url_err) => Error::Configuration(url_err.to_string()),
        other => Error::database(ErrorCode::Driver("DRIVER_ERROR".into()), other.to_string()),
    }
}
