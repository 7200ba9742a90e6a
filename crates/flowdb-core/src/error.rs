//! Error types for flowdb

use thiserror::Error;

/// Stable classification of connection and query failures.
///
/// Driver errors are folded into these codes at the driver boundary so the
/// reconnect policy and status display never have to inspect driver-specific
/// error types. Codes the driver cannot classify are carried verbatim in
/// `Driver`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The server refused the TCP connection
    ConnectionRefused,
    /// An established connection went away
    ConnectionLost,
    /// The peer reset the connection
    ConnectionReset,
    /// Authentication failed
    AccessDenied,
    /// A query was submitted while disconnected
    NotConnected,
    /// The inbound message did not carry a string query
    MalformedQuery,
    /// The periodic health-check query failed
    HealthCheck,
    /// Any other driver-reported code, carried verbatim
    Driver(String),
}

impl ErrorCode {
    /// Short token form of the code, suitable for per-request status text.
    pub fn as_code(&self) -> &str {
        match self {
            ErrorCode::ConnectionRefused => "CONNECTION_REFUSED",
            ErrorCode::ConnectionLost => "CONNECTION_LOST",
            ErrorCode::ConnectionReset => "CONNECTION_RESET",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::MalformedQuery => "MALFORMED_QUERY",
            ErrorCode::HealthCheck => "HEALTH_CHECK",
            ErrorCode::Driver(code) => code,
        }
    }

    /// Whether this code indicates the connection itself failed, as opposed
    /// to a per-request problem. Connection-class failures feed the
    /// reconnect machinery; request-class failures never do.
    pub fn is_connection_class(&self) -> bool {
        matches!(
            self,
            ErrorCode::ConnectionRefused
                | ErrorCode::ConnectionLost
                | ErrorCode::ConnectionReset
                | ErrorCode::AccessDenied
        )
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::ConnectionRefused => write!(f, "connection refused"),
            ErrorCode::ConnectionLost => write!(f, "connection lost"),
            ErrorCode::ConnectionReset => write!(f, "connection reset"),
            ErrorCode::AccessDenied => write!(f, "access denied"),
            ErrorCode::NotConnected => write!(f, "not connected"),
            ErrorCode::MalformedQuery => write!(f, "malformed query"),
            ErrorCode::HealthCheck => write!(f, "bad ping"),
            ErrorCode::Driver(code) => write!(f, "{}", code),
        }
    }
}

/// Core error type for flowdb operations
#[derive(Error, Debug)]
pub enum Error {
    /// A classified failure reported by the database driver
    #[error("{message}")]
    Database { code: ErrorCode, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("database not connected")]
    NotConnected,

    #[error("msg.topic : the query is not defined as a string")]
    MalformedQuery,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a classified driver error.
    pub fn database(code: ErrorCode, message: impl Into<String>) -> Self {
        Error::Database {
            code,
            message: message.into(),
        }
    }

    /// The classification code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Database { code, .. } => code.clone(),
            Error::Connection(_) => ErrorCode::Driver("CONNECTION_ERROR".into()),
            Error::Query(_) => ErrorCode::Driver("QUERY_ERROR".into()),
            Error::Configuration(_) => ErrorCode::Driver("CONFIGURATION_ERROR".into()),
            Error::NotConnected => ErrorCode::NotConnected,
            Error::MalformedQuery => ErrorCode::MalformedQuery,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::ConnectionRefused => ErrorCode::ConnectionRefused,
                std::io::ErrorKind::ConnectionReset => ErrorCode::ConnectionReset,
                std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof => {
                    ErrorCode::ConnectionLost
                }
                _ => ErrorCode::Driver("IO_ERROR".into()),
            },
            Error::Serialization(_) => ErrorCode::Driver("SERIALIZATION_ERROR".into()),
        }
    }
}

/// Result type alias for flowdb operations
pub type Result<T> = std::result::Result<T, Error>;
