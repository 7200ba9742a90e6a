//! flowdb node - Query executor node for the flow host
//!
//! The executor consumes inbound `{topic, payload}` messages, borrows a
//! pooled connection from the shared manager, executes the query, and
//! emits the result message plus `{fill, shape, text}` status updates.
//!
//! # Example
//!
//! ```ignore
//! use flowdb_connection::ConnectionManager;
//! use flowdb_core::{FlowMessage, PoolConfig};
//! use flowdb_driver_mysql::MySqlDriver;
//! use flowdb_node::QueryExecutor;
//!
//! let config = PoolConfig::new("db.internal")
//!     .with_credentials("app", "secret")
//!     .with_database("inventory");
//! let manager = ConnectionManager::new(config, MySqlDriver::new())?;
//! let executor = QueryExecutor::spawn(manager.clone());
//!
//! let msg = FlowMessage::new("SELECT * FROM parts WHERE id = :id", serde_json::json!({"id": 7}));
//! let reply = executor.handle(msg).await?;
//! ```

mod executor;
mod status;

pub use executor::QueryExecutor;
pub use status::state_indicator;
