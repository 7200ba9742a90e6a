//! Pool and connection traits, and the connection lifecycle state

use async_trait::async_trait;
use std::sync::Arc;

use crate::{ErrorCode, Params, PoolConfig, QueryOutcome, Result};

/// Lifecycle state of the shared connection, broadcast to dependent nodes.
///
/// Every transition is observable through the manager's watch channel so
/// dependents can mirror it into their status display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection attempt has been made, or the node was torn down
    Idle,
    /// A connection attempt is in flight
    Connecting,
    /// The active connection is established
    Connected,
    /// The last attempt or the active connection failed with this code
    Error(ErrorCode),
}

impl ConnectionState {
    /// Check if queries may currently be dispatched
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// A connection borrowed from the driver's pool.
///
/// Returned to the pool by `release` (or by dropping the box, which is
/// equivalent); the type system guarantees a connection cannot be released
/// twice.
#[async_trait]
pub trait PooledConnection: Send {
    /// Execute a query, binding `params` according to their shape
    /// (positional `?` placeholders or named `:name` tokens).
    async fn query(&mut self, sql: &str, params: &Params) -> Result<QueryOutcome>;

    /// Return the connection to the pool.
    fn release(self: Box<Self>) {}
}

impl std::fmt::Debug for dyn PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PooledConnection")
    }
}

/// Handle to the driver's connection pool.
///
/// Pooling policy (bounds, queueing, recycling) belongs to the driver; this
/// trait only exposes borrowing and teardown.
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Borrow a connection from the pool.
    async fn acquire(&self) -> Result<Box<dyn PooledConnection>>;

    /// End the pool, draining outstanding connections. Resolves only once
    /// the pool has finished closing.
    async fn disconnect(&self) -> Result<()>;
}

/// Factory for creating driver pools from configuration.
///
/// The manager calls this exactly once per lifetime, on the first
/// `connect()`; pool creation itself performs no I/O.
pub trait PoolFactory: Send + Sync + 'static {
    /// Create a pool for the given configuration.
    fn create_pool(&self, config: &PoolConfig) -> Result<Arc<dyn DatabasePool>>;
}

impl<T: PoolFactory> PoolFactory for Arc<T> {
    fn create_pool(&self, config: &PoolConfig) -> Result<Arc<dyn DatabasePool>> {
        (**self).create_pool(config)
    }
}
