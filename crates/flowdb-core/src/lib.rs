//! flowdb core - Shared abstractions for the flowdb database node
//!
//! This crate provides the fundamental traits and types that the other
//! flowdb crates depend on. It defines:
//!
//! - `DatabasePool` / `PooledConnection` - Traits over the driver's pool
//! - `PoolFactory` - Trait for creating driver pools from configuration
//! - `ConnectionState` - Lifecycle state broadcast to dependent nodes
//! - `FlowMessage` / `StatusIndicator` - Host-facing message and status types
//! - Common types like `Value`, `Row`, `QueryOutcome`, `Params`

mod config;
mod connection;
mod error;
mod message;
mod types;

pub use config::*;
pub use connection::*;
pub use error::*;
pub use message::*;
pub use types::*;
