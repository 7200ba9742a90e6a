//! flowdb connection - Connection lifecycle management
//!
//! This crate owns the shared connection manager: it creates the driver
//! pool (once), holds the active connection, reschedules failed connection
//! attempts, runs the periodic health check, and broadcasts lifecycle state
//! to dependent nodes.

pub mod health;
mod manager;
pub mod reconnect;

pub use health::HealthCheckConfig;
pub use manager::ConnectionManager;
pub use reconnect::ReconnectPolicy;
