//! MySQL/MariaDB driver implementation

mod connection;
mod driver;
mod params;
mod values;

pub use connection::{MySqlPool, MySqlSession, classify_error};
pub use driver::MySqlDriver;
pub use params::{bind_parameters, value_to_mysql_literal};
pub use values::mysql_value_to_value;
