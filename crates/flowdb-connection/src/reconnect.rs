//! Reconnect policy for the shared connection
//!
//! Reconnection uses a fixed backoff: after a failed connection attempt the
//! manager waits `retry_interval` and tries again, indefinitely. The policy
//! also decides which driver error codes are recovered *silently* - with a
//! state change but no error-level log entry.

use flowdb_core::ErrorCode;
use std::collections::HashSet;
use std::time::Duration;

/// Default delay before retrying a failed connection attempt
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(20);

/// Policy governing reconnect timing and error classification.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    retry_interval: Duration,
    silent_codes: HashSet<ErrorCode>,
}

impl ReconnectPolicy {
    /// Create a policy with the given retry interval and the default
    /// silent set (connection-lost and connection-reset).
    pub fn new(retry_interval: Duration) -> Self {
        Self {
            retry_interval,
            silent_codes: HashSet::from([
                ErrorCode::ConnectionLost,
                ErrorCode::ConnectionReset,
            ]),
        }
    }

    /// Replace the set of error codes that reconnect without logging.
    pub fn with_silent_codes(mut self, codes: impl IntoIterator<Item = ErrorCode>) -> Self {
        self.silent_codes = codes.into_iter().collect();
        self
    }

    /// The fixed delay before retrying a failed attempt.
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Check whether an error code is recovered silently.
    pub fn is_silent(&self, code: &ErrorCode) -> bool {
        self.silent_codes.contains(code)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_INTERVAL)
    }
}
