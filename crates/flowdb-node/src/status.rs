//! Mapping from connection state to the node's status indicator

use flowdb_core::{ConnectionState, StatusIndicator};

/// The status indicator mirroring a connection lifecycle state.
pub fn state_indicator(state: &ConnectionState) -> StatusIndicator {
    match state {
        ConnectionState::Idle => StatusIndicator::cleared(),
        ConnectionState::Connecting => StatusIndicator::connecting(),
        ConnectionState::Connected => StatusIndicator::connected(),
        ConnectionState::Error(code) => StatusIndicator::state_error(code),
    }
}
