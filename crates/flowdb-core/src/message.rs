//! Flow messages and status indicators
//!
//! The host runtime delivers messages as loosely-typed JSON objects and
//! renders node status as a small `{fill, shape, text}` tuple. Both shapes
//! are preserved here so the node slots into the host without adaptation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ErrorCode;

/// A message flowing through the host runtime.
///
/// `topic` carries the query text and `payload` the parameters; any other
/// fields on the inbound message are carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowMessage {
    /// Host-assigned message id
    #[serde(rename = "_msgid")]
    pub msg_id: Uuid,
    /// Query text; must be a JSON string to be executable
    pub topic: serde_json::Value,
    /// Query parameters in, query result out
    pub payload: serde_json::Value,
    /// All other message fields, passed through unchanged
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl FlowMessage {
    /// Create a message with a fresh id.
    pub fn new(topic: impl Into<serde_json::Value>, payload: impl Into<serde_json::Value>) -> Self {
        Self {
            msg_id: Uuid::new_v4(),
            topic: topic.into(),
            payload: payload.into(),
            rest: serde_json::Map::new(),
        }
    }

    /// The query text, if the topic is a string.
    pub fn topic_str(&self) -> Option<&str> {
        self.topic.as_str()
    }
}

/// Fill color of a status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFill {
    Grey,
    Green,
    Red,
}

/// Shape of a status indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusShape {
    Ring,
    Dot,
}

/// Status indicator shown next to the node in the host UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusIndicator {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fill: Option<StatusFill>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shape: Option<StatusShape>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub text: String,
}

impl StatusIndicator {
    fn new(fill: StatusFill, shape: StatusShape, text: impl Into<String>) -> Self {
        Self {
            fill: Some(fill),
            shape: Some(shape),
            text: text.into(),
        }
    }

    /// Empty indicator; clears the display.
    pub fn cleared() -> Self {
        Self {
            fill: None,
            shape: None,
            text: String::new(),
        }
    }

    /// Grey ring shown while a connection attempt is in flight.
    pub fn connecting() -> Self {
        Self::new(StatusFill::Grey, StatusShape::Ring, "connecting")
    }

    /// Green dot shown while connected.
    pub fn connected() -> Self {
        Self::new(StatusFill::Green, StatusShape::Dot, "connected")
    }

    /// Transient green dot shown after a successful query.
    pub fn ok() -> Self {
        Self::new(StatusFill::Green, StatusShape::Dot, "OK")
    }

    /// Red ring shown when a query arrives while disconnected.
    pub fn not_connected() -> Self {
        Self::new(StatusFill::Red, StatusShape::Ring, "not yet connected")
    }

    /// Red ring mirroring a connection-state error, with humanized text.
    pub fn state_error(code: &ErrorCode) -> Self {
        Self::new(StatusFill::Red, StatusShape::Ring, code.to_string())
    }

    /// Red ring shown when an individual query fails.
    pub fn query_error(code: &ErrorCode) -> Self {
        Self::new(
            StatusFill::Red,
            StatusShape::Ring,
            format!("Error: {}", code.as_code()),
        )
    }

    /// Check if this is the cleared indicator
    pub fn is_cleared(&self) -> bool {
        self.fill.is_none() && self.shape.is_none() && self.text.is_empty()
    }
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::cleared()
    }
}
