//! Push-channel wire units: outbound commands, inbound replies.
//!
//! Defines the message format exchanged between the bridge (local end)
//! and the remote peer over the push transport.
//!
//! # Format
//!
//! | Message | Direction | Event name | Shape |
//! |---------|-----------|------------|-------|
//! | [`Command`] | Local → Remote | [`EVENT_COMMAND`] | `{type, data, requestId}` |
//! | [`Reply`] | Remote → Local | [`EVENT_RESPONSE`] | `{requestId, result}` |
//! | [`Failure`] | Remote → Local | [`EVENT_FAILURE`] | `{requestId, error}` |
//! | readiness | Remote → Local | [`EVENT_READY`] | (no payload contract) |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::CorrelationId;

// ============================================================================
// Event Names
// ============================================================================

/// Event carrying an outbound [`Command`].
pub const EVENT_COMMAND: &str = "bridge:command";

/// Event carrying an inbound success [`Reply`].
pub const EVENT_RESPONSE: &str = "bridge:response";

/// Event carrying an inbound [`Failure`].
pub const EVENT_FAILURE: &str = "bridge:failure";

/// Event signalling the remote peer is ready to accept commands.
pub const EVENT_READY: &str = "bridge:client-ready";

// ============================================================================
// Command
// ============================================================================

/// An outbound command from local end to remote end.
///
/// Exists only for the duration of its pending correlation entry; there
/// is no persisted command log.
///
/// # Format
///
/// ```json
/// {
///   "type": "module.methodName",
///   "data": { ... },
///   "requestId": "uuid"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    /// Command method in `module.methodName` format.
    #[serde(rename = "type")]
    pub method: String,

    /// Command parameters (opaque to the bridge).
    pub data: Value,

    /// Unique identifier for request/reply correlation.
    #[serde(rename = "requestId")]
    pub request_id: CorrelationId,
}

impl Command {
    /// Creates a new command with auto-generated correlation id.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, data: Value) -> Self {
        Self {
            method: method.into(),
            data,
            request_id: CorrelationId::generate(),
        }
    }

}

// ============================================================================
// Reply
// ============================================================================

/// An inbound success reply from remote end to local end.
///
/// # Format
///
/// ```json
/// {
///   "requestId": "uuid",
///   "result": { ... }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Reply {
    /// Matches the command's `requestId`.
    #[serde(rename = "requestId")]
    pub request_id: CorrelationId,

    /// Result data; absent field deserializes as `null`.
    #[serde(default)]
    pub result: Value,
}

// ============================================================================
// Failure
// ============================================================================

/// An inbound failure reply from remote end to local end.
///
/// Delivered on a distinct event name from [`Reply`].
///
/// # Format
///
/// ```json
/// {
///   "requestId": "uuid",
///   "error": "what went wrong"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Failure {
    /// Matches the command's `requestId`.
    #[serde(rename = "requestId")]
    pub request_id: CorrelationId,

    /// Error message reported by the peer.
    pub error: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_serialization() {
        let command = Command::new("app.getTree", json!({"depth": 3}));
        let json = serde_json::to_string(&command).expect("serialize");

        assert!(json.contains("\"type\":\"app.getTree\""));
        assert!(json.contains("requestId"));
        assert!(json.contains("\"depth\":3"));
    }

    #[test]
    fn test_reply_deserialization() {
        let id = CorrelationId::generate();
        let json_str = format!(r#"{{"requestId": "{id}", "result": "pong"}}"#);

        let reply: Reply = serde_json::from_str(&json_str).expect("parse");
        assert_eq!(reply.request_id, id);
        assert_eq!(reply.result, json!("pong"));
    }

    #[test]
    fn test_reply_missing_result_defaults_to_null() {
        let id = CorrelationId::generate();
        let json_str = format!(r#"{{"requestId": "{id}"}}"#);

        let reply: Reply = serde_json::from_str(&json_str).expect("parse");
        assert_eq!(reply.result, Value::Null);
    }

    #[test]
    fn test_failure_deserialization() {
        let id = CorrelationId::generate();
        let json_str = format!(r#"{{"requestId": "{id}", "error": "store not found"}}"#);

        let failure: Failure = serde_json::from_str(&json_str).expect("parse");
        assert_eq!(failure.request_id, id);
        assert_eq!(failure.error, "store not found");
    }

    #[test]
    fn test_reply_rejects_missing_request_id() {
        let result = serde_json::from_str::<Reply>(r#"{"result": 1}"#);
        assert!(result.is_err());
    }
}
