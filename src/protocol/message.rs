//! HTTP-body RPC message types.
//!
//! Defines the protocol unit carried by `POST /mcp` requests and the
//! response envelope sent back. The body protocol is stateful: a client
//! first sends an `initialize` request to obtain a session id, then
//! presents that id on every subsequent request.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::Envelope;

// ============================================================================
// Constants
// ============================================================================

/// Method name that creates a session when no session header is present.
pub const METHOD_INITIALIZE: &str = "initialize";

// ============================================================================
// RpcRequest
// ============================================================================

/// A protocol request carried in an HTTP body.
///
/// # Format
///
/// ```json
/// {
///   "id": 7,
///   "method": "app.getTree",
///   "params": { ... }
/// }
/// ```
///
/// `id` is the client's own request tag and is echoed back verbatim; it
/// is unrelated to the push-channel correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Client-chosen request tag, echoed in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Operation name.
    pub method: String,

    /// Operation parameters (opaque to the router).
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    /// Creates a new request.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            id: None,
            method: method.into(),
            params,
        }
    }

    /// Returns `true` if this is an initialize-shaped request.
    ///
    /// Only this shape, combined with the absence of a session header,
    /// may create a session.
    #[inline]
    #[must_use]
    pub fn is_initialize(&self) -> bool {
        self.method == METHOD_INITIALIZE
    }
}

// ============================================================================
// RpcResponse
// ============================================================================

/// A protocol response carried in an HTTP body.
///
/// Wraps the dispatcher [`Envelope`] and echoes the client's request
/// tag. Operation failures stay inside the envelope; they never
/// terminate the session or the HTTP exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Echo of the request's tag, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// Operation outcome.
    #[serde(flatten)]
    pub envelope: Envelope,
}

impl RpcResponse {
    /// Creates a response pairing a request tag with an outcome.
    #[inline]
    #[must_use]
    pub fn new(id: Option<Value>, envelope: Envelope) -> Self {
        Self { id, envelope }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_initialize_detection() {
        let init = RpcRequest::new("initialize", json!({}));
        let other = RpcRequest::new("app.getTree", json!({}));

        assert!(init.is_initialize());
        assert!(!other.is_initialize());
    }

    #[test]
    fn test_request_deserialization_defaults() {
        let request: RpcRequest =
            serde_json::from_str(r#"{"method": "app.ping"}"#).expect("parse");

        assert_eq!(request.method, "app.ping");
        assert!(request.id.is_none());
        assert_eq!(request.params, Value::Null);
    }

    #[test]
    fn test_request_rejects_missing_method() {
        let result = serde_json::from_str::<RpcRequest>(r#"{"params": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_response_echoes_request_tag() {
        let response = RpcResponse::new(Some(json!(42)), Envelope::ok(json!("pong")));
        let json = serde_json::to_value(&response).expect("serialize");

        assert_eq!(json["id"], json!(42));
        assert_eq!(json["success"], json!(true));
        assert_eq!(json["data"], json!("pong"));
    }

    #[test]
    fn test_response_error_envelope_flattens() {
        let response = RpcResponse::new(None, Envelope::err("no such store"));
        let json = serde_json::to_value(&response).expect("serialize");

        assert_eq!(json["success"], json!(false));
        assert_eq!(json["error"], json!("no such store"));
        assert!(json.get("id").is_none());
        assert!(json.get("data").is_none());
    }
}
