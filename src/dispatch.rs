//! Command dispatcher: named operations with a uniform result envelope.
//!
//! Consumers register async operations by name; sessions invoke them
//! with opaque params. Every handler failure is caught and translated
//! into `{success: false, error}` rather than propagated raw; a failed
//! operation never terminates the enclosing session or HTTP response.
//!
//! Operations that talk to the remote peer reach the process-wide
//! [`CommandBridge`] through [`CommandDispatcher::bridge`]; when none
//! has been wired, that seam fails with
//! [`Error::TransportUnavailable`](crate::Error::TransportUnavailable).

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::bridge::CommandBridge;
use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Async operation handler: opaque params in, result or error out.
pub type OperationHandler =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

// ============================================================================
// Envelope
// ============================================================================

/// Uniform operation outcome: `{success: true, data}` or
/// `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the operation succeeded.
    pub success: bool,

    /// Result data on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Creates a success envelope.
    #[inline]
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Creates a failure envelope.
    #[inline]
    #[must_use]
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl From<Result<Value>> for Envelope {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

// ============================================================================
// CommandDispatcher
// ============================================================================

/// Registry of named operations shared by every session.
///
/// # Thread Safety
///
/// `CommandDispatcher` is `Send + Sync`; registration and invocation
/// may race freely. Handlers are cloned out of the registry before
/// being awaited, so a long-running operation never holds the map lock.
#[derive(Default)]
pub struct CommandDispatcher {
    /// Registered operations by name.
    operations: RwLock<FxHashMap<String, OperationHandler>>,
    /// Process-wide bridge, if one has been wired.
    bridge: Mutex<Option<Arc<CommandBridge>>>,
}

impl CommandDispatcher {
    /// Creates an empty dispatcher.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an async operation under `name`.
    ///
    /// Re-registering a name replaces the previous handler.
    pub fn register_operation<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let name = name.into();
        let boxed: OperationHandler = Arc::new(move |params| {
            Box::pin(handler(params)) as BoxFuture<'static, Result<Value>>
        });

        let replaced = self.operations.write().insert(name.clone(), boxed);
        if replaced.is_some() {
            warn!(operation = %name, "Operation handler replaced");
        } else {
            debug!(operation = %name, "Operation registered");
        }
    }

    /// Returns the registered operation names, sorted.
    #[must_use]
    pub fn operation_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.operations.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Invokes a named operation, enveloping the outcome.
    ///
    /// Unknown names and handler errors both become failure envelopes;
    /// this method itself never fails.
    pub async fn invoke(&self, method: &str, params: Value) -> Envelope {
        let handler = self.operations.read().get(method).cloned();

        match handler {
            Some(handler) => handler(params).await.into(),
            None => {
                debug!(operation = %method, "Unknown operation invoked");
                Envelope::from(Err(Error::unknown_operation(method)))
            }
        }
    }

    /// Wires the process-wide command bridge.
    pub fn set_bridge(&self, bridge: Arc<CommandBridge>) {
        *self.bridge.lock() = Some(bridge);
    }

    /// Returns the wired bridge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportUnavailable`] when no bridge is wired.
    pub fn bridge(&self) -> Result<Arc<CommandBridge>> {
        self.bridge
            .lock()
            .clone()
            .ok_or(Error::TransportUnavailable)
    }
}

// ============================================================================
// Tests
// ============================================================================
