//! Error types for the bridge and session core.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use bridgemux::{Result, Error};
//!
//! async fn example(bridge: &CommandBridge) -> Result<()> {
//!     let value = bridge.send("app.ping", json!({})).await?;
//!     println!("{value}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Bridge preconditions | [`Error::PeerNotReady`], [`Error::TransportUnavailable`], [`Error::BridgeShuttingDown`] |
//! | Bridge transport | [`Error::TransportSendFailed`], [`Error::TooManyPending`] |
//! | Bridge outcome | [`Error::RequestTimeout`], [`Error::RemoteError`] |
//! | Correlation | [`Error::DuplicateCorrelation`] |
//! | Session | [`Error::InvalidSession`], [`Error::RegistryClosed`] |
//! | Request | [`Error::InvalidRequest`], [`Error::UnknownOperation`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

use crate::identifiers::CorrelationId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging. None of the
/// bridge failures are retried internally; retry policy belongs to the
/// caller.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Bridge Precondition Errors
    // ========================================================================
    /// The remote peer has not signalled readiness yet.
    ///
    /// Returned synchronously by `send`; no correlation entry or
    /// deadline is created.
    #[error("Peer not ready")]
    PeerNotReady,

    /// No push transport is wired into the dispatcher.
    ///
    /// Returned when an operation needs the bridge but none was injected.
    #[error("Transport unavailable: no command bridge configured")]
    TransportUnavailable,

    /// The bridge is shutting down (or has shut down).
    ///
    /// Outstanding calls are drained with this error; subsequent sends
    /// fail fast with it.
    #[error("Bridge shutting down")]
    BridgeShuttingDown,

    // ========================================================================
    // Bridge Transport Errors
    // ========================================================================
    /// Emitting the command on the push transport failed.
    ///
    /// The just-registered correlation entry is removed before this is
    /// returned; the caller is never left waiting on an unsent command.
    #[error("Transport send failed: {message}")]
    TransportSendFailed {
        /// Description of the transport failure.
        message: String,
    },

    /// Too many commands are already in flight.
    #[error("Too many pending commands: {pending}/{max}")]
    TooManyPending {
        /// Number of commands currently pending.
        pending: usize,
        /// Configured pending-command cap.
        max: usize,
    },

    // ========================================================================
    // Bridge Outcome Errors
    // ========================================================================
    /// No reply arrived before the per-call deadline.
    #[error("Command {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The correlation id that timed out.
        request_id: CorrelationId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The peer explicitly reported a failure for this command.
    ///
    /// Propagated verbatim to the caller.
    #[error("Remote error: {message}")]
    RemoteError {
        /// Error message reported by the peer.
        message: String,
    },

    // ========================================================================
    // Correlation Errors
    // ========================================================================
    /// A correlation id was registered twice.
    ///
    /// Invariant violation: panics via `debug_assert!` in debug builds,
    /// degrades to this logged error in release builds.
    #[error("Correlation id already registered: {request_id}")]
    DuplicateCorrelation {
        /// The doubly-registered id.
        request_id: CorrelationId,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Unknown, closed, or malformed session id.
    ///
    /// Surfaced as HTTP 400; a stale id is never rebound to a new
    /// session.
    #[error("Invalid session id: {session_id}")]
    InvalidSession {
        /// The session id as presented by the client.
        session_id: String,
    },

    /// The session registry has shut down; no new sessions.
    #[error("Session registry closed")]
    RegistryClosed,

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// Malformed or unroutable protocol request.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of what was wrong with the request.
        message: String,
    },

    /// No operation registered under this name.
    #[error("Unknown operation: {operation}")]
    UnknownOperation {
        /// The unrecognized operation name.
        operation: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reply channel closed without a terminal transition.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a transport send failure error.
    #[inline]
    pub fn transport_send_failed(message: impl Into<String>) -> Self {
        Self::TransportSendFailed {
            message: message.into(),
        }
    }

    /// Creates a too-many-pending error.
    #[inline]
    pub fn too_many_pending(pending: usize, max: usize) -> Self {
        Self::TooManyPending { pending, max }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: CorrelationId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a remote error.
    #[inline]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteError {
            message: message.into(),
        }
    }

    /// Creates a duplicate correlation error.
    #[inline]
    pub fn duplicate_correlation(request_id: CorrelationId) -> Self {
        Self::DuplicateCorrelation { request_id }
    }

    /// Creates an invalid session error.
    #[inline]
    pub fn invalid_session(session_id: impl Into<String>) -> Self {
        Self::InvalidSession {
            session_id: session_id.into(),
        }
    }

    /// Creates an invalid request error.
    #[inline]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates an unknown operation error.
    #[inline]
    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if this is a session error.
    #[inline]
    #[must_use]
    pub fn is_session_error(&self) -> bool {
        matches!(self, Self::InvalidSession { .. } | Self::RegistryClosed)
    }

    /// Returns `true` if this error is the client's fault.
    ///
    /// Client errors map to HTTP 4xx; everything else maps to 5xx.
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSession { .. }
                | Self::InvalidRequest { .. }
                | Self::UnknownOperation { .. }
        )
    }

    /// Returns `true` if this is a fast local precondition failure.
    ///
    /// Precondition failures are returned before any correlation entry
    /// or deadline exists.
    #[inline]
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::PeerNotReady | Self::TransportUnavailable | Self::BridgeShuttingDown
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
