//! Wire protocol message types.
//!
//! Two protocol layers live here, one per transport:
//!
//! | Layer | Carried over | Types |
//! |-------|--------------|-------|
//! | Command envelope | push transport | [`Command`], [`Reply`], [`Failure`] |
//! | RPC body | HTTP `POST /mcp` | [`RpcRequest`], [`RpcResponse`] |
//!
//! The command envelope correlates by [`CorrelationId`] minted inside
//! the bridge; the RPC body carries an optional client-chosen tag that
//! is echoed back verbatim. The two id spaces never mix.
//!
//! [`CorrelationId`]: crate::identifiers::CorrelationId
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Push-channel command/reply/failure units |
//! | `message` | HTTP-body RPC request/response units |

// ============================================================================
// Submodules
// ============================================================================

/// Push-channel command and reply types.
pub mod command;

/// HTTP-body RPC message types.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    Command, EVENT_COMMAND, EVENT_FAILURE, EVENT_READY, EVENT_RESPONSE, Failure, Reply,
};
pub use message::{METHOD_INITIALIZE, RpcRequest, RpcResponse};
