//! bridgemux - Command correlation bridge and session multiplexer.
//!
//! This library turns a one-way, push-style event channel into a
//! reliable request/response protocol, and multiplexes many stateful
//! protocol sessions over a single stateless HTTP endpoint.
//!
//! # Architecture
//!
//! Two tightly coupled layers:
//!
//! - **Command bridge**: callers get a single-shot, timeout-bounded
//!   future per outstanding call; replies are matched to calls by an
//!   opaque correlation id.
//! - **Session multiplexer**: clients initialize once to obtain a
//!   session id, then present it on every request; per-client state is
//!   created, looked up, and torn down safely under concurrent access.
//!
//! Data flow: inbound HTTP request → router resolves or creates a
//! [`Session`] → session invokes a named operation on the
//! [`CommandDispatcher`] → operation calls [`CommandBridge::send`] →
//! a correlated event goes out on the push transport → the matching
//! reply settles the pending call → result flows back as the HTTP
//! response.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bridgemux::{
//!     AppState, ChannelTransport, CommandBridge, CommandDispatcher, Result, ServerConfig,
//! };
//! use serde_json::json;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Wire the bridge to a push channel (here: in-process).
//!     let (transport, _outbound) = ChannelTransport::new();
//!     let (_inbound_tx, inbound_rx) = mpsc::unbounded_channel();
//!     let bridge = CommandBridge::new(Arc::new(transport), inbound_rx);
//!
//!     // Register operations.
//!     let dispatcher = Arc::new(CommandDispatcher::new());
//!     dispatcher.set_bridge(Arc::clone(&bridge));
//!     dispatcher.register_operation("app.ping", |_params| async { Ok(json!("pong")) });
//!
//!     // Serve the multiplexed endpoint.
//!     let state = AppState::new(dispatcher, ServerConfig::new());
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
//!     bridgemux::serve(listener, state, std::future::pending()).await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | [`CommandBridge`], [`CorrelationTable`], push transport seam |
//! | [`config`] | [`ServerConfig`] session policy and timeouts |
//! | [`dispatch`] | [`CommandDispatcher`] and the result [`Envelope`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | Wire message types for both transports |
//! | [`server`] | HTTP router and [`serve`] entry point |
//! | [`session`] | [`Session`] state and [`SessionRegistry`] |

// ============================================================================
// Modules
// ============================================================================

/// Command correlation bridge over a push transport.
pub mod bridge;

/// Server configuration options.
pub mod config;

/// Named-operation dispatcher and result envelope.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for bridge and session entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Wire protocol message types.
pub mod protocol;

/// HTTP surface: router, handlers, serve loop.
pub mod server;

/// Session state and registry.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{
    ChannelTransport, CommandBridge, CorrelationTable, DEFAULT_COMMAND_TIMEOUT, InboundEvent,
    OutboundFrame, PushTransport,
};

// Config types
pub use config::ServerConfig;

// Dispatcher types
pub use dispatch::{CommandDispatcher, Envelope, OperationHandler};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CorrelationId, SessionId};

// Protocol types
pub use protocol::{Command, Failure, Reply, RpcRequest, RpcResponse};

// Server types
pub use server::{AppState, SESSION_HEADER, build_app, serve};

// Session types
pub use session::{Session, SessionRegistry};
