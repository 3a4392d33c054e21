//! Command correlation bridge.
//!
//! This module turns a one-way push channel into a reliable
//! request/response protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   send(method, params)   ┌─────────────────┐
//! │  Caller task  │─────────────────────────►│  CommandBridge  │
//! │  (awaits rx)  │                          │                 │
//! └───────────────┘                          │ CorrelationTable│
//!         ▲                                  └────────┬────────┘
//!         │ resolve/reject by requestId               │ emit
//!         │                                           ▼
//! ┌───────┴───────┐      named events        ┌─────────────────┐
//! │  Event pump   │◄─────────────────────────│  PushTransport  │
//! └───────────────┘                          └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`CommandBridge`] send path and event pump |
//! | `correlation` | [`CorrelationTable`] pending-call registry |
//! | `transport` | [`PushTransport`] capability and [`ChannelTransport`] |

// ============================================================================
// Submodules
// ============================================================================

/// Pending-call registry.
pub mod correlation;

/// Bridge send path and inbound event pump.
pub mod core;

/// Push transport capability.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{CommandBridge, DEFAULT_COMMAND_TIMEOUT};
pub use correlation::CorrelationTable;
pub use transport::{ChannelTransport, InboundEvent, OutboundFrame, PushTransport};
