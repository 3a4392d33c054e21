//! Session registry.
//!
//! Per-client protocol state, created on initialize and torn down on
//! close, owned exclusively by the [`SessionRegistry`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `registry` | [`Session`] state and [`SessionRegistry`] ownership |

// ============================================================================
// Submodules
// ============================================================================

/// Session state and registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use registry::{Session, SessionRegistry};
