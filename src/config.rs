//! Server configuration options.
//!
//! Provides a type-safe interface for configuring session policy and
//! timeouts.
//!
//! # Example
//!
//! ```ignore
//! use bridgemux::ServerConfig;
//!
//! let config = ServerConfig::new()
//!     .with_strict_sessions()
//!     .with_idle_timeout(Duration::from_secs(300));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default per-request timeout applied at the HTTP layer (30s).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// ServerConfig
// ============================================================================

/// Session policy and timeout configuration.
///
/// The default is the lenient development posture: a request with
/// neither a session header nor an initialize shape gets an ephemeral
/// session of its own. Enable `strict_sessions` to reject those
/// requests instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Reject no-header non-initialize requests instead of minting an
    /// ephemeral session.
    pub strict_sessions: bool,

    /// Close sessions idle longer than this, if set.
    pub idle_timeout: Option<Duration>,

    /// Timeout applied to each HTTP request as a whole.
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ServerConfig {
    /// Creates a config with default (lenient) settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict_sessions: false,
            idle_timeout: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ServerConfig {
    /// Enables strict session policy.
    #[inline]
    #[must_use]
    pub const fn with_strict_sessions(mut self) -> Self {
        self.strict_sessions = true;
        self
    }

    /// Enables idle-session sweeping with the given threshold.
    #[inline]
    #[must_use]
    pub const fn with_idle_timeout(mut self, max_idle: Duration) -> Self {
        self.idle_timeout = Some(max_idle);
        self
    }

    /// Sets the per-request HTTP timeout.
    #[inline]
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
