//! Command bridge: correlated request/response over a push channel.
//!
//! Turns the fire-and-forget push transport into single-shot,
//! timeout-bounded calls. Each outbound command registers a correlation
//! entry; the inbound event pump settles entries as replies arrive.
//!
//! # Event Pump
//!
//! The bridge spawns a tokio task consuming [`InboundEvent`]s:
//!
//! - `ClientReady` flips the readiness gate
//! - `Response` / `Failure` settle the matching pending call
//! - unknown correlation ids are logged and dropped
//!
//! Responses may arrive out of order relative to their sends;
//! correlation by id is mandatory, not an optimization.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::bridge::correlation::{CorrelationTable, PendingGuard};
use crate::bridge::transport::{InboundEvent, PushTransport};
use crate::error::{Error, Result};
use crate::protocol::command::{Command, EVENT_COMMAND};

// ============================================================================
// Constants
// ============================================================================

/// Default deadline for one command (10s).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Maximum commands in flight before rejecting new ones.
const MAX_PENDING_COMMANDS: usize = 100;

// ============================================================================
// CommandBridge
// ============================================================================

/// Issues correlated commands over an injected push transport.
///
/// # Thread Safety
///
/// `CommandBridge` is `Send + Sync`; `send` may be called concurrently
/// from any number of tasks. The correlation table is the only shared
/// mutable state.
///
/// # Lifecycle
///
/// Commands fail fast with [`Error::PeerNotReady`] until the peer's
/// readiness event arrives. [`shutdown`](CommandBridge::shutdown)
/// drains every pending call with [`Error::BridgeShuttingDown`] and is
/// idempotent; sends after shutdown fail fast.
pub struct CommandBridge {
    /// Outbound capability (constructor-injected).
    transport: Arc<dyn PushTransport>,
    /// Pending calls (shared with the event pump).
    correlation: Arc<CorrelationTable>,
    /// Set by the peer's readiness event, cleared on shutdown.
    ready: AtomicBool,
    /// Set once by `shutdown`.
    shutting_down: AtomicBool,
    /// Deadline applied by `send`.
    default_timeout: Duration,
}

impl CommandBridge {
    /// Creates a bridge and spawns its inbound event pump.
    ///
    /// `inbound` carries events the embedder receives from the peer;
    /// when it closes, all pending calls are drained.
    #[must_use]
    pub fn new(
        transport: Arc<dyn PushTransport>,
        inbound: mpsc::UnboundedReceiver<InboundEvent>,
    ) -> Arc<Self> {
        Self::with_default_timeout(transport, inbound, DEFAULT_COMMAND_TIMEOUT)
    }

    /// Creates a bridge with a custom default command deadline.
    #[must_use]
    pub fn with_default_timeout(
        transport: Arc<dyn PushTransport>,
        inbound: mpsc::UnboundedReceiver<InboundEvent>,
        default_timeout: Duration,
    ) -> Arc<Self> {
        let bridge = Arc::new(Self {
            transport,
            correlation: Arc::new(CorrelationTable::new()),
            ready: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
            default_timeout,
        });

        tokio::spawn(Arc::clone(&bridge).run_event_pump(inbound));

        bridge
    }
}

// ============================================================================
// CommandBridge - Public API
// ============================================================================

impl CommandBridge {
    /// Sends a command and waits for its reply with the default deadline.
    ///
    /// # Errors
    ///
    /// - [`Error::BridgeShuttingDown`] after shutdown
    /// - [`Error::PeerNotReady`] before the readiness event
    /// - [`Error::TooManyPending`] at the in-flight cap
    /// - [`Error::TransportSendFailed`] if emission fails
    /// - [`Error::RequestTimeout`] if no reply arrives in time
    /// - [`Error::RemoteError`] if the peer reports failure
    pub async fn send(&self, method: impl Into<String>, params: Value) -> Result<Value> {
        self.send_with_timeout(method, params, self.default_timeout)
            .await
    }

    /// Sends a command and waits for its reply with a custom deadline.
    ///
    /// Settles exactly once: with the peer's result, the peer's error,
    /// or a timeout that also removes the correlation entry. Dropping
    /// the returned future before it settles removes the entry as well;
    /// a reply arriving afterwards takes the unknown-id path.
    ///
    /// # Errors
    ///
    /// See [`send`](CommandBridge::send).
    pub async fn send_with_timeout(
        &self,
        method: impl Into<String>,
        params: Value,
        deadline: Duration,
    ) -> Result<Value> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(Error::BridgeShuttingDown);
        }
        if !self.ready.load(Ordering::SeqCst) {
            return Err(Error::PeerNotReady);
        }

        let pending = self.correlation.len();
        if pending >= MAX_PENDING_COMMANDS {
            warn!(pending, max = MAX_PENDING_COMMANDS, "Too many pending commands");
            return Err(Error::too_many_pending(pending, MAX_PENDING_COMMANDS));
        }

        let command = Command::new(method, params);
        let request_id = command.request_id;
        let payload = serde_json::to_value(&command)?;

        let (tx, rx) = oneshot::channel();
        self.correlation.register(request_id, tx)?;
        let _guard = PendingGuard::new(Arc::clone(&self.correlation), request_id);

        if let Err(e) = self.transport.send(EVENT_COMMAND, payload).await {
            // Guard removes the entry; the caller never waits on an
            // unsent command.
            return Err(Error::transport_send_failed(e.to_string()));
        }

        trace!(%request_id, method = %command.method, "Command sent");

        match timeout(deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                debug!(%request_id, "Command deadline expired");
                Err(Error::request_timeout(
                    request_id,
                    deadline.as_millis() as u64,
                ))
            }
        }
    }

    /// Toggles the readiness gate.
    ///
    /// Normally driven by the peer's readiness event; idempotent.
    pub fn set_ready(&self, ready: bool) {
        let was = self.ready.swap(ready, Ordering::SeqCst);
        if was != ready {
            info!(ready, "Peer readiness changed");
        }
    }

    /// Returns `true` if the peer has signalled readiness.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Returns the number of commands in flight.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.len()
    }

    /// Shuts the bridge down.
    ///
    /// Drains every pending call with [`Error::BridgeShuttingDown`] and
    /// marks the bridge not-ready; subsequent sends fail fast.
    /// Idempotent.
    pub fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.ready.store(false, Ordering::SeqCst);
        self.correlation.drain_all(|| Error::BridgeShuttingDown);

        info!("Command bridge shut down");
    }
}

// ============================================================================
// CommandBridge - Event Pump
// ============================================================================

impl CommandBridge {
    /// Consumes inbound events until the channel closes or shutdown.
    async fn run_event_pump(self: Arc<Self>, mut inbound: mpsc::UnboundedReceiver<InboundEvent>) {
        debug!("Bridge event pump started");

        while let Some(event) = inbound.recv().await {
            if self.shutting_down.load(Ordering::SeqCst) {
                break;
            }

            match event {
                InboundEvent::ClientReady => {
                    self.set_ready(true);
                }

                InboundEvent::Response(reply) => {
                    if !self.correlation.resolve(reply.request_id, reply.result) {
                        warn!(request_id = %reply.request_id, "Reply for unknown command");
                    }
                }

                InboundEvent::Failure(failure) => {
                    let request_id = failure.request_id;
                    if !self.correlation.reject(request_id, Error::remote(failure.error)) {
                        warn!(%request_id, "Failure for unknown command");
                    }
                }
            }
        }

        // Inbound channel gone: the peer can never answer again.
        self.ready.store(false, Ordering::SeqCst);
        self.correlation.drain_all(|| Error::BridgeShuttingDown);

        debug!("Bridge event pump terminated");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::transport::{ChannelTransport, OutboundFrame};
    use serde_json::json;

    fn test_bridge() -> (
        Arc<CommandBridge>,
        mpsc::UnboundedReceiver<OutboundFrame>,
        mpsc::UnboundedSender<InboundEvent>,
    ) {
        let (transport, outbound_rx) = ChannelTransport::new();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let bridge = CommandBridge::new(Arc::new(transport), inbound_rx);
        (bridge, outbound_rx, inbound_tx)
    }

    #[tokio::test]
    async fn test_send_before_ready_fails_fast() {
        let (bridge, _outbound, _inbound) = test_bridge();

        let result = bridge.send("app.ping", json!({})).await;
        assert!(matches!(result, Err(Error::PeerNotReady)));
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_ready_event_opens_the_gate() {
        let (bridge, _outbound, inbound) = test_bridge();
        assert!(!bridge.is_ready());

        inbound.send(InboundEvent::ClientReady).expect("send");

        // The pump runs on another task; poll until the flag flips.
        for _ in 0..50 {
            if bridge.is_ready() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("readiness event never observed");
    }

    #[tokio::test]
    async fn test_send_failure_cleans_up_entry() {
        let (bridge, outbound, _inbound) = test_bridge();
        bridge.set_ready(true);
        drop(outbound); // transport emission will fail synchronously

        let result = bridge.send("app.ping", json!({})).await;
        assert!(matches!(result, Err(Error::TransportSendFailed { .. })));
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_removes_entry() {
        let (bridge, mut outbound, _inbound) = test_bridge();
        bridge.set_ready(true);

        let result = bridge
            .send_with_timeout("app.ping", json!({}), Duration::from_millis(50))
            .await;

        assert!(matches!(result, Err(Error::RequestTimeout { .. })));
        assert_eq!(bridge.pending_count(), 0);

        // The command itself was emitted before the deadline expired.
        let frame = outbound.recv().await.expect("frame");
        assert_eq!(frame.event, EVENT_COMMAND);
    }

    #[tokio::test]
    async fn test_send_after_shutdown_fails_fast() {
        let (bridge, _outbound, _inbound) = test_bridge();
        bridge.set_ready(true);

        bridge.shutdown();
        bridge.shutdown(); // idempotent

        let result = bridge.send("app.ping", json!({})).await;
        assert!(matches!(result, Err(Error::BridgeShuttingDown)));
        assert!(!bridge.is_ready());
    }
}
