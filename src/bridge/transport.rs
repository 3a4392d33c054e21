//! Push transport capability and inbound event parsing.
//!
//! The bridge is agnostic to what carries its events: a dev-server
//! side-channel, a WebSocket, or an in-process pair of channels. It
//! requires exactly one outbound capability, "send a named event with
//! a payload", expressed as the [`PushTransport`] trait, and consumes
//! inbound traffic as a stream of [`InboundEvent`]s.
//!
//! Transports are constructor-injected; the core never selects one by
//! name.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{Error, Result};
use crate::protocol::command::{EVENT_FAILURE, EVENT_READY, EVENT_RESPONSE, Failure, Reply};

// ============================================================================
// PushTransport
// ============================================================================

/// Outbound half of a push-style event channel.
///
/// Implementations must be cheap to call and must fail synchronously if
/// the underlying channel is gone; the bridge relies on a send error
/// to clean up the just-registered correlation entry.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Emits a named event with a JSON payload to the remote peer.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be handed to the
    /// underlying channel.
    async fn send(&self, event: &str, payload: Value) -> Result<()>;
}

// ============================================================================
// InboundEvent
// ============================================================================

/// A parsed event received from the remote peer.
#[derive(Debug)]
pub enum InboundEvent {
    /// The peer signalled it is ready to accept commands.
    ClientReady,
    /// Success reply for an outstanding command.
    Response(Reply),
    /// Failure reply for an outstanding command.
    Failure(Failure),
}

impl InboundEvent {
    /// Parses a raw named event into a typed inbound event.
    ///
    /// Returns `None` for unrecognized event names and for malformed
    /// payloads (e.g. missing `requestId`); both are logged and dropped
    /// without affecting pending calls.
    #[must_use]
    pub fn parse(event: &str, payload: Value) -> Option<Self> {
        match event {
            EVENT_READY => Some(Self::ClientReady),

            EVENT_RESPONSE => match serde_json::from_value::<Reply>(payload) {
                Ok(reply) => Some(Self::Response(reply)),
                Err(e) => {
                    warn!(error = %e, "Malformed reply event dropped");
                    None
                }
            },

            EVENT_FAILURE => match serde_json::from_value::<Failure>(payload) {
                Ok(failure) => Some(Self::Failure(failure)),
                Err(e) => {
                    warn!(error = %e, "Malformed failure event dropped");
                    None
                }
            },

            other => {
                warn!(event = %other, "Unrecognized event dropped");
                None
            }
        }
    }
}

// ============================================================================
// OutboundFrame
// ============================================================================

/// One event emitted through a [`ChannelTransport`].
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    /// Event name.
    pub event: String,
    /// Event payload.
    pub payload: Value,
}

// ============================================================================
// ChannelTransport
// ============================================================================

/// In-process push transport backed by an unbounded channel.
///
/// Embedders forward [`OutboundFrame`]s from the receiver into their
/// real channel (dev-server socket, event emitter); tests read them
/// directly. Dropping the receiver makes subsequent sends fail, which
/// is how a torn-down channel surfaces.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<OutboundFrame>,
}

impl ChannelTransport {
    /// Creates a transport and the receiver for its outbound frames.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        (Self { outbound }, rx)
    }
}

#[async_trait]
impl PushTransport for ChannelTransport {
    async fn send(&self, event: &str, payload: Value) -> Result<()> {
        self.outbound
            .send(OutboundFrame {
                event: event.to_string(),
                payload,
            })
            .map_err(|_| Error::transport_send_failed("outbound channel closed"))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::CorrelationId;
    use serde_json::json;

    #[test]
    fn test_parse_ready() {
        let event = InboundEvent::parse(EVENT_READY, Value::Null);
        assert!(matches!(event, Some(InboundEvent::ClientReady)));
    }

    #[test]
    fn test_parse_response() {
        let id = CorrelationId::generate();
        let payload = json!({"requestId": id, "result": "pong"});

        match InboundEvent::parse(EVENT_RESPONSE, payload) {
            Some(InboundEvent::Response(reply)) => {
                assert_eq!(reply.request_id, id);
                assert_eq!(reply.result, json!("pong"));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn test_parse_failure() {
        let id = CorrelationId::generate();
        let payload = json!({"requestId": id, "error": "nope"});

        match InboundEvent::parse(EVENT_FAILURE, payload) {
            Some(InboundEvent::Failure(failure)) => assert_eq!(failure.error, "nope"),
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn test_parse_malformed_reply_dropped() {
        // Missing requestId
        let event = InboundEvent::parse(EVENT_RESPONSE, json!({"result": 1}));
        assert!(event.is_none());
    }

    #[test]
    fn test_parse_unknown_event_dropped() {
        let event = InboundEvent::parse("hmr:update", json!({}));
        assert!(event.is_none());
    }

    #[tokio::test]
    async fn test_channel_transport_delivers_frames() {
        let (transport, mut rx) = ChannelTransport::new();

        transport
            .send("bridge:command", json!({"x": 1}))
            .await
            .expect("send");

        let frame = rx.recv().await.expect("frame");
        assert_eq!(frame.event, "bridge:command");
        assert_eq!(frame.payload, json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_channel_transport_fails_when_receiver_dropped() {
        let (transport, rx) = ChannelTransport::new();
        drop(rx);

        let result = transport.send("bridge:command", json!({})).await;
        assert!(matches!(result, Err(Error::TransportSendFailed { .. })));
    }
}
