//! Session state and the registry that owns it.
//!
//! A [`Session`] is one logical client's continuing interaction,
//! addressed by a [`SessionId`] across otherwise-stateless HTTP
//! requests. The [`SessionRegistry`] exclusively owns every live
//! session; the router only holds a transient `Arc` while handling one
//! request.
//!
//! # State Machine
//!
//! ```text
//! absent ──initialize──► active ──close/sweep/shutdown──► closed (terminal)
//! ```
//!
//! A request bearing an unknown or closed id is rejected with
//! `InvalidSession`, never rebound; only the no-session-header +
//! initialize-shape combination (or the configured lenient path) may
//! create a session.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::dispatch::{CommandDispatcher, Envelope};
use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::message::{RpcRequest, RpcResponse};

// ============================================================================
// Session
// ============================================================================

/// Per-client protocol state.
///
/// Request handling is serialized per session: the session's async
/// mutex is held across one request, so its state is never touched by
/// two request paths concurrently. Different sessions are independent.
pub struct Session {
    /// Unique id presented by the client on every request.
    id: SessionId,
    /// Creation time.
    created_at: Instant,
    /// Last time a request touched this session.
    last_activity: Mutex<Instant>,
    /// Requests handled so far.
    requests_handled: AtomicU64,
    /// Shared operation registry.
    dispatcher: Arc<CommandDispatcher>,
    /// Serializes request handling within this session.
    serial: tokio::sync::Mutex<()>,
}

impl Session {
    /// Creates a session with a fresh id.
    fn new(dispatcher: Arc<CommandDispatcher>) -> Self {
        let now = Instant::now();
        Self {
            id: SessionId::generate(),
            created_at: now,
            last_activity: Mutex::new(now),
            requests_handled: AtomicU64::new(0),
            dispatcher,
            serial: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the session id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Returns how long this session has existed.
    #[inline]
    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Returns how long since the last request touched this session.
    #[inline]
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Returns the number of requests handled.
    #[inline]
    #[must_use]
    pub fn requests_handled(&self) -> u64 {
        self.requests_handled.load(Ordering::Relaxed)
    }

    /// Handles one protocol request.
    ///
    /// Initialize requests are answered by the session itself; every
    /// other method goes through the dispatcher. Only this one request
    /// is awaited; handling never blocks on other sessions.
    pub async fn handle(&self, request: RpcRequest) -> RpcResponse {
        let _serial = self.serial.lock().await;

        *self.last_activity.lock() = Instant::now();
        self.requests_handled.fetch_add(1, Ordering::Relaxed);

        let envelope = if request.is_initialize() {
            Envelope::ok(json!({
                "sessionId": self.id,
                "operations": self.dispatcher.operation_names(),
            }))
        } else {
            self.dispatcher.invoke(&request.method, request.params).await
        };

        RpcResponse::new(request.id, envelope)
    }

    /// Returns a diagnostic status snapshot.
    #[must_use]
    pub fn status(&self) -> Value {
        json!({
            "sessionId": self.id,
            "ageMs": self.age().as_millis() as u64,
            "idleMs": self.idle_for().as_millis() as u64,
            "requestsHandled": self.requests_handled(),
        })
    }
}

// ============================================================================
// SessionRegistry
// ============================================================================

/// Owns all live sessions, keyed by [`SessionId`].
///
/// # Thread Safety
///
/// Insertions and deletions are atomic with respect to concurrent
/// requests for the same or different ids; two racing initialize
/// requests each get their own session under their own id, each
/// independently closable.
pub struct SessionRegistry {
    /// Live sessions.
    sessions: RwLock<FxHashMap<SessionId, Arc<Session>>>,
    /// Dispatcher handed to each new session.
    dispatcher: Arc<CommandDispatcher>,
    /// Set once by `shutdown_all`.
    shutdown: AtomicBool,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(dispatcher: Arc<CommandDispatcher>) -> Self {
        Self {
            sessions: RwLock::new(FxHashMap::default()),
            dispatcher,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Creates and stores a new session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryClosed`] after `shutdown_all`.
    pub fn create(&self) -> Result<Arc<Session>> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(Error::RegistryClosed);
        }

        let session = Arc::new(Session::new(Arc::clone(&self.dispatcher)));
        let id = session.id();

        self.sessions.write().insert(id, Arc::clone(&session));
        info!(session_id = %id, "Session created");

        Ok(session)
    }

    /// Looks up a live session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSession`] for unknown or closed ids;
    /// a stale id is never rebound to a new session.
    pub fn get(&self, id: SessionId) -> Result<Arc<Session>> {
        self.sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::invalid_session(id.to_string()))
    }

    /// Closes a session. Terminal: the id can never be reused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSession`] if the id is not live.
    pub fn close(&self, id: SessionId) -> Result<()> {
        let removed = self.sessions.write().remove(&id);

        match removed {
            Some(_) => {
                info!(session_id = %id, "Session closed");
                Ok(())
            }
            None => Err(Error::invalid_session(id.to_string())),
        }
    }

    /// Returns the number of live sessions.
    #[inline]
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns the ids of all live sessions.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().copied().collect()
    }

    /// Closes every session idle longer than `max_idle`.
    ///
    /// Returns how many were closed. A request racing the sweep on an
    /// already-fetched session completes normally; the next request
    /// with that id gets `InvalidSession`.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let candidates: Vec<SessionId> = {
            let sessions = self.sessions.read();
            sessions
                .iter()
                .filter(|(_, s)| s.idle_for() > max_idle)
                .map(|(id, _)| *id)
                .collect()
        };

        let mut closed = 0;
        {
            let mut sessions = self.sessions.write();
            for id in candidates {
                // Re-checked under the write lock: a request may have
                // touched the session since the candidate list was built.
                let still_idle = sessions
                    .get(&id)
                    .is_some_and(|s| s.idle_for() > max_idle);

                if still_idle && sessions.remove(&id).is_some() {
                    debug!(session_id = %id, "Idle session swept");
                    closed += 1;
                }
            }
        }

        closed
    }

    /// Closes every live session and refuses new ones.
    ///
    /// Idempotent; used at process shutdown.
    pub fn shutdown_all(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        let count = {
            let mut sessions = self.sessions.write();
            let count = sessions.len();
            sessions.clear();
            count
        };

        info!(count, "Session registry shut down");
    }
}

// ============================================================================
// Tests
// ============================================================================
