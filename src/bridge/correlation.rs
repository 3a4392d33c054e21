//! Correlation table for outstanding commands.
//!
//! Maps correlation ids to the oneshot senders of callers awaiting a
//! reply. Exactly one terminal transition happens per entry: it is
//! resolved, rejected, removed (timeout or caller abandonment), or
//! drained at shutdown.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::identifiers::CorrelationId;

// ============================================================================
// Types
// ============================================================================

/// Sender half of one pending call's reply channel.
pub type Waiter = oneshot::Sender<Result<Value>>;

// ============================================================================
// CorrelationTable
// ============================================================================

/// Registry of pending calls keyed by [`CorrelationId`].
///
/// The table is the only shared mutable structure in the bridge; all
/// access goes through its internal mutex. Once [`drain_all`] has run,
/// registration fails permanently; no entry can land after the drain
/// and be orphaned.
///
/// [`drain_all`]: CorrelationTable::drain_all
#[derive(Debug, Default)]
pub struct CorrelationTable {
    /// Pending entries.
    entries: Mutex<FxHashMap<CorrelationId, Waiter>>,
    /// Set once draining begins; checked under the entries lock.
    draining: AtomicBool,
}

impl CorrelationTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending call.
    ///
    /// # Errors
    ///
    /// - [`Error::BridgeShuttingDown`] once draining has begun
    /// - [`Error::DuplicateCorrelation`] if `id` is already registered.
    ///   Duplicate registration is a programmer error: it panics in
    ///   debug builds and degrades to this logged error in release.
    pub fn register(&self, id: CorrelationId, waiter: Waiter) -> Result<()> {
        let mut entries = self.entries.lock();

        // Checked under the lock: drain_all sets the flag while holding it.
        if self.draining.load(Ordering::SeqCst) {
            return Err(Error::BridgeShuttingDown);
        }

        if entries.contains_key(&id) {
            debug_assert!(false, "correlation id registered twice: {id}");
            warn!(request_id = %id, "Correlation id registered twice");
            return Err(Error::duplicate_correlation(id));
        }

        entries.insert(id, waiter);
        Ok(())
    }

    /// Resolves a pending call with a successful result.
    ///
    /// Returns `false` (no-op, logged by the caller) if `id` is absent;
    /// covers late or duplicate replies after timeout or cleanup.
    pub fn resolve(&self, id: CorrelationId, result: Value) -> bool {
        let waiter = self.entries.lock().remove(&id);

        match waiter {
            Some(tx) => {
                if tx.send(Ok(result)).is_err() {
                    debug!(request_id = %id, "Caller abandoned call before reply");
                }
                true
            }
            None => false,
        }
    }

    /// Rejects a pending call with an error.
    ///
    /// Same contract as [`resolve`](CorrelationTable::resolve).
    pub fn reject(&self, id: CorrelationId, error: Error) -> bool {
        let waiter = self.entries.lock().remove(&id);

        match waiter {
            Some(tx) => {
                if tx.send(Err(error)).is_err() {
                    debug!(request_id = %id, "Caller abandoned call before failure");
                }
                true
            }
            None => false,
        }
    }

    /// Removes a pending entry without settling it.
    ///
    /// Used for timeout cleanup and caller abandonment; a reply arriving
    /// afterwards takes the unknown-id path.
    pub fn remove(&self, id: CorrelationId) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    /// Atomically removes every pending entry and rejects each.
    ///
    /// `make_error` is invoked once per drained entry. Safe to call
    /// while registrations are concurrently attempted: the draining
    /// flag is set under the entries lock, so any registration after
    /// drain begins fails instead of being orphaned. Idempotent.
    pub fn drain_all(&self, make_error: impl Fn() -> Error) {
        let drained: Vec<_> = {
            let mut entries = self.entries.lock();
            self.draining.store(true, Ordering::SeqCst);
            entries.drain().collect()
        };

        let count = drained.len();
        for (id, tx) in drained {
            if tx.send(Err(make_error())).is_err() {
                debug!(request_id = %id, "Caller abandoned call before drain");
            }
        }

        if count > 0 {
            debug!(count, "Drained pending calls");
        }
    }

    /// Returns the number of pending entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no entries are pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

// ============================================================================
// PendingGuard
// ============================================================================

/// Removes a correlation entry when dropped.
///
/// Held by the sending caller across its await; covers timeout cleanup
/// and abandonment (caller future dropped before the deadline). On
/// settled calls the entry is already gone and the removal is a no-op.
pub(crate) struct PendingGuard {
    table: Arc<CorrelationTable>,
    id: CorrelationId,
}

impl PendingGuard {
    /// Creates a guard for a just-registered entry.
    #[inline]
    pub(crate) fn new(table: Arc<CorrelationTable>, id: CorrelationId) -> Self {
        Self { table, id }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.table.remove(self.id);
    }
}

// ============================================================================
// Tests
// ============================================================================
