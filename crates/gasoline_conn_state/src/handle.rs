//! Shared, cloneable handle around the state machine.

use crate::event::ConnectionEvent;
use crate::machine::{ConnectionStateMachine, InvariantViolation, ListenerId, TransitionRecord};
use crate::state::ConnectionState;
use parking_lot::Mutex;
use std::sync::Arc;

/// The process-wide connection state instance.
///
/// Owned by the composition root and cloned into whichever components
/// feed events or read facets; there is no module-level global. Each
/// operation takes the internal lock for its duration, which makes
/// `transition` the critical section the machine requires.
///
/// `reset` reinitializes the machine in place and doubles as the test
/// hook; unit tests that want full isolation construct their own
/// [`ConnectionStateMachine`] instead.
#[derive(Clone)]
pub struct SharedConnectionState {
    inner: Arc<Mutex<ConnectionStateMachine>>,
}

impl SharedConnectionState {
    /// Creates a handle around a fresh machine.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ConnectionStateMachine::new())),
        }
    }

    /// Applies an event and returns the resulting state.
    pub fn transition(&self, event: ConnectionEvent) -> ConnectionState {
        self.inner.lock().transition(event)
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state()
    }

    /// Renders the current state as a single diagnostic line.
    pub fn summary(&self) -> String {
        self.inner.lock().summary()
    }

    /// Registers a state-change listener.
    pub fn subscribe(
        &self,
        listener: impl Fn(&ConnectionState) + Send + 'static,
    ) -> ListenerId {
        self.inner.lock().subscribe(listener)
    }

    /// Removes a listener.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.lock().unsubscribe(id)
    }

    /// Returns the transition history, oldest first.
    pub fn transition_history(&self) -> Vec<TransitionRecord> {
        self.inner.lock().transition_history()
    }

    /// Returns recorded invariant corrections, oldest first.
    pub fn violations(&self) -> Vec<InvariantViolation> {
        self.inner.lock().violations()
    }

    /// See [`ConnectionStateMachine::is_health_stale`].
    pub fn is_health_stale(&self, threshold_ms: u64) -> bool {
        self.inner.lock().is_health_stale(threshold_ms)
    }

    /// See [`ConnectionStateMachine::is_polling_stale`].
    pub fn is_polling_stale(&self, threshold_ms: u64) -> bool {
        self.inner.lock().is_polling_stale(threshold_ms)
    }

    /// Reinitializes the machine: initial state, cleared diagnostics,
    /// listeners notified. Registered listeners survive the reset.
    pub fn reset(&self) -> ConnectionState {
        self.inner.lock().reset()
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new()
    }
}
