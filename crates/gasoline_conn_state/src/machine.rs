//! The connection state transition engine.

use crate::event::ConnectionEvent;
use crate::state::{
    Circuit, CommandPhase, ConnectionState, ExtensionLink, Pilot, Polling, ServerHealth, Tracking,
};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default staleness threshold for `is_polling_stale`, in milliseconds.
///
/// Matches the server's extension-disconnect threshold: a poller silent
/// for longer than this is treated as gone.
pub const DEFAULT_POLL_STALE_MS: u64 = 10_000;

/// Default staleness threshold for `is_health_stale`, in milliseconds.
pub const DEFAULT_HEALTH_STALE_MS: u64 = 30_000;

/// Transition history ring capacity.
const HISTORY_CAP: usize = 50;

/// Violation ring capacity.
const VIOLATION_CAP: usize = 20;

/// One entry of transition history.
///
/// Appended for every `transition` call, including ones that left the
/// state unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    /// The event that was applied.
    pub event: ConnectionEvent,
    /// Epoch ms at which it was applied.
    pub timestamp: u64,
}

/// A recorded self-healing correction.
///
/// The machine never rejects an event; when the post-event state
/// contradicts an invariant, the state is corrected and the correction
/// is logged here for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Stable name of the invariant that forced the correction.
    pub invariant: &'static str,
    /// The condition the invariant requires.
    pub expected: String,
    /// What the state actually held before correction.
    pub actual: String,
    /// Epoch ms of the correction.
    pub timestamp: u64,
}

/// Handle returned by [`ConnectionStateMachine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&ConnectionState) + Send>;

/// The connection state machine.
///
/// A pure transition engine: consumes typed events, applies their direct
/// effect, enforces cross-facet invariants in a fixed order, records
/// history and violations in bounded rings, and notifies subscribers
/// when (and only when) the seven facets changed.
///
/// The machine performs no I/O and owns no timers. All methods take
/// `&mut self`; concurrent callers go through
/// [`crate::SharedConnectionState`].
pub struct ConnectionStateMachine {
    state: ConnectionState,
    history: VecDeque<TransitionRecord>,
    violations: VecDeque<InvariantViolation>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl ConnectionStateMachine {
    /// Creates a machine in the initial state.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::initial(),
            history: VecDeque::with_capacity(HISTORY_CAP),
            violations: VecDeque::with_capacity(VIOLATION_CAP),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Renders the current state as a single diagnostic line.
    pub fn summary(&self) -> String {
        self.state.summary()
    }

    /// Applies an event and returns the resulting state.
    ///
    /// A history record is appended for every call. Listeners fire at
    /// most once per call, and only when the final facets differ from
    /// the pre-transition facets.
    pub fn transition(&mut self, event: ConnectionEvent) -> ConnectionState {
        let now = epoch_millis();
        let before = self.state;

        self.apply_event(&event, now);
        self.enforce_invariants(now);
        self.push_history(TransitionRecord {
            event,
            timestamp: now,
        });

        if !self.state.same_facets(&before) {
            self.state.last_state_change = now;
            self.notify_listeners();
        }
        self.state
    }

    /// Registers a state-change listener.
    pub fn subscribe(&mut self, listener: impl Fn(&ConnectionState) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false when the id is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Returns the transition history, oldest first.
    pub fn transition_history(&self) -> Vec<TransitionRecord> {
        self.history.iter().cloned().collect()
    }

    /// Returns recorded invariant corrections, oldest first.
    pub fn violations(&self) -> Vec<InvariantViolation> {
        self.violations.iter().cloned().collect()
    }

    /// True when no health check has ever succeeded, or the last one is
    /// older than `threshold_ms`.
    pub fn is_health_stale(&self, threshold_ms: u64) -> bool {
        let last = self.state.last_health_check;
        last == 0 || epoch_millis().saturating_sub(last) > threshold_ms
    }

    /// True only while polling is running, at least one poll has
    /// succeeded, and the last success is older than `threshold_ms`.
    pub fn is_polling_stale(&self, threshold_ms: u64) -> bool {
        if self.state.polling != Polling::Running {
            return false;
        }
        let last = self.state.last_successful_poll;
        last != 0 && epoch_millis().saturating_sub(last) > threshold_ms
    }

    /// Restores the initial state, clears violations and history, and
    /// notifies listeners unconditionally.
    ///
    /// The fresh history carries a single synthetic `USER_RESET` record
    /// so diagnostics explain why the state is pristine.
    pub fn reset(&mut self) -> ConnectionState {
        let now = epoch_millis();
        self.state = ConnectionState::initial();
        self.violations.clear();
        self.history.clear();
        self.push_history(TransitionRecord {
            event: ConnectionEvent::UserReset,
            timestamp: now,
        });
        self.notify_listeners();
        self.state
    }

    fn apply_event(&mut self, event: &ConnectionEvent, now: u64) {
        let s = &mut self.state;
        match event {
            ConnectionEvent::ServerUp => {
                s.server = ServerHealth::Up;
            }
            ConnectionEvent::ServerDown => {
                s.server = ServerHealth::Down;
                s.extension = ExtensionLink::Disconnected;
                s.polling = Polling::Stopped;
            }
            ConnectionEvent::ServerBooting => {
                s.server = ServerHealth::Booting;
                s.extension = ExtensionLink::Disconnected;
            }
            ConnectionEvent::HealthOk => {
                s.server = ServerHealth::Up;
                if s.extension == ExtensionLink::Disconnected {
                    s.extension = ExtensionLink::Connected;
                }
                s.last_health_check = now;
            }
            ConnectionEvent::HealthFail => {
                s.extension = ExtensionLink::Disconnected;
                s.polling = Polling::Stopped;
            }
            ConnectionEvent::PollingStarted => {
                s.polling = Polling::Running;
                if s.extension == ExtensionLink::Connected {
                    s.extension = ExtensionLink::Active;
                }
            }
            ConnectionEvent::PollingStopped => {
                s.polling = Polling::Stopped;
                if s.extension == ExtensionLink::Active {
                    s.extension = ExtensionLink::Connected;
                }
            }
            ConnectionEvent::PollSuccess => {
                s.last_successful_poll = now;
            }
            ConnectionEvent::PollFail => {}
            ConnectionEvent::PollStale => {
                s.extension = ExtensionLink::Connected;
                s.polling = Polling::Stopped;
            }
            ConnectionEvent::CircuitOpened => {
                s.circuit = Circuit::Open;
                s.polling = Polling::Stopped;
            }
            ConnectionEvent::CircuitHalfOpen => {
                s.circuit = Circuit::HalfOpen;
            }
            ConnectionEvent::CircuitClosed | ConnectionEvent::ProbeSuccess => {
                s.circuit = Circuit::Closed;
            }
            ConnectionEvent::ProbeFail => {
                s.circuit = Circuit::Open;
            }
            ConnectionEvent::UserReset => {
                s.circuit = Circuit::Closed;
            }
            ConnectionEvent::PilotEnabled => {
                s.pilot = Pilot::Enabled;
                s.circuit = Circuit::Closed;
            }
            ConnectionEvent::PilotDisabled => {
                s.pilot = Pilot::Disabled;
            }
            ConnectionEvent::TrackingEnabled { tab_id } => {
                s.tracking = Tracking::TabTracked;
                s.tracked_tab = Some(*tab_id);
                s.circuit = Circuit::Closed;
            }
            ConnectionEvent::TrackingDisabled => {
                s.tracking = Tracking::None;
                s.tracked_tab = None;
            }
            ConnectionEvent::CommandQueued => {
                if s.commands == CommandPhase::None {
                    s.commands = CommandPhase::Queued;
                }
            }
            ConnectionEvent::CommandProcessing => {
                s.commands = CommandPhase::Processing;
            }
            ConnectionEvent::CommandCompleted | ConnectionEvent::CommandTimeout => {
                s.commands = CommandPhase::None;
            }
        }
    }

    /// Runs the cross-facet invariants in fixed order.
    ///
    /// Corrections cascade: a forced disconnect is visible to the
    /// polling check that follows it.
    fn enforce_invariants(&mut self, now: u64) {
        if self.state.server == ServerHealth::Down
            && self.state.extension != ExtensionLink::Disconnected
        {
            let actual = self.state.extension;
            self.state.extension = ExtensionLink::Disconnected;
            self.record_violation(
                "server-down-implies-disconnected",
                "extension=disconnected",
                format!("extension={actual}"),
                now,
            );
        }

        if self.state.extension == ExtensionLink::Disconnected
            && self.state.polling != Polling::Stopped
        {
            self.state.polling = Polling::Stopped;
            self.record_violation(
                "disconnected-implies-stopped",
                "polling=stopped",
                "polling=running".to_string(),
                now,
            );
        }

        if self.state.extension == ExtensionLink::Active && self.state.polling != Polling::Running {
            self.state.extension = ExtensionLink::Connected;
            self.record_violation(
                "active-requires-polling",
                "polling=running",
                "polling=stopped".to_string(),
                now,
            );
        }

        if self.state.commands == CommandPhase::Processing
            && self.state.extension != ExtensionLink::Active
        {
            let actual = self.state.extension;
            self.state.commands = CommandPhase::None;
            self.record_violation(
                "processing-requires-active",
                "extension=active",
                format!("extension={actual}"),
                now,
            );
        }

        if self.state.server == ServerHealth::Booting
            && self.state.extension != ExtensionLink::Disconnected
        {
            let actual = self.state.extension;
            self.state.extension = ExtensionLink::Disconnected;
            self.record_violation(
                "booting-implies-disconnected",
                "extension=disconnected",
                format!("extension={actual}"),
                now,
            );
        }
    }

    fn record_violation(
        &mut self,
        invariant: &'static str,
        expected: &str,
        actual: String,
        now: u64,
    ) {
        tracing::debug!(invariant, expected, %actual, "corrected connection state");
        if self.violations.len() == VIOLATION_CAP {
            self.violations.pop_front();
        }
        self.violations.push_back(InvariantViolation {
            invariant,
            expected: expected.to_string(),
            actual,
            timestamp: now,
        });
    }

    fn push_history(&mut self, record: TransitionRecord) {
        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    /// Invokes each listener, containing panics so one failing listener
    /// cannot starve the rest.
    fn notify_listeners(&self) {
        for (id, listener) in &self.listeners {
            let state = self.state;
            if catch_unwind(AssertUnwindSafe(|| listener(&state))).is_err() {
                tracing::warn!(listener = id.0, "state listener panicked");
            }
        }
    }
}

impl Default for ConnectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
