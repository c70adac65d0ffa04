//! Events consumed by the connection state machine.

use std::fmt;

/// A typed event fed into [`crate::ConnectionStateMachine::transition`].
///
/// The vocabulary is closed: every variant has an exhaustive handler, so
/// there is no "unrecognized event" path. Informational events such as
/// [`ConnectionEvent::PollFail`] are explicit no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Server answered a reachability probe.
    ServerUp,
    /// Server became unreachable.
    ServerDown,
    /// Server reachable but still starting up.
    ServerBooting,
    /// Health check succeeded.
    HealthOk,
    /// Health check failed.
    HealthFail,
    /// The poll loop started.
    PollingStarted,
    /// The poll loop stopped.
    PollingStopped,
    /// One poll cycle completed successfully.
    PollSuccess,
    /// One poll cycle failed (informational only).
    PollFail,
    /// The poll loop went stale without a clean stop.
    PollStale,
    /// Circuit breaker tripped open.
    CircuitOpened,
    /// Circuit breaker probing for recovery.
    CircuitHalfOpen,
    /// Circuit breaker closed.
    CircuitClosed,
    /// A half-open probe succeeded.
    ProbeSuccess,
    /// A half-open probe failed.
    ProbeFail,
    /// Operator requested a reset.
    UserReset,
    /// Pilot feature enabled.
    PilotEnabled,
    /// Pilot feature disabled.
    PilotDisabled,
    /// Single-tab tracking enabled for the given tab.
    TrackingEnabled {
        /// Browser tab id being tracked.
        tab_id: i64,
    },
    /// Tab tracking disabled.
    TrackingDisabled,
    /// A command was queued for the extension.
    CommandQueued,
    /// A command began executing.
    CommandProcessing,
    /// The executing command finished.
    CommandCompleted,
    /// The executing command timed out.
    CommandTimeout,
}

impl ConnectionEvent {
    /// Stable event name, as recorded in transition history.
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionEvent::ServerUp => "SERVER_UP",
            ConnectionEvent::ServerDown => "SERVER_DOWN",
            ConnectionEvent::ServerBooting => "SERVER_BOOTING",
            ConnectionEvent::HealthOk => "HEALTH_OK",
            ConnectionEvent::HealthFail => "HEALTH_FAIL",
            ConnectionEvent::PollingStarted => "POLLING_STARTED",
            ConnectionEvent::PollingStopped => "POLLING_STOPPED",
            ConnectionEvent::PollSuccess => "POLL_SUCCESS",
            ConnectionEvent::PollFail => "POLL_FAIL",
            ConnectionEvent::PollStale => "POLL_STALE",
            ConnectionEvent::CircuitOpened => "CB_OPENED",
            ConnectionEvent::CircuitHalfOpen => "CB_HALF_OPEN",
            ConnectionEvent::CircuitClosed => "CB_CLOSED",
            ConnectionEvent::ProbeSuccess => "CB_PROBE_SUCCESS",
            ConnectionEvent::ProbeFail => "CB_PROBE_FAIL",
            ConnectionEvent::UserReset => "USER_RESET",
            ConnectionEvent::PilotEnabled => "PILOT_ENABLED",
            ConnectionEvent::PilotDisabled => "PILOT_DISABLED",
            ConnectionEvent::TrackingEnabled { .. } => "TRACKING_ENABLED",
            ConnectionEvent::TrackingDisabled => "TRACKING_DISABLED",
            ConnectionEvent::CommandQueued => "COMMAND_QUEUED",
            ConnectionEvent::CommandProcessing => "COMMAND_PROCESSING",
            ConnectionEvent::CommandCompleted => "COMMAND_COMPLETED",
            ConnectionEvent::CommandTimeout => "COMMAND_TIMEOUT",
        }
    }
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
