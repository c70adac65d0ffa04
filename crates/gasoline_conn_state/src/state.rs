//! The connection state value type and its facets.

use std::fmt;

/// Reachability of the local control server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerHealth {
    /// Server unreachable.
    Down,
    /// Server reachable but still starting up.
    Booting,
    /// Server reachable and serving.
    Up,
}

/// Logical link between the extension and the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionLink {
    /// No live session.
    Disconnected,
    /// Session established, not polling.
    Connected,
    /// Session established and actively polling.
    Active,
}

/// Circuit-breaker willingness to keep sending requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Circuit {
    /// Requests flow normally.
    Closed,
    /// Requests suppressed after repeated failures.
    Open,
    /// Probing whether the server recovered.
    HalfOpen,
}

/// Whether the poll loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polling {
    /// No poll loop scheduled.
    Stopped,
    /// Poll loop scheduled.
    Running,
}

/// AI web-pilot feature toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pilot {
    /// Pilot off.
    Disabled,
    /// Pilot on.
    Enabled,
}

/// Tab-tracking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// Capturing all tabs.
    None,
    /// Capturing a single tracked tab.
    TabTracked,
}

/// Command lifecycle facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPhase {
    /// No command pending.
    None,
    /// A command is queued for dispatch.
    Queued,
    /// A command is executing.
    Processing,
}

impl fmt::Display for ServerHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServerHealth::Down => "down",
            ServerHealth::Booting => "booting",
            ServerHealth::Up => "up",
        })
    }
}

impl fmt::Display for ExtensionLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExtensionLink::Disconnected => "disconnected",
            ExtensionLink::Connected => "connected",
            ExtensionLink::Active => "active",
        })
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Circuit::Closed => "closed",
            Circuit::Open => "open",
            Circuit::HalfOpen => "half-open",
        })
    }
}

impl fmt::Display for Polling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Polling::Stopped => "stopped",
            Polling::Running => "running",
        })
    }
}

impl fmt::Display for Pilot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Pilot::Disabled => "disabled",
            Pilot::Enabled => "enabled",
        })
    }
}

impl fmt::Display for Tracking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tracking::None => "none",
            Tracking::TabTracked => "tab_tracked",
        })
    }
}

impl fmt::Display for CommandPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandPhase::None => "none",
            CommandPhase::Queued => "queued",
            CommandPhase::Processing => "processing",
        })
    }
}

/// A snapshot of the full connection state.
///
/// The type is `Copy`: every accessor hands out an independent value, so
/// holders can never mutate machine-internal state. Change detection
/// compares only the seven facet fields (`same_facets`); the timestamps
/// and the tracked-tab id are informational.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionState {
    /// Server reachability.
    pub server: ServerHealth,
    /// Extension session connectivity.
    pub extension: ExtensionLink,
    /// Circuit-breaker state.
    pub circuit: Circuit,
    /// Poll loop state.
    pub polling: Polling,
    /// Pilot feature toggle.
    pub pilot: Pilot,
    /// Tab-tracking mode.
    pub tracking: Tracking,
    /// Command lifecycle.
    pub commands: CommandPhase,
    /// Tracked tab id while `tracking` is `TabTracked`.
    pub tracked_tab: Option<i64>,
    /// Epoch ms of the last successful health check; 0 = never.
    pub last_health_check: u64,
    /// Epoch ms of the last successful poll; 0 = never.
    pub last_successful_poll: u64,
    /// Epoch ms of the last facet change; 0 = never.
    pub last_state_change: u64,
}

impl ConnectionState {
    /// The documented initial state: everything down, stopped, and clear.
    pub fn initial() -> Self {
        Self {
            server: ServerHealth::Down,
            extension: ExtensionLink::Disconnected,
            circuit: Circuit::Closed,
            polling: Polling::Stopped,
            pilot: Pilot::Disabled,
            tracking: Tracking::None,
            commands: CommandPhase::None,
            tracked_tab: None,
            last_health_check: 0,
            last_successful_poll: 0,
            last_state_change: 0,
        }
    }

    /// Compares only the seven facet fields, ignoring timestamps and the
    /// tracked-tab id.
    pub fn same_facets(&self, other: &Self) -> bool {
        self.server == other.server
            && self.extension == other.extension
            && self.circuit == other.circuit
            && self.polling == other.polling
            && self.pilot == other.pilot
            && self.tracking == other.tracking
            && self.commands == other.commands
    }

    /// Renders the state as a single diagnostic line.
    pub fn summary(&self) -> String {
        format!(
            "server={} ext={} cb={} poll={} pilot={} track={} cmd={}",
            self.server,
            self.extension,
            self.circuit,
            self.polling,
            self.pilot,
            self.tracking,
            self.commands,
        )
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::initial()
    }
}
