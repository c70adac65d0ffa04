//! Configuration for the sync client.

use std::time::Duration;

/// Fixed retry/poll interval used when the server suggests nothing.
pub const BASE_POLL_MS: u64 = 1000;

/// Abort timeout for one `/sync` request.
pub const REQUEST_TIMEOUT_MS: u64 = 8000;

/// Default per-command execution deadline.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 30_000;

/// Lower bound on the per-command deadline; shorter values are clamped.
pub const MIN_COMMAND_TIMEOUT_MS: u64 = 1000;

/// Configuration for a [`crate::SyncClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the control server, without trailing `/sync`.
    pub server_url: String,
    /// Session identifier, fresh per extension load.
    pub session_id: String,
    /// Extension version reported upstream and used for skew checks.
    pub extension_version: String,
    /// Abort timeout for one sync request.
    pub request_timeout: Duration,
    /// Per-command execution deadline.
    pub command_timeout: Duration,
    /// Fixed poll/retry interval.
    pub base_poll: Duration,
}

impl ClientConfig {
    /// Creates a configuration with default timeouts.
    pub fn new(
        server_url: impl Into<String>,
        session_id: impl Into<String>,
        extension_version: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            session_id: session_id.into(),
            extension_version: extension_version.into(),
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            command_timeout: Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS),
            base_poll: Duration::from_millis(BASE_POLL_MS),
        }
    }

    /// Sets the request abort timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the per-command deadline, clamped to the sane floor.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout.max(Duration::from_millis(MIN_COMMAND_TIMEOUT_MS));
        self
    }

    /// Sets the fixed poll/retry interval.
    pub fn with_base_poll(mut self, interval: Duration) -> Self {
        self.base_poll = interval;
        self
    }
}
