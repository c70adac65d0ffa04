//! The callback bundle injected into the sync client.

use async_trait::async_trait;
use gasoline_sync_protocol::{Command, ExtensionLog};
use serde_json::Value;
use std::collections::HashMap;

/// Everything the sync client needs from its host.
///
/// Command execution, settings, and the log buffer are external
/// collaborators; the client only drives the protocol. The notification
/// methods (`connection_changed`, `capture_overrides`,
/// `version_mismatch`) are fire-and-forget and must not block.
#[async_trait]
pub trait SyncDelegate: Send + Sync {
    /// Current settings blob, passed through to the server unmodified.
    async fn settings(&self) -> Value;

    /// Executes one server-issued command.
    ///
    /// Success/result reporting is the executor's business (via
    /// [`crate::SyncClient::queue_command_result`]); an `Err` here is
    /// logged and swallowed — the command still counts as attempted for
    /// acknowledgment purposes.
    async fn handle_command(&self, command: Command) -> Result<(), String>;

    /// Drains a snapshot of the buffered extension logs.
    fn extension_logs(&self) -> Vec<ExtensionLog>;

    /// Clears the external log buffer after a successful delivery.
    fn clear_extension_logs(&self);

    /// The logical link flipped.
    fn connection_changed(&self, connected: bool);

    /// Server pushed capture overrides.
    fn capture_overrides(&self, overrides: HashMap<String, String>) {
        let _ = overrides;
    }

    /// Client and server disagree on `major.minor`.
    fn version_mismatch(&self, local: &str, server: &str) {
        let _ = (local, server);
    }

    /// Diagnostic logging hook; the default forwards to `tracing`.
    fn debug_log(&self, category: &str, message: &str, data: Option<&Value>) {
        match data {
            Some(data) => tracing::debug!(category, %data, "{message}"),
            None => tracing::debug!(category, "{message}"),
        }
    }
}
