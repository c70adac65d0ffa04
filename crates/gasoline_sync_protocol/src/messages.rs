//! Request and response bodies for `POST /sync`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The sync request the extension posts every poll cycle.
///
/// One request carries everything the client has to say: its identity,
/// current settings, any buffered logs, the id of the last command it
/// attempted, and results for commands that have finished since the
/// previous successful cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Session identifier, fresh per extension load.
    pub ext_session_id: String,
    /// Extension version for compatibility checking.
    pub extension_version: String,
    /// Opaque settings blob, passed through unmodified.
    pub settings: Value,
    /// Buffered extension logs, omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension_logs: Vec<ExtensionLog>,
    /// Id of the last command the client attempted to dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_command_ack: Option<String>,
    /// Finished command results awaiting server delivery, omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command_results: Vec<CommandResult>,
}

impl SyncRequest {
    /// Creates a request with no logs, no ack, and no results.
    pub fn new(
        ext_session_id: impl Into<String>,
        extension_version: impl Into<String>,
        settings: Value,
    ) -> Self {
        Self {
            ext_session_id: ext_session_id.into(),
            extension_version: extension_version.into(),
            settings,
            extension_logs: Vec::new(),
            last_command_ack: None,
            command_results: Vec::new(),
        }
    }
}

/// The sync response from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Server acknowledged the sync.
    pub ack: bool,
    /// Commands for the extension to execute, in dispatch order.
    #[serde(default)]
    pub commands: Vec<Command>,
    /// Server-controlled poll interval; 0 or absent means "use the default".
    #[serde(default)]
    pub next_poll_ms: u64,
    /// Server wall-clock time, for drift diagnostics.
    #[serde(default)]
    pub server_time: String,
    /// Server version for compatibility checking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_version: Option<String>,
    /// Capture overrides pushed down by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_overrides: Option<HashMap<String, String>>,
}

impl SyncResponse {
    /// Creates an acknowledged response carrying the given commands.
    pub fn ack(commands: Vec<Command>) -> Self {
        Self {
            ack: true,
            commands,
            next_poll_ms: 0,
            server_time: String::new(),
            server_version: None,
            capture_overrides: None,
        }
    }

    /// Sets the server-suggested poll interval.
    pub fn with_next_poll_ms(mut self, next_poll_ms: u64) -> Self {
        self.next_poll_ms = next_poll_ms;
        self
    }

    /// Sets the server version.
    pub fn with_server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = Some(version.into());
        self
    }

    /// Sets capture overrides.
    pub fn with_capture_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.capture_overrides = Some(overrides);
        self
    }
}

/// A command issued by the server for the extension to execute.
///
/// Identity is `id`: the client dispatches each id at most once locally,
/// no matter how often the server re-offers it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// Unique command id.
    pub id: String,
    /// Command type, e.g. `dom_query` or `browser_action`.
    #[serde(rename = "type")]
    pub command_type: String,
    /// Type-specific parameters, opaque to this crate.
    #[serde(default)]
    pub params: Value,
    /// Target browser tab, when the command is tab-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
    /// Server-side correlation id, echoed back in the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl Command {
    /// Creates a command with the given id, type and params.
    pub fn new(id: impl Into<String>, command_type: impl Into<String>, params: Value) -> Self {
        Self {
            id: id.into(),
            command_type: command_type.into(),
            params,
            tab_id: None,
            correlation_id: None,
        }
    }
}

/// Outcome classification of a finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    /// Command executed and produced a result.
    Complete,
    /// Command failed; see the `error` field.
    Error,
    /// Command exceeded its execution deadline.
    Timeout,
}

/// A finished command outcome reported back to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Id of the command this result answers.
    pub id: String,
    /// Correlation id copied from the command, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Outcome classification.
    pub status: CommandStatus,
    /// Result payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResult {
    /// Creates a successful result.
    pub fn complete(id: impl Into<String>, result: Value) -> Self {
        Self {
            id: id.into(),
            correlation_id: None,
            status: CommandStatus::Complete,
            result: Some(result),
            error: None,
        }
    }

    /// Creates a failed result.
    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            correlation_id: None,
            status: CommandStatus::Error,
            result: None,
            error: Some(message.into()),
        }
    }

    /// Attaches the correlation id.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// A single buffered extension log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionLog {
    /// Epoch milliseconds; 0 lets the server stamp arrival time.
    #[serde(default)]
    pub timestamp: u64,
    /// Log level, e.g. `info` or `error`.
    pub level: String,
    /// Log message.
    pub message: String,
    /// Structured context, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ExtensionLog {
    /// Creates a log entry with no structured context.
    pub fn new(timestamp: u64, level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level: level.into(),
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_batches_are_omitted() {
        let req = SyncRequest::new("sess-1", "6.0.3", json!({"pilot_enabled": true}));
        let body = serde_json::to_string(&req).unwrap();

        assert!(!body.contains("extension_logs"));
        assert!(!body.contains("last_command_ack"));
        assert!(!body.contains("command_results"));
        assert!(body.contains("\"ext_session_id\":\"sess-1\""));
    }

    #[test]
    fn populated_batches_are_serialized() {
        let mut req = SyncRequest::new("sess-1", "6.0.3", Value::Null);
        req.extension_logs = vec![ExtensionLog::new(1234, "info", "hello")];
        req.last_command_ack = Some("cmd-9".into());
        req.command_results = vec![CommandResult::complete("cmd-9", json!({"ok": true}))];

        let body = serde_json::to_string(&req).unwrap();
        assert!(body.contains("\"last_command_ack\":\"cmd-9\""));
        assert!(body.contains("\"status\":\"complete\""));

        let back: SyncRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(back.extension_logs.len(), 1);
        assert_eq!(back.command_results[0].id, "cmd-9");
    }

    #[test]
    fn response_defaults_for_missing_fields() {
        let resp: SyncResponse = serde_json::from_str(r#"{"ack": true}"#).unwrap();
        assert!(resp.ack);
        assert!(resp.commands.is_empty());
        assert_eq!(resp.next_poll_ms, 0);
        assert!(resp.server_version.is_none());
        assert!(resp.capture_overrides.is_none());
    }

    #[test]
    fn response_ignores_unknown_fields() {
        let resp: SyncResponse =
            serde_json::from_str(r#"{"ack": true, "next_poll_ms": 200, "future_field": [1]}"#)
                .unwrap();
        assert_eq!(resp.next_poll_ms, 200);
    }

    #[test]
    fn command_type_field_is_renamed() {
        let cmd: Command = serde_json::from_str(
            r#"{"id": "cmd-1", "type": "dom_query", "params": {"selector": "h1"}, "tab_id": 7}"#,
        )
        .unwrap();
        assert_eq!(cmd.command_type, "dom_query");
        assert_eq!(cmd.tab_id, Some(7));
        assert!(cmd.correlation_id.is_none());
    }

    #[test]
    fn command_status_wire_values() {
        assert_eq!(
            serde_json::to_string(&CommandStatus::Complete).unwrap(),
            "\"complete\""
        );
        assert_eq!(
            serde_json::to_string(&CommandStatus::Error).unwrap(),
            "\"error\""
        );
        assert_eq!(
            serde_json::to_string(&CommandStatus::Timeout).unwrap(),
            "\"timeout\""
        );
    }

    #[test]
    fn error_result_shape() {
        let result = CommandResult::error("cmd-3", "selector not found")
            .with_correlation_id("corr-11");
        let body = serde_json::to_string(&result).unwrap();

        assert!(body.contains("\"status\":\"error\""));
        assert!(body.contains("\"correlation_id\":\"corr-11\""));
        assert!(!body.contains("\"result\""));
    }
}
