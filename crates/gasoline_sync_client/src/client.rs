//! The sync client: poll loop, dispatch, and reconnect accounting.

use crate::config::ClientConfig;
use crate::delegate::SyncDelegate;
use crate::error::ClientError;
use crate::http::HttpClient;
use crate::timer::PollTimer;
use crate::util::epoch_millis;
use gasoline_sync_protocol::{same_major_minor, CommandResult, SyncRequest, SyncResponse};
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Pending-results queue capacity; oldest entries are dropped first.
const PENDING_RESULTS_CAP: usize = 200;

/// Dispatched-id window size for the at-most-once guard.
const DISPATCHED_ID_WINDOW: usize = 256;

/// Snapshot of the client's connection accounting.
#[derive(Debug, Clone, Default)]
pub struct SyncClientState {
    /// Whether the logical link is currently considered up.
    pub connected: bool,
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
    /// Epoch ms of the last successful cycle; 0 = never.
    pub last_sync_at: u64,
    /// Id of the last command attempted, sent upstream as the ack.
    pub last_command_ack: Option<String>,
}

/// Bounded record of locally dispatched command ids.
///
/// The server may re-offer a command until it sees the ack; anything in
/// this window is skipped instead of re-executed. Insertion order is
/// kept so the oldest id falls out first.
struct DispatchLedger {
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl DispatchLedger {
    fn new() -> Self {
        Self {
            order: VecDeque::with_capacity(DISPATCHED_ID_WINDOW),
            seen: HashSet::with_capacity(DISPATCHED_ID_WINDOW),
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    fn record(&mut self, id: String) {
        if !self.seen.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        if self.order.len() > DISPATCHED_ID_WINDOW {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
    }
}

/// The long-polling sync client.
///
/// Cloning yields another handle to the same client. `start` spawns the
/// poll loop on the ambient tokio runtime; all other operations are
/// cheap and non-blocking.
pub struct SyncClient<C> {
    inner: Arc<ClientInner<C>>,
}

impl<C> Clone for SyncClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<C> {
    server_url: RwLock<String>,
    session_id: String,
    extension_version: String,
    request_timeout: Duration,
    command_timeout: Duration,
    base_poll: Duration,
    http: C,
    delegate: Arc<dyn SyncDelegate>,
    state: Mutex<SyncClientState>,
    pending: Mutex<VecDeque<CommandResult>>,
    ledger: Mutex<DispatchLedger>,
    running: AtomicBool,
    timer: PollTimer,
}

impl<C: HttpClient + 'static> SyncClient<C> {
    /// Creates a stopped client.
    pub fn new(config: ClientConfig, http: C, delegate: Arc<dyn SyncDelegate>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                server_url: RwLock::new(config.server_url),
                session_id: config.session_id,
                extension_version: config.extension_version,
                request_timeout: config.request_timeout,
                command_timeout: config.command_timeout,
                base_poll: config.base_poll,
                http,
                delegate,
                state: Mutex::new(SyncClientState::default()),
                pending: Mutex::new(VecDeque::new()),
                ledger: Mutex::new(DispatchLedger::new()),
                running: AtomicBool::new(false),
                timer: PollTimer::new(),
            }),
        }
    }

    /// Starts the poll loop; the first cycle fires immediately.
    ///
    /// Idempotent: a second call while running is a no-op.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.run_loop().await;
        });
    }

    /// Stops the loop.
    ///
    /// Only the scheduled wait is cancelled: an in-flight request or
    /// command handler runs to completion, after which the loop observes
    /// the flag and exits without scheduling another cycle.
    pub fn stop(&self) {
        self.inner.running.store(false, Ordering::SeqCst);
        self.inner.timer.wake();
    }

    /// Whether the poll loop is running.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Returns a snapshot of the connection accounting.
    pub fn state(&self) -> SyncClientState {
        self.inner.state.lock().clone()
    }

    /// Triggers an out-of-band cycle as soon as the current one (if any)
    /// settles. No-op while stopped.
    pub fn flush(&self) {
        if self.is_running() {
            self.inner.timer.wake();
        }
    }

    /// Queues a finished command result for delivery.
    ///
    /// The queue holds the most recent 200 results; when the client is
    /// running this also behaves like [`SyncClient::flush`] so results
    /// go out promptly.
    pub fn queue_command_result(&self, result: CommandResult) {
        self.inner.push_result(result);
        self.flush();
    }

    /// Forgives accumulated failures and, when running, tries again
    /// immediately — without presupposing the outcome.
    pub fn reset_connection(&self) {
        self.inner.state.lock().consecutive_failures = 0;
        self.flush();
    }

    /// Points subsequent requests at a different base URL.
    pub fn set_server_url(&self, url: impl Into<String>) {
        *self.inner.server_url.write() = url.into();
    }
}

impl<C: HttpClient> ClientInner<C> {
    async fn run_loop(self: Arc<Self>) {
        self.delegate.debug_log("sync", "sync loop started", None);
        while self.running.load(Ordering::SeqCst) {
            let delay = self.cycle_once().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.timer.wait(delay).await;
        }
        self.delegate.debug_log("sync", "sync loop stopped", None);
    }

    /// Runs one cycle and returns the delay until the next.
    async fn cycle_once(&self) -> Duration {
        match self.run_cycle().await {
            Ok(next) => next,
            Err(err) => {
                self.record_failure(&err);
                self.base_poll
            }
        }
    }

    async fn run_cycle(&self) -> Result<Duration, ClientError> {
        let settings = self.delegate.settings().await;
        let logs = self.delegate.extension_logs();
        let sent_logs = !logs.is_empty();
        let sent_results: Vec<CommandResult> = self.pending.lock().iter().cloned().collect();

        let request = SyncRequest {
            ext_session_id: self.session_id.clone(),
            extension_version: self.extension_version.clone(),
            settings,
            extension_logs: logs,
            last_command_ack: self.state.lock().last_command_ack.clone(),
            command_results: sent_results.clone(),
        };
        let body = serde_json::to_string(&request)?;

        let url = format!("{}/sync", self.server_url.read());
        let headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            (
                "X-Gasoline-Client".to_string(),
                format!("gasoline-extension/{}", self.extension_version),
            ),
            (
                "X-Gasoline-Extension-Version".to_string(),
                self.extension_version.clone(),
            ),
        ];

        let response = timeout(self.request_timeout, self.http.post(&url, &headers, body))
            .await
            .map_err(|_| ClientError::Timeout)?
            .map_err(ClientError::Transport)?;

        if !response.is_success() {
            return Err(ClientError::Http {
                status: response.status,
            });
        }
        let sync: SyncResponse = serde_json::from_str(&response.body)?;

        Ok(self.handle_success(sync, sent_logs, &sent_results).await)
    }

    async fn handle_success(
        &self,
        response: SyncResponse,
        sent_logs: bool,
        sent_results: &[CommandResult],
    ) -> Duration {
        let reconnected = {
            let mut state = self.state.lock();
            state.consecutive_failures = 0;
            if state.connected {
                false
            } else {
                state.connected = true;
                true
            }
        };
        if reconnected {
            self.delegate.connection_changed(true);
        }

        if let Some(server_version) = response.server_version.as_deref() {
            let local = self.extension_version.as_str();
            if !local.is_empty() && !same_major_minor(local, server_version) {
                self.delegate.version_mismatch(local, server_version);
            }
        }

        if let Some(overrides) = response.capture_overrides {
            self.delegate.capture_overrides(overrides);
        }

        for command in response.commands {
            self.dispatch_command(command).await;
        }

        if sent_logs {
            self.delegate.clear_extension_logs();
        }
        if !sent_results.is_empty() {
            let sent: HashSet<&str> = sent_results.iter().map(|r| r.id.as_str()).collect();
            self.pending.lock().retain(|r| !sent.contains(r.id.as_str()));
        }

        self.state.lock().last_sync_at = epoch_millis();

        if response.next_poll_ms > 0 {
            Duration::from_millis(response.next_poll_ms)
        } else {
            self.base_poll
        }
    }

    /// Dispatches one command, bounded by the command timeout.
    ///
    /// "Dispatched" means attempted: a handler error or timeout still
    /// advances the ack, and a timeout additionally queues an error
    /// result so the server learns the outcome.
    async fn dispatch_command(&self, command: gasoline_sync_protocol::Command) {
        {
            let mut ledger = self.ledger.lock();
            if ledger.contains(&command.id) {
                self.delegate.debug_log(
                    "sync",
                    "skipping already-dispatched command",
                    Some(&json!({ "id": command.id })),
                );
                return;
            }
            ledger.record(command.id.clone());
        }
        self.state.lock().last_command_ack = Some(command.id.clone());

        let id = command.id.clone();
        let correlation_id = command.correlation_id.clone();
        match timeout(self.command_timeout, self.delegate.handle_command(command)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                self.delegate.debug_log(
                    "sync",
                    "command handler failed",
                    Some(&json!({ "id": id, "error": err })),
                );
            }
            Err(_) => {
                let mut result = CommandResult::error(
                    id.clone(),
                    format!(
                        "command {} timed out after {}ms",
                        id,
                        self.command_timeout.as_millis()
                    ),
                );
                if let Some(correlation_id) = correlation_id {
                    result = result.with_correlation_id(correlation_id);
                }
                self.push_result(result);
            }
        }
    }

    fn record_failure(&self, err: &ClientError) {
        let disconnected = {
            let mut state = self.state.lock();
            state.consecutive_failures += 1;
            if state.connected && state.consecutive_failures >= 2 {
                state.connected = false;
                true
            } else {
                false
            }
        };
        self.delegate.debug_log(
            "sync",
            "sync cycle failed",
            Some(&json!({ "kind": err.kind(), "error": err.to_string() })),
        );
        if disconnected {
            self.delegate.connection_changed(false);
        }
    }

    fn push_result(&self, result: CommandResult) {
        let mut pending = self.pending.lock();
        if pending.len() == PENDING_RESULTS_CAP {
            pending.pop_front();
        }
        pending.push_back(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpClient};
    use async_trait::async_trait;
    use gasoline_sync_protocol::{Command, CommandStatus, ExtensionLog};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct TestDelegate {
        settings: Value,
        logs: Mutex<Vec<ExtensionLog>>,
        cleared: AtomicUsize,
        handled: Mutex<Vec<String>>,
        fail_ids: Mutex<HashSet<String>>,
        hang_ids: Mutex<HashSet<String>>,
        connection_changes: Mutex<Vec<bool>>,
        version_mismatches: Mutex<Vec<(String, String)>>,
        overrides_seen: Mutex<Vec<HashMap<String, String>>>,
    }

    #[async_trait]
    impl SyncDelegate for TestDelegate {
        async fn settings(&self) -> Value {
            self.settings.clone()
        }

        async fn handle_command(&self, command: Command) -> Result<(), String> {
            self.handled.lock().push(command.id.clone());
            if self.hang_ids.lock().contains(&command.id) {
                std::future::pending::<()>().await;
            }
            if self.fail_ids.lock().contains(&command.id) {
                return Err("handler exploded".into());
            }
            Ok(())
        }

        fn extension_logs(&self) -> Vec<ExtensionLog> {
            self.logs.lock().clone()
        }

        fn clear_extension_logs(&self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
            self.logs.lock().clear();
        }

        fn connection_changed(&self, connected: bool) {
            self.connection_changes.lock().push(connected);
        }

        fn capture_overrides(&self, overrides: HashMap<String, String>) {
            self.overrides_seen.lock().push(overrides);
        }

        fn version_mismatch(&self, local: &str, server: &str) {
            self.version_mismatches
                .lock()
                .push((local.to_string(), server.to_string()));
        }
    }

    fn make_client(
        version: &str,
    ) -> (SyncClient<MockHttpClient>, Arc<TestDelegate>) {
        let delegate = Arc::new(TestDelegate {
            settings: json!({"pilot_enabled": false}),
            ..TestDelegate::default()
        });
        let config = ClientConfig::new("http://127.0.0.1:7890", "sess-test", version)
            .with_command_timeout(Duration::from_millis(1000));
        let client = SyncClient::new(config, MockHttpClient::new(), delegate.clone());
        (client, delegate)
    }

    fn ok_response(body: Value) -> HttpResponse {
        HttpResponse::ok(body.to_string())
    }

    fn empty_ack() -> HttpResponse {
        ok_response(json!({"ack": true, "commands": [], "next_poll_ms": 0}))
    }

    async fn cycle(client: &SyncClient<MockHttpClient>) -> Duration {
        client.inner.cycle_once().await
    }

    #[tokio::test]
    async fn request_shape_and_headers() {
        let (client, _delegate) = make_client("6.0.3");
        client.inner.http.push_response(empty_ack());

        cycle(&client).await;

        let requests = client.inner.http.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.url, "http://127.0.0.1:7890/sync");
        assert!(req
            .headers
            .contains(&("Content-Type".to_string(), "application/json".to_string())));
        assert!(req.headers.contains(&(
            "X-Gasoline-Client".to_string(),
            "gasoline-extension/6.0.3".to_string()
        )));
        assert!(req.headers.contains(&(
            "X-Gasoline-Extension-Version".to_string(),
            "6.0.3".to_string()
        )));

        // Empty batches are omitted from the body entirely.
        assert!(!req.body.contains("extension_logs"));
        assert!(!req.body.contains("command_results"));
        assert!(!req.body.contains("last_command_ack"));
        let parsed: SyncRequest = serde_json::from_str(&req.body).unwrap();
        assert_eq!(parsed.ext_session_id, "sess-test");
        assert_eq!(parsed.extension_version, "6.0.3");
    }

    #[tokio::test]
    async fn first_success_connects_exactly_once() {
        let (client, delegate) = make_client("6.0.3");
        client.inner.http.push_response(empty_ack());
        client.inner.http.push_response(empty_ack());

        cycle(&client).await;
        cycle(&client).await;

        let state = client.state();
        assert!(state.connected);
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_sync_at > 0);
        assert_eq!(*delegate.connection_changes.lock(), vec![true]);
    }

    #[tokio::test]
    async fn single_failure_does_not_disconnect() {
        let (client, delegate) = make_client("6.0.3");
        client.inner.http.push_response(empty_ack());
        client.inner.http.push_transport_error("connection reset");
        client.inner.http.push_response(empty_ack());

        cycle(&client).await;
        cycle(&client).await;
        assert!(client.state().connected);
        assert_eq!(client.state().consecutive_failures, 1);

        cycle(&client).await;
        assert!(client.state().connected);
        assert_eq!(client.state().consecutive_failures, 0);
        assert_eq!(*delegate.connection_changes.lock(), vec![true]);
    }

    #[tokio::test]
    async fn second_consecutive_failure_disconnects_once() {
        let (client, delegate) = make_client("6.0.3");
        client.inner.http.push_response(empty_ack());
        client.inner.http.push_transport_error("reset");
        client.inner.http.push_transport_error("reset");
        client.inner.http.push_transport_error("reset");

        for _ in 0..4 {
            cycle(&client).await;
        }

        let state = client.state();
        assert!(!state.connected);
        assert_eq!(state.consecutive_failures, 3);
        // No duplicate disconnect on the third failure.
        assert_eq!(*delegate.connection_changes.lock(), vec![true, false]);
    }

    #[tokio::test]
    async fn protocol_failures_count_like_transport_failures() {
        let (client, _delegate) = make_client("6.0.3");
        client
            .inner
            .http
            .push_response(HttpResponse::with_status(503, "busy"));
        client.inner.http.push_response(HttpResponse::ok("not json"));

        cycle(&client).await;
        cycle(&client).await;
        assert_eq!(client.state().consecutive_failures, 2);
    }

    #[tokio::test]
    async fn commands_dispatch_in_order_and_ack_last_attempted() {
        let (client, delegate) = make_client("6.0.3");
        delegate.fail_ids.lock().insert("cmd-1".into());
        client.inner.http.push_response(ok_response(json!({
            "ack": true,
            "commands": [
                {"id": "cmd-1", "type": "dom_query", "params": {}},
                {"id": "cmd-2", "type": "browser_action", "params": {}},
            ],
        })));

        cycle(&client).await;

        assert_eq!(*delegate.handled.lock(), vec!["cmd-1", "cmd-2"]);
        assert_eq!(client.state().last_command_ack.as_deref(), Some("cmd-2"));
    }

    #[tokio::test]
    async fn redelivered_command_is_not_reexecuted() {
        let (client, delegate) = make_client("6.0.3");
        let with_cmd = || {
            ok_response(json!({
                "ack": true,
                "commands": [{"id": "cmd-1", "type": "dom_query", "params": {}}],
            }))
        };
        client.inner.http.push_response(with_cmd());
        client.inner.http.push_response(with_cmd());

        cycle(&client).await;
        cycle(&client).await;

        assert_eq!(*delegate.handled.lock(), vec!["cmd-1"]);
        assert_eq!(client.state().last_command_ack.as_deref(), Some("cmd-1"));
    }

    #[tokio::test]
    async fn duplicate_id_within_one_response_dispatches_once() {
        let (client, delegate) = make_client("6.0.3");
        client.inner.http.push_response(ok_response(json!({
            "ack": true,
            "commands": [
                {"id": "cmd-1", "type": "dom_query", "params": {}},
                {"id": "cmd-1", "type": "dom_query", "params": {}},
            ],
        })));

        cycle(&client).await;
        assert_eq!(*delegate.handled.lock(), vec!["cmd-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_command_queues_error_result() {
        let (client, delegate) = make_client("6.0.3");
        delegate.hang_ids.lock().insert("cmd-slow".into());
        client.inner.http.push_response(ok_response(json!({
            "ack": true,
            "commands": [{"id": "cmd-slow", "type": "dom_query", "params": {},
                          "correlation_id": "corr-7"}],
        })));

        cycle(&client).await;

        assert_eq!(client.state().last_command_ack.as_deref(), Some("cmd-slow"));
        let pending: Vec<CommandResult> =
            client.inner.pending.lock().iter().cloned().collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, CommandStatus::Error);
        assert_eq!(pending[0].correlation_id.as_deref(), Some("corr-7"));
        assert!(pending[0]
            .error
            .as_deref()
            .unwrap()
            .contains("timed out after 1000ms"));
    }

    #[tokio::test]
    async fn pending_queue_keeps_most_recent_200() {
        let (client, _delegate) = make_client("6.0.3");
        for i in 0..250 {
            client.queue_command_result(CommandResult::complete(
                format!("res-{i}"),
                json!({"n": i}),
            ));
        }
        client.inner.http.push_response(empty_ack());

        cycle(&client).await;

        let requests = client.inner.http.requests();
        let parsed: SyncRequest = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(parsed.command_results.len(), 200);
        assert_eq!(parsed.command_results[0].id, "res-50");
        assert_eq!(parsed.command_results[199].id, "res-249");
    }

    #[tokio::test]
    async fn results_survive_failure_and_clear_after_success() {
        let (client, _delegate) = make_client("6.0.3");
        client.queue_command_result(CommandResult::complete("res-1", json!(null)));
        client.inner.http.push_transport_error("refused");
        client.inner.http.push_response(empty_ack());
        client.inner.http.push_response(empty_ack());

        cycle(&client).await;
        assert_eq!(client.inner.pending.lock().len(), 1);

        cycle(&client).await;
        assert!(client.inner.pending.lock().is_empty());

        cycle(&client).await;
        let requests = client.inner.http.requests();
        assert!(requests[1].body.contains("res-1"));
        assert!(!requests[2].body.contains("command_results"));
    }

    #[tokio::test]
    async fn logs_cleared_only_when_sent_and_successful() {
        let (client, delegate) = make_client("6.0.3");
        delegate
            .logs
            .lock()
            .push(ExtensionLog::new(1, "info", "buffered"));
        client.inner.http.push_transport_error("refused");
        client.inner.http.push_response(empty_ack());
        client.inner.http.push_response(empty_ack());

        cycle(&client).await;
        assert_eq!(delegate.cleared.load(Ordering::SeqCst), 0);

        cycle(&client).await;
        assert_eq!(delegate.cleared.load(Ordering::SeqCst), 1);

        // Nothing buffered: clear must not be called again.
        cycle(&client).await;
        assert_eq!(delegate.cleared.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn version_mismatch_on_major_minor_only() {
        let (client, delegate) = make_client("6.0.3");
        client.inner.http.push_response(ok_response(
            json!({"ack": true, "commands": [], "server_version": "7.1.0"}),
        ));
        client.inner.http.push_response(ok_response(
            json!({"ack": true, "commands": [], "server_version": "6.0.9"}),
        ));
        client.inner.http.push_response(ok_response(json!({"ack": true, "commands": []})));

        for _ in 0..3 {
            cycle(&client).await;
        }

        assert_eq!(
            *delegate.version_mismatches.lock(),
            vec![("6.0.3".to_string(), "7.1.0".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_local_version_suppresses_mismatch() {
        let (client, delegate) = make_client("");
        client.inner.http.push_response(ok_response(
            json!({"ack": true, "commands": [], "server_version": "7.1.0"}),
        ));

        cycle(&client).await;
        assert!(delegate.version_mismatches.lock().is_empty());
    }

    #[tokio::test]
    async fn capture_overrides_are_forwarded() {
        let (client, delegate) = make_client("6.0.3");
        client.inner.http.push_response(ok_response(json!({
            "ack": true,
            "commands": [],
            "capture_overrides": {"network": "off"},
        })));

        cycle(&client).await;

        let seen = delegate.overrides_seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("network").map(String::as_str), Some("off"));
    }

    #[tokio::test]
    async fn next_poll_ms_zero_falls_back_to_base_interval() {
        let (client, _delegate) = make_client("6.0.3");
        client.inner.http.push_response(empty_ack());
        client
            .inner
            .http
            .push_response(ok_response(json!({"ack": true, "next_poll_ms": 250})));
        client.inner.http.push_transport_error("refused");

        assert_eq!(cycle(&client).await, Duration::from_millis(1000));
        assert_eq!(cycle(&client).await, Duration::from_millis(250));
        // Failures retry at the fixed base interval.
        assert_eq!(cycle(&client).await, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn set_server_url_takes_effect_next_cycle() {
        let (client, _delegate) = make_client("6.0.3");
        client.inner.http.push_response(empty_ack());
        client.inner.http.push_response(empty_ack());

        cycle(&client).await;
        client.set_server_url("http://127.0.0.1:9999");
        cycle(&client).await;

        let requests = client.inner.http.requests();
        assert_eq!(requests[0].url, "http://127.0.0.1:7890/sync");
        assert_eq!(requests[1].url, "http://127.0.0.1:9999/sync");
    }

    #[tokio::test]
    async fn reset_connection_forgives_failures() {
        let (client, _delegate) = make_client("6.0.3");
        client.inner.http.push_transport_error("refused");
        cycle(&client).await;
        assert_eq!(client.state().consecutive_failures, 1);

        client.reset_connection();
        assert_eq!(client.state().consecutive_failures, 0);
    }

    #[test]
    fn ledger_window_evicts_oldest() {
        let mut ledger = DispatchLedger::new();
        for i in 0..(DISPATCHED_ID_WINDOW + 10) {
            ledger.record(format!("cmd-{i}"));
        }
        assert!(!ledger.contains("cmd-0"));
        assert!(!ledger.contains("cmd-9"));
        assert!(ledger.contains("cmd-10"));
        assert!(ledger.contains(&format!("cmd-{}", DISPATCHED_ID_WINDOW + 9)));

        // Re-recording an evicted id works like a fresh id.
        ledger.record("cmd-0".into());
        assert!(ledger.contains("cmd-0"));
    }
}
