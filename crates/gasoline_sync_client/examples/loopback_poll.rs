//! Drives the sync client against an in-process loopback server.
//!
//! Run with: `cargo run --example loopback_poll`

use async_trait::async_trait;
use gasoline_sync_client::{
    new_session_id, ClientConfig, HttpResponse, LoopbackClient, LoopbackServer, SyncClient,
    SyncDelegate,
};
use gasoline_sync_protocol::{Command, ExtensionLog, SyncRequest, SyncResponse};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// A toy server: offers one command on the first poll, then idles.
#[derive(Default)]
struct DemoServer {
    polls: Mutex<u32>,
}

impl LoopbackServer for DemoServer {
    fn handle_post(&self, _path: &str, body: &str) -> Result<HttpResponse, String> {
        let request: SyncRequest = serde_json::from_str(body).map_err(|e| e.to_string())?;
        let mut polls = self.polls.lock();
        *polls += 1;
        tracing::info!(
            poll = *polls,
            ack = ?request.last_command_ack,
            results = request.command_results.len(),
            "sync request received"
        );

        let commands = if *polls == 1 {
            vec![Command::new(
                "cmd-1",
                "dom_query",
                json!({"selector": "h1"}),
            )]
        } else {
            Vec::new()
        };
        let response = SyncResponse::ack(commands)
            .with_next_poll_ms(500)
            .with_server_version("6.0.9");
        Ok(HttpResponse::ok(serde_json::to_string(&response).unwrap()))
    }
}

struct DemoDelegate;

#[async_trait]
impl SyncDelegate for DemoDelegate {
    async fn settings(&self) -> Value {
        json!({"pilot_enabled": true})
    }

    async fn handle_command(&self, command: Command) -> Result<(), String> {
        tracing::info!(id = %command.id, kind = %command.command_type, "executing command");
        Ok(())
    }

    fn extension_logs(&self) -> Vec<ExtensionLog> {
        Vec::new()
    }

    fn clear_extension_logs(&self) {}

    fn connection_changed(&self, connected: bool) {
        tracing::info!(connected, "connection state changed");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ClientConfig::new("http://127.0.0.1:7890", new_session_id(), "6.0.3");
    let client = SyncClient::new(
        config,
        LoopbackClient::new(Arc::new(DemoServer::default())),
        Arc::new(DemoDelegate),
    );

    client.start();
    tokio::time::sleep(Duration::from_secs(3)).await;
    client.stop();
    tracing::info!(state = ?client.state(), "client stopped");
}
