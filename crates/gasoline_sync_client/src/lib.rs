//! # Gasoline Sync Client
//!
//! Long-polling sync client for the gasoline browser extension.
//!
//! This crate provides:
//! - A self-scheduling poll loop against `POST {server_url}/sync`
//! - Failure-triggered reconnect accounting (fixed-interval retry)
//! - Sequential, at-most-once command dispatch with per-command timeouts
//! - A bounded pending-results queue with at-least-once delivery
//! - HTTP transport abstraction with mock and loopback test doubles
//!
//! ## Architecture
//!
//! The client owns nothing but the loop: settings, logs, and command
//! execution live behind the injected [`SyncDelegate`], and the network
//! lives behind the injected [`HttpClient`]. One sync cycle posts the
//! client's whole upstream state (settings, buffered logs, command
//! acknowledgment, finished results) and interprets the response
//! (commands to dispatch, poll interval, version and capture hints).
//!
//! Cycles are strictly sequential: the next cycle is never scheduled
//! until the previous one — including every command it dispatched — has
//! settled. `stop()` cancels only the scheduled wait; in-flight work
//! always runs to completion or to its own timeout.
//!
//! ## Key Invariants
//!
//! - A single isolated failure never drops the logical link; the second
//!   consecutive failure does, exactly once
//! - A command id is dispatched at most once locally, no matter how
//!   often the server redelivers it
//! - Queued results survive failed cycles and are cleared only after a
//!   successful cycle that carried them

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod delegate;
mod error;
mod http;
mod timer;
mod util;

pub use client::{SyncClient, SyncClientState};
pub use config::{
    ClientConfig, BASE_POLL_MS, DEFAULT_COMMAND_TIMEOUT_MS, MIN_COMMAND_TIMEOUT_MS,
    REQUEST_TIMEOUT_MS,
};
pub use delegate::SyncDelegate;
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, HttpResponse, LoopbackClient, LoopbackServer, MockHttpClient, RecordedRequest};
pub use timer::{PollTimer, WaitOutcome};
pub use util::{epoch_millis, new_session_id};
