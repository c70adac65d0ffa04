//! # Gasoline Sync Protocol
//!
//! Wire types for the unified `/sync` endpoint between the gasoline
//! browser extension and its local control server.
//!
//! This crate provides:
//! - Request/response bodies for `POST /sync`
//! - Server-issued commands and client-side command results
//! - Extension log entries batched into sync requests
//! - Version-skew helpers (`major.minor` comparison)
//!
//! ## Conventions
//!
//! All fields use snake_case JSON. Optional batches (`extension_logs`,
//! `command_results`) and optional scalars (`last_command_ack`,
//! `server_version`) are omitted from the serialized body entirely when
//! empty, and unknown fields in responses are ignored, so client and
//! server can evolve independently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod messages;
mod version;

pub use messages::{
    Command, CommandResult, CommandStatus, ExtensionLog, SyncRequest, SyncResponse,
};
pub use version::{major_minor, same_major_minor};
