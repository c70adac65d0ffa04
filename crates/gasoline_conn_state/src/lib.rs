//! # Gasoline Connection State
//!
//! Connection state machine for the gasoline extension sync core.
//!
//! This crate provides:
//! - A seven-facet connection state (server health, extension link,
//!   circuit breaker, polling, pilot, tab tracking, command lifecycle)
//! - A pure transition engine driven by typed events
//! - Self-healing cross-facet invariants, with corrections recorded as
//!   violations instead of errors
//! - Bounded transition history and violation rings for diagnostics
//! - Change listeners with per-listener panic isolation
//!
//! ## Key Invariants
//!
//! - A down or booting server implies a disconnected extension
//! - A disconnected extension implies stopped polling
//! - An active extension implies running polling
//! - A processing command implies an active extension
//!
//! The machine never rejects an event: contradictions are corrected in a
//! fixed order after the event's direct effect, and each correction is
//! logged. Nothing in this crate performs I/O or owns a timer; an
//! external orchestrator feeds it events and reads facets back.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod event;
mod handle;
mod machine;
mod state;

pub use event::ConnectionEvent;
pub use handle::SharedConnectionState;
pub use machine::{
    ConnectionStateMachine, InvariantViolation, ListenerId, TransitionRecord,
    DEFAULT_HEALTH_STALE_MS, DEFAULT_POLL_STALE_MS,
};
pub use state::{
    Circuit, CommandPhase, ConnectionState, ExtensionLink, Pilot, Polling, ServerHealth, Tracking,
};
