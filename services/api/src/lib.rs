//! Pam Relay API Library Crate
//!
//! HTTP and WebSocket surface of the phone-to-AI audio relay: configuration,
//! application state, call-signaling and outbound-call handlers, the
//! media-stream endpoint, and routing. The binaries are thin wrappers around
//! this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod signaling;
pub mod state;
pub mod twilio;
pub mod ws;

#[cfg(test)]
mod test_utils;
