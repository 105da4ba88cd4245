//! Core of the phone-to-realtime-AI audio relay.
//!
//! This crate knows nothing about HTTP servers or specific WebSocket
//! libraries. It defines the wire formats of both sides, the session
//! configuration, and the [`SessionBridge`] that runs a call.

pub mod audio;
pub mod bridge;
pub mod config;
pub mod connection;
pub mod error;
pub mod media;
pub mod realtime;

pub use bridge::{EndReason, SessionBridge, SessionSummary};
pub use config::SessionConfig;
pub use connection::{Connection, RealtimeConnector, WsFrame};
pub use error::RelayError;
