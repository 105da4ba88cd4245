//! Shared Application State
//!
//! Everything the handlers need, created once at startup. Nothing in here is
//! mutated per call.

use crate::{config::Config, twilio::CallOriginator};
use pam_core::SessionBridge;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub bridge: Arc<SessionBridge>,
    /// `None` when no Twilio credentials are configured.
    pub call_originator: Option<Arc<dyn CallOriginator>>,
}
