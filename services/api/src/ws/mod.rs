//! WebSocket plumbing around the relay core.
//!
//! - `media_stream`: accepts the telephony provider's media-stream socket and
//!   hands it to the shared session bridge.
//! - `openai`: opens the companion connection to the OpenAI Realtime API.

pub mod media_stream;
pub mod openai;

pub use media_stream::media_stream_handler;
pub use openai::OpenAiConnector;

use pam_core::RelayError;
use tokio_tungstenite::tungstenite::Error as WsError;

/// A socket that is already shut maps to [`RelayError::Closed`], anything else is a transport failure.
pub(crate) fn map_ws_error(err: WsError) -> RelayError {
    match err {
        WsError::ConnectionClosed | WsError::AlreadyClosed => RelayError::Closed,
        other => RelayError::transport(other),
    }
}
