use std::fmt::Display;

/// Errors raised while relaying a call between the two connections.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Failed to connect to realtime endpoint: {0}")]
    Connect(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Connection closed")]
    Closed,
}

impl RelayError {
    pub fn connect(err: impl Display) -> Self {
        Self::Connect(err.to_string())
    }

    pub fn transport(err: impl Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// True when the error only means the peer has already gone away.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
