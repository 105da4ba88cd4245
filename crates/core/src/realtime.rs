//! Realtime speech API event shapes.
//!
//! Only the handful of events the relay sends or reacts to are modelled.
//! Anything else the endpoint emits decodes to [`ServerEvent::Other`].

use crate::config::SessionConfig;
use serde::{Deserialize, Serialize};

/// Events sent from the relay to the realtime endpoint.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent<'a> {
    #[serde(rename = "session.update")]
    SessionUpdate { session: &'a SessionConfig },
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { audio: &'a str },
}

/// Events received from the realtime endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "response.audio.delta")]
    ResponseAudioDelta {
        #[serde(default)]
        delta: Option<String>,
    },
    #[serde(rename = "session.created")]
    SessionCreated,
    #[serde(rename = "session.updated")]
    SessionUpdated,
    #[serde(rename = "response.done")]
    ResponseDone,
    #[serde(rename = "error")]
    Error { error: ErrorDetail },
    #[serde(other)]
    Other,
}

impl ServerEvent {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The audio payload of a non-empty audio delta.
    pub fn audio_delta(&self) -> Option<&str> {
        match self {
            Self::ResponseAudioDelta { delta: Some(delta) } if !delta.is_empty() => {
                Some(delta.as_str())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}
