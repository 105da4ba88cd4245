//! Telephony media-stream wire format.
//!
//! Inbound frames are JSON objects tagged by `event`. Only `start` and `media`
//! matter to the relay; every other tag decodes to [`TelephonyFrame::Other`]
//! or one of the informational variants and is ignored.

use serde::{Deserialize, Serialize};

/// A frame received from the telephony provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyFrame {
    Connected,
    Start {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
        #[serde(default)]
        start: Option<StreamStart>,
    },
    Media {
        media: MediaChunk,
    },
    Mark,
    Stop,
    #[serde(other)]
    Other,
}

impl TelephonyFrame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Metadata announced when the provider starts streaming a call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamStart {
    pub account_sid: Option<String>,
    pub call_sid: Option<String>,
    pub stream_sid: Option<String>,
    pub tracks: Vec<String>,
    pub media_format: Option<MediaFormat>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// One chunk of caller audio, base64 encoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaChunk {
    pub payload: String,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub chunk: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A frame the relay sends back to the telephony provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutboundFrame<'a> {
    Media { media: OutboundMedia<'a> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMedia<'a> {
    pub payload: &'a str,
}

impl<'a> OutboundFrame<'a> {
    /// Wraps an audio payload for playback to the caller.
    pub fn media(payload: &'a str) -> Self {
        Self::Media {
            media: OutboundMedia { payload },
        }
    }
}
