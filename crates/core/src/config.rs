//! Parameters sent to the realtime endpoint when a session starts.

use serde::Serialize;

pub const DEFAULT_VOICE: &str = "alloy";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful AI assistant for a call center. \
Answer in a friendly and natural manner without mechanically listing your features.";

/// Audio encodings understood by the realtime endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    #[serde(rename = "g711_ulaw")]
    G711Ulaw,
    #[serde(rename = "g711_alaw")]
    G711Alaw,
    Pcm16,
}

/// How the endpoint decides that the caller has finished a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnDetection {
    ServerVad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
}

/// Session parameters, fixed for the lifetime of every call.
///
/// Serialized as the `session` object of a `session.update` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    pub turn_detection: TurnDetection,
    pub input_audio_format: AudioFormat,
    pub output_audio_format: AudioFormat,
    pub voice: String,
    pub instructions: String,
    pub modalities: Vec<Modality>,
    pub temperature: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_detection: TurnDetection::ServerVad,
            input_audio_format: AudioFormat::G711Ulaw,
            output_audio_format: AudioFormat::G711Ulaw,
            voice: DEFAULT_VOICE.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            modalities: vec![Modality::Text, Modality::Audio],
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl SessionConfig {
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::ClientEvent;
    use serde_json::json;

    #[test]
    fn test_default_session_update_shape() {
        let config = SessionConfig::default();
        let event = ClientEvent::SessionUpdate { session: &config };

        // f32 widening makes the temperature inexact as a Value; checked separately below.
        let mut value = serde_json::to_value(&event).unwrap();
        let temperature = value["session"]
            .as_object_mut()
            .unwrap()
            .remove("temperature")
            .unwrap();
        assert!((temperature.as_f64().unwrap() - 0.8).abs() < 1e-6);

        assert_eq!(
            value,
            json!({
                "type": "session.update",
                "session": {
                    "turn_detection": {"type": "server_vad"},
                    "input_audio_format": "g711_ulaw",
                    "output_audio_format": "g711_ulaw",
                    "voice": "alloy",
                    "instructions": DEFAULT_INSTRUCTIONS,
                    "modalities": ["text", "audio"]
                }
            })
        );
    }

    #[test]
    fn test_temperature_serializes_without_float_noise() {
        let text = serde_json::to_string(&SessionConfig::default()).unwrap();
        assert!(text.contains(r#""temperature":0.8"#), "{text}");
    }

    #[test]
    fn test_builder_overrides() {
        let config = SessionConfig::default()
            .with_voice("shimmer")
            .with_instructions("Be brief.")
            .with_temperature(0.6);

        assert_eq!(config.voice, "shimmer");
        assert_eq!(config.instructions, "Be brief.");
        assert_eq!(config.temperature, 0.6);
        assert_eq!(config.input_audio_format, AudioFormat::G711Ulaw);
        assert_eq!(config.modalities, vec![Modality::Text, Modality::Audio]);
    }

    #[test]
    fn test_audio_format_names() {
        assert_eq!(
            serde_json::to_value(AudioFormat::G711Alaw).unwrap(),
            json!("g711_alaw")
        );
        assert_eq!(serde_json::to_value(AudioFormat::Pcm16).unwrap(), json!("pcm16"));
    }
}
