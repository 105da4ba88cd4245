use base64::Engine;
use std::time::Duration;

// G.711 µ-law, the codec both sides of the relay are configured for.
pub const G711_SAMPLE_RATE_HZ: u64 = 8000;
pub const G711_BYTES_PER_SAMPLE: u64 = 1;

/// Returns how much audio a base64 G.711 payload holds.
///
/// Only used for accounting. Payloads are forwarded untouched whether or not
/// they decode.
pub fn payload_duration(payload: &str) -> Option<Duration> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .ok()?;
    let samples = bytes.len() as u64 / G711_BYTES_PER_SAMPLE;
    Some(Duration::from_micros(samples * 1_000_000 / G711_SAMPLE_RATE_HZ))
}
