//! Call-signaling responses.
//!
//! When a call comes in (or an outbound call is answered) the telephony
//! provider fetches instructions from us. We answer with TwiML that greets the
//! caller and opens a bidirectional media stream to `/media-stream`.

use axum::http::{HeaderMap, header, uri::Authority};

pub const MEDIA_STREAM_PATH: &str = "/media-stream";
pub const INCOMING_CALL_PATH: &str = "/incoming-call";

const GREETING: &str = "Please wait while we connect your call to our AI voice assistant.";
const READY_PROMPT: &str = "You may start talking now.";

/// Picks the host name the provider should call back on: the configured
/// public host if set, otherwise the host the request was addressed to.
pub fn public_domain(configured: Option<&str>, headers: &HeaderMap) -> Option<String> {
    if let Some(host) = configured {
        return Some(strip_scheme(host).trim_end_matches('/').to_string());
    }
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let authority = host.parse::<Authority>().ok()?;
    Some(authority.host().to_string())
}

/// `wss://` URL of the media stream endpoint on `domain`.
pub fn media_stream_url(domain: &str) -> String {
    format!("wss://{}{}", domain, MEDIA_STREAM_PATH)
}

/// `https://` URL of the signaling endpoint, keeping an explicit scheme if one was configured.
pub fn incoming_call_url(domain: &str) -> String {
    let base = if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", domain.trim_end_matches('/'))
    };
    format!("{}{}", base, INCOMING_CALL_PATH)
}

/// TwiML that greets the caller then connects the call to our media stream.
pub fn connect_twiml(stream_url: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "<Response>",
            "<Say>{}</Say>",
            r#"<Pause length="1"/>"#,
            "<Say>{}</Say>",
            r#"<Connect><Stream url="{}"/></Connect>"#,
            "</Response>"
        ),
        escape_xml(GREETING),
        escape_xml(READY_PROMPT),
        escape_xml(stream_url)
    )
}

fn strip_scheme(host: &str) -> &str {
    host.strip_prefix("https://")
        .or_else(|| host.strip_prefix("http://"))
        .or_else(|| host.strip_prefix("wss://"))
        .unwrap_or(host)
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_host(host: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(host).unwrap());
        headers
    }

    #[test]
    fn test_public_domain_prefers_configured_host() {
        let headers = headers_with_host("internal:5050");
        assert_eq!(
            public_domain(Some("relay.example.com"), &headers).as_deref(),
            Some("relay.example.com")
        );
        assert_eq!(
            public_domain(Some("https://relay.example.com/"), &headers).as_deref(),
            Some("relay.example.com")
        );
    }

    #[test]
    fn test_public_domain_falls_back_to_host_header() {
        let headers = headers_with_host("abc123.ngrok.io:443");
        assert_eq!(
            public_domain(None, &headers).as_deref(),
            Some("abc123.ngrok.io")
        );
        assert_eq!(public_domain(None, &HeaderMap::new()), None);
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            media_stream_url("relay.example.com"),
            "wss://relay.example.com/media-stream"
        );
        assert_eq!(
            incoming_call_url("relay.example.com"),
            "https://relay.example.com/incoming-call"
        );
        assert_eq!(
            incoming_call_url("http://localhost:5050"),
            "http://localhost:5050/incoming-call"
        );
    }

    #[test]
    fn test_connect_twiml() {
        let twiml = connect_twiml("wss://relay.example.com/media-stream");
        assert_eq!(
            twiml,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#,
                "<Say>Please wait while we connect your call to our AI voice assistant.</Say>",
                r#"<Pause length="1"/>"#,
                "<Say>You may start talking now.</Say>",
                r#"<Connect><Stream url="wss://relay.example.com/media-stream"/></Connect>"#,
                "</Response>"
            )
        );
    }

    #[test]
    fn test_twiml_escapes_attribute_values() {
        let twiml = connect_twiml(r#"wss://evil"/><Hangup/>"#);
        assert!(!twiml.contains("<Hangup/>"));
        assert!(twiml.contains("&quot;/&gt;&lt;Hangup/&gt;"));
    }
}
