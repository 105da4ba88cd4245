//! Request and response bodies of the HTTP endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Debug, Default)]
pub struct OutboundCallPayload {
    /// Number to call, in E.164 format.
    #[schema(example = "+15551234567")]
    pub to: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct OutboundCallResponse {
    pub success: bool,
    #[serde(rename = "callSid")]
    #[schema(example = "CA0123456789abcdef0123456789abcdef")]
    pub call_sid: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outbound_call_payload_deserialization() {
        let payload: OutboundCallPayload = serde_json::from_str(r#"{"to":"+15551234567"}"#).unwrap();
        assert_eq!(payload.to.as_deref(), Some("+15551234567"));

        let payload: OutboundCallPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.to.is_none());
    }

    #[test]
    fn test_outbound_call_response_serialization() {
        let response = OutboundCallResponse {
            success: true,
            call_sid: "CA123".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "callSid": "CA123"})
        );
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse {
            error: "'to' number is required".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"error": "'to' number is required"})
        );
    }
}
