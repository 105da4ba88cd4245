//! Opens the realtime-AI side of a call against the OpenAI Realtime API.

use super::map_ws_error;
use crate::config::Config;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt, future};
use pam_core::{Connection, RealtimeConnector, RelayError, WsFrame};
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        handshake::client::Request,
        http::{HeaderValue, header::AUTHORIZATION},
        protocol::Message as WsMessage,
    },
};
use tracing::debug;

/// Connects to the realtime endpoint with the service's API key.
pub struct OpenAiConnector {
    endpoint: String,
    api_key: SecretString,
}

impl OpenAiConnector {
    pub fn new(endpoint: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.realtime_endpoint(),
            SecretString::from(config.openai_api_key.expose_secret()),
        )
    }

    fn build_request(&self) -> Result<Request, RelayError> {
        let mut request = self
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(RelayError::connect)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(RelayError::connect)?;
        request.headers_mut().insert(AUTHORIZATION, bearer);
        request
            .headers_mut()
            .insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));
        Ok(request)
    }
}

#[async_trait]
impl RealtimeConnector for OpenAiConnector {
    async fn connect(&self) -> Result<Connection, RelayError> {
        let request = self.build_request()?;
        let (ws_stream, response) = connect_async(request)
            .await
            .map_err(RelayError::connect)?;
        debug!(status = %response.status(), "Realtime handshake complete.");

        let (sink, stream) = ws_stream.split();
        let sink = sink
            .sink_map_err(map_ws_error)
            .with(|text: String| future::ready(Ok::<_, RelayError>(WsMessage::Text(text.into()))));
        let stream = stream.map(|msg| msg.map(into_frame).map_err(map_ws_error));
        Ok(Connection::new(sink, stream))
    }
}

fn into_frame(msg: WsMessage) -> WsFrame {
    match msg {
        WsMessage::Text(text) => WsFrame::Text(text.as_str().to_owned()),
        WsMessage::Close(_) => WsFrame::Close,
        _ => WsFrame::Other,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::within;
    use tokio_tungstenite::tungstenite::Error as WsError;
    use tokio::{net::TcpListener, sync::oneshot};
    use tokio_tungstenite::{
        accept_hdr_async,
        tungstenite::handshake::server::{ErrorResponse, Request as ServerRequest, Response},
    };

    #[test]
    fn test_request_carries_auth_headers() {
        let connector = OpenAiConnector::new(
            "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview-2024-10-01",
            SecretString::from("sk-test"),
        );
        let request = connector.build_request().unwrap();

        assert_eq!(request.headers()[AUTHORIZATION], "Bearer sk-test");
        assert_eq!(request.headers()["OpenAI-Beta"], "realtime=v1");
        assert_eq!(
            request.uri().query(),
            Some("model=gpt-4o-realtime-preview-2024-10-01")
        );
    }

    #[test]
    fn test_closed_errors_map_to_closed() {
        assert!(map_ws_error(WsError::ConnectionClosed).is_closed());
        assert!(map_ws_error(WsError::AlreadyClosed).is_closed());
        assert!(!map_ws_error(WsError::Io(std::io::Error::other("reset"))).is_closed());
    }

    #[tokio::test]
    async fn test_connect_failure_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = OpenAiConnector::new(
            format!("ws://{addr}/v1/realtime"),
            SecretString::from("sk-test"),
        );
        let err = within(connector.connect()).await.err().unwrap();
        assert!(matches!(err, RelayError::Connect(_)));
    }

    #[tokio::test]
    async fn test_connect_exchanges_frames_with_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (headers_tx, headers_rx) = oneshot::channel();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let callback = move |req: &ServerRequest, resp: Response| {
                let header = |name: &str| {
                    req.headers()
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string)
                };
                let _ = headers_tx.send((
                    header("authorization"),
                    header("openai-beta"),
                    req.uri().to_string(),
                ));
                Ok::<_, ErrorResponse>(resp)
            };
            let mut ws = accept_hdr_async(tcp, callback).await.unwrap();
            let first = ws.next().await.unwrap().unwrap();
            ws.send(WsMessage::Text(r#"{"type":"session.created"}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
            first
        });

        let connector = OpenAiConnector::new(
            format!("ws://{addr}/v1/realtime?model=test-model"),
            SecretString::from("sk-test"),
        );
        let (mut sink, mut stream) = within(connector.connect()).await.unwrap().split();

        sink.send(r#"{"type":"session.update"}"#.to_string())
            .await
            .unwrap();
        assert_eq!(
            within(stream.next()).await.unwrap().unwrap(),
            WsFrame::Text(r#"{"type":"session.created"}"#.to_string())
        );
        assert_eq!(within(stream.next()).await.unwrap().unwrap(), WsFrame::Close);

        let first = within(server).await.unwrap();
        assert_eq!(first.to_text().unwrap(), r#"{"type":"session.update"}"#);

        let (auth, beta, uri) = headers_rx.await.unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(beta.as_deref(), Some("realtime=v1"));
        assert_eq!(uri, "/v1/realtime?model=test-model");
    }
}
