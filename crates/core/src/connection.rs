//! Transport-neutral view of the two WebSocket connections a session pairs.
//!
//! The relay never touches `axum` or `tungstenite` types directly. Each
//! transport is adapted into a [`Connection`]: a sink accepting text frames
//! and a stream yielding [`WsFrame`]s.

use crate::error::RelayError;
use async_trait::async_trait;
use futures::{Sink, Stream, StreamExt, stream::BoxStream};
use std::pin::Pin;

/// A single message received from a WebSocket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsFrame {
    Text(String),
    Close,
    /// Ping, pong and binary frames. The relay ignores these.
    Other,
}

/// The sending half of a connection. Closing it closes the connection.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = RelayError> + Send>>;

/// The receiving half of a connection. Ends when the peer goes away.
pub type FrameStream = BoxStream<'static, Result<WsFrame, RelayError>>;

/// One side of a call, already accepted or connected.
pub struct Connection {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Connection {
    pub fn new<Si, St>(sink: Si, stream: St) -> Self
    where
        Si: Sink<String, Error = RelayError> + Send + 'static,
        St: Stream<Item = Result<WsFrame, RelayError>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: stream.boxed(),
        }
    }

    pub fn split(self) -> (FrameSink, FrameStream) {
        (self.sink, self.stream)
    }
}

/// Opens the companion connection to the speech-AI realtime endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    /// Connects and authenticates. Fails if the endpoint rejects the handshake.
    async fn connect(&self) -> Result<Connection, RelayError>;
}

/// In-memory connections backed by unbounded channels.
///
/// Used by tests on both sides of the workspace to stand in for a live socket.
#[cfg(any(test, feature = "test-util"))]
pub mod memory {
    use super::{Connection, WsFrame};
    use crate::error::RelayError;
    use futures::{
        SinkExt, StreamExt,
        channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
    };

    /// The remote end of an in-memory [`Connection`].
    pub struct MemoryPeer {
        incoming: UnboundedSender<Result<WsFrame, RelayError>>,
        outgoing: UnboundedReceiver<String>,
    }

    /// Creates a connected pair: frames pushed into the peer come out of the
    /// connection's stream, text sent on the connection's sink reaches the peer.
    pub fn pair() -> (Connection, MemoryPeer) {
        let (incoming_tx, incoming_rx) = mpsc::unbounded();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded::<String>();

        let sink = outgoing_tx.sink_map_err(|e| {
            if e.is_disconnected() {
                RelayError::Closed
            } else {
                RelayError::transport(e)
            }
        });
        let connection = Connection::new(sink, incoming_rx);
        let peer = MemoryPeer {
            incoming: incoming_tx,
            outgoing: outgoing_rx,
        };
        (connection, peer)
    }

    impl MemoryPeer {
        /// Delivers a text frame. Returns false once the connection is gone.
        pub fn send_text(&self, text: impl Into<String>) -> bool {
            self.incoming
                .unbounded_send(Ok(WsFrame::Text(text.into())))
                .is_ok()
        }

        pub fn send_frame(&self, frame: WsFrame) -> bool {
            self.incoming.unbounded_send(Ok(frame)).is_ok()
        }

        pub fn send_error(&self, err: RelayError) -> bool {
            self.incoming.unbounded_send(Err(err)).is_ok()
        }

        /// Ends the connection's stream, as if the remote side hung up.
        pub fn hang_up(&self) {
            self.incoming.close_channel();
        }

        /// Next text frame sent on the connection, or `None` once it is closed.
        pub async fn recv(&mut self) -> Option<String> {
            self.outgoing.next().await
        }

        /// Like [`MemoryPeer::recv`] but parses the frame as JSON.
        pub async fn recv_json(&mut self) -> Option<serde_json::Value> {
            let text = self.recv().await?;
            serde_json::from_str(&text).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;

    #[tokio::test]
    async fn test_memory_pair_delivers_both_ways() {
        let (connection, mut peer) = memory::pair();
        let (mut sink, mut stream) = connection.split();

        assert!(peer.send_text("hello"));
        assert_eq!(
            stream.next().await.unwrap().unwrap(),
            WsFrame::Text("hello".to_string())
        );

        sink.send("world".to_string()).await.unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("world"));
    }

    #[tokio::test]
    async fn test_memory_pair_close_and_hang_up() {
        let (connection, mut peer) = memory::pair();
        let (mut sink, mut stream) = connection.split();

        sink.close().await.unwrap();
        assert_eq!(peer.recv().await, None);

        peer.hang_up();
        assert!(stream.next().await.is_none());
        assert!(!peer.send_text("too late"));
    }

    #[tokio::test]
    async fn test_sending_to_dropped_peer_reports_closed() {
        let (connection, peer) = memory::pair();
        let (mut sink, _stream) = connection.split();
        drop(peer);

        let err = sink.send("anyone there?".to_string()).await.unwrap_err();
        assert!(err.is_closed());
    }
}
