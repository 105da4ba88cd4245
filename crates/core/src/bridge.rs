//! The Session Bridge.
//!
//! For every accepted telephony media stream the bridge opens one realtime
//! connection, sends the session configuration, then runs two forwarding
//! loops until either side goes away:
//!
//! - inbound: telephony `media` frames become `input_audio_buffer.append` events.
//! - outbound: `response.audio.delta` events become telephony `media` frames.
//!
//! Each loop runs in its own task and owns the sink of the *other* connection.
//! Whichever loop exits first cancels the shared token and closes the sink it
//! owns; the second loop then wakes up and closes its sink too. Nothing is
//! buffered or retried in either direction.

use crate::{
    audio,
    config::SessionConfig,
    connection::{Connection, FrameSink, FrameStream, RealtimeConnector, WsFrame},
    error::RelayError,
    media::{OutboundFrame, TelephonyFrame},
    realtime::{ClientEvent, ServerEvent},
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, instrument, warn};
use uuid::Uuid;

/// Which connection brought the session down, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TelephonyClosed,
    TelephonyFailed,
    RealtimeClosed,
    RealtimeFailed,
}

/// Counters kept by the inbound (caller to AI) loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundStats {
    pub call_sid: Option<String>,
    pub stream_sid: Option<String>,
    pub frames_forwarded: u64,
    /// Media frames that arrived after the realtime connection had gone away.
    pub frames_dropped: u64,
    pub decode_errors: u64,
    pub audio: Duration,
}

/// Counters kept by the outbound (AI to caller) loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundStats {
    pub frames_forwarded: u64,
    /// Events received but not forwarded: every tag other than a non-empty audio delta.
    pub events_ignored: u64,
    pub decode_errors: u64,
    pub audio: Duration,
}

/// What is left of a session once both loops have exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub ended_by: EndReason,
    pub inbound: InboundStats,
    pub outbound: OutboundStats,
}

/// Pairs telephony media streams with realtime connections, one call at a time.
///
/// A single bridge is shared by every call; it holds no per-call state.
pub struct SessionBridge {
    connector: Arc<dyn RealtimeConnector>,
    config: Arc<SessionConfig>,
}

impl SessionBridge {
    pub fn new(connector: Arc<dyn RealtimeConnector>, config: Arc<SessionConfig>) -> Self {
        Self { connector, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Relays one call from acceptance to teardown.
    ///
    /// Returns once both connections are closed and both loops have exited.
    /// Fails, after closing the telephony connection, if the realtime
    /// endpoint cannot be reached or configured.
    #[instrument(name = "relay_session", skip_all, fields(session_id, call_sid))]
    pub async fn accept(&self, telephony: Connection) -> Result<SessionSummary, RelayError> {
        let session_id = Uuid::new_v4();
        Span::current().record("session_id", session_id.to_string().as_str());
        info!("Telephony media stream accepted. Connecting to realtime endpoint...");

        let (mut telephony_sink, telephony_stream) = telephony.split();

        let realtime = match self.connector.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                error!(error = %e, "Could not open realtime connection. Ending call.");
                close_quietly(&mut telephony_sink, "telephony").await;
                return Err(e);
            }
        };
        let (mut realtime_sink, realtime_stream) = realtime.split();
        info!("Connected to realtime endpoint.");

        if let Err(e) = initialize(&mut realtime_sink, &self.config).await {
            error!(error = %e, "Failed to send session configuration. Ending call.");
            close_quietly(&mut realtime_sink, "realtime").await;
            close_quietly(&mut telephony_sink, "telephony").await;
            return Err(e);
        }

        let cancel = CancellationToken::new();
        let realtime_open = Arc::new(AtomicBool::new(true));

        let inbound = tokio::spawn(
            forward_inbound(
                telephony_stream,
                realtime_sink,
                realtime_open.clone(),
                cancel.clone(),
            )
            .instrument(Span::current()),
        );
        let outbound = tokio::spawn(
            forward_outbound(realtime_stream, telephony_sink, realtime_open, cancel)
                .instrument(Span::current()),
        );

        let (inbound, outbound) = tokio::join!(inbound, outbound);
        let (inbound_exit, inbound_stats) = inbound.map_err(RelayError::transport)?;
        let (outbound_exit, outbound_stats) = outbound.map_err(RelayError::transport)?;

        // The token is only ever cancelled by a loop that ended on its own.
        let ended_by = inbound_exit
            .or(outbound_exit)
            .unwrap_or(EndReason::TelephonyClosed);

        let summary = SessionSummary {
            session_id,
            ended_by,
            inbound: inbound_stats,
            outbound: outbound_stats,
        };
        info!(
            ended_by = ?summary.ended_by,
            frames_in = summary.inbound.frames_forwarded,
            frames_out = summary.outbound.frames_forwarded,
            frames_dropped = summary.inbound.frames_dropped,
            audio_in_ms = summary.inbound.audio.as_millis() as u64,
            audio_out_ms = summary.outbound.audio.as_millis() as u64,
            "Relay session finished."
        );
        Ok(summary)
    }
}

/// Sends the single `session.update` event for a call.
///
/// Does not wait for the endpoint to acknowledge it; the forwarders start
/// straight away.
pub async fn initialize(realtime: &mut FrameSink, config: &SessionConfig) -> Result<(), RelayError> {
    debug!(
        voice = %config.voice,
        temperature = config.temperature,
        "Sending session update."
    );
    send_json(realtime, &ClientEvent::SessionUpdate { session: config }).await
}

/// Runs the caller-to-AI loop until the telephony side ends or the session is cancelled.
///
/// Returns `None` when cancelled by the other loop.
async fn forward_inbound(
    mut telephony: FrameStream,
    mut realtime: FrameSink,
    realtime_open: Arc<AtomicBool>,
    cancel: CancellationToken,
) -> (Option<EndReason>, InboundStats) {
    let mut stats = InboundStats::default();
    let exit = tokio::select! {
        reason = relay_inbound(&mut telephony, &mut realtime, &realtime_open, &mut stats) => Some(reason),
        _ = cancel.cancelled() => None,
    };
    cancel.cancel();
    close_quietly(&mut realtime, "realtime").await;
    debug!(?exit, "Inbound forwarder exited.");
    (exit, stats)
}

async fn relay_inbound(
    telephony: &mut FrameStream,
    realtime: &mut FrameSink,
    realtime_open: &AtomicBool,
    stats: &mut InboundStats,
) -> EndReason {
    while let Some(next) = telephony.next().await {
        let text = match next {
            Ok(WsFrame::Text(text)) => text,
            Ok(WsFrame::Other) => continue,
            Ok(WsFrame::Close) => {
                info!("Telephony side sent a close frame.");
                return EndReason::TelephonyClosed;
            }
            Err(e) => {
                error!(error = %e, "Error receiving from telephony connection.");
                return EndReason::TelephonyFailed;
            }
        };

        match TelephonyFrame::parse(&text) {
            Ok(TelephonyFrame::Media { media }) => {
                if !realtime_open.load(Ordering::Acquire) {
                    stats.frames_dropped += 1;
                    continue;
                }
                let event = ClientEvent::InputAudioBufferAppend {
                    audio: &media.payload,
                };
                match send_json(realtime, &event).await {
                    Ok(()) => {
                        stats.frames_forwarded += 1;
                        if let Some(duration) = audio::payload_duration(&media.payload) {
                            stats.audio += duration;
                        }
                    }
                    Err(e) if e.is_closed() => {
                        debug!("Realtime connection closed. Dropping caller audio.");
                        realtime_open.store(false, Ordering::Release);
                        stats.frames_dropped += 1;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to forward caller audio.");
                        return EndReason::RealtimeFailed;
                    }
                }
            }
            Ok(TelephonyFrame::Start { stream_sid, start }) => {
                let stream_sid =
                    stream_sid.or_else(|| start.as_ref().and_then(|s| s.stream_sid.clone()));
                let call_sid = start.and_then(|s| s.call_sid);
                if let Some(call_sid) = &call_sid {
                    Span::current().record("call_sid", call_sid.as_str());
                }
                info!(?stream_sid, ?call_sid, "Incoming stream started.");
                stats.stream_sid = stream_sid;
                stats.call_sid = call_sid;
            }
            Ok(TelephonyFrame::Stop) => info!("Incoming stream stopped."),
            Ok(_) => {}
            Err(e) => {
                stats.decode_errors += 1;
                warn!(error = %e, "Ignoring malformed telephony frame.");
            }
        }
    }
    info!("Telephony connection closed.");
    EndReason::TelephonyClosed
}

/// Runs the AI-to-caller loop until the realtime side ends or the session is cancelled.
async fn forward_outbound(
    mut realtime: FrameStream,
    mut telephony: FrameSink,
    realtime_open: Arc<AtomicBool>,
    cancel: CancellationToken,
) -> (Option<EndReason>, OutboundStats) {
    let mut stats = OutboundStats::default();
    let exit = tokio::select! {
        reason = relay_outbound(&mut realtime, &mut telephony, &mut stats) => Some(reason),
        _ = cancel.cancelled() => None,
    };
    realtime_open.store(false, Ordering::Release);
    cancel.cancel();
    close_quietly(&mut telephony, "telephony").await;
    debug!(?exit, "Outbound forwarder exited.");
    (exit, stats)
}

async fn relay_outbound(
    realtime: &mut FrameStream,
    telephony: &mut FrameSink,
    stats: &mut OutboundStats,
) -> EndReason {
    while let Some(next) = realtime.next().await {
        let text = match next {
            Ok(WsFrame::Text(text)) => text,
            Ok(WsFrame::Other) => continue,
            Ok(WsFrame::Close) => {
                info!("Realtime endpoint sent a close frame.");
                return EndReason::RealtimeClosed;
            }
            Err(e) => {
                error!(error = %e, "Error receiving from realtime connection.");
                return EndReason::RealtimeFailed;
            }
        };

        let event = match ServerEvent::parse(&text) {
            Ok(event) => event,
            Err(e) => {
                stats.decode_errors += 1;
                warn!(error = %e, "Ignoring malformed realtime event.");
                continue;
            }
        };

        if let Some(delta) = event.audio_delta() {
            if let Err(e) = send_json(telephony, &OutboundFrame::media(delta)).await {
                if e.is_closed() {
                    info!("Telephony connection closed while sending audio.");
                    return EndReason::TelephonyClosed;
                }
                error!(error = %e, "Failed to forward AI audio.");
                return EndReason::TelephonyFailed;
            }
            stats.frames_forwarded += 1;
            if let Some(duration) = audio::payload_duration(delta) {
                stats.audio += duration;
            }
            continue;
        }

        match &event {
            ServerEvent::SessionCreated => debug!("Realtime session created."),
            ServerEvent::SessionUpdated => info!("Realtime session configuration applied."),
            ServerEvent::ResponseDone => debug!("Realtime response done."),
            ServerEvent::Error { error } => warn!(
                kind = ?error.kind,
                code = ?error.code,
                message = %error.message,
                "Realtime endpoint reported an error."
            ),
            _ => {}
        }
        stats.events_ignored += 1;
    }
    info!("Realtime connection closed.");
    EndReason::RealtimeClosed
}

async fn send_json<T: Serialize + Sync>(sink: &mut FrameSink, value: &T) -> Result<(), RelayError> {
    let text = serde_json::to_string(value)?;
    sink.send(text).await
}

async fn close_quietly(sink: &mut FrameSink, side: &'static str) {
    if let Err(e) = sink.close().await {
        debug!(side, error = %e, "Connection was already closed.");
    }
}
