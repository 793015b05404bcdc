/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Realtime push channel over a Phoenix-protocol websocket.
//!
//! The socket joins one topic that carries both `postgres_changes` on the
//! `live_streams` table and the `stream-updated` / `viewer-count-updated`
//! broadcast events. Text frames are decoded into [`RealtimeEvent`]s and
//! delivered through an `mpsc` channel; a background task keeps the socket
//! alive with Phoenix heartbeats.
//!
//! ```no_run
//! use zktv_api_client::{AuthMode, BackendClient, RealtimeClient};
//!
//! # async fn example() -> Result<(), zktv_api_client::ApiError> {
//! let backend = BackendClient::new("https://project.supabase.co", "anon-key", AuthMode::Anonymous);
//! let mut subscription = RealtimeClient::from_backend(&backend)?.subscribe_streams().await?;
//! while let Some(event) = subscription.recv().await {
//!     println!("{} changed", event.stream_id());
//! }
//! # Ok(())
//! # }
//! ```

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;
use url::Url;
use zktv_types::realtime::{STREAM_UPDATED, VIEWER_COUNT_UPDATED};
use zktv_types::{RealtimeEvent, StreamInfo};

use crate::error::ApiError;
use crate::BackendClient;

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsWriter = Arc<Mutex<SplitSink<WsStream, Message>>>;

const REALTIME_PATH: &str = "/realtime/v1/websocket";
const STREAMS_TOPIC: &str = "realtime:zktv-streams";
const STREAMS_TABLE: &str = "live_streams";
const HEARTBEAT_PERIOD: Duration = Duration::from_secs(25);
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Builds realtime subscriptions for one backend project.
#[derive(Debug, Clone)]
pub struct RealtimeClient {
    socket_url: String,
    access_token: String,
}

impl RealtimeClient {
    /// Derive the websocket endpoint from the REST base URL
    /// (`https` → `wss`, `http` → `ws`).
    pub fn from_backend(backend: &BackendClient) -> Result<Self, ApiError> {
        let mut url = Url::parse(backend.base_url())
            .map_err(|e| ApiError::Config(format!("invalid backend url: {e}")))?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => return Err(ApiError::Config(format!("unsupported scheme '{other}'"))),
        };
        url.set_scheme(scheme)
            .map_err(|_| ApiError::Config("cannot switch to websocket scheme".to_string()))?;
        url.set_path(REALTIME_PATH);
        url.query_pairs_mut()
            .clear()
            .append_pair("apikey", backend.anon_key())
            .append_pair("vsn", "1.0.0");
        Ok(Self {
            socket_url: url.to_string(),
            access_token: backend.access_token().to_string(),
        })
    }

    pub fn socket_url(&self) -> &str {
        &self.socket_url
    }

    /// Connect, join the streams topic and start delivering events.
    pub async fn subscribe_streams(&self) -> Result<RealtimeSubscription, ApiError> {
        info!("Realtime connecting to {}", self.socket_url);
        let (ws_stream, response) = tokio_tungstenite::connect_async(self.socket_url.as_str())
            .await
            .map_err(|e| ApiError::Realtime(format!("connect failed: {e}")))?;
        info!("Realtime connected (HTTP {})", response.status());

        let (writer, mut reader) = ws_stream.split();
        let writer: WsWriter = Arc::new(Mutex::new(writer));
        let closed = Arc::new(AtomicBool::new(false));
        let next_ref = Arc::new(AtomicU64::new(1));

        send_frame(&writer, &join_frame(&self.access_token, &next_ref)).await?;

        let (tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let closed_reader = closed.clone();
        let reader_task = tokio::spawn(async move {
            while let Some(msg_result) = reader.next().await {
                if closed_reader.load(Ordering::Relaxed) {
                    break;
                }
                match msg_result {
                    Ok(Message::Text(text)) => match decode_frame(&text) {
                        Frame::Event(event) => {
                            if let Err(e) = tx.send(event).await {
                                debug!("Realtime consumer gone: {e}");
                                break;
                            }
                        }
                        Frame::Control { event, status } => {
                            debug!("Realtime control frame {event} ({status:?})");
                            if event == "phx_error" || event == "phx_close" {
                                warn!("Realtime channel closed by server: {event}");
                                break;
                            }
                        }
                        Frame::Ignored => {}
                    },
                    Ok(Message::Close(_)) => {
                        info!("Realtime socket received close frame");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Realtime read error: {e}");
                        break;
                    }
                }
            }
            closed_reader.store(true, Ordering::Relaxed);
            debug!("Realtime reader stopped");
        });

        let writer_hb = writer.clone();
        let closed_hb = closed.clone();
        let heartbeat_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEARTBEAT_PERIOD);
            interval.tick().await;
            loop {
                interval.tick().await;
                if closed_hb.load(Ordering::Relaxed) {
                    break;
                }
                let frame = heartbeat_frame(&next_ref);
                if let Err(e) = send_frame(&writer_hb, &frame).await {
                    warn!("Realtime heartbeat failed: {e}");
                    closed_hb.store(true, Ordering::Relaxed);
                    break;
                }
            }
        });

        Ok(RealtimeSubscription {
            events,
            closed,
            writer,
            tasks: vec![reader_task, heartbeat_task],
        })
    }
}

/// A live subscription. Dropping it stops the background tasks.
pub struct RealtimeSubscription {
    events: mpsc::Receiver<RealtimeEvent>,
    closed: Arc<AtomicBool>,
    writer: WsWriter,
    tasks: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for RealtimeSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeSubscription")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl RealtimeSubscription {
    /// Next event, or `None` once the socket is gone.
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.events.recv().await
    }

    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Relaxed)
    }

    /// Send a close frame and stop the background tasks.
    pub async fn close(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
        let _ = self.writer.lock().await.send(Message::Close(None)).await;
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

async fn send_frame(writer: &WsWriter, frame: &Value) -> Result<(), ApiError> {
    writer
        .lock()
        .await
        .send(Message::Text(frame.to_string()))
        .await
        .map_err(|e| ApiError::Realtime(format!("send failed: {e}")))
}

fn join_frame(access_token: &str, next_ref: &AtomicU64) -> Value {
    json!({
        "topic": STREAMS_TOPIC,
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": STREAMS_TABLE }
                ]
            },
            "access_token": access_token
        },
        "ref": next_ref.fetch_add(1, Ordering::Relaxed).to_string()
    })
}

fn heartbeat_frame(next_ref: &AtomicU64) -> Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": next_ref.fetch_add(1, Ordering::Relaxed).to_string()
    })
}

#[derive(Debug, Deserialize)]
struct PhoenixFrame {
    event: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, PartialEq)]
enum Frame {
    Event(RealtimeEvent),
    Control { event: String, status: Option<String> },
    Ignored,
}

fn decode_frame(text: &str) -> Frame {
    let frame: PhoenixFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Unparsable realtime frame: {e}");
            return Frame::Ignored;
        }
    };
    match frame.event.as_str() {
        "postgres_changes" => {
            let record = &frame.payload["data"]["record"];
            match serde_json::from_value::<StreamInfo>(record.clone()) {
                Ok(stream) => Frame::Event(RealtimeEvent::StreamUpdated(stream)),
                Err(_) => Frame::Ignored,
            }
        }
        "broadcast" => decode_broadcast(&frame.payload),
        "phx_reply" | "phx_error" | "phx_close" | "system" => Frame::Control {
            status: frame.payload["status"].as_str().map(str::to_string),
            event: frame.event,
        },
        _ => Frame::Ignored,
    }
}

fn decode_broadcast(payload: &Value) -> Frame {
    let inner = payload["payload"].clone();
    match payload["event"].as_str() {
        Some(STREAM_UPDATED) => match serde_json::from_value::<StreamInfo>(inner) {
            Ok(stream) => Frame::Event(RealtimeEvent::StreamUpdated(stream)),
            Err(_) => Frame::Ignored,
        },
        Some(VIEWER_COUNT_UPDATED) => {
            let stream_id = inner["stream_id"].as_str().map(str::to_string);
            let viewer_count = inner["viewer_count"].as_u64();
            match (stream_id, viewer_count) {
                (Some(stream_id), Some(viewer_count)) => {
                    Frame::Event(RealtimeEvent::ViewerCountUpdated {
                        stream_id,
                        viewer_count,
                    })
                }
                _ => Frame::Ignored,
            }
        }
        _ => Frame::Ignored,
    }
}
