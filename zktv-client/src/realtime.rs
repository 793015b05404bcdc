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
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Stream state changes, from the realtime websocket or from polling.
//!
//! Both transports sit behind [`EventSource`]; consumers never know which one
//! they got.

use crate::constants::DIRECTORY_POLL_INTERVAL_MS;
use crate::directory::{StreamDirectory, StreamDirectoryCache};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use zktv_api_client::{RealtimeClient, RealtimeSubscription};
use zktv_types::{Callback, FeatureFlags, RealtimeEvent, StreamInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSourceKind {
    Push,
    Poll,
}

#[async_trait]
pub trait EventSource: Send {
    /// The next event, or `None` once the source is closed for good.
    async fn next_event(&mut self) -> Option<RealtimeEvent>;

    fn kind(&self) -> EventSourceKind;
}

enum PushTransport {
    Socket(RealtimeSubscription),
    Channel(mpsc::Receiver<RealtimeEvent>),
}

/// Events pushed by the backend's realtime bus.
pub struct PushEventSource {
    transport: PushTransport,
}

impl PushEventSource {
    pub fn from_subscription(subscription: RealtimeSubscription) -> Self {
        Self {
            transport: PushTransport::Socket(subscription),
        }
    }

    /// Any in-process producer, e.g. a bridge from another bus.
    pub fn from_channel(events: mpsc::Receiver<RealtimeEvent>) -> Self {
        Self {
            transport: PushTransport::Channel(events),
        }
    }

    /// Open the websocket. `None` when the socket cannot be opened.
    pub async fn connect(client: &RealtimeClient) -> Option<Self> {
        match client.subscribe_streams().await {
            Ok(subscription) => Some(Self::from_subscription(subscription)),
            Err(e) => {
                warn!("realtime push unavailable: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl EventSource for PushEventSource {
    async fn next_event(&mut self) -> Option<RealtimeEvent> {
        match &mut self.transport {
            PushTransport::Socket(subscription) => subscription.recv().await,
            PushTransport::Channel(events) => events.recv().await,
        }
    }

    fn kind(&self) -> EventSourceKind {
        EventSourceKind::Push
    }
}

/// Polls the directory and turns differences into events.
pub struct PollEventSource {
    directory: Arc<dyn StreamDirectory>,
    channel: String,
    interval: Duration,
    last: Option<StreamInfo>,
    pending: VecDeque<RealtimeEvent>,
    polled_once: bool,
}

impl PollEventSource {
    pub fn new(directory: Arc<dyn StreamDirectory>, channel: &str) -> Self {
        Self::with_interval(
            directory,
            channel,
            Duration::from_millis(DIRECTORY_POLL_INTERVAL_MS),
        )
    }

    pub fn with_interval(
        directory: Arc<dyn StreamDirectory>,
        channel: &str,
        interval: Duration,
    ) -> Self {
        Self {
            directory,
            channel: channel.to_string(),
            interval,
            last: None,
            pending: VecDeque::new(),
            polled_once: false,
        }
    }

    async fn poll(&mut self) {
        match self.directory.active_stream(&self.channel).await {
            Ok(current) => {
                self.pending
                    .extend(diff_streams(self.last.as_ref(), current.as_ref()));
                self.last = current;
            }
            Err(e) => warn!("directory poll for {} failed: {e}", self.channel),
        }
    }
}

#[async_trait]
impl EventSource for PollEventSource {
    async fn next_event(&mut self) -> Option<RealtimeEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.polled_once {
                tokio::time::sleep(self.interval).await;
            }
            self.polled_once = true;
            self.poll().await;
        }
    }

    fn kind(&self) -> EventSourceKind {
        EventSourceKind::Poll
    }
}

/// Events that turn `previous` into `current`.
pub fn diff_streams(
    previous: Option<&StreamInfo>,
    current: Option<&StreamInfo>,
) -> Vec<RealtimeEvent> {
    match (previous, current) {
        (None, None) => Vec::new(),
        (None, Some(current)) => vec![RealtimeEvent::StreamUpdated(current.clone())],
        (Some(previous), None) => {
            let mut ended = previous.clone();
            ended.is_active = false;
            vec![RealtimeEvent::StreamUpdated(ended)]
        }
        (Some(previous), Some(current)) if previous.id != current.id => {
            let mut ended = previous.clone();
            ended.is_active = false;
            vec![
                RealtimeEvent::StreamUpdated(ended),
                RealtimeEvent::StreamUpdated(current.clone()),
            ]
        }
        (Some(previous), Some(current)) => {
            let mut counted = previous.clone();
            counted.viewer_count = current.viewer_count;
            if &counted != current {
                vec![RealtimeEvent::StreamUpdated(current.clone())]
            } else if previous.viewer_count != current.viewer_count {
                vec![RealtimeEvent::ViewerCountUpdated {
                    stream_id: current.id.clone(),
                    viewer_count: current.viewer_count,
                }]
            } else {
                Vec::new()
            }
        }
    }
}

/// Push when it is on offer and `FEATURE_REALTIME_PUSH` allows it, polling
/// otherwise.
pub fn select_event_source(
    push: Option<PushEventSource>,
    poll: PollEventSource,
) -> Box<dyn EventSource> {
    match push {
        Some(push) if FeatureFlags::realtime_push_enabled() => {
            info!("using realtime push for stream events");
            Box::new(push)
        }
        _ => {
            info!("polling the directory for stream events");
            Box::new(poll)
        }
    }
}

/// Feed events into `cache` and `on_event` until the source closes.
pub async fn follow_stream_events(
    mut source: Box<dyn EventSource>,
    cache: Arc<StreamDirectoryCache>,
    on_event: Callback<RealtimeEvent>,
) {
    while let Some(event) = source.next_event().await {
        if cache.apply(&event) {
            debug!("directory cache patched for stream {}", event.stream_id());
        }
        on_event.emit(event);
    }
    info!("{:?} event source closed", source.kind());
}
