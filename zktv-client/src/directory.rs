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

//! Client-side cache of "active stream" lookups.

use crate::config::LiveConfig;
use crate::constants::DIRECTORY_TTL_SECS;
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use zktv_api_client::ApiError;
use zktv_types::{RealtimeEvent, StreamInfo};

/// Read side of the stream directory.
#[async_trait]
pub trait StreamDirectory: Send + Sync {
    async fn active_stream(&self, channel: &str) -> Result<Option<StreamInfo>, ApiError>;
    async fn stream_by_id(&self, stream_id: &str) -> Result<Option<StreamInfo>, ApiError>;
}

#[derive(Debug, Clone)]
struct Entry {
    stream: Option<StreamInfo>,
    fetched_at: Instant,
}

#[derive(Debug, Default)]
struct Entries {
    by_channel: HashMap<String, Entry>,
    by_id: HashMap<String, Entry>,
}

/// Memoises directory lookups for `ttl`. Realtime events patch cached rows
/// in place; everything else waits for expiry or [`invalidate`].
///
/// [`invalidate`]: StreamDirectoryCache::invalidate
pub struct StreamDirectoryCache {
    directory: Arc<dyn StreamDirectory>,
    ttl: Duration,
    entries: Mutex<Entries>,
}

impl StreamDirectoryCache {
    pub fn new(directory: Arc<dyn StreamDirectory>) -> Self {
        Self::with_ttl(directory, Duration::from_secs(DIRECTORY_TTL_SECS))
    }

    /// Cache with the lifetime configured by `ZKTV_DIRECTORY_TTL_SECS`.
    pub fn from_config(directory: Arc<dyn StreamDirectory>, config: &LiveConfig) -> Self {
        Self::with_ttl(directory, config.directory_ttl)
    }

    pub fn with_ttl(directory: Arc<dyn StreamDirectory>, ttl: Duration) -> Self {
        Self {
            directory,
            ttl,
            entries: Mutex::new(Entries::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn fresh(&self, entry: Option<&Entry>) -> Option<Option<StreamInfo>> {
        entry
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.stream.clone())
    }

    pub async fn active_stream(&self, channel: &str) -> Result<Option<StreamInfo>, ApiError> {
        if let Some(hit) = self.fresh(self.lock().by_channel.get(channel)) {
            debug!("directory cache hit for channel {channel}");
            return Ok(hit);
        }
        let stream = self.directory.active_stream(channel).await?;
        let entry = Entry {
            stream: stream.clone(),
            fetched_at: Instant::now(),
        };
        let mut entries = self.lock();
        if let Some(stream) = &stream {
            entries.by_id.insert(stream.id.clone(), entry.clone());
        }
        entries.by_channel.insert(channel.to_string(), entry);
        Ok(stream)
    }

    pub async fn stream_by_id(&self, stream_id: &str) -> Result<Option<StreamInfo>, ApiError> {
        if let Some(hit) = self.fresh(self.lock().by_id.get(stream_id)) {
            return Ok(hit);
        }
        let stream = self.directory.stream_by_id(stream_id).await?;
        self.lock().by_id.insert(
            stream_id.to_string(),
            Entry {
                stream: stream.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(stream)
    }

    /// Patch cached rows with a realtime event. Returns whether anything
    /// cached changed.
    pub fn apply(&self, event: &RealtimeEvent) -> bool {
        let mut guard = self.lock();
        let entries = &mut *guard;
        let mut changed = false;
        for entry in entries
            .by_id
            .values_mut()
            .chain(entries.by_channel.values_mut())
        {
            if let Some(stream) = entry.stream.as_mut() {
                changed |= event.apply_to(stream);
            }
        }
        if let RealtimeEvent::StreamUpdated(stream) = event {
            // A channel that went live is cached as live right away.
            if stream.is_live() {
                let slot = entries
                    .by_channel
                    .entry(stream.channel_name.clone())
                    .or_insert_with(|| Entry {
                        stream: None,
                        fetched_at: Instant::now(),
                    });
                if slot.stream.as_ref().map(|s| &s.id) != Some(&stream.id) {
                    slot.stream = Some(stream.clone());
                    slot.fetched_at = Instant::now();
                    changed = true;
                }
            } else if let Some(slot) = entries.by_channel.get_mut(&stream.channel_name) {
                if slot.stream.as_ref().is_some_and(|s| s.id == stream.id) {
                    slot.stream = None;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Forget one channel, or everything when `channel` is `None`.
    pub fn invalidate(&self, channel: Option<&str>) {
        let mut entries = self.lock();
        match channel {
            Some(channel) => {
                let removed = entries.by_channel.remove(channel);
                if let Some(Entry {
                    stream: Some(stream),
                    ..
                }) = removed
                {
                    entries.by_id.remove(&stream.id);
                }
            }
            None => {
                entries.by_channel.clear();
                entries.by_id.clear();
            }
        }
    }
}
