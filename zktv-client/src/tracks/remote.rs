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

use crate::rtc::{MediaKind, RemoteTrack};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

type Key = (String, MediaKind);

/// Remote publications the audience knows about and the tracks it holds for
/// them.
#[derive(Default)]
pub struct RemoteTracks {
    publications: BTreeSet<(String, u8)>,
    tracks: HashMap<Key, Arc<dyn RemoteTrack>>,
    in_flight: BTreeSet<(String, u8)>,
    autoplay_blocked: BTreeSet<String>,
}

fn ordinal(kind: MediaKind) -> u8 {
    match kind {
        MediaKind::Video => 0,
        MediaKind::Audio => 1,
    }
}

fn kind_of(ordinal: u8) -> MediaKind {
    if ordinal == 0 {
        MediaKind::Video
    } else {
        MediaKind::Audio
    }
}

impl RemoteTracks {
    pub fn note_published(&mut self, uid: &str, kind: MediaKind) {
        self.publications.insert((uid.to_string(), ordinal(kind)));
    }

    /// Known publications, video before audio per user.
    pub fn publications(&self) -> Vec<(String, MediaKind)> {
        self.publications
            .iter()
            .map(|(uid, k)| (uid.clone(), kind_of(*k)))
            .collect()
    }

    /// Claim a subscribe for `(uid, kind)`. False when its track is already
    /// held or another subscribe for it is in flight.
    pub fn begin_subscribe(&mut self, uid: &str, kind: MediaKind) -> bool {
        if self.tracks.contains_key(&(uid.to_string(), kind)) {
            return false;
        }
        self.in_flight.insert((uid.to_string(), ordinal(kind)))
    }

    pub fn finish_subscribe(&mut self, uid: &str, kind: MediaKind) {
        self.in_flight.remove(&(uid.to_string(), ordinal(kind)));
    }

    /// Store `track`, returning the one it replaces.
    pub fn insert(
        &mut self,
        uid: &str,
        kind: MediaKind,
        track: Arc<dyn RemoteTrack>,
    ) -> Option<Arc<dyn RemoteTrack>> {
        self.tracks.insert((uid.to_string(), kind), track)
    }

    pub fn get(&self, uid: &str, kind: MediaKind) -> Option<Arc<dyn RemoteTrack>> {
        self.tracks.get(&(uid.to_string(), kind)).cloned()
    }

    pub fn remove(&mut self, uid: &str, kind: MediaKind) -> Option<Arc<dyn RemoteTrack>> {
        self.publications.remove(&(uid.to_string(), ordinal(kind)));
        if kind == MediaKind::Audio {
            self.autoplay_blocked.remove(uid);
        }
        self.tracks.remove(&(uid.to_string(), kind))
    }

    pub fn remove_user(&mut self, uid: &str) -> Vec<Arc<dyn RemoteTrack>> {
        [MediaKind::Video, MediaKind::Audio]
            .into_iter()
            .filter_map(|kind| self.remove(uid, kind))
            .collect()
    }

    /// Drop everything, returning the tracks that still need stopping.
    pub fn clear(&mut self) -> Vec<Arc<dyn RemoteTrack>> {
        self.publications.clear();
        self.in_flight.clear();
        self.take_tracks()
    }

    /// Hand back the held tracks but keep the publications, so they can be
    /// subscribed again on a new connection.
    pub fn take_tracks(&mut self) -> Vec<Arc<dyn RemoteTrack>> {
        self.autoplay_blocked.clear();
        self.tracks.drain().map(|(_, track)| track).collect()
    }

    pub fn mark_autoplay_blocked(&mut self, uid: &str) {
        self.autoplay_blocked.insert(uid.to_string());
    }

    pub fn take_autoplay_blocked(&mut self) -> Vec<String> {
        std::mem::take(&mut self.autoplay_blocked).into_iter().collect()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn users(&self) -> Vec<String> {
        let users: BTreeSet<&String> = self.publications.iter().map(|(uid, _)| uid).collect();
        users.into_iter().cloned().collect()
    }
}

impl std::fmt::Debug for RemoteTracks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTracks")
            .field("publications", &self.publications)
            .field("tracks", &self.tracks.len())
            .field("in_flight", &self.in_flight)
            .field("autoplay_blocked", &self.autoplay_blocked)
            .finish()
    }
}
