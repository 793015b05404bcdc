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

//! Integration tests for the viewer presence tracker.

mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use zktv_client::error::LiveError;
use zktv_client::presence::{
    session_id_for, BeatOutcome, MemorySessionStore, PresenceOptions, PresenceState,
    ViewerPresenceTracker,
};

const CHANNEL: &str = "zktv";
const STREAM: &str = "stream-1";

fn tracker_with(
    store: &Arc<MockPresenceStore>,
    ids: &Arc<MemorySessionStore>,
    options: PresenceOptions,
) -> ViewerPresenceTracker {
    ViewerPresenceTracker::new(store.clone(), ids.clone(), CHANNEL, STREAM, None, options)
}

fn seeded(seed: u64) -> PresenceOptions {
    PresenceOptions {
        rng_seed: Some(seed),
        ..PresenceOptions::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_timing_stays_within_jitter_bounds() {
    for seed in 0..8 {
        let store = MockPresenceStore::new();
        let ids = Arc::new(MemorySessionStore::default());
        let tracker = tracker_with(&store, &ids, seeded(seed));

        let started = Instant::now();
        assert!(tracker.start());
        tokio::time::sleep(Duration::from_secs(300)).await;
        drop(tracker);

        let calls = store.timed_calls();
        assert!(matches!(calls[0].0, PresenceCall::Upsert(_)));
        assert_eq!(calls[0].1, started);

        let touches = store.touch_times();
        assert!(touches.len() >= 8, "seed {seed}: {} beats", touches.len());
        let first = touches[0] - started;
        assert!(first <= Duration::from_millis(15_000), "seed {seed}: first {first:?}");
        for gap in touches.windows(2).map(|w| w[1] - w[0]) {
            assert!(
                gap >= Duration::from_millis(25_000) && gap <= Duration::from_millis(35_000),
                "seed {seed}: gap {gap:?}"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_viewers_do_not_beat_in_lockstep() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let a = tracker_with(&store, &ids, seeded(1));
    let b = ViewerPresenceTracker::new(
        store.clone(),
        ids.clone(),
        "other-channel",
        STREAM,
        None,
        seeded(2),
    );
    a.start();
    b.start();
    tokio::time::sleep(Duration::from_secs(20)).await;

    let touches = store.touch_times();
    assert_eq!(touches.len(), 2);
    assert_ne!(touches[0], touches[1]);
}

#[tokio::test(start_paused = true)]
async fn test_light_path_reuses_session() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(3));
    let sid = tracker.session_id();

    tracker.track_viewer().await.unwrap();
    assert_eq!(tracker.state(), PresenceState::Tracked);
    assert_eq!(tracker.beat().await, BeatOutcome::Touched);
    assert_eq!(tracker.beat().await, BeatOutcome::Touched);

    assert_eq!(
        store.calls(),
        vec![
            PresenceCall::Upsert(sid.clone()),
            PresenceCall::Touch(sid.clone()),
            PresenceCall::Touch(sid),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_track_viewer_is_idempotent() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(3));
    let sid = tracker.session_id();

    tracker.track_viewer().await.unwrap();
    tracker.track_viewer().await.unwrap();
    assert_eq!(
        store.calls(),
        vec![PresenceCall::Upsert(sid.clone()), PresenceCall::Upsert(sid)]
    );
    assert_eq!(tracker.state(), PresenceState::Tracked);
}

#[tokio::test(start_paused = true)]
async fn test_failed_touch_falls_back_to_upsert() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(4));
    let sid = tracker.session_id();
    tracker.track_viewer().await.unwrap();

    store.queue_touch(&[Reply::Server]);
    assert_eq!(tracker.beat().await, BeatOutcome::Recovered);
    assert_eq!(tracker.beat().await, BeatOutcome::Touched);

    assert_eq!(
        store.calls(),
        vec![
            PresenceCall::Upsert(sid.clone()),
            PresenceCall::Touch(sid.clone()),
            PresenceCall::Upsert(sid.clone()),
            PresenceCall::Touch(sid),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_lost_session_is_recreated_on_next_beat() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(5));
    tracker.track_viewer().await.unwrap();

    store.queue_touch(&[Reply::Server]);
    store.queue_upsert(&[Reply::Server]);
    assert!(matches!(tracker.beat().await, BeatOutcome::Failed(_)));
    assert_eq!(tracker.state(), PresenceState::Uninitialized);

    assert_eq!(tracker.beat().await, BeatOutcome::Upserted);
    assert_eq!(tracker.state(), PresenceState::Tracked);
}

#[tokio::test(start_paused = true)]
async fn test_auth_errors_swallowed_until_threshold_then_recreated() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(6));
    let original = tracker.session_id();
    tracker.track_viewer().await.unwrap();

    store.queue_touch(&[Reply::Auth; 5]);
    for count in 1..5 {
        assert_eq!(
            tracker.beat().await,
            BeatOutcome::AuthErrorSwallowed { count }
        );
        assert_eq!(tracker.session_id(), original);
    }
    assert_eq!(tracker.beat().await, BeatOutcome::Recreated);

    let fresh = tracker.session_id();
    assert_ne!(fresh, original);
    assert_eq!(session_id_for(ids.as_ref(), CHANNEL), fresh);
    assert_eq!(tracker.auth_error_count(), 0);
    assert_eq!(tracker.state(), PresenceState::Tracked);
    assert_eq!(store.calls().last(), Some(&PresenceCall::Upsert(fresh)));

    assert_eq!(tracker.beat().await, BeatOutcome::Touched);
}

#[tokio::test(start_paused = true)]
async fn test_auth_threshold_is_tunable() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let options = PresenceOptions {
        auth_error_threshold: 2,
        ..seeded(7)
    };
    let tracker = tracker_with(&store, &ids, options);
    tracker.track_viewer().await.unwrap();

    store.set_default_touch(Reply::Auth);
    assert_eq!(
        tracker.beat().await,
        BeatOutcome::AuthErrorSwallowed { count: 1 }
    );
    assert_eq!(tracker.beat().await, BeatOutcome::Recreated);
}

#[tokio::test(start_paused = true)]
async fn test_successful_touch_resets_auth_errors() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(8));
    tracker.track_viewer().await.unwrap();

    store.queue_touch(&[Reply::Auth, Reply::Auth, Reply::Ok]);
    tracker.beat().await;
    tracker.beat().await;
    assert_eq!(tracker.auth_error_count(), 2);
    assert_eq!(tracker.beat().await, BeatOutcome::Touched);
    assert_eq!(tracker.auth_error_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_track_viewer_classifies_errors() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(9));

    store.queue_upsert(&[Reply::Auth, Reply::Server]);
    assert!(matches!(
        tracker.track_viewer().await,
        Err(LiveError::AuthTransient(_))
    ));
    assert!(matches!(
        tracker.track_viewer().await,
        Err(LiveError::Api(_))
    ));
    assert_eq!(tracker.state(), PresenceState::Uninitialized);
}

#[tokio::test(start_paused = true)]
async fn test_session_id_is_shared_per_channel() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let a = tracker_with(&store, &ids, seeded(1));
    let b = tracker_with(&store, &ids, seeded(2));
    assert_eq!(a.session_id(), b.session_id());

    let other = ViewerPresenceTracker::new(
        store.clone(),
        ids.clone(),
        "other-channel",
        STREAM,
        None,
        seeded(3),
    );
    assert_ne!(other.session_id(), a.session_id());
}

#[tokio::test(start_paused = true)]
async fn test_only_one_loop_per_tracker() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(10));

    assert!(tracker.start());
    assert!(!tracker.start());
    assert!(tracker.is_running());

    tokio::time::sleep(Duration::from_secs(100)).await;
    let upserts = store
        .calls()
        .iter()
        .filter(|c| matches!(c, PresenceCall::Upsert(_)))
        .count();
    assert_eq!(upserts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_loop_and_deactivates() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(11));
    let sid = tracker.session_id();

    tracker.start();
    tokio::time::sleep(Duration::from_secs(40)).await;
    tracker.stop().await;

    assert!(!tracker.is_running());
    assert_eq!(tracker.state(), PresenceState::Uninitialized);
    assert_eq!(store.calls().last(), Some(&PresenceCall::Deactivate(sid)));

    let before = store.calls().len();
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(store.calls().len(), before);

    // A stopped tracker can be started again.
    assert!(tracker.start());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_tracker_cancels_loop() {
    let store = MockPresenceStore::new();
    let ids = Arc::new(MemorySessionStore::default());
    let tracker = tracker_with(&store, &ids, seeded(12));
    tracker.start();
    tokio::time::sleep(Duration::from_secs(40)).await;
    drop(tracker);

    let before = store.calls().len();
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(store.calls().len(), before);
}
