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

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::info;
use zktv_api_client::BackendClient;
use zktv_cli::cli_args::Watch;
use zktv_client::platform::spawn;
use zktv_client::realtime::follow_stream_events;
use zktv_client::{FileSessionStore, PresenceOptions, StreamDirectoryCache, ViewerPresenceTracker};
use zktv_types::{Callback, RealtimeEvent};

pub async fn watch(opt: Watch, backend: BackendClient) -> anyhow::Result<()> {
    let backend = Arc::new(backend);
    let stream_id = match opt.stream_id.clone() {
        Some(id) => id,
        None => backend
            .active_stream(&opt.channel)
            .await?
            .map(|stream| stream.id)
            .ok_or_else(|| anyhow!("no active stream on channel {}", opt.channel))?,
    };

    let options = PresenceOptions {
        auth_error_threshold: opt.auth_error_threshold,
        ..PresenceOptions::default()
    };
    let tracker = ViewerPresenceTracker::new(
        backend.clone(),
        Arc::new(FileSessionStore::new(opt.session_file.clone())),
        &opt.channel,
        &stream_id,
        opt.user_id.clone(),
        options,
    );
    info!(
        "watching stream {stream_id} as session {}",
        tracker.session_id()
    );
    tracker.start();

    // Stream end stops the session like closing the page does.
    let (ended_tx, mut ended) = mpsc::unbounded_channel();
    let watched = stream_id.clone();
    let on_event = Callback::from(move |event: RealtimeEvent| match &event {
        RealtimeEvent::StreamUpdated(stream) if stream.id == watched && !stream.is_live() => {
            let _ = ended_tx.send(());
        }
        _ => {}
    });
    let source = super::stream_events(&backend, &opt.channel).await;
    let cache = Arc::new(StreamDirectoryCache::new(backend.clone()));
    let _follower = spawn(follow_stream_events(source, cache, on_event));

    let deadline = async {
        match opt.duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        _ = deadline => info!("duration elapsed"),
        Some(()) = ended.recv() => info!("stream {stream_id} ended"),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupted");
        }
    }

    tracker.stop().await;
    info!("session {} marked inactive", tracker.session_id());
    Ok(())
}
