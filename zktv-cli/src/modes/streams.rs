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

use tracing::info;
use zktv_api_client::BackendClient;
use zktv_cli::cli_args::Streams;
use zktv_client::realtime::follow_stream_events;
use zktv_client::StreamDirectoryCache;
use zktv_types::{Callback, RealtimeEvent, StreamInfo};

pub async fn streams(opt: Streams, backend: BackendClient) -> anyhow::Result<()> {
    let backend = Arc::new(backend);
    let cache = Arc::new(StreamDirectoryCache::with_ttl(
        backend.clone(),
        Duration::from_secs(opt.ttl_secs),
    ));

    match cache.active_stream(&opt.channel).await? {
        Some(stream) => print_stream(&stream),
        None => println!("No active stream on channel {}", opt.channel),
    }
    if !opt.follow {
        return Ok(());
    }

    let source = super::stream_events(&backend, &opt.channel).await;

    let channel = opt.channel.clone();
    let on_event = Callback::from(move |event: RealtimeEvent| print_event(&channel, &event));
    tokio::select! {
        _ = follow_stream_events(source, cache, on_event) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted, stopping"),
    }
    Ok(())
}

fn print_stream(stream: &StreamInfo) {
    println!("{} [{}]", stream.title, stream.id);
    println!("  channel: {}", stream.channel_name);
    println!("  live:    {}", stream.is_live());
    println!("  viewers: {}", stream.viewer_count);
    if let Some(url) = &stream.hls_url {
        println!("  hls:     {url}");
    }
}

fn print_event(channel: &str, event: &RealtimeEvent) {
    match event {
        RealtimeEvent::StreamUpdated(stream) if stream.channel_name == channel => {
            if stream.is_live() {
                println!("stream {} is live: {}", stream.id, stream.title);
            } else {
                println!("stream {} ended", stream.id);
            }
        }
        RealtimeEvent::StreamUpdated(_) => {}
        RealtimeEvent::ViewerCountUpdated {
            stream_id,
            viewer_count,
        } => println!("stream {stream_id}: {viewer_count} viewers"),
    }
}
