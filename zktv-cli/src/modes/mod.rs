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

use tracing::warn;
use zktv_api_client::{BackendClient, RealtimeClient};
use zktv_client::realtime::{select_event_source, EventSource, PollEventSource, PushEventSource};

pub mod notify;
pub mod streams;
pub mod watch;

/// Realtime push when the socket opens, directory polling otherwise.
async fn stream_events(backend: &Arc<BackendClient>, channel: &str) -> Box<dyn EventSource> {
    let push = match RealtimeClient::from_backend(backend) {
        Ok(client) => PushEventSource::connect(&client).await,
        Err(e) => {
            warn!("realtime is unavailable: {e}");
            None
        }
    };
    select_event_source(push, PollEventSource::new(backend.clone(), channel))
}
