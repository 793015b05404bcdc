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

//! The live-video core of ZK TV.  It owns everything between the UI and the
//! RTC SDK: joining the fixed channel, reconnecting after unexpected drops,
//! publishing local tracks with the live-track invariant, subscribing to the
//! host's tracks, keeping a viewer's presence row alive, and following the
//! stream directory in real time.
//!
//! The crate makes no assumptions about the UI.  The SDK, the browser media
//! APIs and the render surface are reached through the traits in [`rtc`],
//! [`media_devices`] and [`tracks`], so the same state machines drive a web
//! frontend, a native shell or the mocks in the test suite.
//!
//! # Outline of usage
//!
//! ## Session creation and joining:
//! ```ignore
//! let options = LiveSessionOptions::from_config(&config, ClientRole::Host);
//! let session = LiveSession::new(options, rtc, surface, tracks);
//! let _events = session.spawn_event_loop(sdk_events);
//!
//! session.join(session.join_params(token, None)).await?;
//! session.start_stream(&camera_id, Some(&mic_id)).await?;
//! session.stop_stream().await?;
//! session.leave().await;
//! ```
//!
//! ## Viewer presence:
//! ```ignore
//! let tracker = ViewerPresenceTracker::new(store, ids, channel, stream_id, None, Default::default());
//! tracker.start();
//! tracker.stop().await;
//! ```
//!
//! ## Following streams:
//! ```ignore
//! let cache = Arc::new(StreamDirectoryCache::new(directory.clone()));
//! let source = select_event_source(PushEventSource::connect(&realtime).await, poll);
//! follow_stream_events(source, cache, on_event).await;
//! ```

pub mod backend;
pub mod config;
pub mod connection;
pub mod constants;
pub mod directory;
pub mod error;
pub mod event_bus;
pub mod events;
pub mod gestures;
pub mod media_devices;
pub mod platform;
pub mod presence;
pub mod realtime;
pub mod rtc;
pub mod tracks;
pub mod utils;

pub use config::LiveConfig;
pub use connection::{ConnectionState, LiveSession, LiveSessionOptions, ReconnectPolicy};
pub use directory::{StreamDirectory, StreamDirectoryCache};
pub use error::{LiveError, Result};
pub use event_bus::EventBus;
pub use events::ClientEvent;
pub use gestures::{GestureController, OverlayAction};
pub use media_devices::{DeviceEnumerator, DeviceKind, MediaDeviceInfo, MediaDeviceList};
pub use presence::{
    FileSessionStore, MemorySessionStore, PresenceOptions, PresenceStore, ViewerPresenceTracker,
};
pub use realtime::{
    follow_stream_events, select_event_source, EventSource, PollEventSource, PushEventSource,
};
pub use rtc::{ClientRole, JoinParams, LocalTrack, MediaFactory, RemoteTrack, RtcClient, RtcError};
pub use tracks::{LocalTrackManager, RenderSurface};
