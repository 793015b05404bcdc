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

//! Per-session event bus for client events.
//!
//! A MPMC broadcast channel: every subscriber receives every event emitted
//! after it subscribed. Each [`LiveSession`](crate::LiveSession) owns its own
//! bus so two sessions never see each other's events.
//!
//! ```ignore
//! let mut rx = session.events().subscribe();
//! tokio::spawn(async move {
//!     while let Ok(event) = rx.recv().await {
//!         if let ClientEvent::ReloadRequired(msg) = event {
//!             show_blocking_error(&msg);
//!         }
//!     }
//! });
//! ```

use crate::events::ClientEvent;
use async_broadcast::{broadcast, InactiveReceiver, Receiver, Sender};
use log::trace;

/// Capacity of the event bus channel
pub const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    sender: Sender<ClientEvent>,
    // Keeps the channel open while nobody is listening.
    _keepalive: InactiveReceiver<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (mut sender, receiver) = broadcast(EVENT_BUS_CAPACITY);
        // Slow subscribers lose the oldest events instead of blocking emitters.
        sender.set_overflow(true);
        Self {
            sender,
            _keepalive: receiver.deactivate(),
        }
    }

    /// Receive all future events.
    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        self.sender.new_receiver()
    }

    /// Non-blocking. Dropped silently when nobody is subscribed.
    pub fn emit(&self, event: ClientEvent) {
        if let Err(e) = self.sender.try_broadcast(event) {
            trace!("client event not delivered: {e}");
        }
    }

    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.emit(ClientEvent::DevicesLoaded);
        bus.emit(ClientEvent::Reconnected);
        assert_eq!(bus.capacity(), EVENT_BUS_CAPACITY);
    }

    #[tokio::test]
    async fn every_subscriber_receives_events() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(ClientEvent::StreamingStarted);

        assert_eq!(rx1.recv().await.unwrap(), ClientEvent::StreamingStarted);
        assert_eq!(rx2.recv().await.unwrap(), ClientEvent::StreamingStarted);
    }

    #[tokio::test]
    async fn late_subscriber_misses_past_events() {
        let bus = EventBus::new();
        bus.emit(ClientEvent::DevicesLoaded);
        let mut rx = bus.subscribe();
        bus.emit(ClientEvent::Reconnected);
        assert_eq!(rx.recv().await.unwrap(), ClientEvent::Reconnected);
    }

    #[tokio::test]
    async fn sessions_do_not_share_events() {
        let a = EventBus::new();
        let b = EventBus::new();
        let mut rx_b = b.subscribe();
        a.emit(ClientEvent::StreamingStarted);
        b.emit(ClientEvent::StreamingStopped);
        assert_eq!(rx_b.recv().await.unwrap(), ClientEvent::StreamingStopped);
    }
}
