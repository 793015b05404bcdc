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

//! Cancellable background tasks.
//!
//! Every timer the live core owns (reconnect backoff, heartbeat loop,
//! publish rechecks) runs as a spawned task behind a [`TaskHandle`].
//! Dropping the handle aborts the task.

use std::future::Future;
use tokio::task::JoinHandle;

/// A spawned task that is aborted when the handle is dropped.
///
/// **Important:** A tokio runtime must be active when [`spawn`] is called.
#[derive(Debug)]
pub struct TaskHandle {
    handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a task owned by the returned handle.
pub fn spawn<F: Future<Output = ()> + Send + 'static>(future: F) -> TaskHandle {
    TaskHandle {
        handle: Some(tokio::spawn(future)),
    }
}

/// Spawn a task nobody waits for, e.g. a one-shot event handler.
pub fn spawn_detached<F: Future<Output = ()> + Send + 'static>(future: F) {
    tokio::spawn(future);
}
