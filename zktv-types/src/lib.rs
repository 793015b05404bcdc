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

pub mod callback;
pub mod feature_flags;
pub mod messaging;
pub mod presence;
pub mod realtime;
pub mod stream;

pub use callback::Callback;
pub use feature_flags::FeatureFlags;
pub use messaging::{NotificationKind, SendMessageRequest, SendMessageResponse};
pub use presence::ViewerSession;
pub use realtime::RealtimeEvent;
pub use stream::StreamInfo;
