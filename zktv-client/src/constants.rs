// Reconnection
pub const RECONNECT_MAX_ATTEMPTS: u32 = 6;
pub const RECONNECT_BASE_DELAY_MS: u64 = 1_000;
pub const RECONNECT_MAX_DELAY_MS: u64 = 30_000;

// Publish invariant re-check after the SDK resolves publish()
pub const PUBLISH_RECHECK_DELAY_MS: u64 = 100;

// Remote track polling after subscribe() resolves without a track object
pub const REMOTE_TRACK_POLL_ATTEMPTS: u32 = 10;
pub const REMOTE_TRACK_POLL_INTERVAL_MS: u64 = 500;

// Viewer presence
pub const HEARTBEAT_FIRST_JITTER_MAX_MS: u64 = 15_000;
pub const HEARTBEAT_INTERVAL_MS: u64 = 30_000;
pub const HEARTBEAT_INTERVAL_JITTER_MS: u64 = 5_000;
pub const PRESENCE_AUTH_ERROR_THRESHOLD: u32 = 5;
pub const SESSION_KEY_PREFIX: &str = "zktv_viewer_session_";

// Stream directory
pub const DIRECTORY_TTL_SECS: u64 = 30;
pub const DIRECTORY_POLL_INTERVAL_MS: u64 = 10_000;

// Microphone
pub const DEFAULT_MIC_VOLUME: u8 = 100;

// Fixed broadcast channel when none is configured
pub const DEFAULT_CHANNEL: &str = "zktv";
