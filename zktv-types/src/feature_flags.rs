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

//! Feature flags for the live client.
//!
//! Flags are loaded lazily from environment variables on first access.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

/// Environment variable prefix for feature flags
const ENV_PREFIX: &str = "FEATURE_";

/// Override states for testing
const OVERRIDE_NONE: u8 = 0;
const OVERRIDE_TRUE: u8 = 1;
const OVERRIDE_FALSE: u8 = 2;

static DESKTOP_AUDIO_OVERRIDE: AtomicU8 = AtomicU8::new(OVERRIDE_NONE);
static REALTIME_PUSH_OVERRIDE: AtomicU8 = AtomicU8::new(OVERRIDE_NONE);

/// Feature flags singleton, lazily initialized from environment variables.
#[derive(Debug, Clone)]
pub struct FeatureFlags {
    /// Allow hosts to capture and publish desktop audio.
    /// Env: FEATURE_DESKTOP_AUDIO=true (default: false)
    pub desktop_audio: bool,

    /// Prefer the realtime websocket over directory polling.
    /// Env: FEATURE_REALTIME_PUSH=false to force polling (default: true)
    pub realtime_push: bool,
}

impl FeatureFlags {
    fn from_env() -> Self {
        Self {
            desktop_audio: read_bool_env("DESKTOP_AUDIO", false),
            realtime_push: read_bool_env("REALTIME_PUSH", true),
        }
    }

    /// Get the global feature flags instance.
    pub fn global() -> &'static Self {
        static FLAGS: OnceLock<FeatureFlags> = OnceLock::new();
        FLAGS.get_or_init(FeatureFlags::from_env)
    }

    #[inline]
    pub fn desktop_audio_enabled() -> bool {
        resolve(&DESKTOP_AUDIO_OVERRIDE, Self::global().desktop_audio)
    }

    #[inline]
    pub fn realtime_push_enabled() -> bool {
        resolve(&REALTIME_PUSH_OVERRIDE, Self::global().realtime_push)
    }

    /// Only available with the `testing` feature enabled.
    #[cfg(any(test, feature = "testing"))]
    pub fn set_desktop_audio_override(enabled: bool) {
        DESKTOP_AUDIO_OVERRIDE.store(encode(enabled), Ordering::SeqCst);
    }

    /// Only available with the `testing` feature enabled.
    #[cfg(any(test, feature = "testing"))]
    pub fn set_realtime_push_override(enabled: bool) {
        REALTIME_PUSH_OVERRIDE.store(encode(enabled), Ordering::SeqCst);
    }

    /// Restore env-based behaviour for every flag.
    #[cfg(any(test, feature = "testing"))]
    pub fn clear_overrides() {
        DESKTOP_AUDIO_OVERRIDE.store(OVERRIDE_NONE, Ordering::SeqCst);
        REALTIME_PUSH_OVERRIDE.store(OVERRIDE_NONE, Ordering::SeqCst);
    }
}

fn resolve(slot: &AtomicU8, fallback: bool) -> bool {
    match slot.load(Ordering::SeqCst) {
        OVERRIDE_TRUE => true,
        OVERRIDE_FALSE => false,
        _ => fallback,
    }
}

#[cfg(any(test, feature = "testing"))]
fn encode(enabled: bool) -> u8 {
    if enabled {
        OVERRIDE_TRUE
    } else {
        OVERRIDE_FALSE
    }
}

/// Read a boolean environment variable with the FEATURE_ prefix.
fn read_bool_env(name: &str, default: bool) -> bool {
    let full_name = format!("{ENV_PREFIX}{name}");
    match std::env::var(&full_name) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bool_env_falls_back_to_default() {
        std::env::remove_var("FEATURE_ZKTV_UNSET");
        assert!(!read_bool_env("ZKTV_UNSET", false));
        assert!(read_bool_env("ZKTV_UNSET", true));
    }

    #[test]
    fn test_read_bool_env_parses_values() {
        std::env::set_var("FEATURE_ZKTV_YES", "YES");
        assert!(read_bool_env("ZKTV_YES", false));

        std::env::set_var("FEATURE_ZKTV_OFF", "off");
        assert!(!read_bool_env("ZKTV_OFF", true));

        std::env::remove_var("FEATURE_ZKTV_YES");
        std::env::remove_var("FEATURE_ZKTV_OFF");
    }

    #[test]
    fn test_override_wins_over_env() {
        FeatureFlags::set_desktop_audio_override(true);
        assert!(FeatureFlags::desktop_audio_enabled());
        FeatureFlags::set_desktop_audio_override(false);
        assert!(!FeatureFlags::desktop_audio_enabled());
        FeatureFlags::clear_overrides();
    }
}
