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

//! Deployment configuration loaded from environment variables.

use std::env;
use std::time::Duration;
use zktv_api_client::{AuthMode, BackendClient};

use crate::constants::{
    DEFAULT_CHANNEL, DIRECTORY_TTL_SECS, PRESENCE_AUTH_ERROR_THRESHOLD, RECONNECT_MAX_ATTEMPTS,
};
use crate::error::{LiveError, Result};

/// Configuration for a live client deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConfig {
    /// RTC application id.
    pub rtc_app_id: String,
    /// The single physical RTC channel every logical stream is broadcast on.
    pub rtc_channel: String,
    /// Backend project URL. `None` disables presence and directory lookups.
    pub backend_url: Option<String>,
    pub backend_anon_key: Option<String>,
    pub reconnect_max_attempts: u32,
    pub presence_auth_error_threshold: u32,
    pub directory_ttl: Duration,
}

impl LiveConfig {
    /// Load configuration from environment variables.
    ///
    /// # Required
    /// - `ZKTV_RTC_APP_ID`
    ///
    /// # Optional
    /// - `ZKTV_RTC_CHANNEL` (default: `"zktv"`)
    /// - `ZKTV_BACKEND_URL`, `ZKTV_BACKEND_ANON_KEY` (both or neither)
    /// - `ZKTV_RECONNECT_MAX_ATTEMPTS` (default: `6`)
    /// - `ZKTV_PRESENCE_AUTH_ERROR_THRESHOLD` (default: `5`)
    /// - `ZKTV_DIRECTORY_TTL_SECS` (default: `30`)
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_vars<F: Fn(&str) -> Option<String>>(var: F) -> Result<Self> {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let rtc_app_id = non_empty("ZKTV_RTC_APP_ID").ok_or_else(|| {
            LiveError::Config("ZKTV_RTC_APP_ID environment variable is required".to_string())
        })?;
        let rtc_channel =
            non_empty("ZKTV_RTC_CHANNEL").unwrap_or_else(|| DEFAULT_CHANNEL.to_string());

        let backend_url = non_empty("ZKTV_BACKEND_URL");
        let backend_anon_key = non_empty("ZKTV_BACKEND_ANON_KEY");
        if backend_url.is_some() != backend_anon_key.is_some() {
            return Err(LiveError::Config(
                "ZKTV_BACKEND_URL and ZKTV_BACKEND_ANON_KEY must be set together".to_string(),
            ));
        }

        let reconnect_max_attempts = parse_or(
            non_empty("ZKTV_RECONNECT_MAX_ATTEMPTS"),
            "ZKTV_RECONNECT_MAX_ATTEMPTS",
            RECONNECT_MAX_ATTEMPTS,
        )?;
        let presence_auth_error_threshold = parse_or(
            non_empty("ZKTV_PRESENCE_AUTH_ERROR_THRESHOLD"),
            "ZKTV_PRESENCE_AUTH_ERROR_THRESHOLD",
            PRESENCE_AUTH_ERROR_THRESHOLD,
        )?;
        let directory_ttl_secs = parse_or(
            non_empty("ZKTV_DIRECTORY_TTL_SECS"),
            "ZKTV_DIRECTORY_TTL_SECS",
            DIRECTORY_TTL_SECS,
        )?;

        if reconnect_max_attempts == 0 {
            return Err(LiveError::Config(
                "ZKTV_RECONNECT_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            rtc_app_id,
            rtc_channel,
            backend_url,
            backend_anon_key,
            reconnect_max_attempts,
            presence_auth_error_threshold: presence_auth_error_threshold.max(1),
            directory_ttl: Duration::from_secs(directory_ttl_secs),
        })
    }

    /// A backend client authenticated as an anonymous visitor.
    pub fn backend_client(&self) -> Result<BackendClient> {
        match (&self.backend_url, &self.backend_anon_key) {
            (Some(url), Some(key)) => Ok(BackendClient::new(url, key, AuthMode::Anonymous)),
            _ => Err(LiveError::Config(
                "ZKTV_BACKEND_URL is not configured".to_string(),
            )),
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, name: &str, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| LiveError::Config(format!("{name} must be a valid integer"))),
        None => Ok(default),
    }
}
