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

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use zktv_api_client::{AuthMode, BackendClient};
use zktv_types::NotificationKind;

/// ZK TV CLI
///
/// Talks to the ZK TV backend the same way the live page does: reads the
/// stream directory, keeps a viewer session alive and sends notifications.
///
/// Backend credentials come from `ZKTV_BACKEND_URL` and
/// `ZKTV_BACKEND_ANON_KEY` unless passed on the command line.
#[derive(Parser, Debug)]
#[clap(name = "zktv-cli")]
pub struct Opt {
    #[clap(flatten)]
    pub backend: Backend,

    #[clap(subcommand)]
    pub mode: Mode,
}

#[derive(Args, Debug, Clone)]
pub struct Backend {
    /// Backend project URL.
    #[clap(long = "backend-url", env = "ZKTV_BACKEND_URL", global = true)]
    pub url: Option<String>,

    /// Public anon key sent as `apikey`.
    #[clap(
        long = "anon-key",
        env = "ZKTV_BACKEND_ANON_KEY",
        global = true,
        hide_env_values = true
    )]
    pub anon_key: Option<String>,
}

impl Backend {
    /// An anonymous backend client, the same identity a page visitor has.
    pub fn client(&self) -> anyhow::Result<BackendClient> {
        let url = self
            .url
            .as_deref()
            .context("--backend-url or ZKTV_BACKEND_URL is required")?;
        let anon_key = self
            .anon_key
            .as_deref()
            .context("--anon-key or ZKTV_BACKEND_ANON_KEY is required")?;
        Ok(BackendClient::new(url, anon_key, AuthMode::Anonymous))
    }
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Show the active stream of a channel.
    Streams(Streams),

    /// Register as a viewer and keep the session alive until interrupted.
    Watch(Watch),

    /// Send a WhatsApp notification through the messaging function.
    Notify(Notify),
}

#[derive(Args, Debug, Clone)]
pub struct Streams {
    #[clap(long = "channel", env = "ZKTV_RTC_CHANNEL", default_value = "zktv")]
    pub channel: String,

    /// Keep running and print stream events as they arrive.
    #[clap(long = "follow", short = 'f')]
    pub follow: bool,

    /// Directory cache lifetime in seconds.
    #[clap(long = "ttl-secs", env = "ZKTV_DIRECTORY_TTL_SECS", default_value = "30")]
    pub ttl_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct Watch {
    #[clap(long = "channel", env = "ZKTV_RTC_CHANNEL", default_value = "zktv")]
    pub channel: String,

    /// Watch this stream instead of the channel's active one.
    #[clap(long = "stream-id")]
    pub stream_id: Option<String>,

    #[clap(long = "user-id")]
    pub user_id: Option<String>,

    /// Where session ids are remembered between runs.
    #[clap(long = "session-file", default_value = ".zktv-sessions.json")]
    pub session_file: PathBuf,

    /// Stop after this many seconds. Runs until Ctrl-C otherwise.
    #[clap(long = "duration-secs")]
    pub duration_secs: Option<u64>,

    /// Auth-class heartbeat failures tolerated before the session is recreated.
    #[arg(
        long,
        env = "ZKTV_PRESENCE_AUTH_ERROR_THRESHOLD",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub auth_error_threshold: u32,
}

#[derive(Args, Debug, Clone)]
#[clap(group = ArgGroup::new("body").required(true))]
pub struct Notify {
    /// Recipient phone number, digits with an optional leading `+`.
    #[clap(long = "to")]
    pub to: PhoneNumber,

    /// Free-text message.
    #[clap(long = "message", group = "body")]
    pub message: Option<String>,

    /// Registered template to send instead of free text.
    #[clap(long = "template", value_enum, group = "body")]
    pub template: Option<Template>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    Registration,
    NumberAssignment,
    WinnerAnnouncement,
}

impl From<Template> for NotificationKind {
    fn from(template: Template) -> Self {
        match template {
            Template::Registration => NotificationKind::Registration,
            Template::NumberAssignment => NotificationKind::NumberAssignment,
            Template::WinnerAnnouncement => NotificationKind::WinnerAnnouncement,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParsePhoneNumberError {
    #[error("phone number must contain only digits after an optional '+': {0}")]
    InvalidCharacter(String),
    #[error("phone number must have 8 to 15 digits, got {0}")]
    InvalidLength(usize),
}

impl FromStr for PhoneNumber {
    type Err = ParsePhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
        let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParsePhoneNumberError::InvalidCharacter(s.to_string()));
        }
        if !(8..=15).contains(&digits.len()) {
            return Err(ParsePhoneNumberError::InvalidLength(digits.len()));
        }
        Ok(PhoneNumber(cleaned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_number_accepts_formatted_input() {
        let phone: PhoneNumber = "+55 11 99999-9999".parse().unwrap();
        assert_eq!(phone.as_str(), "+5511999999999");
    }

    #[test]
    fn test_phone_number_rejects_garbage() {
        assert_eq!(
            "12ab5678".parse::<PhoneNumber>(),
            Err(ParsePhoneNumberError::InvalidCharacter("12ab5678".to_string()))
        );
        assert_eq!(
            "+123".parse::<PhoneNumber>(),
            Err(ParsePhoneNumberError::InvalidLength(3))
        );
    }

    #[test]
    fn test_notify_requires_exactly_one_body() {
        let both = Opt::try_parse_from([
            "zktv-cli",
            "notify",
            "--to",
            "+5511999999999",
            "--message",
            "oi",
            "--template",
            "registration",
        ]);
        assert!(both.is_err());

        let neither = Opt::try_parse_from(["zktv-cli", "notify", "--to", "+5511999999999"]);
        assert!(neither.is_err());
    }

    #[test]
    fn test_notify_template_maps_to_notification_kind() {
        let opt = Opt::try_parse_from([
            "zktv-cli",
            "notify",
            "--to",
            "+5511999999999",
            "--template",
            "winner-announcement",
        ])
        .unwrap();
        match opt.mode {
            Mode::Notify(notify) => {
                let kind: NotificationKind = notify.template.unwrap().into();
                assert_eq!(kind, NotificationKind::WinnerAnnouncement);
            }
            other => panic!("unexpected mode {other:?}"),
        }
    }

    #[test]
    fn test_backend_client_requires_credentials() {
        let backend = Backend {
            url: Some("https://example.supabase.co".to_string()),
            anon_key: None,
        };
        assert!(backend.client().is_err());
    }

    #[test]
    fn test_watch_rejects_zero_auth_threshold() {
        let opt = Opt::try_parse_from(["zktv-cli", "watch", "--auth-error-threshold", "0"]);
        assert!(opt.is_err());
    }
}
