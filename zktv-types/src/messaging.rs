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

//! Payloads of the messaging edge function.

use serde::{Deserialize, Serialize};

/// Which notification a template-based message carries.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Registration,
    NumberAssignment,
    WinnerAnnouncement,
}

impl NotificationKind {
    /// Template name registered with the messaging provider.
    pub fn template_name(self) -> &'static str {
        match self {
            NotificationKind::Registration => "registration_confirmation",
            NotificationKind::NumberAssignment => "number_assignment",
            NotificationKind::WinnerAnnouncement => "winner_announcement",
        }
    }
}

/// `{ to, message | templateName }`. Exactly one of the two is set.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
}

impl SendMessageRequest {
    pub fn text(to: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            message: Some(message.into()),
            template_name: None,
        }
    }

    pub fn template(to: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            to: to.into(),
            message: None,
            template_name: Some(kind.template_name().to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SendMessageResponse {
    pub message_id: String,
    pub status: String,
}
