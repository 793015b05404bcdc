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
 */

//! Messaging edge function. Fully decoupled from the video core.

use log::info;
use zktv_types::{SendMessageRequest, SendMessageResponse};

use crate::error::ApiError;
use crate::{parse_json, BackendClient};

const SEND_MESSAGE_PATH: &str = "/functions/v1/send-whatsapp";

impl BackendClient {
    /// Send a free-text or template message.
    ///
    /// Calls `POST /functions/v1/send-whatsapp`.
    pub async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, ApiError> {
        if request.message.is_none() == request.template_name.is_none() {
            return Err(ApiError::Config(
                "exactly one of message or templateName must be set".to_string(),
            ));
        }
        let response = self.post(SEND_MESSAGE_PATH).json(request).send().await?;
        let sent: SendMessageResponse = parse_json(response).await?;
        info!("message {} to {} is {}", sent.message_id, request.to, sent.status);
        Ok(sent)
    }
}
