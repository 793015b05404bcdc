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

//! REST and realtime client for the ZK TV backend.
//!
//! The backend follows PostgREST conventions for table access and RPCs,
//! exposes edge functions under `/functions/v1`, and pushes row changes
//! over a Phoenix-protocol websocket.
//!
//! # Example
//!
//! ```no_run
//! use zktv_api_client::{AuthMode, BackendClient};
//!
//! # async fn example() -> Result<(), zktv_api_client::ApiError> {
//! let client = BackendClient::new("https://project.supabase.co", "anon-key", AuthMode::Anonymous);
//! if let Some(stream) = client.active_stream("zktv").await? {
//!     println!("{} is live with {} viewers", stream.title, stream.viewer_count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod messaging;
pub mod presence;
pub mod realtime;
pub mod streams;

pub use error::ApiError;
pub use realtime::{RealtimeClient, RealtimeSubscription};
pub use zktv_types;

use reqwest::Client;

/// How requests are authenticated.
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Anonymous visitor: the anon key doubles as the bearer token.
    Anonymous,
    /// Signed-in user: attach the user's access token.
    Bearer(String),
}

/// A typed client for the backend data and messaging boundaries.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    anon_key: String,
    auth: AuthMode,
    http: Client,
}

impl BackendClient {
    /// # Arguments
    ///
    /// * `base_url` - project URL, e.g. `"https://project.supabase.co"`
    /// * `anon_key` - public API key sent as the `apikey` header
    /// * `auth` - how to authenticate requests
    pub fn new(base_url: &str, anon_key: &str, auth: AuthMode) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            auth,
            http: Client::new(),
        }
    }

    /// Swap in a refreshed user token.
    pub fn set_bearer_token(&mut self, token: String) {
        self.auth = AuthMode::Bearer(token);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// The bearer token requests carry: the user's token when signed in,
    /// the anon key otherwise.
    pub(crate) fn access_token(&self) -> &str {
        match &self.auth {
            AuthMode::Anonymous => &self.anon_key,
            AuthMode::Bearer(token) => token,
        }
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.apply_auth(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.apply_auth(self.http.post(self.url(path)))
    }

    pub(crate) fn patch(&self, path: &str) -> reqwest::RequestBuilder {
        self.apply_auth(self.http.patch(self.url(path)))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("apikey", &self.anon_key).header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", self.access_token()),
        )
    }
}

/// Map a non-success response to [`ApiError`].
pub(crate) async fn error_for_status(response: reqwest::Response) -> ApiError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    match status {
        401 => ApiError::NotAuthenticated,
        403 => ApiError::Forbidden(text),
        404 => ApiError::NotFound(text),
        _ => ApiError::ServerError { status, body: text },
    }
}

/// Parse a JSON body on 2xx, or map the failure.
pub(crate) async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(error_for_status(response).await)
    }
}

/// Parse a response where only the status code matters.
pub(crate) async fn parse_status_only(response: reqwest::Response) -> Result<(), ApiError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_for_status(response).await)
    }
}
