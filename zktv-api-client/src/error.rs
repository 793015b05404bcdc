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

//! Error types for the backend client.

use thiserror::Error;

/// PostgREST code for an expired or malformed JWT.
const PGRST_JWT_EXPIRED: &str = "PGRST301";
/// Postgres `insufficient_privilege`, raised when row-level security rejects
/// an anonymous session.
const PG_INSUFFICIENT_PRIVILEGE: &str = "42501";

/// Errors returned by [`BackendClient`](crate::BackendClient) methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The JWT is missing, expired, or invalid (HTTP 401).
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The server denied access (HTTP 403).
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The requested resource was not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A server error with status code and body.
    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    /// A network or transport error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The realtime socket failed or closed.
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// A configuration error (e.g. unparsable base URL).
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether this failure comes from anonymous or expired credentials
    /// rather than from the backend being unavailable.
    pub fn is_auth_error(&self) -> bool {
        match self {
            ApiError::NotAuthenticated | ApiError::Forbidden(_) => true,
            ApiError::ServerError { body, .. } => {
                body.contains(PGRST_JWT_EXPIRED)
                    || body.contains(PG_INSUFFICIENT_PRIVILEGE)
                    || body.contains("JWT expired")
            }
            _ => false,
        }
    }
}
