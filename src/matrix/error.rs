//! Matrix delivery error types.
//!
//! Errors are grouped into three categories for logging and for deciding what
//! the operator has to fix:
//!
//! - **Authentication**: the homeserver refused or garbled the login
//! - **Delivery**: a room send returned something other than 200
//! - **Transport**: the homeserver could not be reached (connect, timeout, TLS)
//!
//! None of them are retried here except an access token rejected mid-dispatch,
//! which the dispatcher handles by logging in once more.

use std::fmt;
use thiserror::Error;

use crate::types::RoomId;

/// The category of a [`MatrixError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Delivery,
    Transport,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Delivery => "delivery",
            ErrorCategory::Transport => "transport",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while logging in to a homeserver or posting to rooms.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// The homeserver rejected the login request body (HTTP 400).
    #[error("invalid login data")]
    InvalidLoginData,

    /// The homeserver rejected the username or password (HTTP 401).
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// Login failed with some other non-success status.
    #[error("login failed (HTTP {status})")]
    LoginFailed { status: u16 },

    /// Login succeeded but the body lacked `access_token` or `user_id`.
    #[error("malformed login response: {0}")]
    MalformedLoginResponse(#[source] serde_json::Error),

    /// A room send returned a status other than 200.
    #[error("error while posting to room {room} (HTTP {status})")]
    Delivery { room: RoomId, status: u16 },

    /// The homeserver URL cannot have API paths appended to it.
    #[error("homeserver URL {0} cannot be used as a base URL")]
    InvalidUrl(String),

    /// The request never got an HTTP response.
    #[error("could not reach homeserver: {0}")]
    Transport(#[source] reqwest::Error),
}

impl MatrixError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MatrixError::InvalidLoginData
            | MatrixError::InvalidCredentials
            | MatrixError::LoginFailed { .. }
            | MatrixError::MalformedLoginResponse(_) => ErrorCategory::Authentication,
            MatrixError::Delivery { .. } => ErrorCategory::Delivery,
            MatrixError::InvalidUrl(_) | MatrixError::Transport(_) => ErrorCategory::Transport,
        }
    }
}

impl From<reqwest::Error> for MatrixError {
    /// Drops the request URL from the error: send URLs carry the access token.
    fn from(err: reqwest::Error) -> Self {
        MatrixError::Transport(err.without_url())
    }
}
