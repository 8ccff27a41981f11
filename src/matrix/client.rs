//! HTTP client for the Matrix client-server API.
//!
//! Covers only the two endpoints message delivery needs, under the `r0` API
//! prefix:
//!
//! - `POST /_matrix/client/r0/login`
//! - `PUT /_matrix/client/r0/rooms/{roomId}/send/m.room.message/{txnId}`

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::Credentials;
use super::error::MatrixError;
use super::session::Session;
use crate::render::RenderedMessage;
use crate::types::{RoomId, TransactionId};

/// Path segments of the client-server API prefix.
const CLIENT_API: [&str; 3] = ["_matrix", "client", "r0"];

/// `m.login.password` request body.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    user: &'a str,
    password: &'a str,
}

/// Login response body. Only `access_token` and `user_id` are required.
#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    user_id: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    home_server: Option<String>,
}

/// `m.room.message` event content for an HTML-formatted text message.
#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    msgtype: &'static str,
    body: &'a str,
    formatted_body: &'a str,
    format: &'static str,
}

/// A Matrix client-server API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct MatrixClient {
    http: reqwest::Client,
}

impl MatrixClient {
    /// Default bound on every outbound request.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, MatrixError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Logs in with a password and returns the new session.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::InvalidLoginData`] on HTTP 400
    /// - [`MatrixError::InvalidCredentials`] on HTTP 401
    /// - [`MatrixError::LoginFailed`] on any other non-success status
    /// - [`MatrixError::MalformedLoginResponse`] if the success body lacks
    ///   `access_token` or `user_id`
    /// - [`MatrixError::Transport`] if the homeserver cannot be reached
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, MatrixError> {
        let url = endpoint(&credentials.homeserver, &["login"])?;
        let request = LoginRequest {
            kind: "m.login.password",
            user: &credentials.username,
            password: &credentials.password,
        };

        let response = self.http.post(url).json(&request).send().await?;
        let status = response.status();
        debug!(status = %status, "Login response received");

        match status {
            StatusCode::BAD_REQUEST => return Err(MatrixError::InvalidLoginData),
            StatusCode::UNAUTHORIZED => return Err(MatrixError::InvalidCredentials),
            s if !s.is_success() => {
                return Err(MatrixError::LoginFailed {
                    status: s.as_u16(),
                });
            }
            _ => {}
        }

        let body = response.bytes().await?;
        let parsed: LoginResponse =
            serde_json::from_slice(&body).map_err(MatrixError::MalformedLoginResponse)?;

        let home_server = parsed
            .home_server
            .or_else(|| credentials.homeserver.host_str().map(str::to_string))
            .unwrap_or_default();

        Ok(Session {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token.unwrap_or_default(),
            home_server,
            user_id: parsed.user_id,
        })
    }

    /// Sends a text message to a room and returns the response status.
    ///
    /// Only a failure to get any response is an error; interpreting the status
    /// is left to the caller.
    pub async fn send_text(
        &self,
        homeserver: &Url,
        access_token: &str,
        room: &RoomId,
        txn: &TransactionId,
        message: &RenderedMessage,
    ) -> Result<StatusCode, MatrixError> {
        let mut url = endpoint(
            homeserver,
            &[
                "rooms",
                room.as_str(),
                "send",
                "m.room.message",
                txn.as_str(),
            ],
        )?;
        url.query_pairs_mut()
            .append_pair("access_token", access_token);

        let content = TextMessage {
            msgtype: "m.text",
            body: &message.plain_text,
            formatted_body: &message.formatted_html,
            format: "org.matrix.custom.html",
        };

        let response = self.http.put(url).json(&content).send().await?;
        Ok(response.status())
    }
}

/// Appends the client API prefix and `segments` to the homeserver URL.
///
/// Each segment is percent-encoded, so room aliases (`#room:server`) and
/// transaction ids cannot alter the path structure.
fn endpoint(homeserver: &Url, segments: &[&str]) -> Result<Url, MatrixError> {
    let mut url = homeserver.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|()| MatrixError::InvalidUrl(homeserver.to_string()))?
        .pop_if_empty()
        .extend(CLIENT_API)
        .extend(segments);
    Ok(url)
}
