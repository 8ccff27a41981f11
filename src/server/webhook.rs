//! Webhook endpoint handler.
//!
//! Accepts a GitHub webhook delivery for one configured repository, renders
//! the route's message from the payload and posts it to the route's rooms
//! before responding. There is no queue: the response reports whether every
//! room accepted the message.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::matrix::{Delivery, MatrixError};
use crate::render::render;
use crate::types::RouteName;
use crate::webhooks::decode_event;

/// Errors that can occur when handling a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No `[github.<repo>]` block is configured for the path.
    #[error("no route configured for {0}")]
    UnknownRoute(String),

    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    ReadBody(#[from] BytesRejection),

    /// The body is not a JSON webhook payload.
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// Login or delivery to a room failed.
    #[error("failed to deliver message for {route}: {source}")]
    Dispatch {
        route: RouteName,
        #[source]
        source: MatrixError,
    },
}

impl IntoResponse for WebhookError {
    /// Server-side failures get a bare status body; their detail is only logged.
    fn into_response(self) -> Response {
        match &self {
            WebhookError::UnknownRoute(_) => (StatusCode::NOT_FOUND, self.to_string()),
            WebhookError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            WebhookError::ReadBody(rejection)
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE =>
            {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            WebhookError::ReadBody(_) | WebhookError::Dispatch { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
        }
        .into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Path: `/github/{repo}`, where `{repo}` names a configured route
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: the message was posted to every room
/// - 400 Bad Request: the body is not a valid payload
/// - 404 Not Found: no route named `{repo}`
/// - 413 Payload Too Large: the body exceeds [`MAX_PAYLOAD_BYTES`](super::MAX_PAYLOAD_BYTES)
/// - 500 Internal Server Error: the body could not be read, login failed, or
///   a room rejected the message
///
/// # Example
///
/// ```ignore
/// POST /github/myrepo HTTP/1.1
/// Content-Type: application/json
///
/// {"repository": {"name": "demo"}, "sender": {"login": "alice"}, "ref": "refs/heads/main"}
///
/// HTTP/1.1 200 OK
///
/// Message sent to myrepo
/// ```
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    Path(repo): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, String), WebhookError> {
    let Some(route) = app_state.routes().get(&repo) else {
        debug!(route = %repo, "Webhook for unknown route");
        return Err(WebhookError::UnknownRoute(repo));
    };

    let body = body.inspect_err(|e| {
        error!(route = %repo, error = %e, "Failed to read webhook body");
    })?;

    let event = decode_event(&body).inspect_err(|e| {
        warn!(route = %repo, error = %e, "Rejected malformed webhook payload");
    })?;

    info!(
        route = %route.name(),
        homeserver = %route.homeserver(),
        repository = %event.repository.full_name,
        sender = %event.sender.login,
        "Received webhook"
    );

    let message = render(&route, &event);
    let delivery = Delivery {
        credentials: route.credentials(),
        rooms: route.rooms(),
        message: &message,
    };

    if let Err(e) = app_state.dispatcher().dispatch(&delivery).await {
        error!(
            route = %route.name(),
            category = %e.category(),
            error = %e,
            "Failed to deliver message"
        );
        return Err(WebhookError::Dispatch {
            route: route.name().clone(),
            source: e,
        });
    }

    info!(
        route = %route.name(),
        rooms = route.rooms().len(),
        "Message sent"
    );
    Ok((StatusCode::OK, format!("Message sent to {}", route.name())))
}
