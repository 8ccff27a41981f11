//! Message fan-out to rooms.
//!
//! A delivery posts one rendered message to each of a route's rooms in
//! configuration order. The first room that does not accept the message stops
//! the delivery: later rooms are never attempted, and rooms already posted to
//! are not rolled back.

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::Credentials;
use super::client::MatrixClient;
use super::error::MatrixError;
use super::session::SessionManager;
use crate::render::RenderedMessage;
use crate::types::{RoomId, TransactionId};

/// One message to post to a set of rooms.
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    pub credentials: &'a Credentials,
    pub rooms: &'a [RoomId],
    pub message: &'a RenderedMessage,
}

/// Posts rendered messages to Matrix rooms.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: MatrixClient,
    sessions: Arc<SessionManager>,
}

impl Dispatcher {
    /// Creates a dispatcher with its own session cache.
    pub fn new(client: MatrixClient) -> Self {
        let sessions = Arc::new(SessionManager::new(client.clone()));
        Self::with_sessions(client, sessions)
    }

    /// Creates a dispatcher that shares an existing session cache.
    pub fn with_sessions(client: MatrixClient, sessions: Arc<SessionManager>) -> Self {
        Dispatcher { client, sessions }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Posts the message to every room, in order.
    ///
    /// Logs in first if no session is cached for the credentials. If a send is
    /// rejected with 401, the token is dropped, a fresh login is performed, and
    /// that room is retried once with the same transaction id.
    ///
    /// # Errors
    ///
    /// - Any login error from [`SessionManager::ensure_session`]
    /// - [`MatrixError::Delivery`] naming the first room that answered with a
    ///   status other than 200
    /// - [`MatrixError::Transport`] if a send got no response
    pub async fn dispatch(&self, delivery: &Delivery<'_>) -> Result<(), MatrixError> {
        let credentials = delivery.credentials;
        let mut session = self.sessions.ensure_session(credentials).await?;

        for room in delivery.rooms {
            let txn = TransactionId::random();
            debug!(room = %room, txn = %txn, "Sending message to room");

            let mut status = self
                .client
                .send_text(
                    &credentials.homeserver,
                    &session.access_token,
                    room,
                    &txn,
                    delivery.message,
                )
                .await?;

            if status == StatusCode::UNAUTHORIZED {
                warn!(room = %room, "Access token rejected, logging in again");
                self.sessions
                    .invalidate(credentials, &session.access_token)
                    .await;
                session = self.sessions.ensure_session(credentials).await?;
                status = self
                    .client
                    .send_text(
                        &credentials.homeserver,
                        &session.access_token,
                        room,
                        &txn,
                        delivery.message,
                    )
                    .await?;
            }

            if status != StatusCode::OK {
                return Err(MatrixError::Delivery {
                    room: room.clone(),
                    status: status.as_u16(),
                });
            }

            info!(room = %room, "Posted message to room");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;
    use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOGIN_PATH: &str = "/_matrix/client/r0/login";

    fn send_path(room: &str) -> String {
        format!("^/_matrix/client/r0/rooms/{}/send/m\\.room\\.message/[0-9]+$", room)
    }

    fn credentials(server: &MockServer) -> Credentials {
        Credentials::new(
            Url::parse(&server.uri()).unwrap(),
            "hookbot".to_string(),
            "hunter2".to_string(),
        )
    }

    fn rooms(ids: &[&str]) -> Vec<RoomId> {
        ids.iter().map(|id| RoomId::from(*id)).collect()
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(MatrixClient::new(MatrixClient::DEFAULT_TIMEOUT).unwrap())
    }

    async fn mount_login(server: &MockServer, token: &str, expected: u64) {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": token,
                "user_id": "@hookbot:example.org"
            })))
            .expect(expected)
            .mount(server)
            .await;
    }

    async fn mount_send(server: &MockServer, room: &str, status: u16, expected: u64) {
        Mock::given(method("PUT"))
            .and(path_regex(send_path(room)))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "event_id": "$event"
            })))
            .expect(expected)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn first_dispatch_logs_in_before_sending() {
        let server = MockServer::start().await;
        mount_login(&server, "syt_token", 1).await;
        mount_send(&server, "!one:example.org", 200, 1).await;
        mount_send(&server, "!two:example.org", 200, 1).await;

        let creds = credentials(&server);
        let rooms = rooms(&["!one:example.org", "!two:example.org"]);
        let message = RenderedMessage::from_plain_text("alice pushed to demo".into());

        dispatcher()
            .dispatch(&Delivery {
                credentials: &creds,
                rooms: &rooms,
                message: &message,
            })
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], LOGIN_PATH);
        assert!(paths[1].contains("/rooms/!one:example.org/"));
        assert!(paths[2].contains("/rooms/!two:example.org/"));
    }

    #[tokio::test]
    async fn cached_session_skips_login() {
        let server = MockServer::start().await;
        mount_login(&server, "syt_token", 1).await;
        Mock::given(method("PUT"))
            .and(path_regex(send_path("!one:example.org")))
            .and(query_param("access_token", "syt_token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;

        let dispatcher = dispatcher();
        let creds = credentials(&server);
        let rooms = rooms(&["!one:example.org"]);
        let message = RenderedMessage::from_plain_text("hello".into());
        let delivery = Delivery {
            credentials: &creds,
            rooms: &rooms,
            message: &message,
        };

        for _ in 0..3 {
            dispatcher.dispatch(&delivery).await.unwrap();
        }
    }

    #[tokio::test]
    async fn dispatchers_with_shared_sessions_log_in_once() {
        let server = MockServer::start().await;
        mount_login(&server, "syt_token", 1).await;
        mount_send(&server, "!one:example.org", 200, 2).await;

        let client = MatrixClient::new(MatrixClient::DEFAULT_TIMEOUT).unwrap();
        let sessions = Arc::new(SessionManager::new(client.clone()));
        let first = Dispatcher::with_sessions(client.clone(), Arc::clone(&sessions));
        let second = Dispatcher::with_sessions(client, Arc::clone(&sessions));

        let creds = credentials(&server);
        let rooms = rooms(&["!one:example.org"]);
        let message = RenderedMessage::from_plain_text("hello".into());
        let delivery = Delivery {
            credentials: &creds,
            rooms: &rooms,
            message: &message,
        };

        first.dispatch(&delivery).await.unwrap();
        second.dispatch(&delivery).await.unwrap();

        assert_eq!(
            sessions.current_token(&creds).await.as_deref(),
            Some("syt_token")
        );
    }

    #[tokio::test]
    async fn failed_room_stops_remaining_rooms() {
        let server = MockServer::start().await;
        mount_login(&server, "syt_token", 1).await;
        mount_send(&server, "!one:example.org", 200, 1).await;
        mount_send(&server, "!two:example.org", 403, 1).await;
        mount_send(&server, "!three:example.org", 200, 0).await;

        let creds = credentials(&server);
        let rooms = rooms(&["!one:example.org", "!two:example.org", "!three:example.org"]);
        let message = RenderedMessage::from_plain_text("hello".into());

        let err = dispatcher()
            .dispatch(&Delivery {
                credentials: &creds,
                rooms: &rooms,
                message: &message,
            })
            .await
            .unwrap_err();

        match &err {
            MatrixError::Delivery { room, status } => {
                assert_eq!(room.as_str(), "!two:example.org");
                assert_eq!(*status, 403);
            }
            other => panic!("expected delivery error, got {other:?}"),
        }
        assert!(err.to_string().contains("!two:example.org"));
    }

    #[tokio::test]
    async fn invalid_credentials_send_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        mount_send(&server, "!one:example.org", 200, 0).await;

        let creds = credentials(&server);
        let rooms = rooms(&["!one:example.org"]);
        let message = RenderedMessage::from_plain_text("hello".into());

        let err = dispatcher()
            .dispatch(&Delivery {
                credentials: &creds,
                rooms: &rooms,
                message: &message,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MatrixError::InvalidCredentials));
    }

    #[tokio::test]
    async fn rejected_token_is_refreshed_and_room_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "syt_old",
                "user_id": "@hookbot:example.org"
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        mount_login(&server, "syt_new", 1).await;
        Mock::given(method("PUT"))
            .and(path_regex(send_path("!one:example.org")))
            .and(query_param("access_token", "syt_old"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path_regex(send_path("!one:example.org")))
            .and(query_param("access_token", "syt_new"))
            .and(body_partial_json(serde_json::json!({"body": "hello"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher();
        let creds = credentials(&server);
        let rooms = rooms(&["!one:example.org"]);
        let message = RenderedMessage::from_plain_text("hello".into());

        dispatcher
            .dispatch(&Delivery {
                credentials: &creds,
                rooms: &rooms,
                message: &message,
            })
            .await
            .unwrap();

        assert_eq!(
            dispatcher.sessions().current_token(&creds).await.as_deref(),
            Some("syt_new")
        );
    }

    #[tokio::test]
    async fn second_rejection_is_a_delivery_error() {
        let server = MockServer::start().await;
        mount_login(&server, "syt_token", 2).await;
        mount_send(&server, "!one:example.org", 401, 2).await;

        let creds = credentials(&server);
        let rooms = rooms(&["!one:example.org"]);
        let message = RenderedMessage::from_plain_text("hello".into());

        let err = dispatcher()
            .dispatch(&Delivery {
                credentials: &creds,
                rooms: &rooms,
                message: &message,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, MatrixError::Delivery { status: 401, .. }));
    }
}
