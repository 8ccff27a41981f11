//! Matrix session cache.
//!
//! Sessions live in memory only and are keyed by (homeserver, username), so
//! routes that post as different identities never share or clobber each
//! other's tokens. A session is created by the first dispatch that needs it
//! and dropped when the homeserver rejects its token; there is no expiry
//! timer.
//!
//! # Locking
//!
//! The outer map lock is held only long enough to fetch or create a slot.
//! Each slot has its own async mutex, held across a login, so concurrent
//! dispatches for one identity perform a single login and the rest reuse its
//! token. Room sends run on a cloned token with no lock held.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::Credentials;
use super::client::MatrixClient;
use super::error::MatrixError;

/// An authenticated Matrix session, as returned by a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    /// Empty when the homeserver did not issue one.
    pub refresh_token: String,
    pub home_server: String,
    pub user_id: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("home_server", &self.home_server)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// The identity a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    homeserver: String,
    username: String,
}

impl SessionKey {
    fn of(credentials: &Credentials) -> Self {
        SessionKey {
            homeserver: credentials.homeserver.as_str().to_string(),
            username: credentials.username.clone(),
        }
    }
}

type Slot = Arc<Mutex<Option<Session>>>;

/// Owns every cached Matrix session.
#[derive(Debug)]
pub struct SessionManager {
    client: MatrixClient,
    slots: Mutex<HashMap<SessionKey, Slot>>,
}

impl SessionManager {
    pub fn new(client: MatrixClient) -> Self {
        SessionManager {
            client,
            slots: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, credentials: &Credentials) -> Slot {
        let mut slots = self.slots.lock().await;
        slots.entry(SessionKey::of(credentials)).or_default().clone()
    }

    /// Returns the cached session for these credentials, logging in first if
    /// there is none.
    ///
    /// A failed login leaves the slot empty, so the next call tries again.
    pub async fn ensure_session(&self, credentials: &Credentials) -> Result<Session, MatrixError> {
        let slot = self.slot(credentials).await;
        let mut cached = slot.lock().await;

        if let Some(session) = cached.as_ref() {
            return Ok(session.clone());
        }

        debug!(
            homeserver = %credentials.homeserver,
            username = %credentials.username,
            "No cached Matrix session, logging in"
        );
        let session = self.client.login(credentials).await?;
        info!(
            homeserver = %credentials.homeserver,
            user_id = %session.user_id,
            "Logged in to Matrix homeserver"
        );

        *cached = Some(session.clone());
        Ok(session)
    }

    /// Drops the cached session if it still holds `stale_token`.
    ///
    /// Returns whether a session was dropped. A session another request has
    /// already replaced with a fresh login is left alone.
    pub async fn invalidate(&self, credentials: &Credentials, stale_token: &str) -> bool {
        let slot = self.slot(credentials).await;
        let mut cached = slot.lock().await;

        let is_stale = cached
            .as_ref()
            .is_some_and(|session| session.access_token == stale_token);
        if is_stale {
            *cached = None;
            debug!(
                homeserver = %credentials.homeserver,
                username = %credentials.username,
                "Invalidated Matrix session"
            );
        }
        is_stale
    }

    /// Returns the cached access token, if any.
    pub async fn current_token(&self, credentials: &Credentials) -> Option<String> {
        let slot = self.slot(credentials).await;
        let cached = slot.lock().await;
        cached.as_ref().map(|session| session.access_token.clone())
    }
}
