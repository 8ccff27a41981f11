//! Matrix client-server API: login, session caching and room delivery.

mod client;
mod dispatch;
mod error;
mod session;

use std::fmt;

use url::Url;

pub use client::MatrixClient;
pub use dispatch::{Delivery, Dispatcher};
pub use error::{ErrorCategory, MatrixError};
pub use session::{Session, SessionManager};

/// The identity a route posts as.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub homeserver: Url,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(homeserver: Url, username: String, password: String) -> Self {
        Credentials {
            homeserver,
            username,
            password,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("homeserver", &self.homeserver.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_password() {
        let creds = Credentials::new(
            Url::parse("https://matrix.example.org").unwrap(),
            "hookbot".into(),
            "hunter2".into(),
        );
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("hookbot"));
    }
}
