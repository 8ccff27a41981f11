//! Newtype wrappers for identifiers.
//!
//! These keep route names, Matrix room identifiers and transaction identifiers
//! from being mixed up with each other or with arbitrary strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The name a repository is configured under, used as the `/github/{name}` path key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteName(pub String);

impl RouteName {
    pub fn new(s: impl Into<String>) -> Self {
        RouteName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RouteName {
    fn from(s: &str) -> Self {
        RouteName(s.to_string())
    }
}

/// A Matrix room identifier or alias (`!opaque:server` or `#alias:server`).
///
/// Note: This does not validate the sigil or server part. The homeserver is
/// the authority on whether a room exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(s: impl Into<String>) -> Self {
        RoomId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        RoomId(s.to_string())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        RoomId(s)
    }
}

/// A client-chosen transaction identifier for a single room send.
///
/// The homeserver uses it to deduplicate retried sends within one access
/// token's lifetime, so it only needs to be unique per session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(s: impl Into<String>) -> Self {
        TransactionId(s.into())
    }

    /// Generates a fresh random transaction identifier.
    pub fn random() -> Self {
        TransactionId(rand::random::<u64>().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod room_id {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn display_is_verbatim(s in "[!#][a-zA-Z0-9]{1,18}:[a-z]{1,10}\\.org") {
                let room = RoomId::new(&s);
                prop_assert_eq!(format!("{}", room), s);
            }

            #[test]
            fn deserializes_from_plain_string(s in "![a-zA-Z0-9]{1,18}:[a-z]{1,10}\\.org") {
                let json = serde_json::to_string(&s).unwrap();
                let parsed: RoomId = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(parsed.as_str(), s.as_str());
            }
        }
    }

    mod transaction_id {
        use super::*;

        #[test]
        fn random_is_numeric() {
            let txn = TransactionId::random();
            assert!(!txn.as_str().is_empty());
            assert!(txn.as_str().chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn consecutive_ids_differ() {
            let a = TransactionId::random();
            let b = TransactionId::random();
            assert_ne!(a, b);
        }
    }

    #[test]
    fn route_names_order_lexically() {
        let mut names = vec![RouteName::from("zeta"), RouteName::from("alpha")];
        names.sort();
        assert_eq!(names[0].as_str(), "alpha");
    }
}
