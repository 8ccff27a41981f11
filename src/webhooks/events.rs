//! GitHub webhook payload types.
//!
//! Only the fields that message templates can reference are decoded. Every
//! field defaults when it is absent or `null`, so any GitHub event type (push,
//! issues, release, ...) decodes as long as the shared fields it does carry
//! have the right JSON types.
//!
//! [`FieldRef`] is the schema side of the same struct: it names one scalar
//! field reachable from a [`WebhookEvent`], and is what template paths such as
//! `.Sender.Login` compile down to.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The subset of a GitHub webhook payload that messages are rendered from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookEvent {
    #[serde(deserialize_with = "nullable")]
    pub sender: Sender,

    #[serde(deserialize_with = "nullable")]
    pub repository: Repository,

    /// The git ref the event concerns, e.g. `refs/heads/main` for a push.
    #[serde(rename = "ref", deserialize_with = "nullable")]
    pub git_ref: String,
}

/// The GitHub account that triggered the event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sender {
    #[serde(deserialize_with = "nullable")]
    pub id: u64,

    #[serde(deserialize_with = "nullable")]
    pub login: String,

    #[serde(deserialize_with = "nullable")]
    pub avatar_url: String,

    #[serde(deserialize_with = "nullable")]
    pub html_url: String,

    /// Account type: `User`, `Bot` or `Organization`.
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub account_type: String,
}

/// The repository the event belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    #[serde(deserialize_with = "nullable")]
    pub id: u64,

    #[serde(deserialize_with = "nullable")]
    pub name: String,

    #[serde(deserialize_with = "nullable")]
    pub full_name: String,

    #[serde(deserialize_with = "nullable")]
    pub private: bool,

    #[serde(deserialize_with = "nullable")]
    pub html_url: String,
}

/// Treats an explicit JSON `null` the same as an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A scalar value read out of a [`WebhookEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(u64),
    Flag(bool),
}

impl FieldValue<'_> {
    /// Truthiness as used by `{{if}}`: empty strings, zero and `false` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Number(n) => *n != 0,
            FieldValue::Flag(b) => *b,
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

/// A resolved reference to one scalar field of a [`WebhookEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRef {
    SenderId,
    SenderLogin,
    SenderAvatarUrl,
    SenderUrl,
    SenderType,
    RepositoryId,
    RepositoryName,
    RepositoryFullName,
    RepositoryPrivate,
    RepositoryUrl,
    Ref,
}

/// Why a field path did not resolve to a [`FieldRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// No field with this name exists at this point in the path.
    Unknown,
    /// The path names a nested object rather than a printable value.
    NotScalar,
}

impl FieldRef {
    /// Resolves a dotted path (already split into segments) to a field.
    ///
    /// Segments match case-insensitively with underscores ignored, so both the
    /// Go-style `FullName` and the JSON-style `full_name` resolve. `Url` is the
    /// payload's `html_url`. `AvaratUrl` is accepted as an alias of
    /// `AvatarUrl` for existing configuration files.
    pub fn resolve(segments: &[&str]) -> Result<Self, PathError> {
        let normalized: Vec<String> = segments.iter().map(|s| normalize(s)).collect();
        let parts: Vec<&str> = normalized.iter().map(String::as_str).collect();

        match parts.as_slice() {
            ["ref"] => Ok(FieldRef::Ref),
            ["sender"] | ["repository"] => Err(PathError::NotScalar),
            ["sender", field] => match *field {
                "id" => Ok(FieldRef::SenderId),
                "login" => Ok(FieldRef::SenderLogin),
                "avatarurl" | "avaraturl" => Ok(FieldRef::SenderAvatarUrl),
                "url" | "htmlurl" => Ok(FieldRef::SenderUrl),
                "type" => Ok(FieldRef::SenderType),
                _ => Err(PathError::Unknown),
            },
            ["repository", field] => match *field {
                "id" => Ok(FieldRef::RepositoryId),
                "name" => Ok(FieldRef::RepositoryName),
                "fullname" => Ok(FieldRef::RepositoryFullName),
                "private" => Ok(FieldRef::RepositoryPrivate),
                "url" | "htmlurl" => Ok(FieldRef::RepositoryUrl),
                _ => Err(PathError::Unknown),
            },
            _ => Err(PathError::Unknown),
        }
    }

    /// Reads this field out of an event.
    pub fn value<'a>(&self, event: &'a WebhookEvent) -> FieldValue<'a> {
        match self {
            FieldRef::SenderId => FieldValue::Number(event.sender.id),
            FieldRef::SenderLogin => FieldValue::Text(&event.sender.login),
            FieldRef::SenderAvatarUrl => FieldValue::Text(&event.sender.avatar_url),
            FieldRef::SenderUrl => FieldValue::Text(&event.sender.html_url),
            FieldRef::SenderType => FieldValue::Text(&event.sender.account_type),
            FieldRef::RepositoryId => FieldValue::Number(event.repository.id),
            FieldRef::RepositoryName => FieldValue::Text(&event.repository.name),
            FieldRef::RepositoryFullName => FieldValue::Text(&event.repository.full_name),
            FieldRef::RepositoryPrivate => FieldValue::Flag(event.repository.private),
            FieldRef::RepositoryUrl => FieldValue::Text(&event.repository.html_url),
            FieldRef::Ref => FieldValue::Text(&event.git_ref),
        }
    }
}

fn normalize(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
