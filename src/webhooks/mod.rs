//! GitHub webhook payloads.
//!
//! This module provides:
//! - Typed decoding of the payload fields messages are rendered from
//! - The field schema that template paths resolve against

pub mod events;

pub use events::{FieldRef, FieldValue, PathError, Repository, Sender, WebhookEvent};

/// Decodes a webhook body.
///
/// Missing or `null` fields default; anything that is not JSON, or whose known
/// fields have the wrong JSON type, is an error.
pub fn decode_event(body: &[u8]) -> Result<WebhookEvent, serde_json::Error> {
    serde_json::from_slice(body)
}
