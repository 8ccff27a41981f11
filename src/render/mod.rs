//! Message rendering.
//!
//! A route's compiled template turns a webhook event into plain text, which
//! doubles as markdown for the HTML variant. Matrix clients show
//! `formatted_body` when they support `org.matrix.custom.html` and fall back
//! to `body` otherwise.

pub mod markdown;

pub use markdown::markdown_to_html;

use crate::routes::RouteDefinition;
use crate::webhooks::WebhookEvent;

/// The two bodies of a Matrix text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Template output, sent verbatim as the message `body`.
    pub plain_text: String,

    /// `plain_text` rendered as markdown, sent as `formatted_body`.
    pub formatted_html: String,
}

impl RenderedMessage {
    /// Builds both bodies from plain text.
    pub fn from_plain_text(plain_text: String) -> Self {
        let formatted_html = markdown_to_html(&plain_text);
        RenderedMessage {
            plain_text,
            formatted_html,
        }
    }
}

/// Renders the message for an event delivered to a route.
pub fn render(route: &RouteDefinition, event: &WebhookEvent) -> RenderedMessage {
    RenderedMessage::from_plain_text(route.template().execute(event))
}
