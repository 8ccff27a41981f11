//! Message templates.
//!
//! Route formats are written in the Go `text/template` dialect existing
//! configuration files use, restricted to what messages need:
//!
//! - `{{ .Sender.Login }}` prints a field of the webhook event
//! - `{{if .Repository.Private}} ... {{else if .Ref}} ... {{else}} ... {{end}}`
//! - `{{/* comments */}}`
//! - `{{-` and `-}}` trim surrounding whitespace
//!
//! Field paths are resolved when the template is compiled, so a template that
//! compiles always executes.

mod error;
mod parser;

pub use error::TemplateError;

use crate::webhooks::{FieldRef, WebhookEvent};

/// A node of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Field(FieldRef),
    If {
        cond: FieldRef,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// A compiled message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Compiles template source.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] for malformed actions, unknown or
    /// non-printable field paths, and unbalanced `if`/`else`/`end` blocks.
    ///
    /// # Examples
    ///
    /// ```
    /// use hooks_to_matrix::template::Template;
    /// use hooks_to_matrix::webhooks::WebhookEvent;
    ///
    /// let template = Template::compile("{{.Sender.Login}} pushed to {{.Repository.Name}}").unwrap();
    /// let mut event = WebhookEvent::default();
    /// event.sender.login = "alice".into();
    /// event.repository.name = "demo".into();
    /// assert_eq!(template.execute(&event), "alice pushed to demo");
    ///
    /// assert!(Template::compile("{{.Sender.Email}}").is_err());
    /// ```
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        Ok(Template {
            nodes: parser::parse(source)?,
        })
    }

    /// Renders the template against an event.
    pub fn execute(&self, event: &WebhookEvent) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, event, &mut out);
        out
    }
}

fn render_nodes(nodes: &[Node], event: &WebhookEvent, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field(field) => out.push_str(&field.value(event).to_string()),
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                let branch = if cond.value(event).is_truthy() {
                    then
                } else {
                    otherwise
                };
                render_nodes(branch, event, out);
            }
        }
    }
}
