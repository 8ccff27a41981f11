//! Template compilation errors.

use thiserror::Error;

/// Errors that can occur when compiling a message template.
///
/// Offsets are byte offsets into the template source and point at the `{{`
/// that opens the offending action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// An action was opened with `{{` but never closed.
    #[error("unclosed action starting at byte {offset}")]
    UnclosedAction { offset: usize },

    /// A `{{/*` comment was never closed with `*/}}`.
    #[error("unclosed comment starting at byte {offset}")]
    UnclosedComment { offset: usize },

    /// An action with nothing inside it, e.g. `{{ }}`.
    #[error("empty action at byte {offset}")]
    EmptyAction { offset: usize },

    /// A field path that does not exist on webhook events.
    #[error("unknown field {path} at byte {offset}")]
    UnknownField { path: String, offset: usize },

    /// A field path naming an object rather than a printable value.
    #[error("field {path} at byte {offset} is not a printable value")]
    NotPrintable { path: String, offset: usize },

    /// An action outside the supported subset (`range`, pipelines, functions...).
    #[error("unsupported action {{{{{action}}}}} at byte {offset}")]
    UnsupportedAction { action: String, offset: usize },

    /// `{{else}}` outside an `{{if}}`, or a second `{{else}}` in the same one.
    #[error("unexpected {{{{else}}}} at byte {offset}")]
    UnexpectedElse { offset: usize },

    /// `{{end}}` with no open `{{if}}`.
    #[error("unexpected {{{{end}}}} at byte {offset}")]
    UnexpectedEnd { offset: usize },

    /// An `{{if}}` that is never closed by `{{end}}`.
    #[error("{{{{if}}}} at byte {offset} is missing its {{{{end}}}}")]
    UnclosedIf { offset: usize },
}
