//! Route construction errors.

use thiserror::Error;

use crate::template::TemplateError;
use crate::types::RouteName;

/// Errors that can occur when building a route from its configuration block.
///
/// Every variant is fatal at startup: the registry is built all-or-nothing.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The `[github.<name>]` entry is not a table.
    #[error("route {route}: configuration must be a table, found {found}")]
    NotATable { route: RouteName, found: &'static str },

    /// The route name cannot be used as a URL path segment.
    #[error("route {route:?}: name must be non-empty and must not contain '/'")]
    InvalidName { route: RouteName },

    /// A key that does not correspond to any route field.
    #[error("route {route}: no such field: {field}")]
    UnknownField { route: RouteName, field: String },

    /// The same field was given twice under different casings.
    #[error("route {route}: field {field} is set more than once")]
    DuplicateField { route: RouteName, field: &'static str },

    /// A field value of the wrong TOML type.
    #[error("route {route}: field {field} must be a {expected}, found {found}")]
    TypeMismatch {
        route: RouteName,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// A required field is absent.
    #[error("route {route}: missing required field {field}")]
    MissingField { route: RouteName, field: &'static str },

    /// `rooms` is absent, empty, or not a list of strings.
    #[error("route {route}: invalid rooms declaration: {reason}")]
    InvalidRooms { route: RouteName, reason: String },

    /// `homeserver` is not a URL.
    #[error("route {route}: invalid homeserver URL: {source}")]
    InvalidHomeserver {
        route: RouteName,
        #[source]
        source: url::ParseError,
    },

    /// `homeserver` is a URL, but not an http(s) one.
    #[error("route {route}: homeserver URL must use http or https, not {scheme}")]
    UnsupportedScheme { route: RouteName, scheme: String },

    /// The message format failed to compile.
    #[error("route {route}: invalid format template: {source}")]
    Template {
        route: RouteName,
        #[source]
        source: TemplateError,
    },
}

impl RouteError {
    /// Returns the name of the route the error belongs to.
    pub fn route(&self) -> &RouteName {
        match self {
            RouteError::NotATable { route, .. }
            | RouteError::InvalidName { route }
            | RouteError::UnknownField { route, .. }
            | RouteError::DuplicateField { route, .. }
            | RouteError::TypeMismatch { route, .. }
            | RouteError::MissingField { route, .. }
            | RouteError::InvalidRooms { route, .. }
            | RouteError::InvalidHomeserver { route, .. }
            | RouteError::UnsupportedScheme { route, .. }
            | RouteError::Template { route, .. } => route,
        }
    }
}
