//! Building a [`RouteDefinition`] from one `[github.<name>]` block.
//!
//! Keys are matched case-insensitively against a fixed field table. Every
//! string field except room entries goes through `$VAR` resolution before it
//! is validated.

use tracing::warn;
use url::Url;

use super::RouteDefinition;
use super::env::resolve_env_sigil_with;
use super::error::RouteError;
use crate::matrix::Credentials;
use crate::template::Template;
use crate::types::{RoomId, RouteName};

/// The fields a route block may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Homeserver,
    Username,
    Password,
    Format,
    Rooms,
    /// Webhook secret; accepted for compatibility but not used.
    Secret,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "homeserver" => Some(Field::Homeserver),
            "username" => Some(Field::Username),
            "password" => Some(Field::Password),
            "format" => Some(Field::Format),
            "rooms" => Some(Field::Rooms),
            "secret" => Some(Field::Secret),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Field::Homeserver => "homeserver",
            Field::Username => "username",
            Field::Password => "password",
            Field::Format => "format",
            Field::Rooms => "rooms",
            Field::Secret => "secret",
        }
    }
}

/// Builds a route, resolving `$VAR` values against the process environment.
pub fn build_route(name: &str, raw: &toml::Table) -> Result<RouteDefinition, RouteError> {
    build_route_with_env(name, raw, |var| std::env::var(var).ok())
}

/// Builds a route, resolving `$VAR` values with `lookup`.
///
/// # Errors
///
/// - [`RouteError::InvalidRooms`] if `rooms` is absent, empty, or not a list
///   of strings. This is checked before any other field.
/// - [`RouteError::UnknownField`], [`RouteError::DuplicateField`] or
///   [`RouteError::TypeMismatch`] for bad keys or values.
/// - [`RouteError::MissingField`] if `homeserver`, `username`, `password` or
///   `format` is absent.
/// - [`RouteError::InvalidHomeserver`] / [`RouteError::UnsupportedScheme`]
///   for a homeserver that is not an http(s) URL.
/// - [`RouteError::Template`] if `format` does not compile.
pub fn build_route_with_env<F>(
    name: &str,
    raw: &toml::Table,
    lookup: F,
) -> Result<RouteDefinition, RouteError>
where
    F: Fn(&str) -> Option<String>,
{
    let route = RouteName::new(name);
    if name.is_empty() || name.contains('/') {
        return Err(RouteError::InvalidName { route });
    }

    let rooms = extract_rooms(&route, raw)?;

    let mut homeserver = None;
    let mut username = None;
    let mut password = None;
    let mut format = None;
    let mut secret_seen = false;

    for (key, value) in raw {
        let field = Field::from_key(key).ok_or_else(|| RouteError::UnknownField {
            route: route.clone(),
            field: key.clone(),
        })?;

        let slot = match field {
            Field::Rooms => continue,
            Field::Secret => {
                expect_string(&route, field, value)?;
                if std::mem::replace(&mut secret_seen, true) {
                    return Err(duplicate(&route, field));
                }
                warn!(
                    route = %route,
                    "Ignoring webhook secret: signature verification is not performed"
                );
                continue;
            }
            Field::Homeserver => &mut homeserver,
            Field::Username => &mut username,
            Field::Password => &mut password,
            Field::Format => &mut format,
        };

        let resolved = resolve_env_sigil_with(expect_string(&route, field, value)?, &lookup);
        if slot.replace(resolved).is_some() {
            return Err(duplicate(&route, field));
        }
    }

    let homeserver = require(&route, Field::Homeserver, homeserver)?;
    let username = require(&route, Field::Username, username)?;
    let password = require(&route, Field::Password, password)?;
    let format = require(&route, Field::Format, format)?;

    let homeserver = parse_homeserver(&route, &homeserver)?;

    let template = Template::compile(&format).map_err(|source| RouteError::Template {
        route: route.clone(),
        source,
    })?;

    Ok(RouteDefinition {
        name: route,
        credentials: Credentials::new(homeserver, username, password),
        rooms,
        format,
        template,
    })
}

/// Extracts `rooms`, which must be a non-empty array of strings.
fn extract_rooms(route: &RouteName, raw: &toml::Table) -> Result<Vec<RoomId>, RouteError> {
    let invalid = |reason: String| RouteError::InvalidRooms {
        route: route.clone(),
        reason,
    };

    let mut declarations = raw
        .iter()
        .filter(|(key, _)| Field::from_key(key) == Some(Field::Rooms))
        .map(|(_, value)| value);

    let value = declarations
        .next()
        .ok_or_else(|| invalid("missing rooms list".to_string()))?;
    if declarations.next().is_some() {
        return Err(duplicate(route, Field::Rooms));
    }

    let entries = value.as_array().ok_or_else(|| {
        invalid(format!(
            "expected a list of room identifiers, found {}",
            value.type_str()
        ))
    })?;

    if entries.is_empty() {
        return Err(invalid("rooms list is empty".to_string()));
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            entry
                .as_str()
                .map(RoomId::from)
                .ok_or_else(|| invalid(format!("entry {} is a {}, not a string", i, entry.type_str())))
        })
        .collect()
}

fn parse_homeserver(route: &RouteName, value: &str) -> Result<Url, RouteError> {
    let url = Url::parse(value).map_err(|source| RouteError::InvalidHomeserver {
        route: route.clone(),
        source,
    })?;

    if matches!(url.scheme(), "http" | "https") {
        return Ok(url);
    }

    Err(RouteError::UnsupportedScheme {
        route: route.clone(),
        scheme: url.scheme().to_string(),
    })
}

fn expect_string<'v>(
    route: &RouteName,
    field: Field,
    value: &'v toml::Value,
) -> Result<&'v str, RouteError> {
    value.as_str().ok_or_else(|| RouteError::TypeMismatch {
        route: route.clone(),
        field: field.name(),
        expected: "string",
        found: value.type_str(),
    })
}

fn require(route: &RouteName, field: Field, value: Option<String>) -> Result<String, RouteError> {
    value.ok_or_else(|| RouteError::MissingField {
        route: route.clone(),
        field: field.name(),
    })
}

fn duplicate(route: &RouteName, field: Field) -> RouteError {
    RouteError::DuplicateField {
        route: route.clone(),
        field: field.name(),
    }
}
