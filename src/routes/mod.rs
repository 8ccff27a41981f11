//! Per-repository routes.
//!
//! Each `[github.<name>]` configuration block becomes a [`RouteDefinition`]:
//! the Matrix identity to post as, the rooms to post into, and the compiled
//! message template. The [`RouteRegistry`] holds every route and is what the
//! webhook handler looks `{repo}` up in.
//!
//! Construction is all-or-nothing: one invalid block fails the whole registry.

mod build;
mod env;
mod error;

pub use build::{build_route, build_route_with_env};
pub use env::{resolve_env_sigil, resolve_env_sigil_with};
pub use error::RouteError;

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::matrix::Credentials;
use crate::template::Template;
use crate::types::{RoomId, RouteName};

/// A validated route.
///
/// Only constructed by [`build_route_with_env`], so `rooms` is never empty and
/// `template` is always the compiled form of `format`.
#[derive(Debug, Clone)]
pub struct RouteDefinition {
    name: RouteName,
    credentials: Credentials,
    rooms: Vec<RoomId>,
    format: String,
    template: Template,
}

impl RouteDefinition {
    pub fn name(&self) -> &RouteName {
        &self.name
    }

    pub fn homeserver(&self) -> &Url {
        &self.credentials.homeserver
    }

    /// The identity messages for this route are posted as.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Target rooms, in configuration order. Never empty.
    pub fn rooms(&self) -> &[RoomId] {
        &self.rooms
    }

    /// The template source.
    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

/// All configured routes, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: HashMap<String, Arc<RouteDefinition>>,
}

impl RouteRegistry {
    /// Builds every route in the `[github]` table, resolving `$VAR` values
    /// against the process environment.
    pub fn from_config(github: &toml::Table) -> Result<Self, RouteError> {
        Self::from_config_with_env(github, |var| std::env::var(var).ok())
    }

    /// Builds every route in the `[github]` table, resolving `$VAR` values with `lookup`.
    ///
    /// Fails on the first invalid route; no partial registry is returned.
    pub fn from_config_with_env<F>(github: &toml::Table, lookup: F) -> Result<Self, RouteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut routes = HashMap::with_capacity(github.len());

        for (name, block) in github {
            let raw = block.as_table().ok_or_else(|| RouteError::NotATable {
                route: RouteName::new(name.as_str()),
                found: block.type_str(),
            })?;
            let route = build_route_with_env(name, raw, &lookup)?;
            routes.insert(name.clone(), Arc::new(route));
        }

        Ok(RouteRegistry { routes })
    }

    /// Looks up a route by name.
    pub fn get(&self, name: &str) -> Option<Arc<RouteDefinition>> {
        self.routes.get(name).cloned()
    }

    /// Returns the route names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
