//! hooks-to-matrix - Relays GitHub webhooks into Matrix rooms.
//!
//! Each configured repository gets a `/github/{repo}` endpoint. A delivery is
//! rendered through the repository's message template, converted to HTML, and
//! posted to every room configured for it.

pub mod config;
pub mod matrix;
pub mod render;
pub mod routes;
pub mod server;
pub mod template;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
