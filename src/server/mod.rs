//! HTTP server for the webhook bridge.
//!
//! # Endpoints
//!
//! - `POST /github/{repo}` - Renders the route's message and posts it to Matrix
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::{WebhookError, webhook_handler};

use crate::matrix::Dispatcher;
use crate::routes::RouteRegistry;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    routes: RouteRegistry,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(routes: RouteRegistry, dispatcher: Dispatcher) -> Self {
        AppState {
            inner: Arc::new(AppStateInner { routes, dispatcher }),
        }
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.inner.routes
    }

    /// The dispatcher, which owns the shared session cache.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }
}

/// Largest webhook body accepted. GitHub caps deliveries at 25 MB.
pub const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::extract::DefaultBodyLimit;
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/github/{repo}", post(webhook_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES))
        .with_state(app_state)
}
