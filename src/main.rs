use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hooks_to_matrix::config::Config;
use hooks_to_matrix::matrix::{Dispatcher, MatrixClient};
use hooks_to_matrix::routes::RouteRegistry;
use hooks_to_matrix::server::{AppState, build_router};

/// Relays GitHub webhooks into Matrix rooms.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "./config.toml")]
    config_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hooks_to_matrix=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config_path)
        .with_context(|| format!("loading {}", cli.config_path.display()))?;
    let routes = RouteRegistry::from_config(config.github()).context("invalid route config")?;
    if routes.is_empty() {
        tracing::warn!("No [github.<repo>] routes configured");
    }
    tracing::info!(routes = ?routes.names(), "Loaded routes");

    let client = MatrixClient::new(config.request_timeout()).context("building HTTP client")?;
    let app = build_router(AppState::new(routes, Dispatcher::new(client)));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
