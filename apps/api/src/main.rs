mod archive;
mod ashby;
mod candidates;
mod config;
mod download;
mod errors;
mod pdf;
mod resumes;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ashby::AshbyClient;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Desk v{}", env!("CARGO_PKG_VERSION"));
    info!("{config:?}");

    // Initialize the Ashby client
    let ats = Arc::new(AshbyClient::new(
        config.ashby_api_key.clone(),
        config.ashby_base_url.clone(),
        config.ashby_timeout,
    ));
    info!("Ashby client initialized ({})", config.ashby_base_url);

    let state = AppState {
        ats,
        cookie_key: session::cookie_key(&config),
        config: config.clone(),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
