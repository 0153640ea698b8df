// ABOUTME: Server binary for the guides portal web front-end
// ABOUTME: Loads configuration, initializes logging, and serves the HTTP routes
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Guides Portal Server Binary
//!
//! Starts the browser-facing portal: OAuth2 login against the configured
//! authority and authenticated calls to the downstream guides API.

use anyhow::Result;
use clap::Parser;
use guides_portal::{config::ServerConfig, logging, resources::ServerResources, routes};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Command-line arguments
#[derive(Parser)]
#[command(name = "guides-portal")]
#[command(about = "Guides portal - OAuth2 web front-end for the Dataverse guides API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration from environment
    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    // Initialize production logging
    logging::init_from_env()?;

    info!("Starting Guides Portal");
    info!("{}", config.summary());

    let resources = Arc::new(ServerResources::new(config));
    let app = routes::router(Arc::clone(&resources));

    let addr = format!("0.0.0.0:{}", resources.config.http_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => tracing::error!("failed to listen for shutdown signal: {e}"),
    }
}
