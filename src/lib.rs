// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Weather-Feed: real-time weather and activity push server
//!
//! Clients connect over a WebSocket, receive their recent activities right
//! away, and once they send a coordinate also receive current conditions and
//! an hourly forecast for it. Each channel is re-polled on a fixed cadence.

pub mod config;
pub mod error;
pub mod models;
pub mod poller;
pub mod registry;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;
pub mod units;

use config::Config;
use registry::ConnectionRegistry;
use services::{GarminClient, OpenWeatherClient};
use session::SessionDeps;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Live push connections
    pub registry: ConnectionRegistry,
    /// Fetchers and cadence handed to every new session
    pub session_deps: SessionDeps,
    /// Cancelled when the server begins shutting down
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, session_deps: SessionDeps) -> Self {
        Self {
            config,
            registry: ConnectionRegistry::new(),
            session_deps,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Build the upstream clients described by `config`.
pub fn build_session_deps(config: &Config) -> Result<SessionDeps, reqwest::Error> {
    let http = reqwest::Client::builder()
        .timeout(config.fetch_timeout)
        .build()?;

    Ok(SessionDeps {
        weather: Arc::new(OpenWeatherClient::from_config(http.clone(), config)),
        activities: Arc::new(GarminClient::from_config(http, config)),
        weather_interval: config.poll_interval,
        activity_interval: config.poll_interval,
    })
}

/// Serve until `signal` resolves, then close every open connection.
pub async fn serve_with_shutdown<S>(
    listener: TcpListener,
    state: Arc<AppState>,
    signal: S,
) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let registry = state.registry.clone();
    let shutdown = state.shutdown.clone();
    let app = routes::create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
            registry.close_all();
        })
        .await
}

/// Serve until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    serve_with_shutdown(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
