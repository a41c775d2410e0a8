//! buttrestd - buttrest daemon
//!
//! Serves the hypermedia REST API over an Intiface server, or over a set of
//! simulated devices with `--simulate`.
//!
//! Usage:
//!   buttrestd --client-name <NAME> --intiface-url ws://127.0.0.1:12345
//!   buttrestd --client-name <NAME> --simulate actuate --device 0 --actuator 0 --intensity 0.5

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use buttrest_api::{command::dispatch, create_router, AppState};
use buttrest_core::{ActuatorCommand, DeviceClient, MockClient};
use buttrest_intiface::{IntifaceClient, IntifaceConfig};
use clap::Parser;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "buttrestd=info,buttrest_api=info,buttrest_intiface=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting buttrestd");

    let client = build_client(&cli)?;
    let state = AppState::with_settings(client, cli.settings());

    match cli.command() {
        Command::Serve => serve(state, cli.listen).await,
        Command::Actuate {
            device,
            actuator,
            intensity,
            duration,
        } => actuate(state, device, actuator, intensity, Duration::from_secs(duration)).await,
    }
}

fn build_client(cli: &Cli) -> anyhow::Result<Arc<dyn DeviceClient>> {
    if cli.simulate {
        tracing::info!("Using simulated devices");
        return Ok(Arc::new(MockClient::demo(cli.client_name.clone())));
    }

    let url = cli
        .intiface_url
        .as_ref()
        .context("--intiface-url is required unless --simulate is set")?;
    tracing::info!(url = %url, client_name = %cli.client_name, "Using Intiface server");

    Ok(Arc::new(IntifaceClient::new(IntifaceConfig::new(
        url.as_str(),
        cli.client_name.clone(),
    ))))
}

/// Serve the API while the client connects and runs its discovery window
/// in the background. A failed startup shuts the server down.
async fn serve(state: AppState, listen: SocketAddr) -> anyhow::Result<()> {
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {}", listen))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let mut startup = {
        let state = state.clone();
        tokio::spawn(async move { state.startup().await })
    };

    let startup_failure = async {
        match (&mut startup).await {
            Ok(Ok(())) => {
                tracing::info!("Client ready");
                std::future::pending::<anyhow::Error>().await
            }
            Ok(Err(e)) => anyhow::Error::from(e).context("client startup failed"),
            Err(e) => anyhow::Error::from(e).context("client startup task failed"),
        }
    };

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            signal.map_err(anyhow::Error::from)
        }
        err = startup_failure => {
            tracing::error!(error = %err, "Startup failed, stopping server");
            Err(err)
        }
    };

    startup.abort();
    let _ = shutdown_tx.send(());
    server.await??;
    state.shutdown().await;

    outcome
}

/// Drive one scalar actuator for `duration`, then stop it and disconnect
async fn actuate(
    state: AppState,
    device: u32,
    actuator: u32,
    intensity: f64,
    duration: Duration,
) -> anyhow::Result<()> {
    state.startup().await.context("client startup failed")?;

    let result = run_actuator(&state, device, actuator, intensity, duration).await;
    state.shutdown().await;
    result
}

async fn run_actuator(
    state: &AppState,
    device: u32,
    actuator: u32,
    intensity: f64,
    duration: Duration,
) -> anyhow::Result<()> {
    let registry = state.registry();
    let info = registry.actuator(device, actuator)?;
    let client = registry.client()?;

    tracing::info!(
        device,
        actuator,
        description = %info.description,
        intensity,
        seconds = duration.as_secs(),
        "Actuating"
    );

    dispatch(client, device, actuator, ActuatorCommand::Scalar { intensity }).await?;
    tokio::time::sleep(duration).await;
    dispatch(client, device, actuator, ActuatorCommand::Scalar { intensity: 0.0 }).await?;

    Ok(())
}
