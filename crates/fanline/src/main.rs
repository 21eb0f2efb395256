//! # fanline
//!
//! Relay bot binary — connects to a line-oriented remote host, fans every
//! received line out to WebSocket subscribers, and serves a health endpoint.

#![deny(unsafe_code)]

mod cli;
mod settings;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use fanline_core::MessageSink;
use fanline_relay::{LineRelay, RemoteTransport, TcpTransport};
use fanline_server::{BroadcastHub, ShutdownCoordinator, serve};
use tracing::{error, info};

/// Could not reach the remote host.
const EXIT_CONNECT_FAILED: u8 = 1;
/// The relay ran but ended with a transport failure.
const EXIT_RELAY_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Cli::parse();
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(settings::settings_path);
    let mut settings = match settings::load_from_path(&config_path) {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "failed to load settings");
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut settings);

    run(settings).await
}

async fn run(settings: settings::Settings) -> ExitCode {
    let coordinator = ShutdownCoordinator::new();

    // Connect upstream before exposing anything downstream: a bot that
    // cannot reach its host has nothing to serve.
    let transport = TcpTransport::new(settings.remote.addr.clone(), settings.remote.identity);
    let (reader, writer) = match transport.connect().await {
        Ok(halves) => halves,
        Err(err) => {
            error!(addr = %settings.remote.addr, error = %err, "failed to connect to remote host");
            return ExitCode::from(EXIT_CONNECT_FAILED);
        }
    };

    let hub = Arc::new(BroadcastHub::new(
        settings.server.backlog_size,
        settings.server.queue_capacity,
    ));
    let server_handle = match serve(&settings.server, Arc::clone(&hub)).await {
        Ok(handle) => handle,
        Err(err) => {
            error!(error = %err, "failed to bind subscriber listener");
            return ExitCode::FAILURE;
        }
    };
    info!(
        remote = %settings.remote.addr,
        listen = %server_handle.addr,
        backlog = settings.server.backlog_size,
        "fanline ready"
    );

    let relay = Arc::new(LineRelay::new());
    let mut relay_task = {
        let relay = Arc::clone(&relay);
        let sink: Arc<dyn MessageSink> = Arc::clone(&hub) as Arc<dyn MessageSink>;
        let cancel = coordinator.token();
        tokio::spawn(async move { relay.run(reader, writer, sink, cancel).await })
    };

    let relay_outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            None
        }
        joined = &mut relay_task => Some(joined),
    };

    let exit = match relay_outcome {
        // Interrupted: cancel the root token and drain the relay with a
        // bounded wait.
        None => {
            let drain = tokio::spawn(async move {
                match relay_task.await {
                    Ok(Ok(())) | Err(_) => {}
                    Ok(Err(err)) => {
                        error!(error = %err, "relay ended with an error during shutdown");
                    }
                }
            });
            coordinator
                .graceful_shutdown(vec![drain], Some(Duration::from_secs(5)))
                .await;
            ExitCode::SUCCESS
        }
        Some(Ok(Ok(()))) => {
            info!("remote stream ended");
            ExitCode::SUCCESS
        }
        Some(Ok(Err(err))) => {
            error!(error = %err, "relay failed");
            ExitCode::from(EXIT_RELAY_FAILED)
        }
        Some(Err(err)) => {
            error!(error = %err, "relay task panicked");
            ExitCode::from(EXIT_RELAY_FAILED)
        }
    };

    // Drop every subscriber and let the listener drain.
    coordinator.shutdown();
    hub.close();
    server_handle.finished().await;
    info!("shutdown complete");

    exit
}
