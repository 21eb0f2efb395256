//! Axum HTTP + WebSocket fan-out server.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::hub::BroadcastHub;
use crate::subscriber::SubscriberSink;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The broadcast hub subscribers attach to.
    pub hub: Arc<BroadcastHub>,
    /// When the server started, for `/health` uptime.
    pub start_time: Instant,
}

/// Handle returned by [`serve`] — resolves when the server task exits.
pub struct ServerHandle {
    /// The actually-bound address (useful with port 0).
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Wait for the server task to finish (it exits after the hub's
    /// shutdown token fires and live connections drain).
    pub async fn finished(self) {
        let _ = self.task.await;
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind the listener and start serving until the hub shuts down.
///
/// A failed WebSocket upgrade is answered to that requester by axum and
/// never reaches the hub; everything past a successful upgrade goes through
/// [`BroadcastHub::attach`].
pub async fn serve(config: &ServerConfig, hub: Arc<BroadcastHub>) -> io::Result<ServerHandle> {
    let state = AppState {
        hub: Arc::clone(&hub),
        start_time: Instant::now(),
    };
    let router = build_router(state);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    info!(%addr, "subscriber listener bound");

    let shutdown = hub.shutdown_token();
    let task = tokio::spawn(async move {
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        if let Err(err) = served {
            error!(error = %err, "server task failed");
        }
    });

    Ok(ServerHandle { addr, task })
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.hub.subscriber_count(),
    ))
}

/// GET /ws — upgrade and hand the connection to the hub.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

/// Split the socket: a reader task watches for the peer closing, the
/// delivery pump owns the write half. Either one ending ends both.
async fn handle_socket(socket: WebSocket, hub: Arc<BroadcastHub>) {
    debug!("subscriber connection upgraded");
    let (ws_tx, mut ws_rx) = socket.split();
    let peer_closed = CancellationToken::new();

    let reader_token = peer_closed.clone();
    let mut reader = tokio::spawn(async move {
        // Inbound frames are not part of the protocol; axum answers pings
        // itself, so this loop only exists to notice the peer going away.
        while let Some(Ok(message)) = ws_rx.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
        reader_token.cancel();
    });

    let mut pump = {
        let hub = Arc::clone(&hub);
        let peer_closed = peer_closed.clone();
        tokio::spawn(async move { hub.attach(WsSink { tx: ws_tx }, peer_closed).await })
    };

    tokio::select! {
        _ = &mut pump => reader.abort(),
        _ = &mut reader => {
            peer_closed.cancel();
            let _ = pump.await;
        }
    }
    debug!("subscriber connection finished");
}

/// [`SubscriberSink`] over the write half of an axum WebSocket.
struct WsSink {
    tx: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl SubscriberSink for WsSink {
    async fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.tx
            .send(Message::Text(line.to_owned().into()))
            .await
            .map_err(io::Error::other)
    }
}
