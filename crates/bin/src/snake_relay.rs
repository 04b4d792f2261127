//! Snake relay - axum server with WebSocket and health endpoints.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::{future, SinkExt, StreamExt};
use server::{ConnectionPermit, Inbound, Relay, RelayStats};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    relay: Relay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,server=debug")),
        )
        .init();

    info!("Snake relay v{}", env!("CARGO_PKG_VERSION"));

    let config = server::Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {}", config.server.port);
    info!("  Grid: {}x{}", config.grid.size, config.grid.size);
    info!("  Foods per room: {}", config.food.count);
    info!(
        "  Connection limits: {} total, {} per IP",
        config.server.max_connections, config.server.ip_limit
    );
    info!("  Leader highlight: {}", config.snapshot.highlight_leader);

    let app = app(Relay::new(&config));

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

fn app(relay: Relay) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(AppState { relay })
}

async fn health(State(state): State<AppState>) -> Json<RelayStats> {
    Json(state.relay.stats().await)
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    let Some(permit) = state.relay.admit(addr.ip()) else {
        warn!("Connection rejected (limit reached): {}", addr);
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    info!("WebSocket connection from {}", addr);

    ws.on_upgrade(move |socket| handle_websocket(socket, addr, state.relay, permit))
}

/// Adapt the axum socket to the relay's socket loop.
async fn handle_websocket(socket: WebSocket, addr: SocketAddr, relay: Relay, permit: ConnectionPermit) {
    let (write, read) = socket.split();
    let read = read.map(|msg| {
        msg.map(|msg| match msg {
            Message::Text(text) => Inbound::Text(text.as_str().to_owned()),
            Message::Close(_) => Inbound::Close,
            _ => Inbound::Other,
        })
    });
    let write = write.with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text.into()))));

    relay.serve_socket(addr, read, write).await;
    drop(permit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_reports_live_counts() {
        let relay = Relay::new(&server::Config::default());
        let (id, _outbox) = relay.connect().await;
        relay
            .handle_text(id, r#"{"event":"joinRoom","data":{"room":"lobby"}}"#)
            .await;
        let (_idle, _idle_outbox) = relay.connect().await;

        let response = app(relay)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let stats: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats, json!({"rooms": 1, "players": 1, "connections": 2}));
    }

    #[tokio::test]
    async fn test_health_on_empty_relay() {
        let response = app(Relay::new(&server::Config::default()))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let stats: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats, json!({"rooms": 0, "players": 0, "connections": 0}));
    }
}
