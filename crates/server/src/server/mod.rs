//! WebSocket relay server.

use crate::config::Config;
use futures_util::{future, SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite, tungstenite::Message};
use tracing::{error, info, warn};

mod limits;
mod relay;
mod socket;

pub use limits::{ConnectionLimits, ConnectionPermit};
pub use relay::{Relay, RelayStats};
pub use socket::Inbound;

/// Run the relay on a plain WebSocket listener.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);

    let relay = Relay::new(&config);

    loop {
        let (stream, addr) = listener.accept().await?;

        let Some(permit) = relay.admit(addr.ip()) else {
            // Dropping the stream closes the socket.
            warn!("Connection rejected (limit reached): {}", addr);
            continue;
        };

        let relay = relay.clone();
        tokio::spawn(async move {
            let result = handle_connection(stream, addr, &relay).await;
            drop(permit);

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, relay: &Relay) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New connection from {}", addr);

    let (write, read) = ws_stream.split();
    let read = read.map(|msg| msg.map(Inbound::from));
    let write = write.with(|text: String| future::ready(Ok::<_, tungstenite::Error>(Message::text(text))));

    relay.serve_socket(addr, read, write).await;
    Ok(())
}
