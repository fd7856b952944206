use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::connection::{self, ConnectionHandle};
use crate::registry::RoomRegistry;

pub struct ServerState {
    pub registry: RwLock<RoomRegistry>,
    pub connections: RwLock<HashMap<Uuid, ConnectionHandle>>,
    pub max_connections: usize,
}

pub type SharedState = Arc<ServerState>;

pub async fn run(addr: SocketAddr, max_connections: usize) -> anyhow::Result<()> {
    let state: SharedState = Arc::new(ServerState {
        registry: RwLock::new(RoomRegistry::new()),
        connections: RwLock::new(HashMap::new()),
        max_connections,
    });

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    loop {
        let (stream, peer_addr) = listener.accept().await?;

        let conn_count = state.connections.read().await.len();
        if conn_count >= state.max_connections {
            tracing::warn!(%peer_addr, max = state.max_connections, "connection limit reached, rejecting");
            drop(stream);
            continue;
        }
        tracing::debug!(%peer_addr, active = conn_count + 1, "accepted connection");

        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = connection::handle_connection(stream, state).await {
                tracing::warn!(%peer_addr, "connection error: {}", e);
            }
        });
    }
}
