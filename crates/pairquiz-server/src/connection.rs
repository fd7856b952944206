use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use uuid::Uuid;

use pairquiz_common::protocol::{
    self, ClientMessage, ServerMessage, framed_transport, serialize_message,
};

use crate::handler;
use crate::server::SharedState;

pub struct ConnectionHandle {
    pub tx: mpsc::Sender<ServerMessage>,
}

pub async fn handle_connection(stream: TcpStream, state: SharedState) -> anyhow::Result<()> {
    let mut transport = framed_transport(stream);

    // Handshake: the first frame must be Hello.
    let hello: ClientMessage = match protocol::recv_message(&mut transport).await? {
        Some(msg) => msg,
        None => return Ok(()),
    };

    let player_id = match hello {
        ClientMessage::Hello { version } => {
            let id = Uuid::new_v4();
            tracing::info!(player = %id, client_version = %version, "connection established");
            protocol::send_message(
                &mut transport,
                &ServerMessage::Welcome {
                    player_id: id,
                    server_version: env!("CARGO_PKG_VERSION").to_string(),
                },
            )
            .await?;
            id
        }
        _ => {
            protocol::send_message(
                &mut transport,
                &ServerMessage::HandshakeError {
                    reason: "Expected Hello message".into(),
                },
            )
            .await?;
            return Ok(());
        }
    };

    // Outbound queue: handlers push, the writer task drains.
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(64);
    state
        .connections
        .write()
        .await
        .insert(player_id, ConnectionHandle { tx });

    let (mut sink, mut stream) = transport.split();

    let write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serialize_message(&msg) {
                Ok(bytes) => {
                    if sink.send(bytes).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("failed to serialize message: {}", e);
                }
            }
        }
    });

    loop {
        match stream.next().await {
            Some(Ok(frame)) => match protocol::deserialize_message::<ClientMessage>(&frame) {
                Ok(msg) => {
                    if let Err(e) = handler::handle_message(player_id, msg, &state).await {
                        tracing::error!(player = %player_id, "handler error: {}", e);
                    }
                }
                Err(e) => {
                    tracing::warn!(player = %player_id, "failed to parse message: {}", e);
                }
            },
            Some(Err(e)) => {
                tracing::warn!(player = %player_id, "read error: {}", e);
                break;
            }
            None => {
                tracing::info!(player = %player_id, "disconnected");
                break;
            }
        }
    }

    handler::handle_disconnect(player_id, &state).await;
    write_task.abort();
    Ok(())
}
