use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use uuid::Uuid;

use crate::player::Player;

// -- Framing --

pub type Transport = Framed<TcpStream, LengthDelimitedCodec>;

pub fn framed_transport(stream: TcpStream) -> Transport {
    LengthDelimitedCodec::builder()
        .max_frame_length(64 * 1024)
        .new_framed(stream)
}

// -- Client -> Server Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    // Handshake
    Hello {
        version: String,
    },

    // Room lifecycle
    CreateRoom {
        player_name: String,
    },
    JoinRoom {
        room_code: String,
        player_name: String,
    },
    Ready {
        room_code: String,
        ready: bool,
    },
    PlayAgain {
        room_code: String,
    },

    // Round submissions
    SubmitAnswer {
        room_code: String,
        answer: String,
    },
    SubmitGuess {
        room_code: String,
        guess: String,
    },

    // Connection
    Ping,
    Disconnect,
}

// -- Server -> Client Messages --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    // Handshake
    Welcome {
        player_id: Uuid,
        server_version: String,
    },
    HandshakeError {
        reason: String,
    },

    // Room lifecycle
    RoomCreated {
        room_code: String,
        player_id: Uuid,
        players: Vec<PlayerInfo>,
    },
    RoomJoined {
        room_code: String,
        player_id: Uuid,
        players: Vec<PlayerInfo>,
    },
    PlayerJoined {
        players: Vec<PlayerInfo>,
    },
    PlayerReadyUpdate {
        players: Vec<PlayerInfo>,
    },
    PlayerLeft {
        players: Vec<PlayerInfo>,
    },

    // Round flow
    GameStarting {
        total_rounds: usize,
    },
    QuestionPhase {
        round: usize,
        question: String,
        time_limit: u64,
    },
    /// Unicast: each player sees the partner's answer mixed into their own
    /// decoy set.
    GuessPhase {
        question: String,
        answers: Vec<String>,
        time_limit: u64,
    },
    /// Unicast: "your" fields are relative to the receiving player.
    RoundResult {
        your_result: GuessResult,
        partner_result: GuessResult,
        your_answer: String,
        partner_answer: String,
        is_last_round: bool,
    },
    GameOver {
        results: Vec<FinalScore>,
    },

    // Errors
    Error {
        code: ErrorCode,
        message: String,
    },

    // Connection
    Pong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    RoomNotFound,
    RoomFull,
    GameInProgress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub ready: bool,
    pub score: u32,
}

impl From<&Player> for PlayerInfo {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            ready: p.ready,
            score: p.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuessResult {
    pub correct: bool,
    pub guess: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalScore {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
}

// -- Serialization helpers --

pub fn serialize_message<T: Serialize>(msg: &T) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_vec(msg)?;
    Ok(Bytes::from(json))
}

pub fn deserialize_message<T: for<'de> Deserialize<'de>>(
    data: &[u8],
) -> Result<T, serde_json::Error> {
    serde_json::from_slice(data)
}

// -- Transport helpers --

pub async fn send_message<T: Serialize>(
    transport: &mut Transport,
    msg: &T,
) -> anyhow::Result<()> {
    let bytes = serialize_message(msg).map_err(|e| anyhow::anyhow!("serialize error: {}", e))?;
    transport
        .send(bytes)
        .await
        .map_err(|e| anyhow::anyhow!("send error: {}", e))
}

pub async fn recv_message<T: for<'de> Deserialize<'de>>(
    transport: &mut Transport,
) -> anyhow::Result<Option<T>> {
    match transport.next().await {
        Some(Ok(frame)) => {
            let msg = deserialize_message(&frame)
                .map_err(|e| anyhow::anyhow!("deserialize error: {}", e))?;
            Ok(Some(msg))
        }
        Some(Err(e)) => Err(anyhow::anyhow!("recv error: {}", e)),
        None => Ok(None),
    }
}
