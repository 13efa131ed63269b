//! # Room Relay Client Library
//!
//! A thin WebSocket client for the room relay. It speaks the same event
//! protocol as the browser games and is used by the terminal client and by
//! the server's integration tests.
//!
//! ## Encodings
//!
//! Events go out as JSON text frames by default. A client created with
//! [`Encoding::Binary`] sends bincode frames instead, and the server answers
//! each connection in the encoding it last received.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::RoomClient;
//! use shared::{ClientEvent, Encoding, GameKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = RoomClient::connect("ws://127.0.0.1:3000", Encoding::Json).await?;
//!     client
//!         .send(&ClientEvent::JoinRoom {
//!             room: "ABC123".to_string(),
//!             game: GameKind::RockPaperScissors,
//!             capacity: None,
//!         })
//!         .await?;
//!     println!("{:?}", client.next_event().await?);
//!     Ok(())
//! }
//! ```

pub mod commands;

use futures_util::{SinkExt, StreamExt};
use log::{debug, info};
use rand::Rng;
use shared::{decode, encode, ClientEvent, Encoding, Frame, ProtocolError, ServerEvent};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub use commands::{describe, Command, CommandError, CommandState};

/// Characters used for generated room codes; ambiguous glyphs are left out
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("connection closed by server")]
    Closed,
    #[error("timed out waiting for a server event")]
    Timeout,
}

/// Random room code for players creating a new room
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())]))
        .collect()
}

/// One WebSocket session with the relay
pub struct RoomClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    encoding: Encoding,
}

impl RoomClient {
    /// Opens a WebSocket session to `url` (for example `ws://127.0.0.1:3000`).
    ///
    /// Every event sent afterwards uses `encoding`.
    pub async fn connect(url: &str, encoding: Encoding) -> Result<Self, ClientError> {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|source| ClientError::Connect {
                url: url.to_string(),
                source,
            })?;
        info!("Connected to {}", url);

        Ok(Self { stream, encoding })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub async fn send(&mut self, event: &ClientEvent) -> Result<(), ClientError> {
        let message = match encode(event, self.encoding)? {
            Frame::Text(text) => Message::text(text),
            Frame::Binary(bytes) => Message::binary(bytes),
        };
        self.stream.send(message).await?;
        Ok(())
    }

    /// Waits for the next server event, skipping control frames
    pub async fn next_event(&mut self) -> Result<ServerEvent, ClientError> {
        loop {
            let message = match self.stream.next().await {
                Some(message) => message?,
                None => return Err(ClientError::Closed),
            };

            let frame = match message {
                Message::Text(text) => Frame::Text(text.as_str().to_owned()),
                Message::Binary(bytes) => Frame::Binary(bytes.to_vec()),
                Message::Close(_) => return Err(ClientError::Closed),
                other => {
                    debug!("Skipping control frame {:?}", other);
                    continue;
                }
            };

            return Ok(decode(&frame)?);
        }
    }

    /// Waits at most `wait` for the next event, failing with
    /// [`ClientError::Timeout`]
    pub async fn next_event_timeout(&mut self, wait: Duration) -> Result<ServerEvent, ClientError> {
        tokio::time::timeout(wait, self.next_event())
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    /// Like [`next_event_timeout`](Self::next_event_timeout) but a quiet
    /// connection yields `Ok(None)`
    pub async fn try_next_event(
        &mut self,
        wait: Duration,
    ) -> Result<Option<ServerEvent>, ClientError> {
        match self.next_event_timeout(wait).await {
            Ok(event) => Ok(Some(event)),
            Err(ClientError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sends a close frame and flushes the session
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
