//! Frame codec shared by server and client.
//!
//! Browsers speak JSON in text frames; native clients may use bincode in
//! binary frames. Both carry exactly one event per frame.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("bincode codec error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame type carries no event")]
    UnsupportedFrame,
    #[error("unknown game {0:?}")]
    UnknownGame(String),
    #[error("unknown choice {0:?}")]
    UnknownChoice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Json,
    Binary,
}

/// Transport-agnostic view of one data frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn encoding(&self) -> Encoding {
        match self {
            Frame::Text(_) => Encoding::Json,
            Frame::Binary(_) => Encoding::Binary,
        }
    }
}

pub fn encode<T: Serialize>(value: &T, encoding: Encoding) -> Result<Frame, ProtocolError> {
    match encoding {
        Encoding::Json => Ok(Frame::Text(serde_json::to_string(value)?)),
        Encoding::Binary => Ok(Frame::Binary(bincode::serialize(value)?)),
    }
}

pub fn decode<T: DeserializeOwned>(frame: &Frame) -> Result<T, ProtocolError> {
    match frame {
        Frame::Text(text) => Ok(serde_json::from_str(text)?),
        Frame::Binary(bytes) => Ok(bincode::deserialize(bytes)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientEvent, GameKind, RpsChoice, ServerEvent};

    #[test]
    fn test_json_uses_event_names() {
        let frame = encode(
            &ServerEvent::RoomFull {
                room: "R1".to_string(),
            },
            Encoding::Json,
        )
        .unwrap();

        assert_eq!(frame, Frame::Text(r#"{"room-full":{"room":"R1"}}"#.to_string()));
    }

    #[test]
    fn test_json_join_defaults_game_and_capacity() {
        let frame = Frame::Text(r#"{"join-room":{"room":" abc "}}"#.to_string());
        let event: ClientEvent = decode(&frame).unwrap();

        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room: " abc ".to_string(),
                game: GameKind::RockPaperScissors,
                capacity: None,
            }
        );
    }

    #[test]
    fn test_binary_frame_decodes() {
        let event = ClientEvent::RpsChoice {
            room: "R1".to_string(),
            choice: RpsChoice::Scissors,
        };
        let frame = encode(&event, Encoding::Binary).unwrap();
        assert_eq!(frame.encoding(), Encoding::Binary);

        let decoded: ClientEvent = decode(&frame).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_garbage_is_an_error() {
        let text = Frame::Text("not json".to_string());
        assert!(matches!(
            decode::<ClientEvent>(&text),
            Err(ProtocolError::Json(_))
        ));

        let bytes = Frame::Binary(vec![0xff, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(
            decode::<ClientEvent>(&bytes),
            Err(ProtocolError::Bincode(_))
        ));
    }
}
