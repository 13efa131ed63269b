use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod codec;

pub use codec::{decode, encode, Encoding, Frame, ProtocolError};

pub const DEFAULT_CAPACITY: usize = 2;
pub const MAX_LUDO_PLAYERS: usize = 4;
pub const LUDO_TOKENS: usize = 4;
pub const LUDO_WIN_POSITION: u8 = 56;
pub const LUDO_DIE_FACES: u8 = 6;
pub const WORD_POINTS_PER_LETTER: u32 = 10;

/// Identifier the transport assigns to one live connection.
pub type ConnectionId = u64;

/// Canonical form of a human-typed room code: trimmed and uppercased.
///
/// Returns `None` for codes that are empty after trimming.
pub fn normalize_room_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        None
    } else {
        Some(code)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    #[default]
    RockPaperScissors,
    TriviaDuel,
    WordWar,
    SpaceRace,
    Ludo,
}

impl GameKind {
    /// Room capacity for this game given the creator's requested size.
    ///
    /// Only Ludo honours the request (clamped to 2..=4); every duel is two players.
    pub fn capacity(self, requested: Option<usize>) -> usize {
        match self {
            GameKind::Ludo => requested
                .unwrap_or(DEFAULT_CAPACITY)
                .clamp(DEFAULT_CAPACITY, MAX_LUDO_PLAYERS),
            _ => DEFAULT_CAPACITY,
        }
    }

    /// Games that collect one action per member before computing a result
    pub fn is_round_based(self) -> bool {
        matches!(self, GameKind::RockPaperScissors | GameKind::TriviaDuel)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameKind::RockPaperScissors => "rock-paper-scissors",
            GameKind::TriviaDuel => "trivia-duel",
            GameKind::WordWar => "word-war",
            GameKind::SpaceRace => "space-race",
            GameKind::Ludo => "ludo",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rock-paper-scissors" | "rps" => Ok(GameKind::RockPaperScissors),
            "trivia-duel" | "trivia" => Ok(GameKind::TriviaDuel),
            "word-war" | "words" => Ok(GameKind::WordWar),
            "space-race" | "race" => Ok(GameKind::SpaceRace),
            "ludo" => Ok(GameKind::Ludo),
            other => Err(ProtocolError::UnknownGame(other.to_string())),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RpsChoice {
    Rock,
    Paper,
    Scissors,
}

impl RpsChoice {
    /// The choice this one defeats (Rock > Scissors > Paper > Rock)
    pub fn beats(self) -> RpsChoice {
        match self {
            RpsChoice::Rock => RpsChoice::Scissors,
            RpsChoice::Paper => RpsChoice::Rock,
            RpsChoice::Scissors => RpsChoice::Paper,
        }
    }
}

impl FromStr for RpsChoice {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rock" | "r" => Ok(RpsChoice::Rock),
            "paper" | "p" => Ok(RpsChoice::Paper),
            "scissors" | "s" => Ok(RpsChoice::Scissors),
            other => Err(ProtocolError::UnknownChoice(other.to_string())),
        }
    }
}

/// A buffered per-round action
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Choice(RpsChoice),
    Answer { answer: String, correct: bool },
}

/// Round outcome framed from the recipient's point of view
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum LudoColor {
    Green,
    Yellow,
    Blue,
    Red,
}

impl LudoColor {
    pub const SEATS: [LudoColor; MAX_LUDO_PLAYERS] = [
        LudoColor::Green,
        LudoColor::Yellow,
        LudoColor::Blue,
        LudoColor::Red,
    ];

    /// Color of the member at the given 0-based join position.
    pub fn for_seat(seat: usize) -> LudoColor {
        Self::SEATS[seat % MAX_LUDO_PLAYERS]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CancelReason {
    PeerLeft,
    Timeout,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MemberAction {
    /// 1-based join order of the member that submitted the action
    pub role: usize,
    pub action: Action,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinRoom {
        room: String,
        #[serde(default)]
        game: GameKind,
        #[serde(default)]
        capacity: Option<usize>,
    },
    SendName {
        room: String,
        name: String,
    },
    RpsChoice {
        room: String,
        choice: RpsChoice,
    },
    SubmitAnswer {
        room: String,
        answer: String,
        #[serde(default)]
        correct: bool,
    },
    SendWord {
        room: String,
        word: String,
    },
    PlayerMove {
        room: String,
        position: i32,
    },
    LudoMove {
        room: String,
        token: u8,
        value: u8,
    },
}

impl ClientEvent {
    /// Room code the event addresses, as typed by the client
    pub fn room(&self) -> &str {
        match self {
            ClientEvent::JoinRoom { room, .. }
            | ClientEvent::SendName { room, .. }
            | ClientEvent::RpsChoice { room, .. }
            | ClientEvent::SubmitAnswer { room, .. }
            | ClientEvent::SendWord { room, .. }
            | ClientEvent::PlayerMove { room, .. }
            | ClientEvent::LudoMove { room, .. } => room,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ServerEvent {
    RoleAssigned {
        room: String,
        role: usize,
    },
    RoomFull {
        room: String,
    },
    WrongGame {
        room: String,
        game: GameKind,
    },
    WaitingForOpponent {
        room: String,
    },
    PeerJoined {
        room: String,
        members: usize,
    },
    RoomReady {
        room: String,
        members: usize,
    },
    PeerName {
        room: String,
        role: usize,
        name: String,
    },
    PeerActed {
        room: String,
        role: usize,
    },
    RoundResult {
        room: String,
        round: u32,
        outcome: Outcome,
        yours: Action,
        actions: Vec<MemberAction>,
        wins: u32,
    },
    RoundCancelled {
        room: String,
        reason: CancelReason,
    },
    PeerWord {
        room: String,
        role: usize,
        word: String,
        score: u32,
        total: u32,
    },
    PeerMoved {
        room: String,
        role: usize,
        position: i32,
    },
    LudoMoved {
        room: String,
        color: LudoColor,
        token: u8,
        value: u8,
        next_turn: LudoColor,
    },
    GameOver {
        room: String,
        winner: usize,
    },
    PeerLeft {
        room: String,
        members: usize,
    },
    RoomExpired {
        room: String,
    },
    ServerFull,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_normalization() {
        assert_eq!(normalize_room_code(" abc "), Some("ABC".to_string()));
        assert_eq!(normalize_room_code("ABC"), Some("ABC".to_string()));
        assert_eq!(normalize_room_code("r1 "), Some("R1".to_string()));
        assert_eq!(normalize_room_code("   "), None);
        assert_eq!(normalize_room_code(""), None);
    }

    #[test]
    fn test_capacity_per_game() {
        assert_eq!(GameKind::RockPaperScissors.capacity(Some(4)), 2);
        assert_eq!(GameKind::WordWar.capacity(None), 2);
        assert_eq!(GameKind::Ludo.capacity(None), 2);
        assert_eq!(GameKind::Ludo.capacity(Some(3)), 3);
        assert_eq!(GameKind::Ludo.capacity(Some(9)), 4);
        assert_eq!(GameKind::Ludo.capacity(Some(1)), 2);
    }

    #[test]
    fn test_rps_cycle() {
        for choice in [RpsChoice::Rock, RpsChoice::Paper, RpsChoice::Scissors] {
            assert_ne!(choice.beats(), choice);
            assert_ne!(choice.beats().beats(), choice);
            assert_eq!(choice.beats().beats().beats(), choice);
        }
    }

    #[test]
    fn test_game_kind_parsing() {
        assert_eq!("rps".parse::<GameKind>().unwrap(), GameKind::RockPaperScissors);
        assert_eq!("Ludo".parse::<GameKind>().unwrap(), GameKind::Ludo);
        assert_eq!(
            GameKind::SpaceRace.as_str().parse::<GameKind>().unwrap(),
            GameKind::SpaceRace
        );
        assert!("chess".parse::<GameKind>().is_err());
    }

    #[test]
    fn test_ludo_seats_follow_join_order() {
        assert_eq!(LudoColor::for_seat(0), LudoColor::Green);
        assert_eq!(LudoColor::for_seat(1), LudoColor::Yellow);
        assert_eq!(LudoColor::for_seat(3), LudoColor::Red);
    }

    #[test]
    fn test_client_event_room() {
        let event = ClientEvent::LudoMove {
            room: "abc".to_string(),
            token: 1,
            value: 6,
        };
        assert_eq!(event.room(), "abc");
    }
}
