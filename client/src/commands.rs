//! Terminal command parsing and event rendering

use rand::Rng;
use shared::{
    Action, CancelReason, ClientEvent, GameKind, Outcome, RpsChoice, ServerEvent, LUDO_DIE_FACES,
    LUDO_TOKENS,
};
use thiserror::Error;

/// How far one `left`/`right` command moves a racer
pub const RACE_STEP: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(ClientEvent),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("type a command, or `help`")]
    Empty,
    #[error("unknown command {0:?} for {1}")]
    Unknown(String, GameKind),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Per-session input state: the room being played and the local racer position
#[derive(Debug, Clone)]
pub struct CommandState {
    room: String,
    game: GameKind,
    position: i32,
}

impl CommandState {
    pub fn new(room: impl Into<String>, game: GameKind) -> Self {
        Self {
            room: room.into(),
            game,
            position: 0,
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn game(&self) -> GameKind {
        self.game
    }

    pub fn join_event(&self, capacity: Option<usize>) -> ClientEvent {
        ClientEvent::JoinRoom {
            room: self.room.clone(),
            game: self.game,
            capacity,
        }
    }

    /// Turns one input line into a command for the current game.
    ///
    /// Ludo rolls the die locally when no value is given.
    pub fn parse<R: Rng + ?Sized>(
        &mut self,
        line: &str,
        rng: &mut R,
    ) -> Result<Command, CommandError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let room = self.room.clone();

        match (verb.to_lowercase().as_str(), self.game) {
            ("", _) => Err(CommandError::Empty),
            ("quit" | "exit", _) => Ok(Command::Quit),
            ("help", _) => Ok(Command::Help),
            ("name", _) => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("name <display name>"));
                }
                Ok(Command::Send(ClientEvent::SendName {
                    room,
                    name: rest.to_string(),
                }))
            }
            (choice, GameKind::RockPaperScissors) => choice
                .parse::<RpsChoice>()
                .map(|choice| Command::Send(ClientEvent::RpsChoice { room, choice }))
                .map_err(|_| CommandError::Unknown(verb.to_string(), self.game)),
            (verb @ ("answer" | "answer!"), GameKind::TriviaDuel) => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("answer <text> | answer! <text>"));
                }
                Ok(Command::Send(ClientEvent::SubmitAnswer {
                    room,
                    answer: rest.to_string(),
                    correct: verb == "answer!",
                }))
            }
            ("word", GameKind::WordWar) => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("word <word>"));
                }
                Ok(Command::Send(ClientEvent::SendWord {
                    room,
                    word: rest.to_string(),
                }))
            }
            (direction @ ("left" | "right"), GameKind::SpaceRace) => {
                let step = if direction == "left" { -RACE_STEP } else { RACE_STEP };
                self.position = (self.position + step).max(0);
                Ok(Command::Send(ClientEvent::PlayerMove {
                    room,
                    position: self.position,
                }))
            }
            ("move", GameKind::Ludo) => {
                const USAGE: &str = "move <token 1-4> [die value 1-6]";
                let mut args = rest.split_whitespace();
                let token: usize = args
                    .next()
                    .and_then(|t| t.parse().ok())
                    .filter(|t| (1..=LUDO_TOKENS).contains(t))
                    .ok_or(CommandError::Usage(USAGE))?;
                let value = match args.next() {
                    Some(v) => v
                        .parse::<u8>()
                        .ok()
                        .filter(|v| (1..=LUDO_DIE_FACES).contains(v))
                        .ok_or(CommandError::Usage(USAGE))?,
                    None => rng.gen_range(1..=LUDO_DIE_FACES),
                };
                Ok(Command::Send(ClientEvent::LudoMove {
                    room,
                    token: (token - 1) as u8,
                    value,
                }))
            }
            _ => Err(CommandError::Unknown(verb.to_string(), self.game)),
        }
    }
}

/// Commands available for a game, one per line
pub fn help(game: GameKind) -> &'static str {
    match game {
        GameKind::RockPaperScissors => "rock | paper | scissors, name <name>, quit",
        GameKind::TriviaDuel => "answer <text> (wrong) | answer! <text> (right), name <name>, quit",
        GameKind::WordWar => "word <word>, name <name>, quit",
        GameKind::SpaceRace => "left | right, name <name>, quit",
        GameKind::Ludo => "move <token 1-4> [value], name <name>, quit",
    }
}

fn describe_action(action: &Action) -> String {
    match action {
        Action::Choice(choice) => format!("{:?}", choice).to_lowercase(),
        Action::Answer { answer, correct } => {
            format!("{:?} ({})", answer, if *correct { "right" } else { "wrong" })
        }
    }
}

/// One-line human rendering of a server event
pub fn describe(event: &ServerEvent) -> String {
    match event {
        ServerEvent::RoleAssigned { room, role } => format!("[{}] you are player {}", room, role),
        ServerEvent::RoomFull { room } => format!("[{}] room is full", room),
        ServerEvent::WrongGame { room, game } => format!("[{}] room is playing {}", room, game),
        ServerEvent::WaitingForOpponent { room } => {
            format!("[{}] waiting for an opponent...", room)
        }
        ServerEvent::PeerJoined { room, members } => {
            format!("[{}] a player joined ({} in room)", room, members)
        }
        ServerEvent::RoomReady { room, members } => {
            format!("[{}] room ready with {} players", room, members)
        }
        ServerEvent::PeerName { room, role, name } => {
            format!("[{}] player {} is {}", room, role, name)
        }
        ServerEvent::PeerActed { room, role } => format!("[{}] player {} has acted", room, role),
        ServerEvent::RoundResult {
            room,
            round,
            outcome,
            yours,
            actions,
            wins,
        } => {
            let verdict = match outcome {
                Outcome::Win => "you win",
                Outcome::Lose => "you lose",
                Outcome::Draw => "draw",
            };
            let others: Vec<String> = actions
                .iter()
                .map(|member| format!("p{}: {}", member.role, describe_action(&member.action)))
                .collect();
            format!(
                "[{}] round {}: {} with {} [{}], {} wins so far",
                room,
                round,
                verdict,
                describe_action(yours),
                others.join(", "),
                wins
            )
        }
        ServerEvent::RoundCancelled { room, reason } => {
            let why = match reason {
                CancelReason::PeerLeft => "a player left",
                CancelReason::Timeout => "it timed out",
            };
            format!("[{}] round cancelled because {}", room, why)
        }
        ServerEvent::PeerWord {
            room,
            role,
            word,
            score,
            total,
        } => format!(
            "[{}] player {} played {:?} for {} ({} total)",
            room, role, word, score, total
        ),
        ServerEvent::PeerMoved {
            room,
            role,
            position,
        } => format!("[{}] player {} moved to {}", room, role, position),
        ServerEvent::LudoMoved {
            room,
            color,
            token,
            value,
            next_turn,
        } => format!(
            "[{}] {:?} moved token {} by {}, {:?} to play",
            room,
            color,
            token + 1,
            value,
            next_turn
        ),
        ServerEvent::GameOver { room, winner } => {
            format!("[{}] game over, player {} wins", room, winner)
        }
        ServerEvent::PeerLeft { room, members } => {
            format!("[{}] a player left ({} remaining)", room, members)
        }
        ServerEvent::RoomExpired { room } => format!("[{}] room expired", room),
        ServerEvent::ServerFull => "server is full, try again later".to_string(),
    }
}
