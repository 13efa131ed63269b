//! Room store and per-room state
//!
//! A room exists exactly while it has members. It is created by the first
//! join for an unknown code and removed by whichever mutation empties it;
//! nothing else creates or deletes rooms.

use shared::{Action, ConnectionId, GameKind, LudoColor, LUDO_TOKENS};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Observable phase of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    WaitingForMembers,
    Ready,
    RoundInProgress,
}

/// Wins and round counter for the buffered-round games
#[derive(Debug, Clone, Default)]
pub struct RoundTally {
    pub round: u32,
    pub wins: HashMap<ConnectionId, u32>,
}

#[derive(Debug, Clone, Default)]
pub struct WordWarState {
    pub played: HashMap<ConnectionId, HashSet<String>>,
    pub totals: HashMap<ConnectionId, u32>,
}

#[derive(Debug, Clone, Default)]
pub struct SpaceRaceState {
    pub positions: HashMap<ConnectionId, i32>,
}

#[derive(Debug, Clone, Default)]
pub struct LudoState {
    /// Index into `Room::members` of the member to move next
    pub turn: usize,
    pub seats: HashMap<ConnectionId, LudoColor>,
    pub tokens: HashMap<ConnectionId, [u8; LUDO_TOKENS]>,
    pub winner: Option<ConnectionId>,
}

impl LudoState {
    /// First color not held by a current member
    fn free_seat(&self) -> LudoColor {
        LudoColor::SEATS
            .into_iter()
            .find(|color| !self.seats.values().any(|taken| taken == color))
            .unwrap_or(LudoColor::Green)
    }
}

/// Game-specific auxiliary state, one shape per game kind
#[derive(Debug, Clone)]
pub enum GameState {
    RockPaperScissors(RoundTally),
    TriviaDuel(RoundTally),
    WordWar(WordWarState),
    SpaceRace(SpaceRaceState),
    Ludo(LudoState),
}

impl GameState {
    pub fn new(game: GameKind) -> Self {
        match game {
            GameKind::RockPaperScissors => GameState::RockPaperScissors(RoundTally::default()),
            GameKind::TriviaDuel => GameState::TriviaDuel(RoundTally::default()),
            GameKind::WordWar => GameState::WordWar(WordWarState::default()),
            GameKind::SpaceRace => GameState::SpaceRace(SpaceRaceState::default()),
            GameKind::Ludo => GameState::Ludo(LudoState::default()),
        }
    }

    pub fn tally_mut(&mut self) -> Option<&mut RoundTally> {
        match self {
            GameState::RockPaperScissors(tally) | GameState::TriviaDuel(tally) => Some(tally),
            _ => None,
        }
    }

    fn on_join(&mut self, connection: ConnectionId) {
        if let GameState::Ludo(ludo) = self {
            let color = ludo.free_seat();
            ludo.seats.insert(connection, color);
            ludo.tokens.insert(connection, [0; LUDO_TOKENS]);
        }
    }

    /// Drops everything held for a departing member at join position `index`
    fn on_leave(&mut self, connection: ConnectionId, index: usize, remaining: usize) {
        match self {
            GameState::RockPaperScissors(tally) | GameState::TriviaDuel(tally) => {
                tally.wins.remove(&connection);
            }
            GameState::WordWar(words) => {
                words.played.remove(&connection);
                words.totals.remove(&connection);
            }
            GameState::SpaceRace(race) => {
                race.positions.remove(&connection);
            }
            GameState::Ludo(ludo) => {
                ludo.seats.remove(&connection);
                ludo.tokens.remove(&connection);
                if ludo.winner == Some(connection) {
                    ludo.winner = None;
                }
                ludo.turn = crate::rules::ludo_turn_after_leave(ludo.turn, index, remaining);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    pub game: GameKind,
    pub capacity: usize,
    /// Join order; a member's role is its position here plus one
    pub members: Vec<ConnectionId>,
    pub round_buffer: HashMap<ConnectionId, Action>,
    pub names: HashMap<ConnectionId, String>,
    pub state: GameState,
    /// Set while the room is below capacity
    pub waiting_since: Option<Instant>,
    /// Set when the first action of the current round was buffered
    pub round_started: Option<Instant>,
}

impl Room {
    pub fn new(code: String, game: GameKind, capacity: usize) -> Self {
        Self {
            code,
            game,
            capacity,
            members: Vec::with_capacity(capacity),
            round_buffer: HashMap::new(),
            names: HashMap::new(),
            state: GameState::new(game),
            waiting_since: Some(Instant::now()),
            round_started: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.members.contains(&connection)
    }

    /// 1-based join order of a member
    pub fn role_of(&self, connection: ConnectionId) -> Option<usize> {
        self.members
            .iter()
            .position(|&member| member == connection)
            .map(|index| index + 1)
    }

    /// Phase derived from membership and the round buffer
    pub fn phase(&self) -> RoomPhase {
        if !self.is_full() {
            RoomPhase::WaitingForMembers
        } else if self.round_buffer.is_empty() {
            RoomPhase::Ready
        } else {
            RoomPhase::RoundInProgress
        }
    }

    /// Appends a member and returns its role. Returns None if the room is full.
    pub fn admit(&mut self, connection: ConnectionId) -> Option<usize> {
        if self.is_full() {
            return None;
        }

        self.members.push(connection);
        self.state.on_join(connection);
        self.waiting_since = if self.is_full() {
            None
        } else {
            Some(Instant::now())
        };

        Some(self.members.len())
    }

    /// Removes a member with all of its per-member state.
    ///
    /// Returns the 0-based join position it held, or None if it was not a member.
    pub fn remove_member(&mut self, connection: ConnectionId) -> Option<usize> {
        let index = self.members.iter().position(|&member| member == connection)?;

        self.members.remove(index);
        self.round_buffer.remove(&connection);
        self.names.remove(&connection);
        self.state.on_leave(connection, index, self.members.len());
        if self.waiting_since.is_none() {
            self.waiting_since = Some(Instant::now());
        }

        Some(index)
    }

    /// Clears the current round without producing a result
    pub fn discard_round(&mut self) {
        self.round_buffer.clear();
        self.round_started = None;
    }
}

/// Process-wide mapping from normalized room code to room
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<String, Room>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the room for `code`, creating an empty one if none exists.
    ///
    /// The flag is true when the room was created by this call.
    pub fn lookup_or_create(
        &mut self,
        code: &str,
        game: GameKind,
        capacity: usize,
    ) -> (&mut Room, bool) {
        let mut created = false;
        let room = self.rooms.entry(code.to_string()).or_insert_with(|| {
            created = true;
            Room::new(code.to_string(), game, capacity)
        });
        (room, created)
    }

    /// Room for an already normalized code
    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Deletes the room if it has no members left. Returns true if deleted.
    pub fn remove_if_empty(&mut self, code: &str) -> bool {
        if self.rooms.get(code).is_some_and(Room::is_empty) {
            self.rooms.remove(code);
            true
        } else {
            false
        }
    }

    /// Deletes a room regardless of its members. Used when a room expires.
    pub fn remove(&mut self, code: &str) -> Option<Room> {
        self.rooms.remove(code)
    }

    /// Codes of every room that lists `connection` as a member
    pub fn rooms_containing(&self, connection: ConnectionId) -> Vec<String> {
        self.rooms
            .values()
            .filter(|room| room.contains(connection))
            .map(|room| room.code.clone())
            .collect()
    }

    /// Codes of all live rooms, in no particular order
    pub fn codes(&self) -> Vec<String> {
        self.rooms.keys().cloned().collect()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    /// Number of live rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
