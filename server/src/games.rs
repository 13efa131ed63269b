//! Relayed, non-round game events: names, word war, space race and ludo

use crate::lifecycle::RoomManager;
use crate::relay::{broadcast_to_room, Relay};
use crate::room::{GameState, Room};
use crate::rules;
use log::{debug, info};
use shared::{normalize_room_code, ConnectionId, LudoColor, ServerEvent, LUDO_TOKENS};

pub const MAX_NAME_LEN: usize = 32;
/// Longest word accepted in word war, in characters
pub const MAX_WORD_LEN: usize = 64;

impl RoomManager {
    /// Room named by `raw_code` plus the caller's role, if the caller is a member
    fn member_room(
        &mut self,
        raw_code: &str,
        connection: ConnectionId,
    ) -> Option<(&mut Room, usize)> {
        let code = normalize_room_code(raw_code)?;
        let room = self.store.get_mut(&code)?;
        let role = room.role_of(connection)?;
        Some((room, role))
    }

    /// Records a display name and relays it to the other members
    pub fn send_name<R: Relay + ?Sized>(
        &mut self,
        relay: &mut R,
        connection: ConnectionId,
        raw_code: &str,
        name: &str,
    ) -> bool {
        let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
        if name.is_empty() {
            return false;
        }
        let Some((room, role)) = self.member_room(raw_code, connection) else {
            debug!("Dropping name from {} for {:?}", connection, raw_code);
            return false;
        };

        room.names.insert(connection, name.clone());
        broadcast_to_room(
            relay,
            &room.members,
            &ServerEvent::PeerName {
                room: room.code.clone(),
                role,
                name,
            },
            Some(connection),
        );
        true
    }

    /// Scores a word server-side and relays it to the opponent.
    ///
    /// Blank, repeated and overlong words are dropped. Returns the sender's
    /// new running total when the word counted.
    pub fn send_word<R: Relay + ?Sized>(
        &mut self,
        relay: &mut R,
        connection: ConnectionId,
        raw_code: &str,
        word: &str,
    ) -> Option<u32> {
        let word = rules::normalize_word(word)?;
        if word.chars().count() > MAX_WORD_LEN {
            debug!("Dropping overlong word from {}", connection);
            return None;
        }
        let (room, role) = self.member_room(raw_code, connection)?;
        if !room.is_full() {
            return None;
        }
        let GameState::WordWar(words) = &mut room.state else {
            return None;
        };

        if !words.played.entry(connection).or_default().insert(word.clone()) {
            debug!("Duplicate word {:?} from {}", word, connection);
            return None;
        }
        let score = rules::word_score(&word);
        let total = words.totals.entry(connection).or_insert(0);
        *total = total.saturating_add(score);
        let total = *total;

        broadcast_to_room(
            relay,
            &room.members,
            &ServerEvent::PeerWord {
                room: room.code.clone(),
                role,
                word,
                score,
                total,
            },
            Some(connection),
        );
        Some(total)
    }

    /// Stores a racer's position and relays it to the opponent
    pub fn player_move<R: Relay + ?Sized>(
        &mut self,
        relay: &mut R,
        connection: ConnectionId,
        raw_code: &str,
        position: i32,
    ) -> bool {
        let Some((room, role)) = self.member_room(raw_code, connection) else {
            return false;
        };
        if !room.is_full() {
            return false;
        }
        let GameState::SpaceRace(race) = &mut room.state else {
            return false;
        };

        let position = position.max(0);
        race.positions.insert(connection, position);
        broadcast_to_room(
            relay,
            &room.members,
            &ServerEvent::PeerMoved {
                room: room.code.clone(),
                role,
                position,
            },
            Some(connection),
        );
        true
    }

    /// Applies a ludo move from the member whose turn it is.
    ///
    /// Out-of-turn or illegal moves are dropped and the turn does not pass.
    pub fn ludo_move<R: Relay + ?Sized>(
        &mut self,
        relay: &mut R,
        connection: ConnectionId,
        raw_code: &str,
        token: u8,
        value: u8,
    ) -> Option<LudoColor> {
        let (room, role) = self.member_room(raw_code, connection)?;
        if !room.is_full() {
            return None;
        }
        let member_count = room.members.len();
        let GameState::Ludo(ludo) = &mut room.state else {
            return None;
        };
        if ludo.winner.is_some() || ludo.turn != role - 1 || usize::from(token) >= LUDO_TOKENS {
            debug!("Dropping ludo move from {} in {}", connection, room.code);
            return None;
        }

        let tokens = ludo.tokens.get_mut(&connection)?;
        let next = rules::ludo_step(tokens[usize::from(token)], value)?;
        tokens[usize::from(token)] = next;
        let finished = rules::ludo_finished(tokens);

        let color = ludo.seats.get(&connection).copied()?;
        ludo.turn = rules::ludo_next_turn(ludo.turn, member_count);
        let next_color = room
            .members
            .get(ludo.turn)
            .and_then(|member| ludo.seats.get(member))
            .copied()
            .unwrap_or(color);

        broadcast_to_room(
            relay,
            &room.members,
            &ServerEvent::LudoMoved {
                room: room.code.clone(),
                color,
                token,
                value,
                next_turn: next_color,
            },
            Some(connection),
        );

        if finished {
            ludo.winner = Some(connection);
            info!("Player {} won ludo room {}", role, room.code);
            broadcast_to_room(
                relay,
                &room.members,
                &ServerEvent::GameOver {
                    room: room.code.clone(),
                    winner: role,
                },
                None,
            );
        }

        Some(next_color)
    }
}
