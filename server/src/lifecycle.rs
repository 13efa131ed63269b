//! Room lifecycle: admission, departure and idle expiry
//!
//! Every path that can empty a room ends with an explicit emptiness check
//! and removal from the store.

use crate::config::RoomTimeouts;
use crate::relay::{broadcast_to_room, Relay};
use crate::room::{GameState, Room, RoomStore};
use log::{debug, info};
use shared::{normalize_room_code, CancelReason, ConnectionId, GameKind, ServerEvent};
use std::time::Instant;

/// Result of a join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { role: usize, created: bool, ready: bool },
    /// The connection was already a member; its role was re-sent
    AlreadyMember { role: usize },
    RoomFull,
    WrongGame { game: GameKind },
    /// Blank room code, ignored without a reply
    InvalidCode,
}

/// Owns the room store and applies every room mutation
pub struct RoomManager {
    pub(crate) store: RoomStore,
    pub(crate) timeouts: RoomTimeouts,
}

impl RoomManager {
    pub fn new(timeouts: RoomTimeouts) -> Self {
        Self {
            store: RoomStore::new(),
            timeouts,
        }
    }

    /// Read-only view of every live room
    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    /// Admits `connection` to the room named by `raw_code`.
    ///
    /// Creates the room on first join with the game's capacity. A full room
    /// or a room of a different game rejects the request with an event sent
    /// only to the requester. Joining while in another room leaves that room
    /// first.
    pub fn join<R: Relay + ?Sized>(
        &mut self,
        relay: &mut R,
        connection: ConnectionId,
        raw_code: &str,
        game: GameKind,
        capacity: Option<usize>,
    ) -> JoinOutcome {
        let Some(code) = normalize_room_code(raw_code) else {
            debug!("Ignoring join with blank room code from {}", connection);
            return JoinOutcome::InvalidCode;
        };

        if let Some(role) = self.store.get(&code).and_then(|room| room.role_of(connection)) {
            relay.send_to(connection, ServerEvent::RoleAssigned { room: code, role });
            return JoinOutcome::AlreadyMember { role };
        }

        if let Some(room) = self.store.get(&code) {
            if room.game != game {
                relay.send_to(
                    connection,
                    ServerEvent::WrongGame {
                        room: code,
                        game: room.game,
                    },
                );
                return JoinOutcome::WrongGame { game: room.game };
            }
            if room.is_full() {
                debug!("Room {} is full, rejecting {}", code, connection);
                relay.send_to(connection, ServerEvent::RoomFull { room: code });
                return JoinOutcome::RoomFull;
            }
        }

        if !self.store.rooms_containing(connection).is_empty() {
            self.leave(relay, connection);
        }

        let (room, created) = self
            .store
            .lookup_or_create(&code, game, game.capacity(capacity));
        if created {
            info!(
                "Created {} room {} (capacity {})",
                room.game, room.code, room.capacity
            );
        }

        let Some(role) = room.admit(connection) else {
            relay.send_to(connection, ServerEvent::RoomFull { room: code });
            return JoinOutcome::RoomFull;
        };
        info!(
            "Connection {} joined room {} as player {}",
            connection, room.code, role
        );

        relay.send_to(
            connection,
            ServerEvent::RoleAssigned {
                room: code.clone(),
                role,
            },
        );
        catch_up(relay, room, connection);

        let members = room.members.len();
        broadcast_to_room(
            relay,
            &room.members,
            &ServerEvent::PeerJoined {
                room: code.clone(),
                members,
            },
            Some(connection),
        );

        let ready = room.is_full();
        if ready {
            broadcast_to_room(
                relay,
                &room.members,
                &ServerEvent::RoomReady {
                    room: code,
                    members,
                },
                None,
            );
        } else {
            relay.send_to(connection, ServerEvent::WaitingForOpponent { room: code });
        }

        JoinOutcome::Joined {
            role,
            created,
            ready,
        }
    }

    /// Removes `connection` from every room that lists it.
    ///
    /// An open round in an affected room is discarded. Remaining members are
    /// told who left and receive fresh roles if their join position moved.
    /// Returns how many rooms the connection was removed from.
    pub fn leave<R: Relay + ?Sized>(&mut self, relay: &mut R, connection: ConnectionId) -> usize {
        let codes = self.store.rooms_containing(connection);

        for code in &codes {
            let Some(room) = self.store.get_mut(code) else {
                continue;
            };

            let round_open = !room.round_buffer.is_empty();
            let Some(index) = room.remove_member(connection) else {
                continue;
            };
            info!("Connection {} left room {}", connection, code);

            broadcast_to_room(
                relay,
                &room.members,
                &ServerEvent::PeerLeft {
                    room: code.clone(),
                    members: room.members.len(),
                },
                None,
            );

            if round_open {
                room.discard_round();
                debug!("Discarded open round in room {}", code);
                broadcast_to_room(
                    relay,
                    &room.members,
                    &ServerEvent::RoundCancelled {
                        room: code.clone(),
                        reason: CancelReason::PeerLeft,
                    },
                    None,
                );
            }

            for (position, &member) in room.members.iter().enumerate().skip(index) {
                relay.send_to(
                    member,
                    ServerEvent::RoleAssigned {
                        room: code.clone(),
                        role: position + 1,
                    },
                );
            }

            if self.store.remove_if_empty(code) {
                info!("Room {} is empty, removed", code);
            }
        }

        codes.len()
    }

    /// Expires rooms that waited too long for members and rounds that waited
    /// too long for actions. Returns the number of rooms removed.
    pub fn sweep<R: Relay + ?Sized>(&mut self, relay: &mut R, now: Instant) -> usize {
        let mut expired = Vec::new();

        for code in self.store.codes() {
            let Some(room) = self.store.get_mut(&code) else {
                continue;
            };

            let idle = matches!(
                (room.waiting_since, self.timeouts.idle_room),
                (Some(since), Some(limit)) if now.saturating_duration_since(since) >= limit
            );
            if idle {
                expired.push(code);
                continue;
            }

            let stalled = matches!(
                (room.round_started, self.timeouts.round),
                (Some(since), Some(limit)) if now.saturating_duration_since(since) >= limit
            );
            if stalled {
                room.discard_round();
                info!("Round in room {} timed out", code);
                broadcast_to_room(
                    relay,
                    &room.members,
                    &ServerEvent::RoundCancelled {
                        room: code.clone(),
                        reason: CancelReason::Timeout,
                    },
                    None,
                );
            }
        }

        for code in &expired {
            if let Some(room) = self.store.remove(code) {
                info!("Room {} expired waiting for members", code);
                broadcast_to_room(
                    relay,
                    &room.members,
                    &ServerEvent::RoomExpired { room: code.clone() },
                    None,
                );
            }
        }

        expired.len()
    }
}

/// Tells a newcomer what the existing members already shared
fn catch_up<R: Relay + ?Sized>(relay: &mut R, room: &Room, newcomer: ConnectionId) {
    for (index, &member) in room.members.iter().enumerate() {
        if member == newcomer {
            continue;
        }
        if let Some(name) = room.names.get(&member) {
            relay.send_to(
                newcomer,
                ServerEvent::PeerName {
                    room: room.code.clone(),
                    role: index + 1,
                    name: name.clone(),
                },
            );
        }
        if let GameState::SpaceRace(race) = &room.state {
            if let Some(&position) = race.positions.get(&member) {
                relay.send_to(
                    newcomer,
                    ServerEvent::PeerMoved {
                        room: room.code.clone(),
                        role: index + 1,
                        position,
                    },
                );
            }
        }
    }
}
