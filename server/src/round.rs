//! Round coordination for the buffered-action games
//!
//! A round completes when the buffer holds one action per current member.
//! Keys can only be members (departures remove their entry), so comparing
//! sizes is enough.

use crate::lifecycle::RoomManager;
use crate::relay::{broadcast_to_room, Relay};
use crate::room::Room;
use crate::rules;
use log::debug;
use shared::{normalize_room_code, Action, ConnectionId, GameKind, MemberAction, ServerEvent};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Stale, foreign or premature action; nothing changed
    Dropped,
    /// Buffered, still waiting on other members
    Pending,
    /// This action completed the round; results were sent
    Completed { round: u32 },
}

fn accepts(game: GameKind, action: &Action) -> bool {
    matches!(
        (game, action),
        (GameKind::RockPaperScissors, Action::Choice(_))
            | (GameKind::TriviaDuel, Action::Answer { .. })
    )
}

impl RoomManager {
    /// Buffers one member's action for the current round.
    ///
    /// Later submissions from the same member overwrite earlier ones until
    /// the round completes. Actions for unknown rooms, from non-members, of
    /// the wrong kind, or sent before the room is full are dropped. Never
    /// creates a room.
    pub fn submit_action<R: Relay + ?Sized>(
        &mut self,
        relay: &mut R,
        connection: ConnectionId,
        raw_code: &str,
        action: Action,
    ) -> Submission {
        let Some(room) = normalize_room_code(raw_code).and_then(|code| self.store.get_mut(&code))
        else {
            debug!("Dropping action for unknown room {:?}", raw_code);
            return Submission::Dropped;
        };

        let Some(role) = room.role_of(connection) else {
            debug!("Dropping action from non-member {} in {}", connection, room.code);
            return Submission::Dropped;
        };

        if !accepts(room.game, &action) || !room.is_full() {
            debug!("Dropping action from {} in {}", connection, room.code);
            return Submission::Dropped;
        }

        if room.round_buffer.is_empty() {
            room.round_started = Some(Instant::now());
        }
        room.round_buffer.insert(connection, action);

        broadcast_to_room(
            relay,
            &room.members,
            &ServerEvent::PeerActed {
                room: room.code.clone(),
                role,
            },
            Some(connection),
        );

        if room.round_buffer.len() == room.members.len() {
            complete_round(relay, room)
        } else {
            Submission::Pending
        }
    }
}

/// Applies the rules to a complete buffer, sends each member its own result
/// and clears the buffer for the next round.
fn complete_round<R: Relay + ?Sized>(relay: &mut R, room: &mut Room) -> Submission {
    let Some(outcomes) = rules::round_outcomes(&room.members, &room.round_buffer) else {
        return Submission::Pending;
    };

    let actions: Vec<MemberAction> = room
        .members
        .iter()
        .enumerate()
        .filter_map(|(index, member)| {
            room.round_buffer.get(member).map(|action| MemberAction {
                role: index + 1,
                action: action.clone(),
            })
        })
        .collect();

    let members = room.members.clone();
    let Some(tally) = room.state.tally_mut() else {
        return Submission::Dropped;
    };
    tally.round += 1;
    let round = tally.round;

    for (member, outcome) in members.iter().zip(&outcomes) {
        let wins = tally.wins.entry(*member).or_insert(0);
        if *outcome == shared::Outcome::Win {
            *wins += 1;
        }
    }

    for (index, (member, outcome)) in members.iter().zip(outcomes).enumerate() {
        relay.send_to(
            *member,
            ServerEvent::RoundResult {
                room: room.code.clone(),
                round,
                outcome,
                yours: actions[index].action.clone(),
                actions: actions.clone(),
                wins: tally.wins.get(member).copied().unwrap_or(0),
            },
        );
    }

    debug!("Room {} completed round {}", room.code, round);
    room.round_buffer.clear();
    room.round_started = None;

    Submission::Completed { round }
}
