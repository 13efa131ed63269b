//! Broadcast/relay layer
//!
//! The room core never touches sockets. It pushes events through a [`Relay`],
//! which the connection registry implements for live sessions and tests
//! implement with a recorder.

use shared::{ConnectionId, ServerEvent};

/// Best-effort, in-order-per-connection delivery of server events
pub trait Relay {
    /// Unicast to exactly one connection. Delivery failures are the relay's
    /// to log; they are never reported back into the room core.
    fn send_to(&mut self, connection: ConnectionId, event: ServerEvent);
}

/// Sends `event` to every member of a room except `excluding`.
pub fn broadcast_to_room<R: Relay + ?Sized>(
    relay: &mut R,
    members: &[ConnectionId],
    event: &ServerEvent,
    excluding: Option<ConnectionId>,
) {
    for &member in members {
        if Some(member) == excluding {
            continue;
        }
        relay.send_to(member, event.clone());
    }
}

/// Relay that keeps everything it was asked to send
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingRelay {
    pub sent: Vec<(ConnectionId, ServerEvent)>,
}

#[cfg(test)]
impl RecordingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered to one connection, in send order
    pub fn to(&self, connection: ConnectionId) -> Vec<ServerEvent> {
        self.sent
            .iter()
            .filter(|(id, _)| *id == connection)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

#[cfg(test)]
impl Relay for RecordingRelay {
    fn send_to(&mut self, connection: ConnectionId, event: ServerEvent) {
        self.sent.push((connection, event));
    }
}
