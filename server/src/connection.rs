//! Live connection tracking for the relay server
//!
//! This module keeps the server-side view of every open WebSocket session:
//! - Admission against the configured connection limit
//! - The outbound channel used to reach each connection's task
//! - Delivery of room events, implementing [`Relay`]
//!
//! Ids are assigned by the acceptor; the registry only records which of
//! them are currently live.

use crate::relay::Relay;
use log::{info, warn};
use shared::{ConnectionId, ServerEvent};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

/// Instructions from the server loop to one connection task
#[derive(Debug)]
pub enum Outgoing {
    Event(ServerEvent),
    Close,
}

/// One live session
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    /// Peer address, for logging
    pub addr: SocketAddr,
    pub connected_at: Instant,
    sender: mpsc::UnboundedSender<Outgoing>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Outgoing>,
    ) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        }
    }

    /// Queues an event; false when the connection task has already gone
    pub fn send(&self, event: ServerEvent) -> bool {
        self.sender.send(Outgoing::Event(event)).is_ok()
    }

    pub fn close(&self) {
        let _ = self.sender.send(Outgoing::Close);
    }
}

/// All live connections, bounded by `max_connections`
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    max_connections: usize,
}

impl ConnectionRegistry {
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: HashMap::new(),
            max_connections,
        }
    }

    /// Registers a new connection.
    ///
    /// When the server is at capacity the connection is sent `server-full`,
    /// closed, and false is returned.
    pub fn add(
        &mut self,
        id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Outgoing>,
    ) -> bool {
        let connection = Connection::new(id, addr, sender);

        if self.connections.len() >= self.max_connections {
            warn!("Server full, refusing connection {} from {}", id, addr);
            connection.send(ServerEvent::ServerFull);
            connection.close();
            return false;
        }

        info!("Connection {} opened from {}", id, addr);
        self.connections.insert(id, connection);
        true
    }

    /// Forgets a connection. Returns true if it was registered.
    pub fn remove(&mut self, id: ConnectionId) -> bool {
        if let Some(connection) = self.connections.remove(&id) {
            info!(
                "Connection {} from {} closed after {:.1}s",
                id,
                connection.addr,
                connection.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Relay for ConnectionRegistry {
    fn send_to(&mut self, connection: ConnectionId, event: ServerEvent) {
        match self.connections.get(&connection) {
            Some(live) => {
                if !live.send(event) {
                    warn!("Connection {} is gone, dropping event", connection);
                }
            }
            None => warn!("No live connection {}, dropping event", connection),
        }
    }
}
