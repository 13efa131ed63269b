//! Server network layer: WebSocket sessions and the single-writer event loop

use crate::config::ServerConfig;
use crate::connection::{ConnectionRegistry, Outgoing};
use crate::error::ServerError;
use crate::lifecycle::RoomManager;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{decode, encode, ClientEvent, ConnectionId, Encoding, Frame};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

/// Messages sent from connection tasks to the server loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Outgoing>,
    },
    Event {
        id: ConnectionId,
        event: ClientEvent,
    },
    Disconnected {
        id: ConnectionId,
    },
}

/// Sole owner of connection and room state. Handles one message at a time.
pub struct EventLoop {
    rooms: RoomManager,
    connections: ConnectionRegistry,
}

impl EventLoop {
    /// Creates an empty loop with the configured room timeouts and
    /// connection limit
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            rooms: RoomManager::new(config.timeouts),
            connections: ConnectionRegistry::new(config.max_connections),
        }
    }

    /// Applies one message from a connection task.
    ///
    /// Events from connections that were refused at admission are dropped.
    /// A disconnect unregisters the connection and evicts it from its rooms.
    pub fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Connected { id, addr, sender } => {
                self.connections.add(id, addr, sender);
            }
            ServerMessage::Event { id, event } => {
                if !self.connections.contains(id) {
                    debug!("Ignoring event from unregistered connection {}", id);
                    return;
                }
                self.rooms.handle_event(&mut self.connections, id, event);
            }
            ServerMessage::Disconnected { id } => {
                if self.connections.remove(id) {
                    self.rooms.leave(&mut self.connections, id);
                }
            }
        }
    }

    /// Expires idle rooms and stalled rounds as of `now`
    pub fn sweep(&mut self, now: Instant) {
        self.rooms.sweep(&mut self.connections, now);
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }
}

/// Relay server bound to a TCP port
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    /// Binds the listener on the configured host and port.
    ///
    /// Port 0 picks a free port; read it back with [`Server::local_addr`].
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Main server loop.
    ///
    /// Spawns the acceptor, then applies connection messages and the periodic
    /// sweep one at a time. The acceptor holds a channel handle for as long as
    /// the process lives, so in practice this only returns when the caller
    /// drops the future, as the binary does on Ctrl+C.
    pub async fn run(self) -> Result<(), ServerError> {
        let (server_tx, mut server_rx) = mpsc::unbounded_channel();
        let mut event_loop = EventLoop::new(&self.config);

        spawn_acceptor(self.listener, server_tx);

        let mut sweep = interval(self.config.sweep_interval.max(Duration::from_millis(10)));
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = server_rx.recv() => {
                    match message {
                        Some(message) => event_loop.handle_message(message),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = sweep.tick() => {
                    event_loop.sweep(Instant::now());
                },
            }
        }

        Ok(())
    }
}

/// Spawns the task that accepts TCP connections and numbers them from 1
fn spawn_acceptor(listener: TcpListener, server_tx: mpsc::UnboundedSender<ServerMessage>) {
    tokio::spawn(async move {
        let mut next_id: ConnectionId = 1;

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let id = next_id;
                    next_id += 1;
                    tokio::spawn(serve_connection(id, stream, addr, server_tx.clone()));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    });
}

/// Runs one WebSocket session: forwards decoded events to the server loop
/// and writes queued events back in the client's encoding.
async fn serve_connection(
    id: ConnectionId,
    stream: TcpStream,
    addr: SocketAddr,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let (mut write, mut read) = ws.split();
    let (sender, mut outgoing_rx) = mpsc::unbounded_channel();

    if server_tx
        .send(ServerMessage::Connected { id, addr, sender })
        .is_err()
    {
        return;
    }

    let mut encoding = Encoding::default();

    loop {
        tokio::select! {
            incoming = read.next() => {
                match incoming {
                    Some(Ok(message)) => {
                        if message.is_close() {
                            break;
                        }
                        let Some(frame) = to_frame(message) else {
                            continue;
                        };
                        encoding = frame.encoding();

                        match decode::<ClientEvent>(&frame) {
                            Ok(event) => {
                                if server_tx.send(ServerMessage::Event { id, event }).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Failed to decode frame from connection {}: {}", id, e),
                        }
                    }
                    Some(Err(e)) => {
                        debug!("Connection {} read error: {}", id, e);
                        break;
                    }
                    None => break,
                }
            },

            outgoing = outgoing_rx.recv() => {
                match outgoing {
                    Some(Outgoing::Event(event)) => match encode(&event, encoding) {
                        Ok(frame) => {
                            if let Err(e) = write.send(to_message(frame)).await {
                                debug!("Connection {} write error: {}", id, e);
                                break;
                            }
                        }
                        Err(e) => error!("Failed to encode event for {}: {}", id, e),
                    },
                    Some(Outgoing::Close) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            },
        }
    }

    let _ = server_tx.send(ServerMessage::Disconnected { id });
}

fn to_frame(message: Message) -> Option<Frame> {
    match message {
        Message::Text(text) => Some(Frame::Text(text.as_str().to_owned())),
        Message::Binary(bytes) => Some(Frame::Binary(bytes.to_vec())),
        _ => None,
    }
}

fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::text(text),
        Frame::Binary(bytes) => Message::binary(bytes),
    }
}
