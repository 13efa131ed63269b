//! # Room Relay Server Library
//!
//! This library provides the realtime relay that pairs players of the casual
//! games platform into rooms and forwards their game events. The server never
//! renders or simulates a game; it only tracks membership, buffers round
//! actions, decides round outcomes and relays everything else.
//!
//! ## Core Responsibilities
//!
//! ### Room Matching
//! Clients join a room by a short shared code. The first join creates the
//! room, later joins fill it up to the game's capacity, and every member is
//! told its 1-based role in join order.
//!
//! ### Round Resolution
//! Round-based games (rock-paper-scissors and trivia duels) collect one action
//! per member. Once everyone has acted, each member receives the outcome from
//! its own point of view and the round buffer is cleared.
//!
//! ### Disconnect Cleanup
//! A closed connection is removed from every room it belongs to. Remaining
//! members are notified and rooms that become empty are deleted.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Event Loop
//! Each WebSocket session runs in its own task and forwards decoded events on
//! a channel. One loop owns all room and connection state and applies the
//! events sequentially, so no locking is needed and every room mutation is
//! atomic with respect to other events.
//!
//! ### Relay Seam
//! Room logic emits events through the [`relay::Relay`] trait instead of
//! touching sockets, which keeps the whole room core testable in memory.
//!
//! ## Module Organization
//!
//! - `room`: room records, per-game state and the code-keyed store
//! - `lifecycle`: join, leave and timeout sweep
//! - `round`: round buffering and completion
//! - `games`: relayed events for names, word war, space race and ludo
//! - `rules`: pure outcome and scoring rules
//! - `connection`: live connection registry
//! - `network`: WebSocket acceptor, session tasks and event loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod games;
pub mod handler;
pub mod lifecycle;
pub mod network;
pub mod relay;
pub mod room;
pub mod round;
pub mod rules;

pub use config::{RoomTimeouts, ServerConfig};
pub use error::ServerError;
pub use lifecycle::{JoinOutcome, RoomManager};
pub use network::{EventLoop, Server, ServerMessage};
pub use round::Submission;
