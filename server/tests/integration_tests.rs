//! Integration tests for the relay over real WebSocket connections
//!
//! Each test binds a server on an ephemeral port and drives it with the
//! client library or with raw frames.

use client::{ClientError, RoomClient};
use futures_util::{SinkExt, StreamExt};
use server::{RoomTimeouts, Server, ServerConfig};
use shared::{
    decode, encode, Action, CancelReason, ClientEvent, Encoding, Frame, GameKind, Outcome,
    RpsChoice, ServerEvent,
};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(200);

async fn start_server(config: ServerConfig) -> String {
    let server = Server::bind(ServerConfig {
        port: 0,
        ..config
    })
    .await
    .expect("Failed to bind server");
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    format!("ws://{}", addr)
}

async fn connect(url: &str) -> RoomClient {
    RoomClient::connect(url, Encoding::Json)
        .await
        .expect("Failed to connect")
}

fn join_rps(room: &str) -> ClientEvent {
    ClientEvent::JoinRoom {
        room: room.to_string(),
        game: GameKind::RockPaperScissors,
        capacity: None,
    }
}

/// Reads events until one matches, failing on timeout
async fn wait_for<F>(client: &mut RoomClient, mut matches: F) -> ServerEvent
where
    F: FnMut(&ServerEvent) -> bool,
{
    loop {
        let event = client
            .next_event_timeout(WAIT)
            .await
            .expect("Expected a server event");
        if matches(&event) {
            return event;
        }
    }
}

/// Two clients in a ready rock-paper-scissors room "R1"
async fn ready_pair(url: &str) -> (RoomClient, RoomClient) {
    let mut a = connect(url).await;
    let mut b = connect(url).await;

    a.send(&join_rps("R1")).await.unwrap();
    wait_for(&mut a, |e| matches!(e, ServerEvent::WaitingForOpponent { .. })).await;
    b.send(&join_rps("r1 ")).await.unwrap();

    wait_for(&mut a, |e| matches!(e, ServerEvent::RoomReady { .. })).await;
    wait_for(&mut b, |e| matches!(e, ServerEvent::RoomReady { .. })).await;
    (a, b)
}

mod room_tests {
    use super::*;

    /// Codes are matched case-insensitively and roles follow join order
    #[tokio::test]
    async fn join_assigns_roles_in_order() {
        let url = start_server(ServerConfig::default()).await;
        let mut a = connect(&url).await;
        let mut b = connect(&url).await;

        a.send(&join_rps("R1")).await.unwrap();
        assert_eq!(
            a.next_event_timeout(WAIT).await.unwrap(),
            ServerEvent::RoleAssigned {
                room: "R1".to_string(),
                role: 1
            }
        );
        assert_eq!(
            a.next_event_timeout(WAIT).await.unwrap(),
            ServerEvent::WaitingForOpponent {
                room: "R1".to_string()
            }
        );

        b.send(&join_rps("r1 ")).await.unwrap();
        assert_eq!(
            b.next_event_timeout(WAIT).await.unwrap(),
            ServerEvent::RoleAssigned {
                room: "R1".to_string(),
                role: 2
            }
        );
        assert_eq!(
            a.next_event_timeout(WAIT).await.unwrap(),
            ServerEvent::PeerJoined {
                room: "R1".to_string(),
                members: 2
            }
        );
    }

    #[tokio::test]
    async fn third_player_gets_room_full() {
        let url = start_server(ServerConfig::default()).await;
        let (_a, _b) = ready_pair(&url).await;
        let mut c = connect(&url).await;

        c.send(&join_rps("R1")).await.unwrap();
        assert_eq!(
            c.next_event_timeout(WAIT).await.unwrap(),
            ServerEvent::RoomFull {
                room: "R1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn disconnect_notifies_remaining_member() {
        let url = start_server(ServerConfig::default()).await;
        let (mut a, b) = ready_pair(&url).await;

        b.close().await.unwrap();

        assert_eq!(
            wait_for(&mut a, |e| matches!(e, ServerEvent::PeerLeft { .. })).await,
            ServerEvent::PeerLeft {
                room: "R1".to_string(),
                members: 1
            }
        );

        // the freed seat can be taken again
        let mut c = connect(&url).await;
        c.send(&join_rps("R1")).await.unwrap();
        assert_eq!(
            c.next_event_timeout(WAIT).await.unwrap(),
            ServerEvent::RoleAssigned {
                room: "R1".to_string(),
                role: 2
            }
        );
    }

    #[tokio::test]
    async fn server_full_refuses_extra_connections() {
        let url = start_server(ServerConfig {
            max_connections: 1,
            ..ServerConfig::default()
        })
        .await;
        let mut a = connect(&url).await;
        a.send(&join_rps("R1")).await.unwrap();
        wait_for(&mut a, |e| matches!(e, ServerEvent::RoleAssigned { .. })).await;

        let mut b = connect(&url).await;
        assert_eq!(b.next_event_timeout(WAIT).await.unwrap(), ServerEvent::ServerFull);
        assert!(matches!(
            b.next_event_timeout(WAIT).await,
            Err(ClientError::Closed) | Err(ClientError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn idle_room_expires() {
        let url = start_server(ServerConfig {
            timeouts: RoomTimeouts {
                idle_room: Some(Duration::from_millis(100)),
                round: None,
            },
            sweep_interval: Duration::from_millis(20),
            ..ServerConfig::default()
        })
        .await;
        let mut a = connect(&url).await;
        a.send(&join_rps("LONELY")).await.unwrap();

        assert_eq!(
            wait_for(&mut a, |e| matches!(e, ServerEvent::RoomExpired { .. })).await,
            ServerEvent::RoomExpired {
                room: "LONELY".to_string()
            }
        );
    }
}

mod round_tests {
    use super::*;

    fn outcome(event: &ServerEvent) -> Option<Outcome> {
        match event {
            ServerEvent::RoundResult { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }

    /// Each player sees the same round from their own side
    #[tokio::test]
    async fn rps_round_results_are_mirrored() {
        let url = start_server(ServerConfig::default()).await;
        let (mut a, mut b) = ready_pair(&url).await;

        a.send(&ClientEvent::RpsChoice {
            room: "R1".to_string(),
            choice: RpsChoice::Rock,
        })
        .await
        .unwrap();
        assert_eq!(
            wait_for(&mut b, |e| matches!(e, ServerEvent::PeerActed { .. })).await,
            ServerEvent::PeerActed {
                room: "R1".to_string(),
                role: 1
            }
        );

        b.send(&ClientEvent::RpsChoice {
            room: "r1".to_string(),
            choice: RpsChoice::Scissors,
        })
        .await
        .unwrap();

        let a_result = wait_for(&mut a, |e| outcome(e).is_some()).await;
        let b_result = wait_for(&mut b, |e| outcome(e).is_some()).await;
        assert_eq!(outcome(&a_result), Some(Outcome::Win));
        assert_eq!(outcome(&b_result), Some(Outcome::Lose));

        match b_result {
            ServerEvent::RoundResult {
                round, yours, wins, ..
            } => {
                assert_eq!(round, 1);
                assert_eq!(yours, Action::Choice(RpsChoice::Scissors));
                assert_eq!(wins, 0);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn action_for_unknown_room_is_ignored() {
        let url = start_server(ServerConfig::default()).await;
        let mut a = connect(&url).await;

        a.send(&ClientEvent::RpsChoice {
            room: "NOPE".to_string(),
            choice: RpsChoice::Paper,
        })
        .await
        .unwrap();
        assert_eq!(a.try_next_event(QUIET).await.unwrap(), None);

        // the session is still usable
        a.send(&join_rps("NOPE")).await.unwrap();
        assert_eq!(
            a.next_event_timeout(WAIT).await.unwrap(),
            ServerEvent::RoleAssigned {
                room: "NOPE".to_string(),
                role: 1
            }
        );
    }

    #[tokio::test]
    async fn departure_cancels_open_round() {
        let url = start_server(ServerConfig::default()).await;
        let (mut a, b) = ready_pair(&url).await;

        a.send(&ClientEvent::RpsChoice {
            room: "R1".to_string(),
            choice: RpsChoice::Rock,
        })
        .await
        .unwrap();
        b.close().await.unwrap();

        assert_eq!(
            wait_for(&mut a, |e| matches!(e, ServerEvent::RoundCancelled { .. })).await,
            ServerEvent::RoundCancelled {
                room: "R1".to_string(),
                reason: CancelReason::PeerLeft
            }
        );
    }
}

mod protocol_tests {
    use super::*;

    type RawSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn raw_connect(url: &str) -> RawSocket {
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("Failed to connect");
        stream
    }

    /// Browsers send hand-written JSON and expect JSON back
    #[tokio::test]
    async fn json_text_frames_get_json_replies() {
        let url = start_server(ServerConfig::default()).await;
        let mut ws = raw_connect(&url).await;

        ws.send(Message::text(r#"{"join-room":{"room":"abc"}}"#))
            .await
            .unwrap();

        let reply = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("Timed out")
            .expect("Stream ended")
            .unwrap();
        let Message::Text(text) = reply else {
            panic!("Expected a text frame, got {:?}", reply);
        };
        let event: ServerEvent = decode(&Frame::Text(text.as_str().to_owned())).unwrap();
        assert_eq!(
            event,
            ServerEvent::RoleAssigned {
                room: "ABC".to_string(),
                role: 1
            }
        );
    }

    #[tokio::test]
    async fn binary_frames_get_binary_replies() {
        let url = start_server(ServerConfig::default()).await;
        let mut ws = raw_connect(&url).await;

        let Frame::Binary(bytes) = encode(&join_rps("BIN"), Encoding::Binary).unwrap() else {
            panic!("Expected a binary frame");
        };
        ws.send(Message::binary(bytes)).await.unwrap();

        let reply = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("Timed out")
            .expect("Stream ended")
            .unwrap();
        let Message::Binary(bytes) = reply else {
            panic!("Expected a binary frame, got {:?}", reply);
        };
        let event: ServerEvent = decode(&Frame::Binary(bytes.to_vec())).unwrap();
        assert_eq!(
            event,
            ServerEvent::RoleAssigned {
                room: "BIN".to_string(),
                role: 1
            }
        );
    }

    #[tokio::test]
    async fn garbage_frame_does_not_drop_connection() {
        let url = start_server(ServerConfig::default()).await;
        let mut a = connect(&url).await;
        let mut ws = raw_connect(&url).await;

        ws.send(Message::text("not json")).await.unwrap();
        ws.send(Message::text(r#"{"join-room":{"room":"G"}}"#))
            .await
            .unwrap();

        let reply = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("Timed out")
            .expect("Stream ended")
            .unwrap();
        assert!(reply.is_text());

        a.send(&join_rps("G")).await.unwrap();
        wait_for(&mut a, |e| matches!(e, ServerEvent::RoomReady { .. })).await;
    }
}
