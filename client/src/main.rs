use clap::Parser;
use client::commands::help;
use client::{describe, generate_room_code, ClientError, Command, CommandState, RoomClient};
use log::{info, warn};
use shared::{ClientEvent, Encoding, GameKind, ServerEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay WebSocket URL
    #[arg(short = 's', long, env = "RELAY_URL", default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Room code to join; a random one is generated when omitted
    #[arg(short, long)]
    room: Option<String>,

    /// Game to play: rps, trivia, words, race or ludo
    #[arg(short, long, default_value = "rps")]
    game: GameKind,

    /// Display name shared with the other players
    #[arg(short, long)]
    name: Option<String>,

    /// Ludo table size when creating the room (2-4)
    #[arg(short, long)]
    capacity: Option<usize>,

    /// Send bincode frames instead of JSON
    #[arg(short, long)]
    binary: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let room = args
        .room
        .unwrap_or_else(|| generate_room_code(&mut rand::thread_rng()));
    let encoding = if args.binary {
        Encoding::Binary
    } else {
        Encoding::Json
    };

    info!("Connecting to: {}", args.server);
    let mut client = RoomClient::connect(&args.server, encoding).await?;
    let mut state = CommandState::new(room, args.game);

    client.send(&state.join_event(args.capacity)).await?;
    if let Some(name) = args.name {
        client
            .send(&ClientEvent::SendName {
                room: state.room().to_string(),
                name,
            })
            .await?;
    }

    println!("Playing {} in room {}", state.game(), state.room());
    println!("Commands: {}", help(state.game()));

    let mut lines = spawn_stdin_reader();
    let mut rng = rand::thread_rng();

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    break;
                };
                match state.parse(&line, &mut rng) {
                    Ok(Command::Send(event)) => client.send(&event).await?,
                    Ok(Command::Help) => println!("Commands: {}", help(state.game())),
                    Ok(Command::Quit) => break,
                    Err(e) => println!("{}", e),
                }
            },

            event = client.next_event() => {
                match event {
                    Ok(event) => {
                        println!("{}", describe(&event));
                        if event == ServerEvent::ServerFull {
                            break;
                        }
                    }
                    Err(ClientError::Closed) => {
                        info!("Server closed the connection");
                        return Ok(());
                    }
                    Err(ClientError::Protocol(e)) => warn!("Ignoring undecodable event: {}", e),
                    Err(e) => return Err(e.into()),
                }
            },
        }
    }

    client.close().await?;
    Ok(())
}

/// Forwards stdin lines to the main loop so reading never blocks the socket
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
