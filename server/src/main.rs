use clap::Parser;
use log::{error, info};
use server::config::{timeout_from_secs, RoomTimeouts, ServerConfig};
use server::network::Server;
use std::time::Duration;

/// Realtime room relay for the casual games platform
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP address to bind to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Maximum simultaneous connections
    #[arg(short, long, env = "MAX_CONNECTIONS", default_value = "256")]
    max_connections: usize,

    /// Seconds a room may wait for players before it expires (0 disables)
    #[arg(long, env = "ROOM_TIMEOUT_SECS", default_value = "600")]
    room_timeout_secs: u64,

    /// Seconds a started round may wait for the remaining actions (0 disables)
    #[arg(long, env = "ROUND_TIMEOUT_SECS", default_value = "120")]
    round_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        max_connections: args.max_connections,
        timeouts: RoomTimeouts {
            idle_room: timeout_from_secs(args.room_timeout_secs),
            round: timeout_from_secs(args.round_timeout_secs),
        },
        sweep_interval: Duration::from_secs(1),
    };

    info!(
        "Starting relay on {} (max {} connections)",
        config.address(),
        config.max_connections
    );

    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
