use std::time::Duration;

/// Runtime settings for the relay server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_connections: usize,
    pub timeouts: RoomTimeouts,
    /// How often idle rooms and stalled rounds are swept
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_connections: 256,
            timeouts: RoomTimeouts::default(),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Limits on how long a room may wait. `None` disables a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomTimeouts {
    /// Room below capacity with no new member for this long is removed
    pub idle_room: Option<Duration>,
    /// Round with a partial buffer for this long is discarded
    pub round: Option<Duration>,
}

impl Default for RoomTimeouts {
    fn default() -> Self {
        Self {
            idle_room: Some(Duration::from_secs(600)),
            round: Some(Duration::from_secs(120)),
        }
    }
}

impl RoomTimeouts {
    pub fn disabled() -> Self {
        Self {
            idle_room: None,
            round: None,
        }
    }
}

/// Seconds from the command line, where 0 turns the limit off
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
