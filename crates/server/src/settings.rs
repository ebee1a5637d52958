//! Runtime configuration, read once from the environment at startup.

use std::time::Duration;

/// Server settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Event the startup sequence subscribes to
    pub subscribe_event: String,
    /// Bounded wait after subscribing, before the first command
    pub settle: Duration,
    /// Commands issued strictly in order after the settle delay
    pub startup_commands: Vec<String>,
    /// Log complete wire documents instead of one-line summaries
    pub log_full_wire: bool,
}

impl Settings {
    /// Read settings from the environment, falling back to the demo
    /// defaults.
    pub fn from_env() -> Self {
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("SERVER_PORT")
            .or_else(|_| std::env::var("PORT"))
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .unwrap_or(3000);
        let subscribe_event =
            std::env::var("SUBSCRIBE_EVENT").unwrap_or_else(|_| "PlayerMessage".into());
        let settle_ms: u64 = std::env::var("SETTLE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1_000);
        let startup_commands = std::env::var("STARTUP_COMMANDS")
            .map(|v| parse_commands(&v))
            .unwrap_or_else(|_| default_commands());
        let log_full_wire = std::env::var("LOG_FULL_WIRE")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            host,
            port,
            subscribe_event,
            settle: Duration::from_millis(settle_ms),
            startup_commands,
            log_full_wire,
        }
    }
}

/// Split a `;`-separated command list, dropping empty segments.
fn parse_commands(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// The demo sequence: greet, chime, and place a glass block underfoot.
fn default_commands() -> Vec<String> {
    vec![
        "title @a actionbar §aConnected!".to_string(),
        "playsound random.levelup @a ~ ~ ~ 1 1".to_string(),
        "setblock ~ ~-1 ~ glass".to_string(),
    ]
}
