//! Command-line and environment configuration.

use clap::Parser;
use shared::{DEFAULT_PORT, TICK_INTERVAL_MS};
use std::time::Duration;

/// Authoritative platformer server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Milliseconds between simulation ticks
    #[arg(short, long, default_value_t = TICK_INTERVAL_MS)]
    pub tick_ms: u64,
}

/// Resolved settings the server is started with.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tick_duration: Duration,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tick_duration: Duration::from_millis(TICK_INTERVAL_MS),
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            tick_duration: Duration::from_millis(args.tick_ms.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["server"]).unwrap();
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.tick_ms, 16);

        let config = ServerConfig::from(args);
        assert_eq!(config.tick_duration, Duration::from_millis(16));
    }

    #[test]
    fn test_explicit_flags() {
        let args =
            Args::try_parse_from(["server", "-H", "127.0.0.1", "--port", "4000", "--tick-ms", "33"])
                .unwrap();
        let config = ServerConfig::from(args);
        assert_eq!(config.address(), "127.0.0.1:4000");
        assert_eq!(config.tick_duration, Duration::from_millis(33));
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let args = Args::try_parse_from(["server", "--tick-ms", "0"]).unwrap();
        assert_eq!(
            ServerConfig::from(args).tick_duration,
            Duration::from_millis(1)
        );
    }

    #[test]
    fn test_default_config_address() {
        assert_eq!(ServerConfig::default().address(), "0.0.0.0:3000");
    }
}
