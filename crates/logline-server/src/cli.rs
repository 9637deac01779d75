//! Command-line argument parsing with clap.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{DEFAULT_DATA_FILE, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, ServerConfig};
use crate::fanout::DEFAULT_SUBSCRIBER_BUFFER;

/// Log ingestion API with a live WebSocket feed.
#[derive(Parser, Debug, Clone)]
#[command(name = "logline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Interface to listen on.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// JSON file holding the log collection.
    #[arg(short, long, env = "LOGLINE_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Allowed browser origins, comma separated. Empty allows any origin.
    #[arg(long = "cors-origin", env = "FRONTEND_URL", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[arg(long, env = "LOGLINE_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Maximum concurrent WebSocket viewers.
    #[arg(long, env = "LOGLINE_MAX_WS_CONNECTIONS", default_value_t = 1000)]
    pub max_ws_connections: usize,

    /// Seconds between WebSocket pings.
    #[arg(long, env = "LOGLINE_WS_PING_SECS", default_value_t = 30)]
    pub ws_ping_secs: u64,

    /// Updates buffered per viewer before it is disconnected.
    #[arg(long, env = "LOGLINE_SUBSCRIBER_BUFFER", default_value_t = DEFAULT_SUBSCRIBER_BUFFER)]
    pub subscriber_buffer: usize,

    /// Log output format.
    #[arg(long, env = "LOGLINE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl Cli {
    /// Build the server configuration from the parsed arguments.
    #[must_use]
    pub fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::new(SocketAddr::new(self.host, self.port))
            .with_data_file(self.data_file)
            .with_max_body_bytes(self.max_body_bytes)
            .with_max_ws_connections(self.max_ws_connections)
            .with_ws_ping_interval(Duration::from_secs(self.ws_ping_secs.max(1)))
            .with_subscriber_buffer(self.subscriber_buffer);

        for origin in self.cors_origins {
            let origin = origin.trim();
            if !origin.is_empty() {
                config = config.with_cors_origin(origin);
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 5] = ["logline", "--host", "127.0.0.1", "--port", "4000"];

    #[test]
    fn test_parse_explicit_args() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--data-file",
            "/tmp/logs.json",
            "--cors-origin",
            "http://localhost:3000,https://logs.example.com",
            "--log-format",
            "json",
        ]);

        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.port, 4000);
        assert_eq!(cli.data_file, PathBuf::from("/tmp/logs.json"));
        assert_eq!(cli.cors_origins.len(), 2);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_into_config() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--cors-origin",
            "http://localhost:3000, ",
            "--max-body-bytes",
            "2048",
            "--ws-ping-secs",
            "0",
        ]);

        let config = Cli::try_parse_from(args).unwrap().into_config();

        assert_eq!(config.bind_addr, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(config.cors_origins, vec!["http://localhost:3000".to_string()]);
        assert_eq!(config.max_body_bytes, 2048);
        assert_eq!(config.ws_ping_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = Cli::try_parse_from(["logline", "--port", "not-a-port"]);
        assert!(result.is_err());
    }
}
