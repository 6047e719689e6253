//! Server command line and configuration.

use clap::Parser;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8888;

/// How often the statistics task logs a summary.
pub const STATS_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone, Parser)]
#[command(name = "matchbook-server", about = "Binary TCP matching engine server")]
pub struct Config {
    /// TCP port to listen on.
    #[arg(default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Interface to bind (e.g. 0.0.0.0 or 127.0.0.1).
    #[arg(long, default_value = "0.0.0.0")]
    pub bind_addr: String,

    /// Maximum number of simultaneously connected clients.
    #[arg(long, default_value_t = 1024)]
    pub max_clients: usize,
}

impl Config {
    /// `addr:port` string for binding.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
