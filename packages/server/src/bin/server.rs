//! Planning poker server.
//!
//! Serves the session HTTP API and pushes every session change to the
//! participants connected over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin planpoker-server
//! cargo run --bin planpoker-server -- --host 0.0.0.0 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use planpoker_server::{
    config::{
        DEFAULT_DROP_TIMEOUT, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_HEARTBEAT_TIMEOUT,
        DEFAULT_QUEUE_CAPACITY, HubConfig,
    },
    domain::SessionRepository,
    infrastructure::{hub::BroadcastHub, repository::InMemorySessionRepository},
    ui::{AppState, Server},
};
use planpoker_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "planpoker-server")]
#[command(about = "Real-time planning poker server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Outbound queue capacity per connection
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// How long a broadcast waits on a full queue before dropping the event
    #[arg(long, default_value_t = DEFAULT_DROP_TIMEOUT.as_millis() as u64)]
    drop_timeout_ms: u64,

    /// Interval between heartbeat pings
    #[arg(
        long,
        default_value_t = DEFAULT_HEARTBEAT_INTERVAL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    heartbeat_interval_secs: u64,

    /// Silence after which a connection is closed
    #[arg(
        long,
        default_value_t = DEFAULT_HEARTBEAT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    heartbeat_timeout_secs: u64,
}

impl Args {
    fn hub_config(&self) -> HubConfig {
        HubConfig {
            queue_capacity: self.queue_capacity,
            drop_timeout: Duration::from_millis(self.drop_timeout_ms),
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs),
            heartbeat_timeout: Duration::from_secs(self.heartbeat_timeout_secs),
            ..HubConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = args.hub_config();
    tracing::debug!("Hub configuration: {:?}", config);

    // Initialize dependencies in order:
    // 1. Repository
    // 2. BroadcastHub
    // 3. UseCases (AppState)
    // 4. Server
    let repository: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());
    let hub = Arc::new(BroadcastHub::new(config));
    let state = Arc::new(AppState::new(repository, hub));

    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
