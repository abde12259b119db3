//! Ringmaster entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ringmaster::api::HttpServer;
use ringmaster::config::{parse_search_list, NodeConfig};
use ringmaster::executor::ScriptExecutor;
use ringmaster::network::NetworkClient;
use ringmaster::node::Node;
use ringmaster::peer::Peer;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// High-availability master election and failover for a fixed peer cluster.
#[derive(Parser, Debug)]
#[command(name = "ringmaster", version, about)]
struct Cli {
    /// Host this node listens on.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port this node listens on.
    #[arg(long, default_value_t = 7500)]
    port: u16,

    /// Comma-separated list of candidate peers to probe at startup, e.g.
    /// "10.0.0.2:7500,10.0.0.3:7500".
    #[arg(long, default_value = "")]
    searchlist: String,

    /// Script to run when this node becomes master.
    #[arg(long, default_value = "masterscript.sh")]
    masterscript: String,

    /// Script to run when this node is a slave.
    #[arg(long, default_value = "slavescript.sh")]
    slavescript: String,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = NodeConfig {
        host: cli.host,
        port: cli.port,
        search_list: parse_search_list(&cli.searchlist),
        master_script_path: cli.masterscript,
        slave_script_path: cli.slavescript,
    };

    let self_peer = Peer::new(config.host.clone(), config.port);
    tracing::info!("starting node {} at {}", self_peer.id, self_peer.base_url());

    let listener = match tokio::net::TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", config.bind_address(), e);
            std::process::exit(1);
        }
    };

    let client = NetworkClient::new(REQUEST_TIMEOUT);
    let executor = ScriptExecutor::new(config.master_script_path, config.slave_script_path);
    let node = Arc::new(Node::new(self_peer, client, executor));

    let server = HttpServer::new(Arc::clone(&node));
    tokio::spawn(async move {
        if let Err(e) = server.serve(listener).await {
            tracing::error!("HTTP server stopped: {}", e);
        }
    });

    if let Err(e) = node.start(&config.search_list).await {
        tracing::error!("failed to join cluster: {}", e);
        std::process::exit(1);
    }

    tokio::spawn(ringmaster::monitor::run(Arc::clone(&node)));

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("shutting down");
            std::process::exit(0);
        }
        Err(e) => {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::process::exit(1);
        }
    }
}
