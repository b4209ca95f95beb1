use std::sync::Arc;

use tracing::{error, info};

use parlor::chat::{Dispatcher, Registry};
use parlor::server::{ChatServer, Session};
use parlor::{Config, Result};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = parlor::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        parlor::logging::init_console_only(&config.logging.level);
    }

    info!("PARLOR - Minimal multi-user chat server");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    if let Err(e) = run(config).await {
        error!("Server terminated: {e}");
        std::process::exit(1);
    }
}

/// Bind the listener and serve sessions until the process is stopped.
async fn run(config: Config) -> Result<()> {
    // The registry is created once at startup and injected into every
    // session; there is no ambient global state.
    let registry = Arc::new(Registry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry));

    let server = ChatServer::bind(&config.server).await?;

    server
        .run(move |stream, peer_addr| {
            let session = Session::new(peer_addr, Arc::clone(&registry), dispatcher.clone());
            session.run(stream)
        })
        .await
}
