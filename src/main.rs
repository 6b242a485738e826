//! TiddlyWiki save server - Entry Point
//!
//! Single-document save endpoint for a wiki editor running in a browser.

use env_logger::Env;
use log::{error, info};

use tw5_save_server::Server;
use tw5_save_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Launching TiddlyWiki save server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let server = Server::new(&config).await?;
    server.start().await;

    Ok(())
}
