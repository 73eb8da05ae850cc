//! Server binary: parses startup configuration, initializes structured
//! logging, binds the listener, and runs the accept loop until shutdown.

use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, Level};

use jobexec::config::ServerConfig;
use jobexec::server::Server;

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::parse();

    if config.debug {
        tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .init();
    } else {
        tracing_subscriber::fmt().json().init();
    }

    let listener = match TcpListener::bind((config.listen, config.port)).await
    {
        Ok(listener) => listener,
        Err(error) => {
            error!(%error, "failed to listen for connections");
            return ExitCode::from(111);
        },
    };

    let server = Server::new(&config);
    match server.run(listener).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "encountered runtime error");
            ExitCode::FAILURE
        },
    }
}
