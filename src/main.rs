// src/main.rs
//! Inkpress server entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use inkpress::config::AppConfig;
use inkpress::server::ApiServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inkpress")]
#[command(about = "Blogging platform backend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Server {
        /// Port to bind, overriding the PORT environment variable
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("starting inkpress v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::from_env()?;
    if let Some(Commands::Server { port: Some(port) }) = &args.command {
        config.port = *port;
    }

    ApiServer::new(config).await?.run().await
}
