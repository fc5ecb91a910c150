use anyhow::Result;
use clap::{Parser, Subcommand};
use flqween_backend::api;
use flqween_backend::bootstrap;
use flqween_backend::config::{FlqweenConfig, FlqweenPaths};
use flqween_backend::telemetry;
use flqween_backend::utils::APP_NAME;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Flqween content-sharing backend")]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Base directory for data, uploads and keys (overrides FLQWEEN_HOME)
    #[arg(long, global = true)]
    home: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let args = Args::parse();

    let mut config = FlqweenConfig::from_env()?;
    if let Some(home) = args.home {
        config.paths = FlqweenPaths::from_base_dir(home)?;
    }
    if let Some(port) = args.port {
        config.api_port = port;
    }
    tracing::info!(app = APP_NAME, port = config.api_port, "starting");

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let resources = bootstrap::initialize(&config)?;
            api::serve_http(config, resources.database, resources.tokens).await
        }
    }
}
