//! adboard entrypoint

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use adboard::{run_server, ServerArgs};

#[derive(Parser, Debug)]
#[command(name = "adboard", version, about = "Classifieds board HTTP server")]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    /// Enable debug logging (unless RUST_LOG is set explicitly)
    #[arg(long)]
    debug: bool,
}

fn init_tracing(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;
    run_server(cli.server).await
}
