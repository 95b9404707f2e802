//! Correlated-randomness dealer process.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use omf_cli::{config::Config, framed, init_tracing};
use omf_protocol::Dealer;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (TOML); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let dims = config.dimensions;

    let listener = TcpListener::bind(("0.0.0.0", config.network.dealer_port))
        .await
        .with_context(|| format!("listening on port {}", config.network.dealer_port))?;

    // Connection order binds the roles: first accept is P0, second is P1.
    info!(port = config.network.dealer_port, "waiting for P0");
    let (p0, addr0) = listener.accept().await.context("accepting P0")?;
    info!(%addr0, "P0 connected, waiting for P1");
    let (p1, addr1) = listener.accept().await.context("accepting P1")?;
    info!(%addr1, "P1 connected");

    let mut dealer = Dealer::new(framed(p0), framed(p1));
    dealer
        .run(dims.items, dims.features, dims.queries)
        .await
        .context("dealing query material")?;

    info!(queries = dims.queries, "session finished");
    Ok(())
}
