//! One compute party of the three-party deployment.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use omf_cli::{config::Config, files, framed, init_tracing};
use omf_protocol::{PartyState, Role, UpdateEngine};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Party role, 0 or 1.
    #[arg(long)]
    role: u8,
    /// Configuration file (TOML); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let role = Role::from_index(cli.role).context("role must be 0 or 1")?;
    let dims = config.dimensions;

    let dealer_stream = TcpStream::connect(&config.network.dealer_addr)
        .await
        .with_context(|| format!("connecting to dealer at {}", config.network.dealer_addr))?;
    info!(%role, dealer = %config.network.dealer_addr, "connected to dealer");

    let peer_stream = match role {
        Role::P0 => TcpStream::connect(&config.network.peer_addr)
            .await
            .with_context(|| format!("connecting to peer at {}", config.network.peer_addr))?,
        Role::P1 => {
            let listener = TcpListener::bind(("0.0.0.0", config.network.peer_port))
                .await
                .with_context(|| format!("listening on peer port {}", config.network.peer_port))?;
            info!(port = config.network.peer_port, "waiting for P0");
            let (stream, peer) = listener.accept().await.context("accepting peer link")?;
            info!(%peer, "peer connected");
            stream
        }
    };
    info!(%role, "peer link established");

    let index = role.index();
    let data_dir = files::locate_data_dir(&config.data_dir, &format!("U{index}.txt"));
    let users = files::load_matrix(
        &data_dir.join(format!("U{index}.txt")),
        dims.users,
        dims.features,
    )
    .context("loading user shares")?;
    let items = files::load_matrix(
        &data_dir.join(format!("V{index}.txt")),
        dims.items,
        dims.features,
    )
    .context("loading item shares")?;
    let queries = files::read_queries(&data_dir.join(format!("queries_p{index}.bin")))
        .context("loading queries")?;
    info!(%role, queries = queries.len(), "loaded shares and queries");

    let mut engine = UpdateEngine::new(role, framed(dealer_stream), framed(peer_stream));
    let mut state = PartyState { users, items };
    let stats = engine.run(&mut state, &queries).await?;

    files::save_matrix(&data_dir.join(format!("U{index}_updated.txt")), &state.users)
        .context("saving updated user shares")?;
    files::save_matrix(&data_dir.join(format!("V{index}_updated.txt")), &state.items)
        .context("saving updated item shares")?;

    for (query, (user, item)) in stats
        .user_update
        .iter()
        .zip(&stats.item_update)
        .enumerate()
    {
        debug!(query, user_update = ?user, item_update = ?item, "query timing");
    }
    info!(
        %role,
        queries = queries.len(),
        avg_user_update = ?stats.average_user_update(),
        avg_item_update = ?stats.average_item_update(),
        "session finished"
    );
    Ok(())
}
